//! Classification of the pushed git ref.
//!
//! A tag push matching the tag pattern publishes; a push to the release branch
//! creates the tag; anything else is ignored.

use crate::config::TriggerConfig;
use crate::error::{Result, TriggerError};
use glob::{MatchOptions, Pattern};

/// Environment variable holding the pushed ref on GitHub Actions
pub const GITHUB_REF_ENV: &str = "GITHUB_REF";

/// `*` stops at `/`, as in GitHub's tag filters
const TAG_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// What a pushed ref asks the tool to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Version tag pushed: verify, build and publish
    Tag {
        /// Tag name, e.g. `v1.2.3`
        tag: String,
        /// Tag name without the prefix
        version: String,
    },
    /// Release branch pushed: create the version tag
    ReleaseBranch {
        /// Branch name
        branch: String,
    },
    /// Ref that starts no release
    Ignored {
        /// The ref as given
        git_ref: String,
    },
}

impl Trigger {
    /// Classify `git_ref` (`refs/tags/..`, `refs/heads/..` or a bare name)
    pub fn classify(git_ref: &str, config: &TriggerConfig) -> Result<Self> {
        let git_ref = git_ref.trim();
        let pattern = Pattern::new(&config.tag_pattern).map_err(|e| TriggerError::InvalidPattern {
            pattern: config.tag_pattern.clone(),
            reason: e.to_string(),
        })?;

        let tag_candidate = |name: &str| -> Option<Trigger> {
            if !pattern.matches_with(name, TAG_MATCH) {
                return None;
            }
            let version = name.strip_prefix(config.tag_prefix.as_str())?;
            if version.is_empty() {
                return None;
            }
            Some(Trigger::Tag {
                tag: name.to_string(),
                version: version.to_string(),
            })
        };

        let ignored = || Trigger::Ignored {
            git_ref: git_ref.to_string(),
        };

        if let Some(name) = git_ref.strip_prefix("refs/tags/") {
            return Ok(tag_candidate(name).unwrap_or_else(ignored));
        }

        if let Some(branch) = git_ref.strip_prefix("refs/heads/") {
            if branch == config.release_branch {
                return Ok(Trigger::ReleaseBranch {
                    branch: branch.to_string(),
                });
            }
            return Ok(ignored());
        }

        if git_ref.starts_with("refs/") {
            return Ok(ignored());
        }

        // Bare names, for local invocations
        if git_ref == config.release_branch {
            return Ok(Trigger::ReleaseBranch {
                branch: git_ref.to_string(),
            });
        }
        Ok(tag_candidate(git_ref).unwrap_or_else(ignored))
    }

    /// Resolve the ref from an explicit value or `GITHUB_REF`
    pub fn resolve_ref(explicit: Option<&str>) -> Result<String> {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(GITHUB_REF_ENV).ok())
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| TriggerError::MissingRef.into())
    }

    /// Short label for output
    pub fn describe(&self) -> String {
        match self {
            Trigger::Tag { tag, .. } => format!("tag push {}", tag),
            Trigger::ReleaseBranch { branch } => format!("push to release branch {}", branch),
            Trigger::Ignored { git_ref } => format!("ignored ref {}", git_ref),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(git_ref: &str) -> Trigger {
        Trigger::classify(git_ref, &TriggerConfig::default()).unwrap()
    }

    #[test]
    fn test_version_tag() {
        assert_eq!(
            classify("refs/tags/v1.2.3"),
            Trigger::Tag {
                tag: "v1.2.3".to_string(),
                version: "1.2.3".to_string()
            }
        );
    }

    #[test]
    fn test_release_branch() {
        assert_eq!(
            classify("refs/heads/release"),
            Trigger::ReleaseBranch {
                branch: "release".to_string()
            }
        );
    }

    #[test]
    fn test_other_refs_are_ignored() {
        assert!(matches!(classify("refs/heads/main"), Trigger::Ignored { .. }));
        assert!(matches!(classify("refs/tags/nightly"), Trigger::Ignored { .. }));
        assert!(matches!(classify("refs/tags/v"), Trigger::Ignored { .. }));
        assert!(matches!(classify("refs/pull/12/merge"), Trigger::Ignored { .. }));
    }

    #[test]
    fn test_star_does_not_cross_slash() {
        assert!(matches!(classify("refs/tags/v1/x"), Trigger::Ignored { .. }));
        assert!(matches!(classify("v1/x"), Trigger::Ignored { .. }));
        assert!(matches!(classify("refs/tags/v1.0.0"), Trigger::Tag { .. }));
    }

    #[test]
    fn test_bare_names() {
        assert!(matches!(classify("v0.4.0"), Trigger::Tag { .. }));
        assert!(matches!(classify("release"), Trigger::ReleaseBranch { .. }));
        assert!(matches!(classify("feature/x"), Trigger::Ignored { .. }));
    }

    #[test]
    fn test_custom_pattern() {
        let config = TriggerConfig {
            tag_prefix: "scraper-utils-v".to_string(),
            tag_pattern: "scraper-utils-v[0-9]*".to_string(),
            release_branch: "main".to_string(),
        };
        assert_eq!(
            Trigger::classify("refs/tags/scraper-utils-v2.0.0", &config).unwrap(),
            Trigger::Tag {
                tag: "scraper-utils-v2.0.0".to_string(),
                version: "2.0.0".to_string()
            }
        );
        assert!(matches!(
            Trigger::classify("refs/tags/scraper-utils-vnext", &config).unwrap(),
            Trigger::Ignored { .. }
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = TriggerConfig {
            tag_pattern: "v[".to_string(),
            ..TriggerConfig::default()
        };
        assert!(Trigger::classify("refs/tags/v1.0.0", &config).is_err());
    }

    #[test]
    fn test_explicit_ref_wins() {
        assert_eq!(Trigger::resolve_ref(Some("refs/tags/v1.0.0")).unwrap(), "refs/tags/v1.0.0");
    }
}
