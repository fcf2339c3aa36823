//! Tag/version consistency.
//!
//! A release tag is the configured prefix followed by the version declared in
//! the manifest. The publish workflow refuses to run when the two disagree.

mod bumper;

pub use bumper::{VersionBump, bump_version};

use crate::error::{Result, VersionError};
use regex::Regex;
use std::sync::LazyLock;

/// Default tag prefix
pub const DEFAULT_TAG_PREFIX: &str = "v";

/// A tag whose version matched the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVersion {
    /// Full tag name, e.g. `v1.2.3`
    pub tag: String,
    /// Version carried by the tag, e.g. `1.2.3`
    pub version: String,
}

/// Build the tag name for a version
pub fn tag_name(prefix: &str, version: &str) -> String {
    format!("{}{}", prefix, version.trim())
}

/// Strip the prefix from a tag, returning the version it carries
pub fn version_from_tag<'a>(tag: &'a str, prefix: &str) -> Result<&'a str> {
    let tag = tag.trim();
    let version = tag.strip_prefix(prefix).ok_or_else(|| VersionError::InvalidTag {
        tag: tag.to_string(),
        reason: format!("expected the '{}' prefix", prefix),
    })?;

    if version.is_empty() {
        return Err(VersionError::InvalidTag {
            tag: tag.to_string(),
            reason: "no version after the prefix".to_string(),
        }
        .into());
    }

    Ok(version)
}

/// Verify that `tag` carries exactly the `declared` version.
///
/// Fails with [`VersionError::Mismatch`] iff the versions differ.
pub fn verify_tag_version(tag: &str, prefix: &str, declared: &str) -> Result<TagVersion> {
    let tag_version = version_from_tag(tag, prefix)?;
    let declared = declared.trim();

    if tag_version != declared {
        return Err(VersionError::Mismatch {
            tag: tag.trim().to_string(),
            tag_version: tag_version.to_string(),
            declared: declared.to_string(),
        }
        .into());
    }

    Ok(TagVersion {
        tag: tag.trim().to_string(),
        version: tag_version.to_string(),
    })
}

static PEP440_PRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d+(\.\d+)*[-_.]?(a|alpha|b|beta|c|rc|pre|preview|dev)\d*")
        .expect("PEP 440 pre-release regex is valid")
});

/// Whether a version should be published as a pre-release.
///
/// Covers semver pre-release identifiers and PEP 440 alpha/beta/rc/dev
/// segments.
pub fn is_prerelease(version: &str) -> bool {
    let version = version.trim();
    if let Ok(parsed) = semver::Version::parse(version) {
        return !parsed.pre.is_empty();
    }
    PEP440_PRE_RE.is_match(version) || version.contains(".dev")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;

    #[test]
    fn test_matching_tag_passes() {
        let matched = verify_tag_version("v1.2.3", "v", "1.2.3").unwrap();
        assert_eq!(matched.tag, "v1.2.3");
        assert_eq!(matched.version, "1.2.3");
    }

    #[test]
    fn test_mismatch_fails() {
        let err = verify_tag_version("v1.2.4", "v", "1.2.3").unwrap_err();
        match err {
            ReleaseError::Version(VersionError::Mismatch {
                tag_version,
                declared,
                ..
            }) => {
                assert_eq!(tag_version, "1.2.4");
                assert_eq!(declared, "1.2.3");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fails_iff_versions_differ() {
        let versions = ["0.1.0", "0.1.1", "1.0.0", "1.0.0rc1", "10.2.3"];
        for tagged in versions {
            for declared in versions {
                let result = verify_tag_version(&tag_name("v", tagged), "v", declared);
                assert_eq!(result.is_err(), tagged != declared, "{tagged} vs {declared}");
            }
        }
    }

    #[test]
    fn test_no_normalisation_between_forms() {
        assert!(verify_tag_version("v1.02.0", "v", "1.2.0").is_err());
        assert!(verify_tag_version("v1.2", "v", "1.2.0").is_err());
    }

    #[test]
    fn test_declared_whitespace_is_ignored() {
        assert!(verify_tag_version("v2.0.0", "v", " 2.0.0\n").is_ok());
    }

    #[test]
    fn test_missing_prefix_is_invalid() {
        let err = verify_tag_version("1.2.3", "v", "1.2.3").unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Version(VersionError::InvalidTag { .. })
        ));
        assert!(verify_tag_version("v", "v", "1.2.3").is_err());
    }

    #[test]
    fn test_custom_prefix() {
        assert!(verify_tag_version("release-3.1.0", "release-", "3.1.0").is_ok());
    }

    #[test]
    fn test_prerelease_detection() {
        assert!(is_prerelease("1.0.0-beta.1"));
        assert!(is_prerelease("1.0.0rc1"));
        assert!(is_prerelease("2.1a3"));
        assert!(is_prerelease("0.4.0.dev2"));
        assert!(!is_prerelease("1.0.0"));
        assert!(!is_prerelease("0.9.12"));
        assert!(!is_prerelease("1.0.post1"));
    }
}
