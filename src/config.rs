//! Release configuration: `release.toml`, environment overrides and defaults.
//!
//! Every section is optional. A repository without a `release.toml` gets the
//! behaviour of the stock workflows: tags `v*`, branch `release`, build with
//! the manifest's native tool, publish to GitHub Releases.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file name at the repository root
pub const CONFIG_FILE: &str = "release.toml";

/// Complete release configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Ref classification
    pub trigger: TriggerConfig,
    /// Build step
    pub build: BuildConfig,
    /// Release host and registry upload
    pub publish: PublishConfig,
    /// Retry limits for network operations
    pub retry: RetryConfig,
}

/// Which refs start a release
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriggerConfig {
    /// Prefix stripped from tags to get the version
    pub tag_prefix: String,
    /// Glob a tag must match to trigger a publish
    pub tag_pattern: String,
    /// Branch whose pushes create the release tag
    pub release_branch: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            tag_prefix: "v".to_string(),
            tag_pattern: "v*".to_string(),
            release_branch: "release".to_string(),
        }
    }
}

/// Build step settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Command and arguments; derived from the manifest kind when unset
    pub command: Option<Vec<String>>,
    /// Directory holding built artifacts, relative to the repository root
    pub dist_dir: Option<PathBuf>,
    /// Kill the build after this many seconds
    pub timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: None,
            dist_dir: None,
            timeout_secs: 900,
        }
    }
}

/// Release host settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Upload to GitHub Releases
    pub github: bool,
    /// `owner/repo`; detected from the environment or origin when unset
    pub repository: Option<String>,
    /// Leave the release as a draft after uploading
    pub draft: bool,
    /// Registry upload command run after the release upload
    pub command: Option<Vec<String>>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            github: true,
            repository: None,
            draft: false,
            command: None,
        }
    }
}

/// Configuration for retry behavior across network operations
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Max retries for GitHub API calls (lookup, create, publish)
    pub github_api: u32,
    /// Max retries per asset upload
    pub uploads: u32,
    /// Absolute deadline for one retried operation, in seconds
    pub deadline_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            github_api: 5,
            uploads: 5,
            deadline_secs: 1800,
        }
    }
}

impl RetryConfig {
    const MAX_RETRIES: u32 = 20;

    /// Parse retry count from environment variable with clamping to maximum
    fn parse_retry_env(var_name: &str, default: u32) -> u32 {
        std::env::var(var_name)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .map(|v| v.min(Self::MAX_RETRIES))
            .unwrap_or(default)
    }

    /// Apply `TAG_RELEASE_RETRY_*` overrides
    pub fn apply_env(&mut self) {
        self.github_api = Self::parse_retry_env("TAG_RELEASE_RETRY_GITHUB", self.github_api);
        self.uploads = Self::parse_retry_env("TAG_RELEASE_RETRY_UPLOADS", self.uploads);
    }

    /// Validate retry counts are reasonable
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [("retry.github_api", self.github_api), ("retry.uploads", self.uploads)] {
            if value > Self::MAX_RETRIES {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("{} is above the maximum of {}", value, Self::MAX_RETRIES),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl ReleaseConfig {
    /// Load configuration.
    ///
    /// `explicit` must exist when given; otherwise `<root>/release.toml` is
    /// read when present. Environment overrides are applied last.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Some(root.join(CONFIG_FILE)).filter(|p| p.is_file()),
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.retry.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        log::debug!("Loaded release config from {}", path.display());
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.trigger.tag_pattern.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "trigger.tag_pattern".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        if self.trigger.release_branch.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "trigger.release_branch".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        for (key, command) in [
            ("build.command", &self.build.command),
            ("publish.command", &self.publish.command),
        ] {
            if command.as_ref().is_some_and(|c| c.is_empty()) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "command must have at least the program name".to_string(),
                }
                .into());
            }
        }
        self.retry.validate()
    }
}
