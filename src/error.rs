//! Error types for tag_release operations.
//!
//! Every failure of a release run maps to one of these variants. All of them
//! stop the run; only network failures against the release host are retried.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tag_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all tag_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Manifest discovery and parsing errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Tag/version consistency errors
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    /// Git ref classification errors
    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    /// Git operation errors
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Build errors
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Release host errors
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Workflow template parsing errors
    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    /// Workflow template rendering errors
    #[error("Template render error: {0}")]
    Render(#[from] handlebars::RenderError),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Manifest discovery and parsing errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Neither pyproject.toml nor Cargo.toml found
    #[error("No pyproject.toml or Cargo.toml found in {path}")]
    NotFound {
        /// Directory that was searched
        path: PathBuf,
    },

    /// Manifest declares no static version
    #[error("{path} does not declare a static version ({reason})")]
    MissingVersion {
        /// Manifest path
        path: PathBuf,
        /// Why the version could not be read
        reason: String,
    },

    /// Manifest could not be parsed
    #[error("Failed to parse {path}: {reason}")]
    Invalid {
        /// Manifest path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Rewriting the version failed
    #[error("Failed to update version in {path}: {reason}")]
    UpdateFailed {
        /// Manifest path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// Tag/version consistency errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// Pushed tag and declared version differ
    #[error(
        "Tag '{tag}' carries version '{tag_version}' but the manifest declares '{declared}'"
    )]
    Mismatch {
        /// Tag name
        tag: String,
        /// Version extracted from the tag
        tag_version: String,
        /// Version declared in the manifest
        declared: String,
    },

    /// Tag does not have the expected shape
    #[error("Invalid tag '{tag}': {reason}")]
    InvalidTag {
        /// Tag name
        tag: String,
        /// Reason for the error
        reason: String,
    },

    /// Version parsing failed
    #[error("Failed to parse version '{version}': {source}")]
    ParseFailed {
        /// Version string
        version: String,
        /// Parsing error
        #[source]
        source: semver::Error,
    },

    /// Version bump would not move the version forward
    #[error("Version bump '{bump}' not supported for version '{version}': {reason}")]
    UnsupportedBump {
        /// Bump type
        bump: String,
        /// Current version
        version: String,
        /// Reason for the error
        reason: String,
    },
}

/// Git ref classification errors
#[derive(Error, Debug)]
pub enum TriggerError {
    /// No ref supplied by flag or environment
    #[error("No git ref given. Pass --ref or set GITHUB_REF.")]
    MissingRef,

    /// Configured tag pattern is not a valid glob
    #[error("Invalid tag pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Pattern text
        pattern: String,
        /// Reason for the error
        reason: String,
    },
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository: {path}")]
    NotRepository {
        /// Path that was checked
        path: PathBuf,
    },

    /// Working directory not clean
    #[error("Working directory not clean. Commit or stash changes before tagging.")]
    DirtyWorkingDirectory,

    /// Tag already exists on a different commit
    #[error("Git tag '{tag}' already exists at {existing} (HEAD is {head})")]
    TagExists {
        /// Tag name
        tag: String,
        /// Commit the tag points at
        existing: String,
        /// Current HEAD commit
        head: String,
    },

    /// A repository operation failed
    #[error("Git {operation} failed: {reason}")]
    OperationFailed {
        /// What was attempted
        operation: String,
        /// Underlying error
        reason: String,
    },

    /// Push failed
    #[error("Git push failed: {reason}")]
    PushFailed {
        /// Reason for the error
        reason: String,
    },
}

/// Build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Build tool not installed
    #[error("Build tool '{tool}' not found on PATH")]
    ToolNotFound {
        /// Executable name
        tool: String,
    },

    /// Build command exited with an error
    #[error("Build command '{command}' failed: {reason}")]
    CommandFailed {
        /// Command line
        command: String,
        /// stderr or exit status
        reason: String,
    },

    /// Build command exceeded its timeout
    #[error("Build command '{command}' timed out after {seconds}s")]
    TimedOut {
        /// Command line
        command: String,
        /// Timeout in seconds
        seconds: u64,
    },

    /// Build produced nothing for the declared version
    #[error("No artifacts for version {version} found in {dist_dir}")]
    NoArtifacts {
        /// Declared version
        version: String,
        /// Directory that was scanned
        dist_dir: PathBuf,
    },
}

/// Release host errors
#[derive(Error, Debug)]
pub enum PublishError {
    /// Asset already uploaded and overwrite was not confirmed
    #[error("Release {tag} already has asset '{asset}'. Re-run with --overwrite to replace it.")]
    AssetExists {
        /// Release tag
        tag: String,
        /// Asset file name
        asset: String,
    },

    /// No token available
    #[error("GitHub token not provided. Set GH_TOKEN or GITHUB_TOKEN.")]
    MissingToken,

    /// Repository could not be determined
    #[error("Could not determine the GitHub repository: {reason}")]
    UnknownRepository {
        /// Reason for the error
        reason: String,
    },

    /// Authentication rejected
    #[error("GitHub rejected the credentials ({status})")]
    AuthenticationFailed {
        /// HTTP status
        status: u16,
    },

    /// API responded with an unexpected status
    #[error("GitHub API {operation} failed ({status}): {body}")]
    Api {
        /// Operation name
        operation: String,
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },

    /// Transport level failure
    #[error("Network error during {operation}: {reason}")]
    Network {
        /// Operation name
        operation: String,
        /// Reason for the error
        reason: String,
    },

    /// Registry upload command failed
    #[error("Registry upload '{command}' failed: {reason}")]
    RegistryFailed {
        /// Command line
        command: String,
        /// Reason for the error
        reason: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file unreadable or malformed
    #[error("Invalid config file {path}: {reason}")]
    InvalidFile {
        /// Config path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Config value out of range
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Config key
        key: String,
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// Refusing to replace a file without --force
    #[error("{path} already exists")]
    FileExists {
        /// Existing file
        path: PathBuf,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Version(VersionError::Mismatch {
                tag_version,
                declared,
                ..
            }) => vec![
                format!(
                    "Set the manifest version to {} or push the tag for {}",
                    tag_version, declared
                ),
                "Delete the wrong tag: git push --delete origin <tag>".to_string(),
            ],
            ReleaseError::Manifest(ManifestError::MissingVersion { .. }) => vec![
                "Declare a static version under [project] or [tool.poetry]".to_string(),
            ],
            ReleaseError::Git(GitError::DirtyWorkingDirectory) => vec![
                "Commit pending changes: git add . && git commit -m 'message'".to_string(),
                "Stash changes temporarily: git stash".to_string(),
            ],
            ReleaseError::Git(GitError::TagExists { tag, .. }) => vec![
                format!("Bump the manifest version; {} is already taken", tag),
                format!("Inspect the existing tag: git show {}", tag),
            ],
            ReleaseError::Build(BuildError::ToolNotFound { tool }) => vec![
                format!("Install {} in the runner before invoking tag_release", tool),
                "Or set [build].command in release.toml".to_string(),
            ],
            ReleaseError::Publish(PublishError::AssetExists { .. }) => vec![
                "Re-run with --overwrite to replace the existing assets".to_string(),
            ],
            ReleaseError::Cli(CliError::FileExists { .. }) => vec![
                "Re-run with --force to replace it".to_string(),
            ],
            ReleaseError::Trigger(TriggerError::MissingRef) => vec![
                "Pass --ref refs/tags/v<version> or run inside GitHub Actions".to_string(),
            ],
            ReleaseError::Publish(PublishError::MissingToken)
            | ReleaseError::Publish(PublishError::AuthenticationFailed { .. }) => vec![
                "Export GH_TOKEN or GITHUB_TOKEN with contents: write permission".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            ReleaseError::Publish(PublishError::Network { .. }) => true,
            ReleaseError::Publish(PublishError::Api { status, .. }) => {
                *status == 429 || *status >= 500
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_names_both_versions() {
        let err = ReleaseError::from(VersionError::Mismatch {
            tag: "v1.2.0".to_string(),
            tag_version: "1.2.0".to_string(),
            declared: "1.1.9".to_string(),
        });
        let message = err.to_string();
        assert!(message.contains("1.2.0"));
        assert!(message.contains("1.1.9"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_server_errors_are_recoverable() {
        let err = ReleaseError::from(PublishError::Api {
            operation: "upload".to_string(),
            status: 502,
            body: String::new(),
        });
        assert!(err.is_recoverable());

        let err = ReleaseError::from(PublishError::Api {
            operation: "upload".to_string(),
            status: 422,
            body: String::new(),
        });
        assert!(!err.is_recoverable());
    }
}
