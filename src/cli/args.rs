//! Command line argument parsing and validation.

use crate::version::VersionBump;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Tag-driven release automation
#[derive(Parser, Debug)]
#[command(
    name = "tag_release",
    version,
    about = "Tag-driven release automation for single-package repositories",
    long_about = "Verify, build and publish a package when a version tag is pushed.

Pushing to the release branch creates the v<version> tag; pushing a v* tag
checks the tag against the manifest version, builds the package and uploads
every artifact to the GitHub release for that tag.

Usage:
  tag_release run                 # dispatch on $GITHUB_REF
  tag_release check --ref v1.2.3  # verify a tag locally
  tag_release init                # write the GitHub Actions workflows"
)]
pub struct Args {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Repository root
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub path: PathBuf,

    /// Release configuration file (default: <path>/release.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print details of every step
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Classify the pushed ref and verify the tag against the manifest version
    Check {
        /// Ref to check (default: $GITHUB_REF)
        #[arg(long = "ref", value_name = "REF")]
        git_ref: Option<String>,
    },

    /// Create the version tag at HEAD and push it
    Tag {
        /// Create the tag locally only
        #[arg(long)]
        no_push: bool,

        /// Tag even when the working tree has uncommitted changes
        #[arg(long)]
        allow_dirty: bool,
    },

    /// Build the package and list its artifacts
    Build,

    /// Upload built artifacts to the release for a tag
    Publish {
        /// Release tag (default: <prefix><manifest version>)
        #[arg(long, value_name = "TAG")]
        tag: Option<String>,

        /// Replace assets that already exist on the release
        #[arg(long)]
        overwrite: bool,

        /// Leave the release as a draft
        #[arg(long)]
        draft: bool,

        /// Upload what is already in the dist directory instead of building
        #[arg(long)]
        skip_build: bool,

        /// GitHub repository as owner/repo
        #[arg(long, value_name = "OWNER/REPO")]
        repo: Option<String>,
    },

    /// Dispatch on the pushed ref: tag, publish or do nothing
    Run {
        /// Ref to act on (default: $GITHUB_REF)
        #[arg(long = "ref", value_name = "REF")]
        git_ref: Option<String>,

        /// Replace assets that already exist on the release
        #[arg(long)]
        overwrite: bool,

        /// Leave the release as a draft
        #[arg(long)]
        draft: bool,

        /// Show what would happen without tagging, building or uploading
        #[arg(long)]
        dry_run: bool,

        /// Create the tag locally only
        #[arg(long)]
        no_push: bool,

        /// GitHub repository as owner/repo
        #[arg(long, value_name = "OWNER/REPO")]
        repo: Option<String>,
    },

    /// Rewrite the manifest version
    Bump {
        /// major, minor, patch or an exact version
        #[arg(value_name = "BUMP")]
        bump: VersionBump,

        /// Print the new version without writing the manifest
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the GitHub Actions workflows into .github/workflows/
    Init {
        /// Overwrite existing workflow files
        #[arg(long)]
        force: bool,
    },
}

impl Command {
    /// Subcommand name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Check { .. } => "check",
            Command::Tag { .. } => "tag",
            Command::Build => "build",
            Command::Publish { .. } => "publish",
            Command::Run { .. } => "run",
            Command::Bump { .. } => "bump",
            Command::Init { .. } => "init",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !self.path.is_dir() {
            return Err(format!("'{}' is not a directory", self.path.display()));
        }

        if let Some(config) = &self.config
            && !config.is_file()
        {
            return Err(format!("config file '{}' does not exist", config.display()));
        }

        match &self.command {
            Command::Check { git_ref: Some(r) } | Command::Run { git_ref: Some(r), .. }
                if r.trim().is_empty() =>
            {
                Err("--ref must not be empty".to_string())
            }
            Command::Publish { tag: Some(t), .. } if t.trim().is_empty() => {
                Err("--tag must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Output verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Errors only
    Quiet,
    /// Normal progress
    Normal,
    /// Every step
    Verbose,
}

impl From<&Args> for VerbosityLevel {
    fn from(args: &Args) -> Self {
        if args.quiet {
            VerbosityLevel::Quiet
        } else if args.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    root: PathBuf,
    config_file: Option<PathBuf>,
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(root: PathBuf, config_file: Option<PathBuf>, verbosity: VerbosityLevel) -> Self {
        Self {
            root,
            config_file,
            output: super::OutputManager::new(
                verbosity == VerbosityLevel::Verbose,
                verbosity == VerbosityLevel::Quiet,
            ),
        }
    }

    /// Repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Explicit `--config` file
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print informational message
    pub fn info_println(&self, message: &str) {
        let _ = self.output.info(message);
    }

    /// Print verbose message
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        let _ = self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.path.clone(), args.config.clone(), VerbosityLevel::from(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = Args::try_parse_from(["tag_release", "check", "--ref", "v1.0.0", "--quiet", "--path", "/tmp"])
            .unwrap();
        assert!(args.quiet);
        assert_eq!(args.path, PathBuf::from("/tmp"));
        assert!(matches!(args.command, Command::Check { git_ref: Some(ref r) } if r == "v1.0.0"));
        assert_eq!(VerbosityLevel::from(&args), VerbosityLevel::Quiet);
    }

    #[test]
    fn test_bump_argument_parsing() {
        let args = Args::try_parse_from(["tag_release", "bump", "minor"]).unwrap();
        assert!(matches!(args.command, Command::Bump { bump: VersionBump::Minor, .. }));

        let args = Args::try_parse_from(["tag_release", "bump", "2.0.0"]).unwrap();
        assert_eq!(args.command.name(), "bump");

        assert!(Args::try_parse_from(["tag_release", "bump", "sideways"]).is_err());
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        assert!(Args::try_parse_from(["tag_release", "build", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_ref() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        let args = Args::try_parse_from(["tag_release", "check", "--ref", " ", "--path", path]).unwrap();
        assert!(args.validate().is_err());

        let args = Args::try_parse_from(["tag_release", "check", "--path", path]).unwrap();
        assert!(args.validate().is_ok());
    }
}
