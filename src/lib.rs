//! # tag_release
//!
//! Tag-driven release automation for single-package repositories.
//!
//! Two CI workflows drive a release. A push to the release branch creates the
//! `v<version>` tag for the version declared in the manifest; pushing that tag
//! verifies it against the manifest, builds the package and uploads every
//! artifact to the GitHub release for the tag, exactly once.
//!
//! ## Usage
//!
//! ```bash
//! tag_release run                   # dispatch on $GITHUB_REF inside a workflow
//! tag_release check --ref v0.3.1    # fails unless the manifest declares 0.3.1
//! tag_release publish --overwrite   # re-upload the assets of the current version
//! tag_release bump patch            # 0.3.1 -> 0.3.2 in pyproject.toml / Cargo.toml
//! tag_release init                  # write .github/workflows/*.yml
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod manifest;
pub mod process;
pub mod publish;
pub mod retry;
pub mod trigger;
pub mod version;

// Re-export main types for public API
pub use build::{Artifact, BuildPlan};
pub use cli::Args;
pub use config::ReleaseConfig;
pub use error::{CliError, ReleaseError, Result};
pub use git::{GitOperations, GitRepository};
pub use github::GitHubClient;
pub use manifest::ProjectManifest;
pub use publish::{Publisher, ReleaseHost};
pub use trigger::Trigger;
pub use version::{VersionBump, verify_tag_version};
