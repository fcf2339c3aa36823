//! The release host seam.

use crate::build::Artifact;
use crate::error::Result;
use std::future::Future;

/// A release listing as the host reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRelease {
    /// Host-side id
    pub id: u64,
    /// Tag the release belongs to
    pub tag: String,
    /// Web page of the release
    pub html_url: String,
    /// Whether the release is still hidden
    pub draft: bool,
    /// Whether the release is marked as a pre-release
    pub prerelease: bool,
}

/// An uploaded release asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAsset {
    /// Host-side id
    pub id: u64,
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Public download URL
    pub download_url: String,
}

/// Parameters for a new release
#[derive(Debug, Clone)]
pub struct NewRelease {
    /// Tag name
    pub tag: String,
    /// Commit to tag when the tag does not exist yet
    pub target_commitish: Option<String>,
    /// Display name
    pub name: String,
    /// Release notes
    pub body: String,
    /// Create hidden
    pub draft: bool,
    /// Mark as pre-release
    pub prerelease: bool,
}

/// Operations a release host has to provide
pub trait ReleaseHost {
    /// Release for `tag`, including drafts
    fn find_release(&self, tag: &str) -> impl Future<Output = Result<Option<RemoteRelease>>>;

    /// Create a release
    fn create_release(&self, release: &NewRelease) -> impl Future<Output = Result<RemoteRelease>>;

    /// Assets already attached to a release
    fn list_assets(&self, release_id: u64) -> impl Future<Output = Result<Vec<RemoteAsset>>>;

    /// Remove an asset
    fn delete_asset(&self, asset_id: u64) -> impl Future<Output = Result<()>>;

    /// Attach an artifact to a release
    fn upload_asset(
        &self,
        release: &RemoteRelease,
        artifact: &Artifact,
    ) -> impl Future<Output = Result<RemoteAsset>>;

    /// Make a draft release public
    fn publish_release(&self, release_id: u64) -> impl Future<Output = Result<RemoteRelease>>;
}
