//! Git operations trait and types for the tagging workflow.
//!
//! The trait keeps tagging logic independent from how git is driven; the
//! production implementation is [`GitRepository`](super::GitRepository).

use crate::error::Result;
use std::future::Future;

/// Git operations needed to create and publish a release tag
pub trait GitOperations {
    /// Full SHA of HEAD
    fn head_commit(&self) -> impl Future<Output = Result<String>>;

    /// Commit a tag points at, or `None` when the tag does not exist
    fn tag_target(&self, tag_name: &str) -> impl Future<Output = Result<Option<String>>>;

    /// Create an annotated tag at HEAD
    fn create_tag(&self, tag_name: &str, message: &str) -> impl Future<Output = Result<TagInfo>>;

    /// Push a single tag to a remote
    fn push_tag(&self, remote: &str, tag_name: &str) -> impl Future<Output = Result<()>>;

    /// Whether `remote` already has `tag_name`
    fn remote_has_tag(&self, remote: &str, tag_name: &str) -> impl Future<Output = Result<bool>>;

    /// Check if working directory is clean
    fn is_working_directory_clean(&self) -> impl Future<Output = Result<bool>>;

    /// URL of a remote
    fn remote_url(&self, remote: &str) -> impl Future<Output = Result<String>>;
}

/// Information about a Git tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    /// Tag name
    pub name: String,
    /// Target commit hash
    pub target_commit: String,
    /// Whether this call created the tag
    pub created: bool,
    /// Whether the tag was pushed during this call
    pub pushed: bool,
}
