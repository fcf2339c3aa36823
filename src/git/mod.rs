//! Git integration for the tagging workflow.
//!
//! A push to the release branch ends with the version tag existing at HEAD
//! on the remote. Re-running on the same commit is a no-op.

mod git_adapter;
mod operations;

pub use git_adapter::GitRepository;
pub use operations::{GitOperations, TagInfo};

use crate::error::{GitError, Result};

/// Default remote for tag pushes
pub const DEFAULT_REMOTE: &str = "origin";

/// Options for [`ensure_release_tag`]
#[derive(Debug, Clone)]
pub struct TagOptions {
    /// Remote to push to
    pub remote: String,
    /// Push the tag after creating it
    pub push: bool,
    /// Refuse to tag a dirty working tree
    pub require_clean: bool,
}

impl Default for TagOptions {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.to_string(),
            push: true,
            require_clean: true,
        }
    }
}

/// Make sure `tag_name` exists at HEAD, creating and pushing it when missing.
///
/// A tag already at HEAD is not recreated, but is still pushed when the
/// remote lacks it. A tag at any other commit is an error.
pub async fn ensure_release_tag<G: GitOperations>(
    git: &G,
    tag_name: &str,
    version: &str,
    options: &TagOptions,
) -> Result<TagInfo> {
    let head = git.head_commit().await?;

    if let Some(existing) = git.tag_target(tag_name).await? {
        if existing == head {
            log::info!("Tag {} already at HEAD ({})", tag_name, short(&head));
            let mut info = TagInfo {
                name: tag_name.to_string(),
                target_commit: existing,
                created: false,
                pushed: false,
            };
            if options.push && !git.remote_has_tag(&options.remote, tag_name).await? {
                git.push_tag(&options.remote, tag_name).await?;
                info.pushed = true;
                log::info!("Pushed existing tag {} to {}", tag_name, options.remote);
            }
            return Ok(info);
        }
        return Err(GitError::TagExists {
            tag: tag_name.to_string(),
            existing: short(&existing).to_string(),
            head: short(&head).to_string(),
        }
        .into());
    }

    if options.require_clean && !git.is_working_directory_clean().await? {
        return Err(GitError::DirtyWorkingDirectory.into());
    }

    let message = format!("Release {}", version);
    let mut info = git.create_tag(tag_name, &message).await?;
    log::info!("Created tag {} at {}", tag_name, short(&info.target_commit));

    if options.push {
        git.push_tag(&options.remote, tag_name).await?;
        info.pushed = true;
        log::info!("Pushed tag {} to {}", tag_name, options.remote);
    }

    Ok(info)
}

/// Abbreviated commit hash for messages
pub fn short(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeGit {
        head: String,
        clean: bool,
        tags: RefCell<HashMap<String, String>>,
        pushed: RefCell<Vec<String>>,
    }

    impl FakeGit {
        fn new(head: &str) -> Self {
            Self {
                head: head.to_string(),
                clean: true,
                tags: RefCell::new(HashMap::new()),
                pushed: RefCell::new(Vec::new()),
            }
        }
    }

    impl GitOperations for FakeGit {
        async fn head_commit(&self) -> Result<String> {
            Ok(self.head.clone())
        }

        async fn tag_target(&self, tag_name: &str) -> Result<Option<String>> {
            Ok(self.tags.borrow().get(tag_name).cloned())
        }

        async fn create_tag(&self, tag_name: &str, _message: &str) -> Result<TagInfo> {
            self.tags
                .borrow_mut()
                .insert(tag_name.to_string(), self.head.clone());
            Ok(TagInfo {
                name: tag_name.to_string(),
                target_commit: self.head.clone(),
                created: true,
                pushed: false,
            })
        }

        async fn push_tag(&self, _remote: &str, tag_name: &str) -> Result<()> {
            self.pushed.borrow_mut().push(tag_name.to_string());
            Ok(())
        }

        async fn remote_has_tag(&self, _remote: &str, tag_name: &str) -> Result<bool> {
            Ok(self.pushed.borrow().iter().any(|t| t == tag_name))
        }

        async fn is_working_directory_clean(&self) -> Result<bool> {
            Ok(self.clean)
        }

        async fn remote_url(&self, _remote: &str) -> Result<String> {
            Ok("git@github.com:owner/repo.git".to_string())
        }
    }

    #[tokio::test]
    async fn test_creates_and_pushes_missing_tag() {
        let git = FakeGit::new("a1b2c3d4e5f6");
        let info = ensure_release_tag(&git, "v1.0.0", "1.0.0", &TagOptions::default())
            .await
            .unwrap();

        assert!(info.created);
        assert!(info.pushed);
        assert_eq!(git.pushed.borrow().as_slice(), ["v1.0.0".to_string()]);
    }

    #[tokio::test]
    async fn test_tag_at_head_and_on_remote_is_noop() {
        let git = FakeGit::new("a1b2c3d4e5f6");
        git.tags
            .borrow_mut()
            .insert("v1.0.0".to_string(), "a1b2c3d4e5f6".to_string());
        git.pushed.borrow_mut().push("v1.0.0".to_string());

        let info = ensure_release_tag(&git, "v1.0.0", "1.0.0", &TagOptions::default())
            .await
            .unwrap();

        assert!(!info.created);
        assert!(!info.pushed);
        assert_eq!(git.pushed.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_local_only_tag_is_pushed_on_rerun() {
        let git = FakeGit::new("a1b2c3d4e5f6");
        let local_only = TagOptions {
            push: false,
            ..TagOptions::default()
        };
        ensure_release_tag(&git, "v1.0.0", "1.0.0", &local_only).await.unwrap();
        assert!(git.pushed.borrow().is_empty());

        let info = ensure_release_tag(&git, "v1.0.0", "1.0.0", &TagOptions::default())
            .await
            .unwrap();
        assert!(!info.created);
        assert!(info.pushed);
        assert_eq!(git.pushed.borrow().as_slice(), ["v1.0.0".to_string()]);

        let again = ensure_release_tag(&git, "v1.0.0", "1.0.0", &TagOptions::default())
            .await
            .unwrap();
        assert!(!again.pushed);
        assert_eq!(git.pushed.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_tag_elsewhere_is_rejected() {
        let git = FakeGit::new("a1b2c3d4e5f6");
        git.tags
            .borrow_mut()
            .insert("v1.0.0".to_string(), "ffffffffffff".to_string());

        let err = ensure_release_tag(&git, "v1.0.0", "1.0.0", &TagOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Git(GitError::TagExists { .. })));
    }

    #[tokio::test]
    async fn test_dirty_tree_is_rejected() {
        let mut git = FakeGit::new("a1b2c3d4e5f6");
        git.clean = false;

        let err = ensure_release_tag(&git, "v1.0.0", "1.0.0", &TagOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Git(GitError::DirtyWorkingDirectory)));
        assert!(git.tags.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_no_push() {
        let git = FakeGit::new("a1b2c3d4e5f6");
        let options = TagOptions {
            push: false,
            ..TagOptions::default()
        };
        let info = ensure_release_tag(&git, "v1.0.0", "1.0.0", &options).await.unwrap();
        assert!(info.created);
        assert!(!info.pushed);
        assert!(git.pushed.borrow().is_empty());
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short("0123456789abcdef"), "0123456");
        assert_eq!(short("abc"), "abc");
    }
}
