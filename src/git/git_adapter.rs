//! [`GitOperations`] backed by `kodegen_tools_git` and `gix`.

use crate::error::{GitError, Result};
use crate::git::{GitOperations, TagInfo};
use kodegen_tools_git::{self as git, PushOpts, RepoHandle, TagOpts};
use std::path::Path;

/// Git operations on an opened repository
#[derive(Debug)]
pub struct GitRepository {
    repo: RepoHandle,
}

fn failed(operation: &str, reason: impl std::fmt::Display) -> GitError {
    GitError::OperationFailed {
        operation: operation.to_string(),
        reason: reason.to_string(),
    }
}

impl GitRepository {
    /// Open the repository whose working tree is `path`
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let not_repository = || GitError::NotRepository {
            path: path.to_path_buf(),
        };

        let repo = git::open_repo(path)
            .await
            .map_err(|_| not_repository())?
            .map_err(|_| not_repository())?;

        // Bare repositories have nothing to build from
        if repo.raw().workdir().is_none() {
            return Err(not_repository().into());
        }

        Ok(Self { repo })
    }
}

impl GitOperations for GitRepository {
    async fn head_commit(&self) -> Result<String> {
        let repo = self.repo.clone();
        tokio::task::spawn_blocking(move || {
            let head = repo.raw().head().map_err(|e| failed("read HEAD", e))?;
            let id = head.into_peeled_id().map_err(|e| failed("peel HEAD", e))?;
            Ok(id.to_string())
        })
        .await
        .map_err(|e| failed("read HEAD", format!("task join error: {}", e)))?
    }

    async fn tag_target(&self, tag_name: &str) -> Result<Option<String>> {
        let repo = self.repo.clone();
        let reference = format!("refs/tags/{}", tag_name);
        tokio::task::spawn_blocking(move || {
            let raw = repo.raw();
            let exists = raw
                .try_find_reference(reference.as_str())
                .map_err(|e| failed("look up tag", e))?
                .is_some();
            if !exists {
                return Ok(None);
            }

            // ^{commit} peels annotated tags to the commit they mark
            let id = raw
                .rev_parse_single(format!("{}^{{commit}}", reference).as_str())
                .map_err(|e| failed("peel tag", e))?;
            Ok(Some(id.to_string()))
        })
        .await
        .map_err(|e| failed("look up tag", format!("task join error: {}", e)))?
    }

    async fn create_tag(&self, tag_name: &str, message: &str) -> Result<TagInfo> {
        let created = git::create_tag(
            &self.repo,
            TagOpts {
                name: tag_name.to_string(),
                message: Some(message.to_string()),
                target: None,
                force: false,
            },
        )
        .await
        .map_err(|e| failed(&format!("tag {}", tag_name), e))?;

        Ok(TagInfo {
            name: created.name,
            target_commit: created.target_commit,
            created: true,
            pushed: false,
        })
    }

    async fn push_tag(&self, remote: &str, tag_name: &str) -> Result<()> {
        let refspec = format!("refs/tags/{0}:refs/tags/{0}", tag_name);
        let result = git::push(
            &self.repo,
            PushOpts {
                remote: remote.to_string(),
                refspecs: vec![refspec],
                force: false,
                tags: false,
                timeout_secs: None,
            },
        )
        .await
        .map_err(|e| GitError::PushFailed {
            reason: format!("{} to {}: {}", tag_name, remote, e),
        })?;

        for warning in &result.warnings {
            log::warn!("git push: {}", warning);
        }
        Ok(())
    }

    async fn remote_has_tag(&self, remote: &str, tag_name: &str) -> Result<bool> {
        Ok(git::check_remote_tag_exists(&self.repo, remote, tag_name)
            .await
            .map_err(|e| failed("check remote tag", e))?)
    }

    async fn is_working_directory_clean(&self) -> Result<bool> {
        Ok(git::is_clean(&self.repo)
            .await
            .map_err(|e| failed("status", e))?)
    }

    async fn remote_url(&self, remote: &str) -> Result<String> {
        let remotes = git::list_remotes(&self.repo)
            .await
            .map_err(|e| failed("list remotes", e))?;

        remotes
            .into_iter()
            .find(|r| r.name == remote)
            .map(|r| r.fetch_url)
            .ok_or_else(|| failed("list remotes", format!("no remote named '{}'", remote)).into())
    }
}
