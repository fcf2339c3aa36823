//! GitHub integration for release operations

mod client;
mod repo;

pub use client::{DEFAULT_API_BASE, GITHUB_API_URL_ENV, GitHubClient};
pub use repo::{GITHUB_REPOSITORY_ENV, GitHubRepo, parse_github_url};

use crate::error::{PublishError, Result};
use crate::git::{DEFAULT_REMOTE, GitOperations};

/// Determine the repository to publish to.
///
/// Order: explicit value (flag or `release.toml`), `GITHUB_REPOSITORY`,
/// then the URL of the `origin` remote.
pub async fn detect_repository<G: GitOperations>(
    explicit: Option<&str>,
    git: Option<&G>,
) -> Result<GitHubRepo> {
    if let Some(repo) = explicit {
        return Ok(repo.parse::<GitHubRepo>()?);
    }

    if let Ok(repo) = std::env::var(GITHUB_REPOSITORY_ENV)
        && !repo.trim().is_empty()
    {
        return Ok(repo.parse::<GitHubRepo>()?);
    }

    match git {
        Some(git) => {
            let url = git.remote_url(DEFAULT_REMOTE).await?;
            parse_github_url(&url)
        }
        None => Err(PublishError::UnknownRepository {
            reason: "pass --repo, set GITHUB_REPOSITORY or add an origin remote".to_string(),
        }
        .into()),
    }
}
