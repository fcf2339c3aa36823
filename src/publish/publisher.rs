//! Release publishing: one release per tag, one upload per artifact.

use super::host::{NewRelease, ReleaseHost, RemoteAsset, RemoteRelease};
use crate::build::Artifact;
use crate::config::RetryConfig;
use crate::error::{CliError, PublishError, ReleaseError, Result};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::version::is_prerelease;
use std::cell::Cell;
use std::collections::{HashMap, HashSet};

/// Options for [`Publisher::publish`]
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Replace assets that already exist on the release
    pub overwrite: bool,
    /// Leave a newly created release as a draft
    pub draft: bool,
    /// Commit for the tag if the host has to create it
    pub target_commitish: Option<String>,
    /// Release notes; a one-line default is used when unset
    pub notes: Option<String>,
}

/// What a publish run did
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Release tag
    pub tag: String,
    /// Host-side release id
    pub release_id: u64,
    /// Release page
    pub html_url: String,
    /// Whether this run created the release
    pub created_release: bool,
    /// Whether the release is still a draft
    pub draft: bool,
    /// Uploaded assets, in upload order
    pub uploaded: Vec<RemoteAsset>,
    /// Names of assets that replaced an existing upload
    pub replaced: Vec<String>,
}

/// Publishes build artifacts to a [`ReleaseHost`]
pub struct Publisher<'a, H: ReleaseHost> {
    host: &'a H,
    api_policy: RetryPolicy,
    upload_policy: RetryPolicy,
}

impl<'a, H: ReleaseHost> Publisher<'a, H> {
    /// Create a publisher with retry limits from `retry`
    pub fn new(host: &'a H, retry: &RetryConfig) -> Self {
        Self {
            host,
            api_policy: RetryPolicy::github_api(retry),
            upload_policy: RetryPolicy::uploads(retry),
        }
    }

    /// Replace the retry policies
    pub fn with_policies(mut self, api_policy: RetryPolicy, upload_policy: RetryPolicy) -> Self {
        self.api_policy = api_policy;
        self.upload_policy = upload_policy;
        self
    }

    /// Publish `artifacts` on the release for `tag`.
    ///
    /// Every artifact is uploaded exactly once. Name clashes with assets
    /// already on the release are detected before anything is uploaded and
    /// fail the run unless `options.overwrite` is set.
    pub async fn publish(
        &self,
        tag: &str,
        version: &str,
        artifacts: &[Artifact],
        options: &PublishOptions,
    ) -> Result<PublishReport> {
        ensure_unique_names(artifacts)?;

        let existing = retry_with_backoff(
            || self.host.find_release(tag),
            &self.api_policy,
            "Find release",
        )
        .await?;

        let (release, created_release) = match existing {
            Some(release) => {
                log::info!("Reusing release {} ({})", release.tag, release.html_url);
                (release, false)
            }
            None => {
                let new_release = NewRelease {
                    tag: tag.to_string(),
                    target_commitish: options.target_commitish.clone(),
                    name: tag.to_string(),
                    body: options
                        .notes
                        .clone()
                        .unwrap_or_else(|| default_notes(version)),
                    // Stays hidden until every artifact is attached
                    draft: true,
                    prerelease: is_prerelease(version),
                };
                let release = retry_with_backoff(
                    || self.host.create_release(&new_release),
                    &self.api_policy,
                    "Create release",
                )
                .await?;
                log::info!("Created draft release {}", release.html_url);
                (release, true)
            }
        };

        let current_assets = retry_with_backoff(
            || self.host.list_assets(release.id),
            &self.api_policy,
            "List release assets",
        )
        .await?;
        let current: HashMap<&str, &RemoteAsset> = current_assets
            .iter()
            .map(|asset| (asset.name.as_str(), asset))
            .collect();

        if !options.overwrite
            && let Some(clash) = artifacts.iter().find(|a| current.contains_key(a.name.as_str()))
        {
            return Err(PublishError::AssetExists {
                tag: tag.to_string(),
                asset: clash.name.clone(),
            }
            .into());
        }

        let mut uploaded = Vec::with_capacity(artifacts.len());
        let mut replaced = Vec::new();

        for artifact in artifacts {
            if let Some(old) = current.get(artifact.name.as_str()) {
                retry_with_backoff(
                    || self.host.delete_asset(old.id),
                    &self.api_policy,
                    "Delete existing asset",
                )
                .await?;
                log::info!("Removed existing asset {}", old.name);
                replaced.push(artifact.name.clone());
            }

            let asset = self.upload_artifact(&release, artifact).await?;
            log::info!("Uploaded {} ({} bytes)", asset.name, asset.size);
            uploaded.push(asset);
        }

        let release = if release.draft && !options.draft {
            retry_with_backoff(
                || self.host.publish_release(release.id),
                &self.api_policy,
                "Publish release",
            )
            .await?
        } else {
            release
        };

        Ok(PublishReport {
            tag: tag.to_string(),
            release_id: release.id,
            html_url: release.html_url,
            created_release,
            draft: release.draft,
            uploaded,
            replaced,
        })
    }
}

impl<H: ReleaseHost> Publisher<'_, H> {
    /// Upload one artifact, retrying transient failures.
    ///
    /// A failed attempt may still have stored the asset. Before a retry, and
    /// when the host reports the name as taken, the release's assets are
    /// listed again: a same-size asset is the upload, anything else under
    /// that name is removed first.
    async fn upload_artifact(&self, release: &RemoteRelease, artifact: &Artifact) -> Result<RemoteAsset> {
        let attempts = &Cell::new(0u32);
        retry_with_backoff(
            || async move {
                let attempt = attempts.get();
                attempts.set(attempt + 1);

                if attempt > 0
                    && let Some(asset) = self.stored_copy(release, artifact).await?
                {
                    return Ok(asset);
                }

                match self.host.upload_asset(release, artifact).await {
                    Err(e) if is_already_exists(&e) => match self.stored_copy(release, artifact).await? {
                        Some(asset) => Ok(asset),
                        None => self.host.upload_asset(release, artifact).await,
                    },
                    other => other,
                }
            },
            &self.upload_policy,
            &format!("Upload {}", artifact.name),
        )
        .await
    }

    /// The asset a previous attempt stored for `artifact`, if complete.
    ///
    /// A same-name asset with a different size is deleted.
    async fn stored_copy(&self, release: &RemoteRelease, artifact: &Artifact) -> Result<Option<RemoteAsset>> {
        let assets = self.host.list_assets(release.id).await?;
        let Some(asset) = assets.into_iter().find(|a| a.name == artifact.name) else {
            return Ok(None);
        };

        if asset.size == artifact.size {
            log::info!("{} was stored by an earlier attempt", artifact.name);
            return Ok(Some(asset));
        }

        log::warn!(
            "Removing partial upload of {} ({} of {} bytes)",
            artifact.name,
            asset.size,
            artifact.size
        );
        self.host.delete_asset(asset.id).await?;
        Ok(None)
    }
}

/// GitHub answers a duplicate asset name with 422 `already_exists`
fn is_already_exists(error: &ReleaseError) -> bool {
    matches!(
        error,
        ReleaseError::Publish(PublishError::Api { status: 422, body, .. }) if body.contains("already_exists")
    )
}

fn default_notes(version: &str) -> String {
    format!(
        "Release {} ({})",
        version,
        chrono::Utc::now().format("%Y-%m-%d")
    )
}

fn ensure_unique_names(artifacts: &[Artifact]) -> Result<()> {
    let mut seen = HashSet::new();
    for artifact in artifacts {
        if !seen.insert(artifact.name.as_str()) {
            return Err(CliError::InvalidArguments {
                reason: format!("Artifact '{}' listed more than once", artifact.name),
            }
            .into());
        }
    }
    Ok(())
}
