//! GitHub Releases over the REST API.

use super::repo::GitHubRepo;
use crate::build::Artifact;
use crate::error::{PublishError, Result};
use crate::publish::{NewRelease, ReleaseHost, RemoteAsset, RemoteRelease};
use bytes::Bytes;
use reqwest::header::LINK;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

/// Public API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Public upload endpoint
const DEFAULT_UPLOADS_BASE: &str = "https://uploads.github.com";

/// Environment variable overriding the API base (GitHub Enterprise)
pub const GITHUB_API_URL_ENV: &str = "GITHUB_API_URL";

const USER_AGENT: &str = concat!("tag_release/", env!("CARGO_PKG_VERSION"));

/// Largest page the list endpoints serve
const PAGE_SIZE: &str = "100";

/// Status, body and `rel="next"` link of one response
#[derive(Debug)]
struct Reply {
    status: StatusCode,
    body: String,
    next: Option<String>,
}

/// GitHub REST client scoped to one repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    repo: GitHubRepo,
    token: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    id: u64,
    tag_name: String,
    html_url: String,
    draft: bool,
    prerelease: bool,
}

impl From<ReleaseResponse> for RemoteRelease {
    fn from(r: ReleaseResponse) -> Self {
        Self {
            id: r.id,
            tag: r.tag_name,
            html_url: r.html_url,
            draft: r.draft,
            prerelease: r.prerelease,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    id: u64,
    name: String,
    size: u64,
    browser_download_url: String,
}

impl From<AssetResponse> for RemoteAsset {
    fn from(a: AssetResponse) -> Self {
        Self {
            id: a.id,
            name: a.name,
            size: a.size,
            download_url: a.browser_download_url,
        }
    }
}

impl GitHubClient {
    /// Create a client with an explicit token and API base
    pub fn new(repo: GitHubRepo, token: String, api_base: Option<String>) -> Self {
        let api_base = api_base
            .map(|b| b.trim_end_matches('/').to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            client: Client::new(),
            repo,
            token,
            api_base,
        }
    }

    /// Create a client from `GH_TOKEN`/`GITHUB_TOKEN` and `GITHUB_API_URL`
    pub fn from_env(repo: GitHubRepo) -> Result<Self> {
        let token = ["GH_TOKEN", "GITHUB_TOKEN"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|t| !t.trim().is_empty()))
            .ok_or(PublishError::MissingToken)?;

        Ok(Self::new(repo, token, std::env::var(GITHUB_API_URL_ENV).ok()))
    }

    /// Repository this client talks to
    pub fn repo(&self) -> &GitHubRepo {
        &self.repo
    }

    /// `<base>/repos/<owner>/<repo>/<segments...>`, each segment escaped
    fn endpoint(&self, base: &str, segments: &[&str]) -> Result<Url> {
        let invalid = |reason: String| PublishError::Api {
            operation: "build request URL".to_string(),
            status: 0,
            body: format!("invalid API URL '{}': {}", base, reason),
        };

        let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("not a base URL".to_string()))?
            .pop_if_empty()
            .extend(["repos", self.repo.owner.as_str(), self.repo.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn repo_endpoint(&self, segments: &[&str]) -> Result<Url> {
        self.endpoint(&self.api_base, segments)
    }

    /// Upload host: uploads.github.com for github.com, `<host>/api/uploads`
    /// for Enterprise servers.
    fn uploads_base(&self) -> String {
        if self.api_base == DEFAULT_API_BASE {
            DEFAULT_UPLOADS_BASE.to_string()
        } else {
            self.api_base
                .strip_suffix("/api/v3")
                .map(|host| format!("{}/api/uploads", host))
                .unwrap_or_else(|| self.api_base.clone())
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .bearer_auth(&self.token)
    }

    /// Send a request and read the whole reply
    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Reply> {
        let response = request.send().await.map_err(|e| PublishError::Network {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_link);
        let body = response.text().await.map_err(|e| PublishError::Network {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;

        log::debug!("github: {} -> {}", operation, status);
        Ok(Reply { status, body, next })
    }

    fn check(operation: &str, status: StatusCode, body: String) -> Result<String> {
        if status.is_success() {
            return Ok(body);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(PublishError::AuthenticationFailed {
                status: status.as_u16(),
            }
            .into());
        }
        Err(PublishError::Api {
            operation: operation.to_string(),
            status: status.as_u16(),
            body,
        }
        .into())
    }

    fn parse<T: DeserializeOwned>(operation: &str, body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|e| {
            PublishError::Api {
                operation: operation.to_string(),
                status: 200,
                body: format!("invalid JSON: {}", e),
            }
            .into()
        })
    }

    /// Every item of a paginated list, following `Link: rel="next"`
    async fn get_all<T: DeserializeOwned>(&self, operation: &str, mut url: Url) -> Result<Vec<T>> {
        url.query_pairs_mut().append_pair("per_page", PAGE_SIZE);

        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let reply = self.send(operation, self.request(Method::GET, url)).await?;
            let body = Self::check(operation, reply.status, reply.body)?;
            let page: Vec<T> = Self::parse(operation, &body)?;
            items.extend(page);

            next = match reply.next {
                Some(link) => Some(Url::parse(&link).map_err(|e| PublishError::Api {
                    operation: operation.to_string(),
                    status: reply.status.as_u16(),
                    body: format!("invalid next page link '{}': {}", link, e),
                })?),
                None => None,
            };
        }
        Ok(items)
    }

    /// Drafts are not reachable through `releases/tags/{tag}`; scan the list.
    async fn find_draft(&self, tag: &str) -> Result<Option<RemoteRelease>> {
        let url = self.repo_endpoint(&["releases"])?;
        let releases: Vec<ReleaseResponse> = self.get_all("list releases", url).await?;
        Ok(releases
            .into_iter()
            .find(|r| r.draft && r.tag_name == tag)
            .map(RemoteRelease::from))
    }
}

/// Target of the `rel="next"` entry of a `Link` header
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim().strip_prefix('<')?.strip_suffix('>')?;
        parts
            .any(|param| matches!(param.trim(), "rel=\"next\"" | "rel=next"))
            .then(|| target.to_string())
    })
}

impl ReleaseHost for GitHubClient {
    async fn find_release(&self, tag: &str) -> Result<Option<RemoteRelease>> {
        let operation = "get release by tag";
        let url = self.repo_endpoint(&["releases", "tags", tag])?;
        let reply = self.send(operation, self.request(Method::GET, url)).await?;

        if reply.status == StatusCode::NOT_FOUND {
            return self.find_draft(tag).await;
        }

        let body = Self::check(operation, reply.status, reply.body)?;
        let release: ReleaseResponse = Self::parse(operation, &body)?;
        Ok(Some(release.into()))
    }

    async fn create_release(&self, release: &NewRelease) -> Result<RemoteRelease> {
        let operation = "create release";
        let mut payload = json!({
            "tag_name": release.tag,
            "name": release.name,
            "body": release.body,
            "draft": release.draft,
            "prerelease": release.prerelease,
        });
        if let Some(target) = &release.target_commitish {
            payload["target_commitish"] = json!(target);
        }

        let url = self.repo_endpoint(&["releases"])?;
        let reply = self
            .send(operation, self.request(Method::POST, url).json(&payload))
            .await?;
        let body = Self::check(operation, reply.status, reply.body)?;
        let created: ReleaseResponse = Self::parse(operation, &body)?;
        Ok(created.into())
    }

    async fn list_assets(&self, release_id: u64) -> Result<Vec<RemoteAsset>> {
        let url = self.repo_endpoint(&["releases", &release_id.to_string(), "assets"])?;
        let assets: Vec<AssetResponse> = self.get_all("list assets", url).await?;
        Ok(assets.into_iter().map(RemoteAsset::from).collect())
    }

    async fn delete_asset(&self, asset_id: u64) -> Result<()> {
        let operation = "delete asset";
        let url = self.repo_endpoint(&["releases", "assets", &asset_id.to_string()])?;
        let reply = self.send(operation, self.request(Method::DELETE, url)).await?;
        Self::check(operation, reply.status, reply.body).map(|_| ())
    }

    async fn upload_asset(&self, release: &RemoteRelease, artifact: &Artifact) -> Result<RemoteAsset> {
        let operation = "upload asset";
        let mut url = self.endpoint(
            &self.uploads_base(),
            &["releases", &release.id.to_string(), "assets"],
        )?;
        url.query_pairs_mut().append_pair("name", &artifact.name);

        let content = Bytes::from(tokio::fs::read(&artifact.path).await?);
        let request = self
            .request(Method::POST, url)
            .header("Content-Type", artifact.content_type())
            .body(content);

        let reply = self.send(operation, request).await?;
        let body = Self::check(operation, reply.status, reply.body)?;
        let asset: AssetResponse = Self::parse(operation, &body)?;
        Ok(asset.into())
    }

    async fn publish_release(&self, release_id: u64) -> Result<RemoteRelease> {
        let operation = "publish release";
        let url = self.repo_endpoint(&["releases", &release_id.to_string()])?;
        let reply = self
            .send(
                operation,
                self.request(Method::PATCH, url).json(&json!({ "draft": false })),
            )
            .await?;
        let body = Self::check(operation, reply.status, reply.body)?;
        let release: ReleaseResponse = Self::parse(operation, &body)?;
        Ok(release.into())
    }
}
