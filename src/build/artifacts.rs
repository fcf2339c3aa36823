//! Artifact discovery and checksums.

use crate::error::{BuildError, Result};
use crate::manifest::ProjectManifest;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// PEP 440 public and local version, with the spellings the packaging
/// tools accept and rewrite.
static PEP440: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?P<pre_n>[0-9]+)?)?
        (?:-(?P<post_n1>[0-9]+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?)?
        (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>[0-9]+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?$",
    )
    .expect("PEP 440 pattern is valid")
});

/// One distributable file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Absolute path on disk
    pub path: PathBuf,
    /// File name, used as the release asset name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Hex SHA-256 of the content
    pub sha256: String,
}

impl Artifact {
    /// Read size and checksum of `path`.
    ///
    /// Hashing runs on the blocking pool.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BuildError::CommandFailed {
                command: "collect_artifacts".to_string(),
                reason: format!("Invalid artifact filename: {:?}", path),
            })?
            .to_string();

        let data = tokio::fs::read(path).await?;
        let size = data.len() as u64;
        let sha256 = tokio::task::spawn_blocking(move || hex::encode(Sha256::digest(&data)))
            .await
            .map_err(|e| anyhow::anyhow!("Hash task failed: {}", e))?;

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size,
            sha256,
        })
    }

    /// MIME type for the upload
    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.name)
    }
}

/// Detect MIME type for release assets
pub fn content_type_for(file_name: &str) -> &'static str {
    if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") {
        "application/gzip"
    } else if file_name.ends_with(".whl") || file_name.ends_with(".zip") {
        "application/zip"
    } else if file_name.ends_with(".crate") {
        "application/x-tar"
    } else {
        "application/octet-stream"
    }
}

/// Canonical PEP 440 spelling of `version`, as build backends write it into
/// file names (`1.0.0-rc.1` becomes `1.0.0rc1`, `2.0-beta` becomes `2.0b0`).
///
/// Returns `None` when the version is not PEP 440 at all.
pub fn normalize_pep440(version: &str) -> Option<String> {
    let caps = PEP440.captures(version.trim())?;
    let number = |name: &str| -> u64 {
        caps.name(name)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let mut normalized = String::new();
    if number("epoch") != 0 {
        normalized.push_str(&format!("{}!", number("epoch")));
    }
    let release: Vec<String> = caps["release"]
        .split('.')
        .map(|part| part.parse::<u64>().map(|n| n.to_string()).unwrap_or_else(|_| part.to_string()))
        .collect();
    normalized.push_str(&release.join("."));

    if let Some(label) = caps.name("pre_l") {
        let label = match label.as_str().to_ascii_lowercase().as_str() {
            "alpha" | "a" => "a",
            "beta" | "b" => "b",
            _ => "rc",
        };
        normalized.push_str(&format!("{}{}", label, number("pre_n")));
    }
    if caps.name("post_n1").is_some() {
        normalized.push_str(&format!(".post{}", number("post_n1")));
    } else if caps.name("post_l").is_some() {
        normalized.push_str(&format!(".post{}", number("post_n2")));
    }
    if caps.name("dev_l").is_some() {
        normalized.push_str(&format!(".dev{}", number("dev_n")));
    }
    if let Some(local) = caps.name("local") {
        normalized.push('+');
        normalized.push_str(&local.as_str().to_ascii_lowercase().replace(['-', '_'], "."));
    }
    Some(normalized)
}

/// Whether `file_name` is built for `version`.
///
/// The version has to appear as a whole segment: preceded by `-` or `_` and
/// followed by `-`, `.` or the end of the name. Besides the literal version,
/// the wheel spelling (`-` replaced by `_`) and the PEP 440 canonical form
/// are accepted.
pub fn names_version(file_name: &str, version: &str) -> bool {
    let version = version.trim();
    if version.is_empty() {
        return false;
    }

    let mut candidates = vec![version.to_string(), version.replace('-', "_")];
    if let Some(normalized) = normalize_pep440(version) {
        candidates.push(normalized.replace('-', "_"));
        candidates.push(normalized);
    }
    candidates.dedup();

    let lowered = file_name.to_ascii_lowercase();
    candidates.iter().any(|candidate| {
        let candidate = candidate.to_ascii_lowercase();
        let file_name = lowered.as_str();
        file_name.match_indices(candidate.as_str()).any(|(start, _)| {
            let before = file_name[..start].chars().last();
            let after = file_name[start + candidate.len()..].chars().next();
            matches!(before, Some('-') | Some('_'))
                && matches!(after, None | Some('-') | Some('.'))
        })
    })
}

/// Collect the artifacts for the manifest's version from `dist_dir`.
///
/// Hidden files, directories and files for other versions are skipped. The
/// result is unique by file name and sorted.
pub async fn collect_artifacts(dist_dir: &Path, manifest: &ProjectManifest) -> Result<Vec<Artifact>> {
    let no_artifacts = || BuildError::NoArtifacts {
        version: manifest.version.clone(),
        dist_dir: dist_dir.to_path_buf(),
    };

    if !dist_dir.is_dir() {
        return Err(no_artifacts().into());
    }

    let mut by_name: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut entries = tokio::fs::read_dir(dist_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') || !names_version(&name, &manifest.version) {
            log::debug!("Skipping {} (not an artifact for {})", name, manifest.version);
            continue;
        }
        by_name.entry(name).or_insert_with(|| entry.path());
    }

    if by_name.is_empty() {
        return Err(no_artifacts().into());
    }

    let mut artifacts = Vec::with_capacity(by_name.len());
    for path in by_name.values() {
        artifacts.push(Artifact::from_path(path).await?);
    }
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ManifestKind, VersionLocation};
    use tempfile::TempDir;

    fn manifest(version: &str) -> ProjectManifest {
        ProjectManifest {
            path: PathBuf::from("pyproject.toml"),
            kind: ManifestKind::Pyproject,
            name: "scraper_utils".to_string(),
            version: version.to_string(),
            location: VersionLocation::Poetry,
        }
    }

    #[test]
    fn test_names_version() {
        assert!(names_version("scraper_utils-0.3.1.tar.gz", "0.3.1"));
        assert!(names_version("scraper_utils-0.3.1-py3-none-any.whl", "0.3.1"));
        assert!(names_version("tool-1.0.0_rc.1-py3-none-any.whl", "1.0.0-rc.1"));
        assert!(names_version("tool-2.0.0.crate", "2.0.0"));
        assert!(!names_version("scraper_utils-0.3.10.tar.gz", "0.3.1"));
        assert!(!names_version("scraper_utils-10.3.1.tar.gz", "0.3.1"));
        assert!(!names_version("README.md", "0.3.1"));
    }

    #[test]
    fn test_normalize_pep440() {
        assert_eq!(normalize_pep440("1.0.0-rc.1").as_deref(), Some("1.0.0rc1"));
        assert_eq!(normalize_pep440("1.0.0-beta.1").as_deref(), Some("1.0.0b1"));
        assert_eq!(normalize_pep440("1.0RC1").as_deref(), Some("1.0rc1"));
        assert_eq!(normalize_pep440("2.0-alpha").as_deref(), Some("2.0a0"));
        assert_eq!(normalize_pep440("1.2.preview3").as_deref(), Some("1.2rc3"));
        assert_eq!(normalize_pep440("1.0-1").as_deref(), Some("1.0.post1"));
        assert_eq!(normalize_pep440("1.0.0.dev").as_deref(), Some("1.0.0.dev0"));
        assert_eq!(normalize_pep440("1.0.01").as_deref(), Some("1.0.1"));
        assert_eq!(normalize_pep440("1.0+Build-5").as_deref(), Some("1.0+build.5"));
        assert_eq!(normalize_pep440("1.0.0-alpha.beta"), None);
    }

    #[test]
    fn test_names_version_accepts_normalized_prereleases() {
        assert!(names_version("scraper_utils-1.0.0rc1.tar.gz", "1.0.0-rc.1"));
        assert!(names_version("scraper_utils-1.0.0b1-py3-none-any.whl", "1.0.0-beta.1"));
        assert!(names_version("scraper_utils-1.0rc1.tar.gz", "1.0RC1"));
        assert!(!names_version("scraper_utils-1.0.0rc2.tar.gz", "1.0.0-rc.1"));
        assert!(!names_version("scraper_utils-1.0.0rc1.tar.gz", "1.0.0"));
    }

    #[tokio::test]
    async fn test_collect_prerelease_artifacts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("scraper_utils-1.0.0rc1.tar.gz"), b"sdist").unwrap();
        std::fs::write(dir.path().join("scraper_utils-1.0.0rc1-py3-none-any.whl"), b"wheel").unwrap();

        let artifacts = collect_artifacts(dir.path(), &manifest("1.0.0-rc.1")).await.unwrap();
        assert_eq!(artifacts.len(), 2);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("a-1.0.tar.gz"), "application/gzip");
        assert_eq!(content_type_for("a-1.0-py3-none-any.whl"), "application/zip");
        assert_eq!(content_type_for("a-1.0.crate"), "application/x-tar");
        assert_eq!(content_type_for("a-1.0.bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_collect_filters_and_hashes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("scraper_utils-0.3.1.tar.gz"), b"sdist").unwrap();
        std::fs::write(dir.path().join("scraper_utils-0.3.1-py3-none-any.whl"), b"wheel").unwrap();
        std::fs::write(dir.path().join("scraper_utils-0.3.0.tar.gz"), b"old").unwrap();
        std::fs::write(dir.path().join(".gitignore"), b"*").unwrap();
        std::fs::create_dir(dir.path().join("scraper_utils-0.3.1")).unwrap();

        let artifacts = collect_artifacts(dir.path(), &manifest("0.3.1")).await.unwrap();
        let names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            ["scraper_utils-0.3.1-py3-none-any.whl", "scraper_utils-0.3.1.tar.gz"]
        );

        let sdist = &artifacts[1];
        assert_eq!(sdist.size, 5);
        assert_eq!(sdist.sha256, hex::encode(Sha256::digest(b"sdist")));
    }

    #[tokio::test]
    async fn test_empty_dist_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("scraper_utils-0.2.0.tar.gz"), b"old").unwrap();
        assert!(collect_artifacts(dir.path(), &manifest("0.3.1")).await.is_err());
        assert!(
            collect_artifacts(&dir.path().join("missing"), &manifest("0.3.1"))
                .await
                .is_err()
        );
    }
}
