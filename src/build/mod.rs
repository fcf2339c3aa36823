//! Build step: run the project's packaging command and collect the
//! distributable artifacts for the declared version.

mod artifacts;

pub use artifacts::{Artifact, collect_artifacts};

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::manifest::{ManifestKind, ProjectManifest};
use crate::process::{RunError, output_with_timeout};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Resolved build step
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Program followed by its arguments
    pub command: Vec<String>,
    /// Directory scanned for artifacts (absolute)
    pub dist_dir: PathBuf,
    /// Remove old files from `dist_dir` before building
    pub clean_dist: bool,
    /// Kill the build after this long
    pub timeout: Duration,
}

/// Artifacts produced by one build
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Version the artifacts were built for
    pub version: String,
    /// De-duplicated artifacts, sorted by file name
    pub artifacts: Vec<Artifact>,
}

impl BuildPlan {
    /// Derive the build step for `manifest`, honouring `[build]` overrides.
    ///
    /// Python projects build with Poetry when it is installed, otherwise with
    /// `python -m build`. Cargo packages use `cargo package`.
    pub fn resolve(manifest: &ProjectManifest, config: &BuildConfig) -> Self {
        let root = manifest.root();

        let command = config.command.clone().unwrap_or_else(|| match manifest.kind {
            ManifestKind::Pyproject => {
                if which::which("poetry").is_ok() {
                    vec!["poetry".to_string(), "build".to_string()]
                } else {
                    vec!["python".to_string(), "-m".to_string(), "build".to_string()]
                }
            }
            ManifestKind::Cargo => vec![
                "cargo".to_string(),
                "package".to_string(),
                "--allow-dirty".to_string(),
                "--no-verify".to_string(),
            ],
        });

        let default_dist = match manifest.kind {
            ManifestKind::Pyproject => PathBuf::from("dist"),
            ManifestKind::Cargo => PathBuf::from("target").join("package"),
        };
        let dist_dir = root.join(config.dist_dir.clone().unwrap_or(default_dist));

        Self {
            command,
            dist_dir,
            // target/package is shared with cargo's own bookkeeping
            clean_dist: manifest.kind == ManifestKind::Pyproject,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Command line for messages
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Run `plan` in the manifest's directory and collect its artifacts
pub async fn run_build(plan: &BuildPlan, manifest: &ProjectManifest) -> Result<BuildOutput> {
    let (program, args) = plan
        .command
        .split_first()
        .ok_or_else(|| BuildError::CommandFailed {
            command: String::new(),
            reason: "empty build command".to_string(),
        })?;

    which::which(program).map_err(|_| BuildError::ToolNotFound {
        tool: program.clone(),
    })?;

    if plan.clean_dist {
        clean_dist_dir(&plan.dist_dir, manifest).await?;
    }

    log::info!("Running build: {}", plan.command_line());

    let mut command = Command::new(program);
    command.args(args).current_dir(manifest.root());

    let output = output_with_timeout(command, plan.timeout)
        .await
        .map_err(|e| match e {
            RunError::TimedOut => BuildError::TimedOut {
                command: plan.command_line(),
                seconds: plan.timeout.as_secs(),
            },
            RunError::Io(e) => BuildError::CommandFailed {
                command: plan.command_line(),
                reason: e.to_string(),
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = if stderr.trim().is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr.trim().to_string()
        };
        return Err(BuildError::CommandFailed {
            command: plan.command_line(),
            reason,
        }
        .into());
    }

    log::debug!("{}", String::from_utf8_lossy(&output.stdout));

    let artifacts = collect_artifacts(&plan.dist_dir, manifest).await?;
    Ok(BuildOutput {
        version: manifest.version.clone(),
        artifacts,
    })
}

/// Lowercase with `-` and `.` folded to `_`, the way sdist and wheel names
/// spell the distribution.
fn distribution_key(name: &str) -> String {
    name.to_ascii_lowercase().replace(['-', '.'], "_")
}

/// Remove artifacts of earlier builds from `dist_dir`.
///
/// Only regular files named `<package>-...` go. A `dist_dir` that holds the
/// manifest, or is one of its ancestors, is never cleaned.
async fn clean_dist_dir(dist_dir: &Path, manifest: &ProjectManifest) -> Result<()> {
    if !dist_dir.is_dir() {
        return Ok(());
    }

    let dist = tokio::fs::canonicalize(dist_dir).await?;
    let root = tokio::fs::canonicalize(manifest.root()).await?;
    if root.starts_with(&dist) {
        log::warn!(
            "Not cleaning {}: it contains the project manifest",
            dist_dir.display()
        );
        return Ok(());
    }

    let prefix = format!("{}_", distribution_key(&manifest.name));
    let mut entries = tokio::fs::read_dir(dist_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if distribution_key(&name).starts_with(&prefix) {
            log::debug!("Removing stale artifact {}", entry.path().display());
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::VersionLocation;
    use tempfile::TempDir;

    fn manifest(dir: &TempDir, kind: ManifestKind) -> ProjectManifest {
        ProjectManifest {
            path: dir.path().join("pyproject.toml"),
            kind,
            name: "scraper_utils".to_string(),
            version: "0.3.1".to_string(),
            location: VersionLocation::Project,
        }
    }

    #[test]
    fn test_plan_honours_overrides() {
        let dir = TempDir::new().unwrap();
        let config = BuildConfig {
            command: Some(vec!["make".to_string(), "dist".to_string()]),
            dist_dir: Some(PathBuf::from("out")),
            timeout_secs: 30,
        };

        let plan = BuildPlan::resolve(&manifest(&dir, ManifestKind::Pyproject), &config);
        assert_eq!(plan.command_line(), "make dist");
        assert_eq!(plan.dist_dir, dir.path().join("out"));
        assert_eq!(plan.timeout, Duration::from_secs(30));
        assert!(plan.clean_dist);
    }

    #[test]
    fn test_cargo_defaults() {
        let dir = TempDir::new().unwrap();
        let plan = BuildPlan::resolve(&manifest(&dir, ManifestKind::Cargo), &BuildConfig::default());
        assert_eq!(plan.command[..2], ["cargo".to_string(), "package".to_string()]);
        assert_eq!(plan.dist_dir, dir.path().join("target").join("package"));
        assert!(!plan.clean_dist);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_build_collects_fresh_artifacts() {
        let dir = TempDir::new().unwrap();
        let dist = dir.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("scraper_utils-0.3.0.tar.gz"), b"stale").unwrap();

        let plan = BuildPlan {
            command: vec![
                "sh".to_string(),
                "-c".to_string(),
                "printf wheel > dist/scraper_utils-0.3.1-py3-none-any.whl".to_string(),
            ],
            dist_dir: dist.clone(),
            clean_dist: true,
            timeout: Duration::from_secs(30),
        };

        let output = run_build(&plan, &manifest(&dir, ManifestKind::Pyproject))
            .await
            .unwrap();
        assert_eq!(output.artifacts.len(), 1);
        assert_eq!(output.artifacts[0].name, "scraper_utils-0.3.1-py3-none-any.whl");
        assert!(!dist.join("scraper_utils-0.3.0.tar.gz").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_build_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let plan = BuildPlan {
            command: vec!["sh".to_string(), "-c".to_string(), "echo broken >&2; exit 3".to_string()],
            dist_dir: dir.path().join("dist"),
            clean_dist: true,
            timeout: Duration::from_secs(30),
        };

        let err = run_build(&plan, &manifest(&dir, ManifestKind::Pyproject))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dist_dir_at_root_keeps_project_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), b"[project]").unwrap();
        std::fs::write(dir.path().join("README.md"), b"readme").unwrap();
        std::fs::write(dir.path().join("scraper_utils-0.3.0.tar.gz"), b"stale").unwrap();

        let config = BuildConfig {
            command: Some(vec!["true".to_string()]),
            dist_dir: Some(PathBuf::from("")),
            timeout_secs: 30,
        };
        let manifest = manifest(&dir, ManifestKind::Pyproject);
        let plan = BuildPlan::resolve(&manifest, &config);

        let err = run_build(&plan, &manifest).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Build(BuildError::NoArtifacts { .. })
        ));
        assert!(dir.path().join("pyproject.toml").exists());
        assert!(dir.path().join("README.md").exists());
        assert!(dir.path().join("scraper_utils-0.3.0.tar.gz").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clean_removes_only_package_files() {
        let dir = TempDir::new().unwrap();
        let dist = dir.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("Scraper-Utils-0.2.0.tar.gz"), b"stale").unwrap();
        std::fs::write(dist.join("scraper_utils-0.3.0-py3-none-any.whl"), b"stale").unwrap();
        std::fs::write(dist.join("notes.txt"), b"keep").unwrap();
        std::fs::write(dist.join("scraper_utilsx-1.0.tar.gz"), b"keep").unwrap();

        clean_dist_dir(&dist, &manifest(&dir, ManifestKind::Pyproject))
            .await
            .unwrap();

        assert!(!dist.join("Scraper-Utils-0.2.0.tar.gz").exists());
        assert!(!dist.join("scraper_utils-0.3.0-py3-none-any.whl").exists());
        assert!(dist.join("notes.txt").exists());
        assert!(dist.join("scraper_utilsx-1.0.tar.gz").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_timeout() {
        let dir = TempDir::new().unwrap();
        let plan = BuildPlan {
            command: vec!["sh".to_string(), "-c".to_string(), "sleep 5".to_string()],
            dist_dir: dir.path().join("dist"),
            clean_dist: false,
            timeout: Duration::from_millis(200),
        };

        let err = run_build(&plan, &manifest(&dir, ManifestKind::Pyproject))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Build(BuildError::TimedOut { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let dir = TempDir::new().unwrap();
        let plan = BuildPlan {
            command: vec!["definitely-not-a-build-tool-4711".to_string()],
            dist_dir: dir.path().join("dist"),
            clean_dist: false,
            timeout: Duration::from_secs(5),
        };

        let err = run_build(&plan, &manifest(&dir, ManifestKind::Pyproject))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Build(BuildError::ToolNotFound { .. })
        ));
    }
}
