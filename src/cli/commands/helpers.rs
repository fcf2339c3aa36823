//! Shared steps used by several commands.

use crate::build::{Artifact, BuildPlan, run_build};
use crate::cli::{RuntimeConfig, format_size};
use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::git::{GitOperations, GitRepository, TagOptions, ensure_release_tag, short};
use crate::github::{GitHubClient, detect_repository};
use crate::manifest::{ProjectManifest, load_manifest};
use crate::publish::{PublishOptions, Publisher, run_registry_upload};
use crate::version::tag_name;

/// Manifest and configuration of the repository being released
pub(super) struct Project {
    pub manifest: ProjectManifest,
    pub config: ReleaseConfig,
}

impl Project {
    /// Tag for the declared version
    pub fn release_tag(&self) -> String {
        tag_name(&self.config.trigger.tag_prefix, &self.manifest.version)
    }
}

/// Load `release.toml` and the manifest from the repository root
pub(super) fn load_project(config: &RuntimeConfig) -> Result<Project> {
    let release_config = ReleaseConfig::load(config.root(), config.config_file())?;
    let manifest = load_manifest(config.root())?;

    config.verbose_println(&format!(
        "{} declares {} {}",
        manifest.path.display(),
        manifest.name,
        manifest.version
    ));

    Ok(Project {
        manifest,
        config: release_config,
    })
}

/// Create the release tag at HEAD (release branch flow)
pub(super) async fn tag_step(
    project: &Project,
    config: &RuntimeConfig,
    push: bool,
    require_clean: bool,
) -> Result<()> {
    let git = GitRepository::open(config.root()).await?;
    let tag = project.release_tag();
    let options = TagOptions {
        push,
        require_clean,
        ..TagOptions::default()
    };

    config.section("Tag");
    let info = ensure_release_tag(&git, &tag, &project.manifest.version, &options).await?;

    if !info.created && info.pushed {
        config.success_println(&format!(
            "Tag {} already pointed at HEAD ({}); pushed it to {}",
            info.name,
            short(&info.target_commit),
            options.remote
        ));
    } else if !info.created {
        config.info_println(&format!(
            "Tag {} already points at HEAD ({}), nothing to do",
            info.name,
            short(&info.target_commit)
        ));
    } else if info.pushed {
        config.success_println(&format!(
            "Created and pushed tag {} at {}",
            info.name,
            short(&info.target_commit)
        ));
    } else {
        config.success_println(&format!(
            "Created tag {} at {} (not pushed)",
            info.name,
            short(&info.target_commit)
        ));
    }
    Ok(())
}

/// Run the build and print the artifacts
pub(super) async fn build_step(project: &Project, config: &RuntimeConfig) -> Result<Vec<Artifact>> {
    let plan = BuildPlan::resolve(&project.manifest, &project.config.build);

    config.section("Build");
    config.info_println(&format!("Running {}", plan.command_line()));
    let output = run_build(&plan, &project.manifest).await?;

    print_artifacts(&output.artifacts, config);
    config.success_println(&format!(
        "Built {} artifact(s) for {}",
        output.artifacts.len(),
        output.version
    ));
    Ok(output.artifacts)
}

/// Print name, size and digest of every artifact
pub(super) fn print_artifacts(artifacts: &[Artifact], config: &RuntimeConfig) {
    for artifact in artifacts {
        config.indent(&format!("{} ({})", artifact.name, format_size(artifact.size)));
        config.verbose_println(&format!("sha256:{}", artifact.sha256));
    }
}

/// Flags controlling [`publish_step`]
#[derive(Debug, Clone, Default)]
pub(super) struct PublishFlags<'a> {
    pub overwrite: bool,
    pub draft: bool,
    pub repo: Option<&'a str>,
}

/// Upload artifacts to the release host, then run the registry upload
pub(super) async fn publish_step(
    project: &Project,
    config: &RuntimeConfig,
    tag: &str,
    artifacts: &[Artifact],
    flags: &PublishFlags<'_>,
) -> Result<()> {
    let publish = &project.config.publish;
    config.section("Publish");

    if publish.github {
        let git = GitRepository::open(config.root()).await.ok();
        let repo = detect_repository(flags.repo.or(publish.repository.as_deref()), git.as_ref()).await?;
        let client = GitHubClient::from_env(repo)?;

        let target_commitish = match &git {
            Some(git) => git.head_commit().await.ok(),
            None => None,
        };
        let options = PublishOptions {
            overwrite: flags.overwrite,
            draft: flags.draft || publish.draft,
            target_commitish,
            notes: None,
        };

        config.info_println(&format!(
            "Uploading {} artifact(s) to {} release {}",
            artifacts.len(),
            client.repo(),
            tag
        ));

        let report = Publisher::new(&client, &project.config.retry)
            .publish(tag, &project.manifest.version, artifacts, &options)
            .await?;

        for asset in &report.uploaded {
            let marker = if report.replaced.contains(&asset.name) {
                " (replaced)"
            } else {
                ""
            };
            config.indent(&format!("{}{}", asset.name, marker));
        }

        if report.draft {
            config.warning_println(&format!("Release {} left as draft: {}", report.tag, report.html_url));
        } else {
            config.success_println(&format!("Published {}", report.html_url));
        }
    } else {
        config.verbose_println("GitHub Releases upload disabled in release.toml");
    }

    if let Some(command) = &publish.command {
        config.info_println(&format!("Running {}", command.join(" ")));
        let timeout = std::time::Duration::from_secs(project.config.build.timeout_secs);
        run_registry_upload(command, project.manifest.root(), timeout).await?;
        config.success_println("Registry upload finished");
    }

    Ok(())
}

/// Print recovery suggestions for a failed command
pub(super) fn print_suggestions(config: &RuntimeConfig, suggestions: &[String]) {
    if suggestions.is_empty() {
        return;
    }
    config.println("\n💡 Recovery suggestions:");
    for suggestion in suggestions {
        config.println(&format!("  • {}", suggestion));
    }
}
