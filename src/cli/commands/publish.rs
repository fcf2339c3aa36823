//! `publish`: upload artifacts to the release for a tag.

use super::helpers::{PublishFlags, build_step, load_project, print_artifacts, publish_step};
use crate::build::{BuildPlan, collect_artifacts};
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::version::verify_tag_version;

/// Arguments of the `publish` subcommand
#[derive(Debug, Clone)]
pub(super) struct PublishArgs<'a> {
    pub tag: Option<&'a str>,
    pub overwrite: bool,
    pub draft: bool,
    pub skip_build: bool,
    pub repo: Option<&'a str>,
}

pub(super) async fn execute_publish(args: &PublishArgs<'_>, config: &RuntimeConfig) -> Result<()> {
    let project = load_project(config)?;
    let tag = args
        .tag
        .map(str::to_string)
        .unwrap_or_else(|| project.release_tag());

    // Never attach artifacts of one version to another version's release
    verify_tag_version(&tag, &project.config.trigger.tag_prefix, &project.manifest.version)?;

    let artifacts = if args.skip_build {
        let plan = BuildPlan::resolve(&project.manifest, &project.config.build);
        let artifacts = collect_artifacts(&plan.dist_dir, &project.manifest).await?;
        config.info_println(&format!(
            "Using {} existing artifact(s) from {}",
            artifacts.len(),
            plan.dist_dir.display()
        ));
        print_artifacts(&artifacts, config);
        artifacts
    } else {
        build_step(&project, config).await?
    };

    let flags = PublishFlags {
        overwrite: args.overwrite,
        draft: args.draft,
        repo: args.repo,
    };
    publish_step(&project, config, &tag, &artifacts, &flags).await
}
