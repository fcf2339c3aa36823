//! `run`: the workflow entry point, dispatching on the pushed ref.

use super::helpers::{PublishFlags, build_step, load_project, publish_step, tag_step};
use crate::build::BuildPlan;
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::trigger::Trigger;
use crate::version::verify_tag_version;

/// Arguments of the `run` subcommand
#[derive(Debug, Clone)]
pub(super) struct RunArgs<'a> {
    pub git_ref: Option<&'a str>,
    pub overwrite: bool,
    pub draft: bool,
    pub dry_run: bool,
    pub no_push: bool,
    pub repo: Option<&'a str>,
}

pub(super) async fn execute_run(args: &RunArgs<'_>, config: &RuntimeConfig) -> Result<i32> {
    let project = load_project(config)?;
    let git_ref = Trigger::resolve_ref(args.git_ref)?;
    let trigger = Trigger::classify(&git_ref, &project.config.trigger)?;
    config.info_println(&format!("Triggered by {}", trigger.describe()));

    match trigger {
        Trigger::Tag { tag, .. } => {
            config.section("Verify");
            let verified = verify_tag_version(
                &tag,
                &project.config.trigger.tag_prefix,
                &project.manifest.version,
            )?;
            config.success_println(&format!(
                "Tag {} matches {} {}",
                verified.tag, project.manifest.name, verified.version
            ));

            if args.dry_run {
                let plan = BuildPlan::resolve(&project.manifest, &project.config.build);
                config.info_println(&format!("Dry run: would build with {}", plan.command_line()));
                config.info_println(&format!(
                    "Dry run: would upload {} to release {}",
                    plan.dist_dir.display(),
                    verified.tag
                ));
                if let Some(command) = &project.config.publish.command {
                    config.info_println(&format!("Dry run: would run {}", command.join(" ")));
                }
                return Ok(0);
            }

            let artifacts = build_step(&project, config).await?;
            let flags = PublishFlags {
                overwrite: args.overwrite,
                draft: args.draft,
                repo: args.repo,
            };
            publish_step(&project, config, &verified.tag, &artifacts, &flags).await?;
        }
        Trigger::ReleaseBranch { branch } => {
            if args.dry_run {
                config.info_println(&format!(
                    "Dry run: would tag {} at the head of {}",
                    project.release_tag(),
                    branch
                ));
                return Ok(0);
            }
            tag_step(&project, config, !args.no_push, true).await?;
        }
        Trigger::Ignored { git_ref } => {
            config.info_println(&format!("{} does not start a release, nothing to do", git_ref));
        }
    }

    Ok(0)
}
