//! Command execution functions coordinating the release phases.

mod build;
mod bump;
mod check;
mod helpers;
mod init;
mod publish;
mod run;
mod tag;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use build::execute_build;
use bump::execute_bump;
use check::execute_check;
use helpers::print_suggestions;
use init::execute_init;
use publish::{PublishArgs, execute_publish};
use run::{RunArgs, execute_run};
use tag::execute_tag;

/// Execute the parsed command, returning the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        // Never quiet for validation errors
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);

    let result = match &args.command {
        Command::Check { git_ref } => execute_check(git_ref.as_deref(), &config),
        Command::Run {
            git_ref,
            overwrite,
            draft,
            dry_run,
            no_push,
            repo,
        } => {
            let run_args = RunArgs {
                git_ref: git_ref.as_deref(),
                overwrite: *overwrite,
                draft: *draft,
                dry_run: *dry_run,
                no_push: *no_push,
                repo: repo.as_deref(),
            };
            execute_run(&run_args, &config).await
        }
        Command::Tag { no_push, allow_dirty } => {
            execute_tag(*no_push, *allow_dirty, &config).await.map(|()| 0)
        }
        Command::Build => execute_build(&config).await.map(|()| 0),
        Command::Publish {
            tag,
            overwrite,
            draft,
            skip_build,
            repo,
        } => {
            let publish_args = PublishArgs {
                tag: tag.as_deref(),
                overwrite: *overwrite,
                draft: *draft,
                skip_build: *skip_build,
                repo: repo.as_deref(),
            };
            execute_publish(&publish_args, &config).await.map(|()| 0)
        }
        Command::Bump { bump, dry_run } => execute_bump(bump, *dry_run, &config).map(|()| 0),
        Command::Init { force } => execute_init(*force, &config).map(|()| 0),
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            config.error_println(&format!("Command '{}' failed: {}", args.command.name(), e));
            log::debug!("{:?}", e);
            print_suggestions(&config, &e.recovery_suggestions());
            Ok(1)
        }
    }
}
