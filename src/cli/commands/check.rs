//! `check`: classify the ref and verify the tag version.

use super::helpers::load_project;
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::trigger::Trigger;
use crate::version::verify_tag_version;

/// Exits 0 for matching tags and for refs that start no publish; a version
/// mismatch surfaces as an error.
pub(super) fn execute_check(git_ref: Option<&str>, config: &RuntimeConfig) -> Result<i32> {
    let project = load_project(config)?;
    let git_ref = Trigger::resolve_ref(git_ref)?;
    let trigger = Trigger::classify(&git_ref, &project.config.trigger)?;
    config.verbose_println(&format!("{} is a {}", git_ref, trigger.describe()));

    match trigger {
        Trigger::Tag { tag, .. } => {
            let verified = verify_tag_version(
                &tag,
                &project.config.trigger.tag_prefix,
                &project.manifest.version,
            )?;
            config.success_println(&format!(
                "Tag {} matches {} {}",
                verified.tag, project.manifest.name, verified.version
            ));
        }
        Trigger::ReleaseBranch { branch } => {
            config.info_println(&format!(
                "Push to {} would create tag {}",
                branch,
                project.release_tag()
            ));
        }
        Trigger::Ignored { git_ref } => {
            config.info_println(&format!("{} does not start a release", git_ref));
        }
    }

    Ok(0)
}
