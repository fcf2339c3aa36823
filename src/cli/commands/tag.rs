//! `tag`: create the version tag at HEAD.

use super::helpers::{load_project, tag_step};
use crate::cli::RuntimeConfig;
use crate::error::Result;

pub(super) async fn execute_tag(no_push: bool, allow_dirty: bool, config: &RuntimeConfig) -> Result<()> {
    let project = load_project(config)?;
    tag_step(&project, config, !no_push, !allow_dirty).await
}
