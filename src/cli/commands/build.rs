//! `build`: build the package and list its artifacts.

use super::helpers::{build_step, load_project};
use crate::cli::RuntimeConfig;
use crate::error::Result;

pub(super) async fn execute_build(config: &RuntimeConfig) -> Result<()> {
    let project = load_project(config)?;
    build_step(&project, config).await.map(|_| ())
}
