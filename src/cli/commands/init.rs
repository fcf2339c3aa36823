//! `init`: write the GitHub Actions workflows.
//!
//! Both workflow definitions are embedded at compile time and rendered with
//! the repository's trigger settings, so a fresh repository needs nothing
//! but this binary.

use crate::cli::RuntimeConfig;
use crate::config::{ReleaseConfig, TriggerConfig};
use crate::error::{CliError, ReleaseError, Result};
use crate::manifest::{ManifestKind, load_manifest};
use handlebars::{Handlebars, no_escape};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Release branch workflow: creates the tag
const TAG_WORKFLOW: &str = include_str!("../../../templates/workflows/tag-release.yml.hbs");

/// Tag workflow: verifies, builds and publishes
const PUBLISH_WORKFLOW: &str = include_str!("../../../templates/workflows/publish-release.yml.hbs");

/// Output file name and template of each workflow
const WORKFLOWS: [(&str, &str); 2] = [
    ("tag-release.yml", TAG_WORKFLOW),
    ("publish-release.yml", PUBLISH_WORKFLOW),
];

const PYTHON_VERSION: &str = "3.12";

#[derive(Debug, Serialize)]
struct WorkflowContext<'a> {
    release_branch: &'a str,
    tag_pattern: &'a str,
    tool_version: &'a str,
    python: bool,
    python_version: &'a str,
}

/// Render both workflows; returns `(file name, contents)` pairs
fn render_workflows(trigger: &TriggerConfig, python: bool) -> Result<Vec<(&'static str, String)>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(no_escape);

    let context = WorkflowContext {
        release_branch: &trigger.release_branch,
        tag_pattern: &trigger.tag_pattern,
        tool_version: env!("CARGO_PKG_VERSION"),
        python,
        python_version: PYTHON_VERSION,
    };

    WORKFLOWS
        .iter()
        .map(|(name, template)| Ok((*name, registry.render_template(template, &context)?)))
        .collect()
}

/// Write the rendered workflows below `root/.github/workflows`
fn write_workflows(root: &Path, rendered: &[(&str, String)], force: bool) -> Result<Vec<PathBuf>> {
    let workflows_dir = root.join(".github").join("workflows");

    if !force
        && let Some(existing) = rendered
            .iter()
            .map(|(name, _)| workflows_dir.join(name))
            .find(|path| path.exists())
    {
        return Err(CliError::FileExists { path: existing }.into());
    }

    fs::create_dir_all(&workflows_dir).map_err(|e| {
        ReleaseError::Cli(CliError::ExecutionFailed {
            command: "create_workflows_dir".to_string(),
            reason: format!(
                "Failed to create {}: {}",
                workflows_dir.display(),
                e
            ),
        })
    })?;

    let mut written = Vec::with_capacity(rendered.len());
    for (name, contents) in rendered {
        let path = workflows_dir.join(name);
        fs::write(&path, contents).map_err(|e| {
            ReleaseError::Cli(CliError::ExecutionFailed {
                command: "write_workflow".to_string(),
                reason: format!("Failed to write {}: {}", path.display(), e),
            })
        })?;
        written.push(path);
    }
    Ok(written)
}

pub(super) fn execute_init(force: bool, config: &RuntimeConfig) -> Result<()> {
    let release_config = ReleaseConfig::load(config.root(), config.config_file())?;

    // A repository without a manifest yet still gets the python setup steps
    let python = match load_manifest(config.root()) {
        Ok(manifest) => manifest.kind == ManifestKind::Pyproject,
        Err(e) => {
            config.verbose_println(&format!("No manifest loaded ({}), assuming a python project", e));
            true
        }
    };

    let rendered = render_workflows(&release_config.trigger, python)?;
    for path in write_workflows(config.root(), &rendered, force)? {
        config.indent(&path.display().to_string());
    }
    config.success_println("Workflows written; commit them to enable tag releases");
    Ok(())
}
