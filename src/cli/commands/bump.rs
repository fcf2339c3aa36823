//! `bump`: rewrite the manifest version.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::manifest::{load_manifest, set_version};
use crate::version::{VersionBump, bump_version};

pub(super) fn execute_bump(bump: &VersionBump, dry_run: bool, config: &RuntimeConfig) -> Result<()> {
    let manifest = load_manifest(config.root())?;
    let next = bump_version(&manifest.version, bump)?.to_string();

    if dry_run {
        config.info_println(&format!(
            "Dry run: {} {} -> {}",
            manifest.name, manifest.version, next
        ));
        return Ok(());
    }

    let updated = set_version(&manifest, &next)?;
    config.success_println(&format!(
        "{} {} -> {} ({})",
        updated.name,
        manifest.version,
        updated.version,
        updated.path.display()
    ));
    Ok(())
}
