//! Format-preserving version rewrite.

use super::ProjectManifest;
use crate::error::{ManifestError, Result};

/// Rewrite the declared version in place, keeping comments and layout.
///
/// Returns the manifest as it reads after the write.
pub fn set_version(manifest: &ProjectManifest, new_version: &str) -> Result<ProjectManifest> {
    let path = &manifest.path;
    let content = std::fs::read_to_string(path)?;

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| ManifestError::UpdateFailed {
            path: path.clone(),
            reason: format!("Failed to parse TOML: {}", e),
        })?;

    let mut item = doc.as_item_mut();
    for key in manifest.location.table_path() {
        item = item
            .get_mut(key)
            .filter(|table| table.is_table_like())
            .ok_or_else(|| ManifestError::UpdateFailed {
                path: path.clone(),
                reason: format!("Missing table '{}'", key),
            })?;
    }

    item["version"] = toml_edit::value(new_version);

    std::fs::write(path, doc.to_string()).map_err(|e| ManifestError::UpdateFailed {
        path: path.clone(),
        reason: format!("Failed to write file: {}", e),
    })?;

    log::debug!("Set version {} in {}", new_version, path.display());

    Ok(ProjectManifest {
        version: new_version.to_string(),
        ..manifest.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{PYPROJECT, load_manifest};
    use tempfile::TempDir;

    #[test]
    fn test_set_version_preserves_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PYPROJECT);
        std::fs::write(
            &path,
            "# package metadata\n[tool.poetry]\nname = \"scraper-utils\"\nversion = \"0.1.0\" # bumped by CI\n",
        )
        .unwrap();

        let manifest = load_manifest(dir.path()).unwrap();
        let updated = set_version(&manifest, "0.2.0").unwrap();
        assert_eq!(updated.version, "0.2.0");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# package metadata"));
        assert!(content.contains("version = \"0.2.0\""));
        assert_eq!(load_manifest(dir.path()).unwrap().version, "0.2.0");
    }
}
