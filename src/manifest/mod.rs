//! Project manifest discovery: the declared name and version of the package
//! being released.
//!
//! Python projects (`pyproject.toml`, PEP 621 or Poetry layout) are checked
//! first, then Cargo packages.

mod editor;

pub use editor::set_version;

use crate::error::{ManifestError, Result};
use std::path::{Path, PathBuf};

/// Manifest file name for Python projects
pub const PYPROJECT: &str = "pyproject.toml";

/// Manifest file name for Cargo packages
pub const CARGO_TOML: &str = "Cargo.toml";

/// Which manifest format declared the version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// `pyproject.toml`
    Pyproject,
    /// `Cargo.toml`
    Cargo,
}

/// Where inside the manifest the version lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionLocation {
    /// `[project].version`
    Project,
    /// `[tool.poetry].version`
    Poetry,
    /// `[package].version`
    Package,
    /// `[workspace.package].version`
    WorkspacePackage,
}

impl VersionLocation {
    /// Table path of the version key
    pub fn table_path(self) -> &'static [&'static str] {
        match self {
            VersionLocation::Project => &["project"],
            VersionLocation::Poetry => &["tool", "poetry"],
            VersionLocation::Package => &["package"],
            VersionLocation::WorkspacePackage => &["workspace", "package"],
        }
    }
}

/// Name and version declared by the project manifest
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    /// Path to the manifest file
    pub path: PathBuf,
    /// Manifest format
    pub kind: ManifestKind,
    /// Package name
    pub name: String,
    /// Declared version, verbatim
    pub version: String,
    /// Table holding the version
    pub location: VersionLocation,
}

impl ProjectManifest {
    /// Directory containing the manifest
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Locate and load the manifest in `root`
pub fn load_manifest(root: &Path) -> Result<ProjectManifest> {
    let pyproject = root.join(PYPROJECT);
    if pyproject.is_file() {
        return load_pyproject(&pyproject);
    }

    let cargo_toml = root.join(CARGO_TOML);
    if cargo_toml.is_file() {
        return load_cargo_toml(&cargo_toml);
    }

    Err(ManifestError::NotFound {
        path: root.to_path_buf(),
    }
    .into())
}

fn read_toml(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| {
        ManifestError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn lookup<'a>(value: &'a toml::Value, table_path: &[&str]) -> Option<&'a toml::Value> {
    table_path
        .iter()
        .try_fold(value, |current, key| current.get(*key))
}

fn string_field(table: &toml::Value, key: &str) -> Option<String> {
    table
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Load a PEP 621 or Poetry `pyproject.toml`
pub fn load_pyproject(path: &Path) -> Result<ProjectManifest> {
    let doc = read_toml(path)?;

    if let Some(project) = lookup(&doc, VersionLocation::Project.table_path())
        && let Some(version) = string_field(project, "version")
    {
        return Ok(ProjectManifest {
            path: path.to_path_buf(),
            kind: ManifestKind::Pyproject,
            name: string_field(project, "name").unwrap_or_default(),
            version,
            location: VersionLocation::Project,
        });
    }

    if let Some(poetry) = lookup(&doc, VersionLocation::Poetry.table_path())
        && let Some(version) = string_field(poetry, "version")
    {
        let name = string_field(poetry, "name")
            .or_else(|| lookup(&doc, &["project"]).and_then(|p| string_field(p, "name")))
            .unwrap_or_default();
        return Ok(ProjectManifest {
            path: path.to_path_buf(),
            kind: ManifestKind::Pyproject,
            name,
            version,
            location: VersionLocation::Poetry,
        });
    }

    let is_dynamic = lookup(&doc, &["project", "dynamic"])
        .and_then(|v| v.as_array())
        .is_some_and(|fields| fields.iter().any(|f| f.as_str() == Some("version")));

    let reason = if is_dynamic {
        "version is listed in [project].dynamic".to_string()
    } else {
        "no version in [project] or [tool.poetry]".to_string()
    };

    Err(ManifestError::MissingVersion {
        path: path.to_path_buf(),
        reason,
    }
    .into())
}

/// Load a Cargo package manifest, following `version.workspace = true`
pub fn load_cargo_toml(path: &Path) -> Result<ProjectManifest> {
    let doc = read_toml(path)?;

    let package = doc.get("package");
    let name = package
        .and_then(|p| string_field(p, "name"))
        .unwrap_or_default();

    if let Some(version) = package.and_then(|p| string_field(p, "version")) {
        return Ok(ProjectManifest {
            path: path.to_path_buf(),
            kind: ManifestKind::Cargo,
            name,
            version,
            location: VersionLocation::Package,
        });
    }

    let inherits = package
        .and_then(|p| p.get("version"))
        .and_then(|v| v.get("workspace"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    if (inherits || package.is_none())
        && let Some(version) = lookup(&doc, VersionLocation::WorkspacePackage.table_path())
            .and_then(|w| string_field(w, "version"))
    {
        return Ok(ProjectManifest {
            path: path.to_path_buf(),
            kind: ManifestKind::Cargo,
            name,
            version,
            location: VersionLocation::WorkspacePackage,
        });
    }

    Err(ManifestError::MissingVersion {
        path: path.to_path_buf(),
        reason: "no version in [package] or [workspace.package]".to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).expect("write manifest");
    }

    #[test]
    fn test_pep621_version() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            PYPROJECT,
            "[project]\nname = \"scraper_utils\"\nversion = \"0.3.1\"\n",
        );

        let manifest = load_manifest(dir.path()).unwrap();
        assert_eq!(manifest.kind, ManifestKind::Pyproject);
        assert_eq!(manifest.name, "scraper_utils");
        assert_eq!(manifest.version, "0.3.1");
        assert_eq!(manifest.location, VersionLocation::Project);
    }

    #[test]
    fn test_poetry_version() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            PYPROJECT,
            "[tool.poetry]\nname = \"scraper-utils\"\nversion = \"1.4.0\"\n\n[tool.poetry.dependencies]\npython = \"^3.10\"\n",
        );

        let manifest = load_manifest(dir.path()).unwrap();
        assert_eq!(manifest.version, "1.4.0");
        assert_eq!(manifest.location, VersionLocation::Poetry);
    }

    #[test]
    fn test_dynamic_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            PYPROJECT,
            "[project]\nname = \"x\"\ndynamic = [\"version\"]\n",
        );

        let err = load_manifest(dir.path()).unwrap_err();
        assert!(err.to_string().contains("dynamic"));
    }

    #[test]
    fn test_pyproject_wins_over_cargo() {
        let dir = TempDir::new().unwrap();
        write(&dir, PYPROJECT, "[project]\nname = \"py\"\nversion = \"2.0.0\"\n");
        write(&dir, CARGO_TOML, "[package]\nname = \"rs\"\nversion = \"9.9.9\"\n");

        let manifest = load_manifest(dir.path()).unwrap();
        assert_eq!(manifest.name, "py");
    }

    #[test]
    fn test_cargo_workspace_inheritance() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            CARGO_TOML,
            "[package]\nname = \"tool\"\nversion.workspace = true\n\n[workspace.package]\nversion = \"0.7.2\"\n",
        );

        let manifest = load_manifest(dir.path()).unwrap();
        assert_eq!(manifest.kind, ManifestKind::Cargo);
        assert_eq!(manifest.version, "0.7.2");
        assert_eq!(manifest.location, VersionLocation::WorkspacePackage);
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        assert!(load_manifest(dir.path()).is_err());
    }
}
