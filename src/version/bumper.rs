//! Semantic version bumping for the `bump` command.

use crate::error::{Result, VersionError};
use semver::{BuildMetadata, Prerelease, Version};
use std::str::FromStr;

/// Requested version change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionBump {
    /// Increment major, reset minor and patch
    Major,
    /// Increment minor, reset patch
    Minor,
    /// Increment patch
    Patch,
    /// Set an explicit version
    Exact(Version),
}

impl FromStr for VersionBump {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("major") {
            Ok(VersionBump::Major)
        } else if s.eq_ignore_ascii_case("minor") {
            Ok(VersionBump::Minor)
        } else if s.eq_ignore_ascii_case("patch") {
            Ok(VersionBump::Patch)
        } else {
            // Pre-release identifiers are case-sensitive; keep them as typed
            Version::parse(s.trim_start_matches(['v', 'V']))
                .map(VersionBump::Exact)
                .map_err(|e| format!("expected major, minor, patch or X.Y.Z ({})", e))
        }
    }
}

impl std::fmt::Display for VersionBump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionBump::Major => write!(f, "major"),
            VersionBump::Minor => write!(f, "minor"),
            VersionBump::Patch => write!(f, "patch"),
            VersionBump::Exact(v) => write!(f, "{}", v),
        }
    }
}

/// Apply `bump` to the declared version string.
///
/// The result always moves forward; pre-release and build metadata are
/// dropped by the increment bumps.
pub fn bump_version(current: &str, bump: &VersionBump) -> Result<Version> {
    let current = Version::parse(current.trim()).map_err(|e| VersionError::ParseFailed {
        version: current.to_string(),
        source: e,
    })?;

    let next = match bump {
        VersionBump::Major => Version::new(current.major + 1, 0, 0),
        VersionBump::Minor => Version::new(current.major, current.minor + 1, 0),
        VersionBump::Patch => {
            if current.pre.is_empty() {
                Version::new(current.major, current.minor, current.patch + 1)
            } else {
                // 1.2.3-rc.1 -> 1.2.3
                let mut released = current.clone();
                released.pre = Prerelease::EMPTY;
                released.build = BuildMetadata::EMPTY;
                released
            }
        }
        VersionBump::Exact(version) => version.clone(),
    };

    if next <= current {
        return Err(VersionError::UnsupportedBump {
            bump: bump.to_string(),
            version: current.to_string(),
            reason: format!("{} is not greater than {}", next, current),
        }
        .into());
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_bumps() {
        assert_eq!(bump_version("1.4.2", &VersionBump::Major).unwrap().to_string(), "2.0.0");
        assert_eq!(bump_version("1.4.2", &VersionBump::Minor).unwrap().to_string(), "1.5.0");
        assert_eq!(bump_version("1.4.2", &VersionBump::Patch).unwrap().to_string(), "1.4.3");
    }

    #[test]
    fn test_patch_releases_prerelease() {
        assert_eq!(
            bump_version("1.4.2-rc.1", &VersionBump::Patch).unwrap().to_string(),
            "1.4.2"
        );
    }

    #[test]
    fn test_exact_must_move_forward() {
        let bump: VersionBump = "v1.0.0".parse().unwrap();
        assert!(bump_version("1.0.0", &bump).is_err());
        assert!(bump_version("0.9.0", &bump).is_ok());
    }

    #[test]
    fn test_parse_bump_names() {
        assert_eq!("PATCH".parse::<VersionBump>(), Ok(VersionBump::Patch));
        assert!("sideways".parse::<VersionBump>().is_err());
    }

    #[test]
    fn test_exact_keeps_prerelease_case() {
        let bump: VersionBump = " 1.0.0-RC.1 ".parse().unwrap();
        assert_eq!(bump.to_string(), "1.0.0-RC.1");
        assert_eq!("V2.0.0".parse::<VersionBump>().unwrap().to_string(), "2.0.0");
        assert_eq!(bump_version("0.9.0", &bump).unwrap().to_string(), "1.0.0-RC.1");
    }
}
