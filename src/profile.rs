//! Machine profile definitions.
//!
//! A profile describes the limits of the machine the interpreter drives:
//! feed and spindle ceilings, tool magazine size, per-axis travel. Profiles
//! are TOML files; a default profile is embedded in the binary.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::machine::{Axis, Units, AXES};

/// Root profile file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileFile {
    pub machine: ProfileMeta,
    pub limits: LimitsDef,
    #[serde(default)]
    pub axis: Vec<AxisDef>,
}

/// Profile metadata
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileMeta {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub units: Units,
}

/// Machine-wide limits
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LimitsDef {
    pub max_feed_rate: f64,
    pub max_spindle_rpm: f64,
    #[serde(default = "default_tool_slots")]
    pub tool_slots: u8,
}

fn default_tool_slots() -> u8 {
    1
}

/// Travel range for one axis. Axes without an entry are unbounded.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AxisDef {
    pub letter: String,
    pub min: f64,
    pub max: f64,
}

/// Travel range, resolved per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Travel {
    pub min: f64,
    pub max: f64,
}

/// Runtime machine profile (resolved for per-axis lookups)
#[derive(Debug, Clone, PartialEq)]
pub struct MachineProfile {
    pub name: String,
    pub description: Option<String>,
    pub units: Units,
    pub max_feed_rate: f64,
    pub max_spindle_rpm: f64,
    pub tool_slots: u8,
    pub travel: [Option<Travel>; AXES],
}

impl From<ProfileFile> for MachineProfile {
    fn from(file: ProfileFile) -> Self {
        let mut travel = [None; AXES];
        for def in &file.axis {
            let letter = def.letter.trim().to_ascii_uppercase();
            let axis = match letter.chars().next() {
                Some(c) if letter.len() == 1 => Axis::ALL.into_iter().find(|a| a.letter() == c),
                _ => None,
            };
            match axis {
                Some(axis) => {
                    travel[axis.index()] = Some(Travel {
                        min: def.min,
                        max: def.max,
                    });
                }
                None => {
                    log::warn!("profile {}: unknown axis {:?}", file.machine.name, def.letter);
                }
            }
        }

        Self {
            name: file.machine.name,
            description: file.machine.description,
            units: file.machine.units,
            max_feed_rate: file.limits.max_feed_rate,
            max_spindle_rpm: file.limits.max_spindle_rpm,
            tool_slots: file.limits.tool_slots,
            travel,
        }
    }
}

impl Default for MachineProfile {
    fn default() -> Self {
        Self::embedded_default()
    }
}

impl MachineProfile {
    /// Load a profile from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        let file: ProfileFile = toml::from_str(&content)
            .with_context(|| format!("parsing profile {}", path.display()))?;
        Ok(file.into())
    }

    /// Find `default.toml` in the given directories, first hit wins.
    pub fn find_default(dirs: &[PathBuf]) -> Option<PathBuf> {
        dirs.iter()
            .map(|dir| dir.join("default.toml"))
            .find(|candidate| candidate.is_file())
    }

    /// The profile embedded in the binary.
    pub fn embedded_default() -> Self {
        let embedded_toml = include_str!("../resources/profiles/default.toml");
        match toml::from_str::<ProfileFile>(embedded_toml) {
            Ok(file) => file.into(),
            Err(e) => {
                // Fallback keeps the interpreter usable if the embedded
                // profile ever goes out of sync with the schema.
                log::warn!("Failed to parse embedded profile: {}. Using minimal fallback.", e);
                Self::minimal_fallback()
            }
        }
    }

    fn minimal_fallback() -> Self {
        Self {
            name: "fallback".to_string(),
            description: None,
            units: Units::Millimeters,
            max_feed_rate: 1_000.0,
            max_spindle_rpm: 10_000.0,
            tool_slots: 1,
            travel: [None; AXES],
        }
    }

    /// Travel range for one axis, if the profile bounds it.
    pub fn travel(&self, axis: Axis) -> Option<Travel> {
        self.travel[axis.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[machine]
name = "bench-mill"
description = "three axis test profile"
units = "mm"

[limits]
max_feed_rate = 2000.0
max_spindle_rpm = 12000.0
tool_slots = 6

[[axis]]
letter = "X"
min = 0.0
max = 200.0

[[axis]]
letter = "z"
min = -50.0
max = 0.0
"#;

    #[test]
    fn test_profile_from_toml() {
        let file: ProfileFile = toml::from_str(SAMPLE).expect("parse sample profile");
        let profile = MachineProfile::from(file);

        assert_eq!(profile.name, "bench-mill");
        assert_eq!(profile.units, Units::Millimeters);
        assert_eq!(profile.max_feed_rate, 2000.0);
        assert_eq!(profile.tool_slots, 6);
        assert_eq!(
            profile.travel(Axis::X),
            Some(Travel {
                min: 0.0,
                max: 200.0
            })
        );
        // lowercase letters are accepted
        assert!(profile.travel(Axis::Z).is_some());
        // axes without an entry are unbounded
        assert!(profile.travel(Axis::Y).is_none());
    }

    #[test]
    fn test_embedded_default_parses() {
        let profile = MachineProfile::embedded_default();
        assert_ne!(profile.name, "fallback");
        assert!(profile.max_feed_rate > 0.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write profile");

        let profile = MachineProfile::load(file.path()).expect("load profile");
        assert_eq!(profile.name, "bench-mill");
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"[machine\nname = ").expect("write garbage");

        assert!(MachineProfile::load(file.path()).is_err());
    }

    #[test]
    fn test_tool_slots_default() {
        let without_slots = r#"
[machine]
name = "tiny"

[limits]
max_feed_rate = 100.0
max_spindle_rpm = 1000.0
"#;
        let file: ProfileFile = toml::from_str(without_slots).expect("parse");
        let profile = MachineProfile::from(file);
        assert_eq!(profile.tool_slots, 1);
    }
}
