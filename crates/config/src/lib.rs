// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod microcode;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_schema_version() -> String {
    "1.0".to_string()
}

fn default_period() -> u64 {
    800
}

fn default_init_ticks() -> u64 {
    200
}

fn default_startup_ticks() -> u64 {
    200
}

/// One schematic module: a netlist file plus the namespace prefix its
/// components and networks live under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleEntry {
    pub netlist: PathBuf,
    pub prefix: String,
}

/// Top-level description of a simulated system: the schematic modules, the
/// microcode directory, the program ROM, and the clocking parameters.
///
/// Paths are interpreted relative to the manifest file's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    pub modules: Vec<ModuleEntry>,
    pub microcode: PathBuf,
    pub rom: PathBuf,
    /// Clock period in ticks; one CPU cycle is one low and one high phase.
    #[serde(default = "default_period")]
    pub period: u64,
    /// Ticks spent with reset held after power-on.
    #[serde(default = "default_init_ticks")]
    pub init_ticks: u64,
    /// Ticks run after reset release before the first cycle step.
    #[serde(default = "default_startup_ticks")]
    pub startup_ticks: u64,
}

impl SystemManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open system manifest at {:?}", path.as_ref()))?;
        let manifest: Self =
            serde_yaml::from_reader(file).context("Failed to parse System Manifest YAML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.modules.is_empty() {
            anyhow::bail!("A system needs at least one module");
        }

        let mut seen = std::collections::HashSet::new();
        for module in &self.modules {
            if module.prefix.is_empty() {
                anyhow::bail!("Module prefix cannot be empty");
            }
            if module.prefix == "BP" {
                anyhow::bail!("Module prefix 'BP' is reserved for the backplane");
            }
            if module.prefix.contains(':') {
                anyhow::bail!("Module prefix '{}' cannot contain ':'", module.prefix);
            }
            if !seen.insert(module.prefix.as_str()) {
                anyhow::bail!("Duplicate module prefix '{}'", module.prefix);
            }
        }

        if self.period < 2 || self.period % 2 != 0 {
            anyhow::bail!(
                "Clock period must be an even tick count >= 2, got {}",
                self.period
            );
        }

        Ok(())
    }

    /// Module list with paths resolved against the manifest directory.
    pub fn resolved_modules(&self, base: &Path) -> Vec<(PathBuf, String)> {
        self.modules
            .iter()
            .map(|m| (base.join(&m.netlist), m.prefix.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
schema_version: "1.0"
name: "dragonfly-8b9m"
modules:
  - netlist: "netlists/alu_hub.frp"
    prefix: "ALU"
  - netlist: "netlists/interface.frp"
    prefix: "I"
microcode: "microcode/bin"
rom: "main.bin"
period: 400
"#;

    #[test]
    fn parses_and_validates_a_manifest() {
        let manifest: SystemManifest = serde_yaml::from_str(SAMPLE).unwrap();
        manifest.validate().unwrap();
        assert_eq!(manifest.name, "dragonfly-8b9m");
        assert_eq!(manifest.modules.len(), 2);
        assert_eq!(manifest.period, 400);
        // Defaults fill in.
        assert_eq!(manifest.init_ticks, 200);
        assert_eq!(manifest.startup_ticks, 200);

        let resolved = manifest.resolved_modules(Path::new("/sys"));
        assert_eq!(resolved[0].0, PathBuf::from("/sys/netlists/alu_hub.frp"));
        assert_eq!(resolved[1].1, "I");
    }

    #[test]
    fn rejects_odd_period() {
        let mut manifest: SystemManifest = serde_yaml::from_str(SAMPLE).unwrap();
        manifest.period = 401;
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("even tick count"));
    }

    #[test]
    fn rejects_reserved_prefix() {
        let mut manifest: SystemManifest = serde_yaml::from_str(SAMPLE).unwrap();
        manifest.modules[0].prefix = "BP".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn rejects_duplicate_prefixes() {
        let mut manifest: SystemManifest = serde_yaml::from_str(SAMPLE).unwrap();
        manifest.modules[1].prefix = "ALU".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate module prefix"));
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let mut manifest: SystemManifest = serde_yaml::from_str(SAMPLE).unwrap();
        manifest.schema_version = "2.0".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("Unsupported schema_version"));
    }
}
