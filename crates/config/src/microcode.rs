// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One row of `table.csv`: how an opcode presents to humans and how many
/// clock cycles its microprogram takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub opcode: u8,
    pub mnemonic: String,
    pub max_cycles: u32,
    pub min_cycles: u32,
}

/// Opcode lookup built from the microcode generator's `table.csv`.
#[derive(Debug, Default)]
pub struct MicrocodeIndex {
    ops: BTreeMap<u8, OpcodeInfo>,
}

impl MicrocodeIndex {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read opcode table at {:?}", path.as_ref()))?;
        Self::from_csv(&text)
    }

    /// Parse `hexOpcode, decOpcode, mnemonic, maxCycles, minCycles` rows.
    /// The mnemonic may itself contain commas ("LD A, [byte]").
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut ops = BTreeMap::new();

        for (idx, line) in text.lines().enumerate().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < 5 {
                anyhow::bail!("table.csv line {}: expected 5 fields: {line}", idx + 1);
            }

            let opcode: u8 = fields[1]
                .trim()
                .parse()
                .with_context(|| format!("table.csv line {}: bad opcode", idx + 1))?;
            let max_cycles: u32 = fields[fields.len() - 2]
                .trim()
                .parse()
                .with_context(|| format!("table.csv line {}: bad maxCycles", idx + 1))?;
            let min_cycles: u32 = fields[fields.len() - 1]
                .trim()
                .parse()
                .with_context(|| format!("table.csv line {}: bad minCycles", idx + 1))?;
            let mnemonic = fields[2..fields.len() - 2]
                .join(",")
                .trim()
                .trim_matches('"')
                .to_string();

            ops.insert(
                opcode,
                OpcodeInfo {
                    opcode,
                    mnemonic,
                    max_cycles,
                    min_cycles,
                },
            );
        }

        Ok(Self { ops })
    }

    pub fn get(&self, opcode: u8) -> Option<&OpcodeInfo> {
        self.ops.get(&opcode)
    }

    pub fn mnemonic(&self, opcode: u8) -> Option<&str> {
        self.ops.get(&opcode).map(|o| o.mnemonic.as_str())
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawControlBusNames {
    readers: BTreeMap<String, String>,
    writers: BTreeMap<String, String>,
}

/// Mnemonic names of the 5-bit reader (L0..L4) and writer (R0..R4) control
/// bus codes, from the microcode generator's `components.json`.
#[derive(Debug, Default)]
pub struct ControlBusNames {
    pub readers: BTreeMap<u8, String>,
    pub writers: BTreeMap<u8, String>,
}

impl ControlBusNames {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read components.json at {:?}", path.as_ref()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawControlBusNames =
            serde_json::from_str(text).context("Failed to parse components.json")?;

        let convert = |map: BTreeMap<String, String>| -> Result<BTreeMap<u8, String>> {
            map.into_iter()
                .map(|(code, name)| {
                    let code: u8 = code
                        .parse()
                        .with_context(|| format!("Bad control bus code '{code}'"))?;
                    Ok((code, name))
                })
                .collect()
        };

        Ok(Self {
            readers: convert(raw.readers)?,
            writers: convert(raw.writers)?,
        })
    }
}
