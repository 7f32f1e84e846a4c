// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::log::LogEntry;
use crate::net::LineState;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Everything observable about one tick.
///
/// Maps are ordered so downstream diffs and exports are stable across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformChunk {
    pub tick: u64,
    pub network_states: BTreeMap<String, LineState>,
    pub network_drivers: BTreeMap<String, Vec<String>>,
    pub variables: BTreeMap<String, BTreeMap<String, i64>>,
    pub logs: Vec<LogEntry>,
    pub clock: bool,
    pub wait: bool,
    pub reset: bool,
    pub halt: bool,
}

impl WaveformChunk {
    pub fn has_conflicts(&self) -> bool {
        self.network_states
            .values()
            .any(|s| *s == LineState::Conflict)
    }

    pub fn conflicts(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.network_states
            .iter()
            .filter(|(_, state)| **state == LineState::Conflict)
            .map(|(name, _)| {
                let drivers = self
                    .network_drivers
                    .get(name)
                    .map(|d| d.as_slice())
                    .unwrap_or(&[]);
                (name.as_str(), drivers)
            })
    }

    /// Assemble an integer from a group of nets named `{bus}{i}!`. Returns
    /// `None` when any member is missing or not cleanly driven.
    pub fn bus_value(&self, bus: &str, width: u32) -> Option<u64> {
        let mut value = 0u64;
        for i in 0..width {
            let name = format!("{bus}{i}!");
            match self.network_states.get(&name)? {
                LineState::DrivenHigh => value |= 1 << i,
                LineState::DrivenLow => {}
                _ => return None,
            }
        }
        Some(value)
    }
}

/// A recorded run: the chunks in tick order plus the pin-alias map they were
/// captured under.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Waveform {
    pub component_pins: BTreeMap<String, BTreeMap<String, String>>,
    pub chunks: Vec<WaveformChunk>,
}

impl Waveform {
    pub fn new(component_pins: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self {
            component_pins,
            chunks: Vec::new(),
        }
    }

    pub fn push(&mut self, chunk: WaveformChunk) {
        self.chunks.push(chunk);
    }

    pub fn get(&self, index: usize) -> Option<&WaveformChunk> {
        self.chunks.get(index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create waveform file {path:?}"))?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)
            .context("Failed to serialize waveform")?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open waveform file {path:?}"))?;
        serde_json::from_reader(std::io::BufReader::new(file)).context("Failed to parse waveform")
    }
}
