// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::log::LogSink;
use crate::{SimResult, SimulationError};

const ROM_BASE: u16 = 0x0000;
const ROM_SIZE: usize = 10 * 1024;
const RAM_BASE: u16 = 0x4000;
const RAM_SIZE: usize = 6 * 1024;
const STACK_BASE: u16 = 0xFBFF;
const STACK_SIZE: usize = 1025;

/// Synchronous byte-wide memory port serviced during the interface's falling
/// clock edge. Implemented by the motherboard; handed into the sweep as a
/// trait object so the interface component never owns its counterpart.
pub trait MemoryBus {
    fn read(&mut self, address: u16) -> SimResult<u8>;
    fn write(&mut self, address: u16, value: u8) -> SimResult<()>;
}

/// The board around the CPU: three fixed address windows.
///
/// | range           | kind                              |
/// |-----------------|-----------------------------------|
/// | 0x0000..=0x27FF | ROM (writes silently ignored)     |
/// | 0x4000..=0x57FF | RAM                               |
/// | 0xFBFF..=0xFFFF | stack                             |
///
/// Anything else fails with `InvalidAddress`, which escapes the tick.
#[derive(Debug)]
pub struct Motherboard {
    rom: Vec<u8>,
    ram: Vec<u8>,
    stack: Vec<u8>,
}

impl Default for Motherboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Motherboard {
    pub fn new() -> Self {
        Self {
            rom: vec![0; ROM_SIZE],
            ram: vec![0; RAM_SIZE],
            stack: vec![0; STACK_SIZE],
        }
    }

    /// Install the program ROM. Short images are zero-padded, long ones
    /// truncated; both deviations leave a warning in the chunk log.
    pub fn set_rom(&mut self, data: &[u8], logs: &mut LogSink) {
        match data.len().cmp(&ROM_SIZE) {
            std::cmp::Ordering::Less => {
                logs.warn(
                    "Motherboard",
                    format!(
                        "ROM image is smaller than {}B ({} bytes), padding with zeros",
                        ROM_SIZE,
                        data.len()
                    ),
                );
                self.rom[..data.len()].copy_from_slice(data);
                self.rom[data.len()..].fill(0);
            }
            std::cmp::Ordering::Greater => {
                logs.warn(
                    "Motherboard",
                    format!(
                        "ROM image is larger than {}B ({} bytes), truncating",
                        ROM_SIZE,
                        data.len()
                    ),
                );
                self.rom.copy_from_slice(&data[..ROM_SIZE]);
            }
            std::cmp::Ordering::Equal => self.rom.copy_from_slice(data),
        }
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }
}

impl MemoryBus for Motherboard {
    fn read(&mut self, address: u16) -> SimResult<u8> {
        if (address as usize) < ROM_SIZE {
            return Ok(self.rom[(address - ROM_BASE) as usize]);
        }
        if (RAM_BASE..RAM_BASE + RAM_SIZE as u16).contains(&address) {
            return Ok(self.ram[(address - RAM_BASE) as usize]);
        }
        if address >= STACK_BASE {
            return Ok(self.stack[(address - STACK_BASE) as usize]);
        }
        Err(SimulationError::InvalidAddress(address))
    }

    fn write(&mut self, address: u16, value: u8) -> SimResult<()> {
        if (address as usize) < ROM_SIZE {
            // ROM: writes land nowhere.
            return Ok(());
        }
        if (RAM_BASE..RAM_BASE + RAM_SIZE as u16).contains(&address) {
            self.ram[(address - RAM_BASE) as usize] = value;
            return Ok(());
        }
        if address >= STACK_BASE {
            self.stack[(address - STACK_BASE) as usize] = value;
            return Ok(());
        }
        Err(SimulationError::InvalidAddress(address))
    }
}
