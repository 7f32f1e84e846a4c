// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod backplane;
pub mod board;
pub mod engine;
pub mod log;
pub mod machine;
pub mod metrics;
pub mod net;
pub mod parts;
pub mod stepper;
pub mod waveform;

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Invalid memory address {0:#06x}")]
    InvalidAddress(u16),
    #[error("Unknown component '{0}'")]
    UnknownComponent(String),
    #[error("Component '{component}' has no variable '{variable}'")]
    UnknownVariable { component: String, variable: String },
    #[error("Pin alias conflict on '{component}': {detail}")]
    Observation { component: String, detail: String },
    #[error("Clock period must be an even tick count >= 2, got {0}")]
    InvalidPeriod(u64),
    #[error("EEPROM image out of bounds: {len} bytes at offset {offset:#06x}")]
    EepromImage { offset: usize, len: usize },
}

pub type SimResult<T> = Result<T, SimulationError>;
