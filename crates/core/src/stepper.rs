// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::engine::SimulationEngine;
use crate::log::LogLevel;
use crate::net::LineState;
use crate::waveform::WaveformChunk;
use crate::{SimResult, SimulationError};

/// Drives the interface clock to turn raw ticks into CPU clock cycles.
///
/// One cycle holds CLOCK low for `period / 2` ticks plus one settle tick
/// (the convention the debugger relies on: latches are fully settled before
/// the high phase), then high for `period / 2` ticks.
#[derive(Debug, Clone, Copy)]
pub struct CycleStepper {
    period: u64,
}

impl CycleStepper {
    pub fn new(period: u64) -> SimResult<Self> {
        if period < 2 || period % 2 != 0 {
            return Err(SimulationError::InvalidPeriod(period));
        }
        Ok(Self { period })
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// Power-on sequence: backplane up, reset held for `init_ticks`, power
    /// rails of every component verified, then reset released and
    /// `startup_ticks` run so the microcode sequencer reaches its idle state.
    pub fn power_on(
        &self,
        engine: &mut SimulationEngine,
        init_ticks: u64,
        startup_ticks: u64,
    ) -> SimResult<WaveformChunk> {
        self.power_on_with(engine, init_ticks, startup_ticks, |_| {})
    }

    /// Like [`CycleStepper::power_on`], with every intermediate chunk handed
    /// to `on_chunk` (waveform recorders want all of them).
    pub fn power_on_with(
        &self,
        engine: &mut SimulationEngine,
        init_ticks: u64,
        startup_ticks: u64,
        mut on_chunk: impl FnMut(&WaveformChunk),
    ) -> SimResult<WaveformChunk> {
        engine.set_power(true);
        engine.set_reset(true);
        engine.set_wait(false);

        let mut chunk = engine.tick()?;
        on_chunk(&chunk);
        for _ in 1..init_ticks.max(1) {
            chunk = engine.tick()?;
            on_chunk(&chunk);
        }

        self.check_power_rails(engine, &chunk)?;

        engine.set_reset(false);
        for _ in 0..startup_ticks {
            chunk = engine.tick()?;
            on_chunk(&chunk);
        }
        Ok(chunk)
    }

    fn check_power_rails(
        &self,
        engine: &mut SimulationEngine,
        chunk: &WaveformChunk,
    ) -> SimResult<()> {
        let pins = engine.get_component_pins()?;
        for (component, pin_map) in &pins {
            let Some(vcc_net) = pin_map.get("VCC") else {
                engine.push_log(LogLevel::Info, component, "No VCC pin to check");
                continue;
            };

            if chunk.network_states.get(vcc_net) == Some(&LineState::DrivenHigh) {
                engine.push_log(LogLevel::Ok, component, "Power connected on pin VCC");
            } else {
                engine.push_log(LogLevel::Error, component, "Power not connected on pin VCC");
            }
        }
        Ok(())
    }

    /// One full clock cycle; returns the final chunk.
    pub fn step(&self, engine: &mut SimulationEngine) -> SimResult<WaveformChunk> {
        self.step_with(engine, |_| {})
    }

    /// Like [`CycleStepper::step`], with every intermediate chunk handed to
    /// `on_chunk`.
    pub fn step_with(
        &self,
        engine: &mut SimulationEngine,
        mut on_chunk: impl FnMut(&WaveformChunk),
    ) -> SimResult<WaveformChunk> {
        engine.set_clock(false);
        for _ in 0..self.period / 2 {
            on_chunk(&engine.tick()?);
        }
        // Extra settle tick with the clock still low.
        let mut chunk = engine.tick()?;
        on_chunk(&chunk);

        engine.set_clock(true);
        for _ in 0..self.period / 2 {
            chunk = engine.tick()?;
            on_chunk(&chunk);
        }
        Ok(chunk)
    }

    /// Step until the CPU asserts N_HALT or `max_cycles` cycles have run.
    /// Returns the last chunk and the number of cycles executed.
    pub fn run_until_halt(
        &self,
        engine: &mut SimulationEngine,
        max_cycles: u64,
    ) -> SimResult<(WaveformChunk, u64)> {
        let mut executed = 0;
        let mut chunk = self.step(engine)?;
        executed += 1;

        while executed < max_cycles && !chunk.halt {
            chunk = self.step(engine)?;
            executed += 1;
        }
        Ok((chunk, executed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_must_be_even_and_at_least_two() {
        assert!(CycleStepper::new(2).is_ok());
        assert!(CycleStepper::new(800).is_ok());
        assert!(matches!(
            CycleStepper::new(0),
            Err(SimulationError::InvalidPeriod(0))
        ));
        assert!(matches!(
            CycleStepper::new(5),
            Err(SimulationError::InvalidPeriod(5))
        ));
    }
}
