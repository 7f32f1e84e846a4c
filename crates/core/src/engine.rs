// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::board::Motherboard;
use crate::log::{LogLevel, LogSink};
use crate::machine::Machine;
use crate::metrics::RunMetrics;
use crate::net::LineState;
use crate::parts::StrobeLines;
use crate::waveform::WaveformChunk;
use crate::{SimResult, SimulationError};
use std::collections::BTreeMap;

/// Owns the machine and the motherboard, advances the simulation one tick at
/// a time, and harvests each tick into a [`WaveformChunk`].
pub struct SimulationEngine {
    machine: Machine,
    board: Motherboard,
    logs: LogSink,
    tick: u64,
    pub metrics: RunMetrics,
}

impl SimulationEngine {
    pub fn new(machine: Machine, rom: &[u8]) -> Self {
        let mut logs = LogSink::new();
        let mut board = Motherboard::new();
        board.set_rom(rom, &mut logs);

        Self {
            machine,
            board,
            logs,
            tick: 0,
            metrics: RunMetrics::new(),
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn board(&self) -> &Motherboard {
        &self.board
    }

    /// Inject a message into the current tick's log stream.
    pub fn push_log(&mut self, level: LogLevel, source: &str, message: impl Into<String>) {
        self.logs.push(level, source, message);
    }

    pub fn set_power(&mut self, on: bool) {
        tracing::info!(power = on, "backplane power");
        self.machine.backplane.set_power(on);
        self.logs
            .info("BP", if on { "Power on" } else { "Power off" });
    }

    pub fn set_clock(&mut self, value: bool) {
        if let Some(iface) = self.machine.interface_mut() {
            iface.set_clock(value);
        }
    }

    pub fn set_wait(&mut self, value: bool) {
        if let Some(iface) = self.machine.interface_mut() {
            iface.set_wait(value);
        }
    }

    pub fn set_reset(&mut self, value: bool) {
        if let Some(iface) = self.machine.interface_mut() {
            iface.set_reset(value);
        }
    }

    pub fn interface_name(&self) -> Option<&str> {
        self.machine.interface_name()
    }

    /// True while the CPU asserts N_HALT.
    pub fn halted(&self) -> bool {
        self.machine
            .interface()
            .map(|iface| iface.halted(&self.machine.nets))
            .unwrap_or(false)
    }

    pub fn strobes(&self) -> StrobeLines {
        self.machine
            .interface()
            .map(|iface| iface.strobes(&self.machine.nets))
            .unwrap_or_default()
    }

    /// Write a named variable on a component (clock/reset/wait scheduling on
    /// the interface, register preloads on latches and counters).
    pub fn set_component_variable(
        &mut self,
        component: &str,
        variable: &str,
        value: i64,
    ) -> SimResult<()> {
        let idx = self
            .machine
            .component_index(component)
            .ok_or_else(|| SimulationError::UnknownComponent(component.to_string()))?;

        let comp = &mut self.machine.components[idx];
        if !comp.part.set_variable(variable, value) {
            return Err(SimulationError::UnknownVariable {
                component: component.to_string(),
                variable: variable.to_string(),
            });
        }

        self.logs
            .info(component, format!("Setting {variable} to {value}"));
        Ok(())
    }

    /// Pin-alias map of every component: component name -> alias -> network.
    ///
    /// Fails loudly when one alias of a component would name two different
    /// networks; downstream tools key their display on this map.
    pub fn get_component_pins(&self) -> SimResult<BTreeMap<String, BTreeMap<String, String>>> {
        let mut result = BTreeMap::new();

        for component in &self.machine.components {
            let mut pin_map: BTreeMap<String, String> = BTreeMap::new();
            for (alias, pin) in component.part.pinout() {
                let Some(net) = pin else { continue };
                let net_name = self.machine.nets.name(net).to_string();
                if let Some(previous) = pin_map.get(&alias) {
                    if *previous != net_name {
                        return Err(SimulationError::Observation {
                            component: component.name.clone(),
                            detail: format!(
                                "alias {alias} maps to both {previous} and {net_name}"
                            ),
                        });
                    }
                    continue;
                }
                pin_map.insert(alias, net_name);
            }
            result.insert(component.name.clone(), pin_map);
        }

        Ok(result)
    }

    /// Bit widths of every exposed component variable, for VCD registration.
    pub fn get_component_variable_sizes(&self) -> BTreeMap<String, BTreeMap<String, u32>> {
        let mut result = BTreeMap::new();
        for component in &self.machine.components {
            let sizes = component.part.variable_sizes();
            if sizes.is_empty() {
                continue;
            }
            result.insert(
                component.name.clone(),
                sizes
                    .into_iter()
                    .map(|(name, width)| (name.to_string(), width))
                    .collect(),
            );
        }
        result
    }

    /// Advance one propagation sweep and harvest the result.
    ///
    /// Component complaints and conflicts never abort the sweep; only a
    /// motherboard access outside the memory map escapes as an error.
    pub fn tick(&mut self) -> SimResult<WaveformChunk> {
        self.machine.sweep(&mut self.board, &mut self.logs)?;

        let mut network_states = BTreeMap::new();
        let mut network_drivers = BTreeMap::new();
        let mut conflicts = 0u64;

        for id in self.machine.nets.ids() {
            let name = self.machine.nets.name(id).to_string();
            let state = self.machine.nets.state(id);
            let drivers: Vec<String> = self
                .machine
                .nets
                .drivers(id)
                .iter()
                .map(|d| self.machine.driver_name(*d).to_string())
                .collect();

            if state == LineState::Conflict {
                conflicts += 1;
                self.logs
                    .warn(&name, format!("Conflict: driven by {drivers:?}"));
            }

            network_states.insert(name.clone(), state);
            network_drivers.insert(name, drivers);
        }

        let mut variables = BTreeMap::new();
        for component in &self.machine.components {
            let vars = component.part.variables();
            if vars.is_empty() {
                continue;
            }
            variables.insert(
                component.name.clone(),
                vars.into_iter()
                    .map(|(name, value)| (name.to_string(), value))
                    .collect(),
            );
        }

        let (clock, wait, reset) = self
            .machine
            .interface()
            .map(|iface| (iface.clock(), iface.wait(), iface.reset()))
            .unwrap_or((false, false, false));
        let halt = self.halted();

        let chunk = WaveformChunk {
            tick: self.tick,
            network_states,
            network_drivers,
            variables,
            logs: self.logs.drain(),
            clock,
            wait,
            reset,
            halt,
        };

        self.tick += 1;
        self.metrics.record_tick(conflicts);
        Ok(chunk)
    }
}
