// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

// Each integration test binary uses its own subset of this rig.
#![allow(dead_code)]

use dragonfly_core::backplane::Backplane;
use dragonfly_core::board::Motherboard;
use dragonfly_core::log::LogSink;
use dragonfly_core::machine::Machine;
use dragonfly_core::net::{DriverId, LineState, NetArena, NetId};
use dragonfly_core::parts::{Component, Part, PinMap};
use dragonfly_core::SimResult;

/// Driver id used by test stimulus, far outside the component range.
pub const FEED: DriverId = DriverId(1_000_000);

/// A hand-wired machine plus persistent input stimulus.
///
/// Feeds are re-driven into the pending slot at the start of every tick,
/// mimicking an external signal source holding a level.
pub struct Rig {
    pub machine: Machine,
    pub board: Motherboard,
    pub logs: LogSink,
    feeds: Vec<(NetId, bool)>,
}

impl Rig {
    /// Build from (component name, netlist type, [(pin, net)]) triples.
    /// Nets are created on demand under the `T:` module prefix.
    pub fn build(parts: &[(&str, &str, &[(&str, &str)])]) -> Rig {
        let mut nets = NetArena::new();
        let mut components = Vec::new();

        for (name, type_name, pins) in parts {
            let mut map = PinMap::new();
            for (pin, net) in pins.iter() {
                let full = format!("T:{net}!");
                let id = nets
                    .lookup(&full)
                    .unwrap_or_else(|| nets.add(&full).expect("fresh net"));
                map.insert(pin, id);
            }
            let part = Part::from_type_name(type_name, &map)
                .unwrap_or_else(|| panic!("unknown part type {type_name}"));
            components.push(Component::new(format!("T:{name}"), part));
        }

        let interface = components
            .iter()
            .position(|c| matches!(c.part, Part::Interface(_)));
        let machine = Machine::new(components, nets, Backplane::new(), interface);

        Rig {
            machine,
            board: Motherboard::new(),
            logs: LogSink::new(),
            feeds: Vec::new(),
        }
    }

    pub fn net(&self, name: &str) -> NetId {
        self.machine
            .nets
            .lookup(&format!("T:{name}!"))
            .unwrap_or_else(|| panic!("unknown net {name}"))
    }

    /// Hold a net at a level from the next tick on.
    pub fn feed(&mut self, name: &str, value: bool) {
        let id = self.net(name);
        if let Some(feed) = self.feeds.iter_mut().find(|f| f.0 == id) {
            feed.1 = value;
        } else {
            self.feeds.push((id, value));
        }
    }

    pub fn unfeed(&mut self, name: &str) {
        let id = self.net(name);
        self.feeds.retain(|f| f.0 != id);
    }

    /// Feed the conventional power nets.
    pub fn power(&mut self) {
        self.feed("VCC", true);
        self.feed("GND", false);
    }

    pub fn try_tick(&mut self) -> SimResult<()> {
        for (id, value) in self.feeds.clone() {
            self.machine.nets.drive(id, FEED, value);
        }
        self.machine.sweep(&mut self.board, &mut self.logs)
    }

    pub fn tick(&mut self) {
        self.try_tick().expect("sweep failed");
    }

    /// A changed feed needs one tick to commit and one for parts to react.
    pub fn settle(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Full clock excursion on a net, slow enough for edge detectors.
    pub fn pulse(&mut self, clk: &str) {
        self.feed(clk, false);
        self.settle(2);
        self.feed(clk, true);
        self.settle(2);
    }

    pub fn state(&self, name: &str) -> LineState {
        self.machine.nets.state(self.net(name))
    }

    pub fn high(&self, name: &str) -> bool {
        self.machine.nets.read(self.net(name))
    }

    pub fn part_mut(&mut self, name: &str) -> &mut Part {
        let full = format!("T:{name}");
        let idx = self
            .machine
            .component_index(&full)
            .unwrap_or_else(|| panic!("unknown component {name}"));
        &mut self.machine.components[idx].part
    }

    /// Read a bus fed from `{bus}0..{bus}{width-1}` as an integer.
    pub fn bus(&self, bus: &str, width: u32) -> u64 {
        let mut value = 0;
        for i in 0..width {
            if self.high(&format!("{bus}{i}")) {
                value |= 1 << i;
            }
        }
        value
    }
}
