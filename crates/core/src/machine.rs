// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::backplane::Backplane;
use crate::board::MemoryBus;
use crate::log::LogSink;
use crate::net::{DriverId, NetArena};
use crate::parts::{Component, Interface, Part, TickCtx};
use crate::SimResult;

/// The assembled CPU: every component and network of all modules, plus the
/// shared backplane.
///
/// Components are owned exclusively here and iterated in loader order;
/// networks are shared between components by index only. Because reads see
/// the committed side and writes the pending side, the iteration order has
/// no influence on the committed result of a sweep.
#[derive(Debug)]
pub struct Machine {
    pub components: Vec<Component>,
    pub nets: NetArena,
    pub backplane: Backplane,
    interface: Option<usize>,
}

impl Machine {
    pub fn new(
        components: Vec<Component>,
        nets: NetArena,
        backplane: Backplane,
        interface: Option<usize>,
    ) -> Self {
        Self {
            components,
            nets,
            backplane,
            interface,
        }
    }

    pub fn component_index(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name == name)
    }

    /// Driver id reserved for the backplane, one past the component range.
    pub fn backplane_driver(&self) -> DriverId {
        DriverId(self.components.len() as u32)
    }

    pub fn driver_name(&self, id: DriverId) -> &str {
        let idx = id.0 as usize;
        if idx < self.components.len() {
            &self.components[idx].name
        } else if idx == self.components.len() {
            "BP"
        } else {
            "?"
        }
    }

    pub fn interface(&self) -> Option<&Interface> {
        self.interface.map(|idx| match &self.components[idx].part {
            Part::Interface(iface) => iface,
            _ => unreachable!("interface index does not point at an interface"),
        })
    }

    pub fn interface_mut(&mut self) -> Option<&mut Interface> {
        self.interface
            .map(|idx| match &mut self.components[idx].part {
                Part::Interface(iface) => iface,
                _ => unreachable!("interface index does not point at an interface"),
            })
    }

    pub fn interface_name(&self) -> Option<&str> {
        self.interface.map(|idx| self.components[idx].name.as_str())
    }

    /// One full propagation sweep: every component, then the backplane
    /// merge, then the commit that publishes the tick's result.
    pub fn sweep(&mut self, memory: &mut dyn MemoryBus, logs: &mut LogSink) -> SimResult<()> {
        for idx in 0..self.components.len() {
            let component = &mut self.components[idx];
            let mut ctx = TickCtx {
                nets: &mut self.nets,
                driver: DriverId(idx as u32),
                source: &component.name,
                logs,
                memory,
            };
            component.part.propagate(&mut ctx)?;
        }

        let driver = DriverId(self.components.len() as u32);
        self.backplane.propagate(&mut self.nets, driver);

        self.nets.commit_all();
        Ok(())
    }
}
