// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resolved electrical state of a network for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineState {
    Floating,
    DrivenHigh,
    DrivenLow,
    Conflict,
}

/// Dense index into the net arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetId(pub u32);

/// A component pin is bound to at most one network; unconnected pins stay
/// `None` and read as low / floating.
pub type Pin = Option<NetId>;

/// Identifies the driver of a network within a tick. Component drivers use
/// their index in the machine's component list; the backplane gets the slot
/// one past the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverId(pub u32);

/// A single electrical node.
///
/// Readers only ever observe the committed state of the previous tick;
/// writers only touch the pending slot, through [`NetArena::drive`].
#[derive(Debug)]
pub struct Net {
    name: String,
    state: LineState,
    drivers: Vec<DriverId>,
    pending: LineState,
    pending_drivers: Vec<DriverId>,
}

impl Net {
    fn new(name: String) -> Self {
        Self {
            name,
            state: LineState::Floating,
            drivers: Vec::new(),
            pending: LineState::Floating,
            pending_drivers: Vec::new(),
        }
    }
}

/// Central arena owning every network of the machine.
///
/// Components hold `NetId` indices, never references; the arena's insertion
/// order is the deterministic traversal order for observation maps.
#[derive(Debug, Default)]
pub struct NetArena {
    nets: Vec<Net>,
    index: HashMap<String, NetId>,
}

impl NetArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a network. Returns `None` when the name is already taken.
    pub fn add(&mut self, name: &str) -> Option<NetId> {
        if self.index.contains_key(name) {
            return None;
        }
        let id = NetId(self.nets.len() as u32);
        self.nets.push(Net::new(name.to_string()));
        self.index.insert(name.to_string(), id);
        Some(id)
    }

    pub fn lookup(&self, name: &str) -> Option<NetId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: NetId) -> &str {
        &self.nets[id.0 as usize].name
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NetId> {
        (0..self.nets.len() as u32).map(NetId)
    }

    /// Committed state as a plain logic level: true only for DRIVEN_HIGH.
    /// Low, floating and conflicting nets all read as false; consumers that
    /// need the distinction use [`NetArena::state`].
    pub fn read(&self, id: NetId) -> bool {
        self.nets[id.0 as usize].state == LineState::DrivenHigh
    }

    pub fn state(&self, id: NetId) -> LineState {
        self.nets[id.0 as usize].state
    }

    pub fn drivers(&self, id: NetId) -> &[DriverId] {
        &self.nets[id.0 as usize].drivers
    }

    pub fn is_floating(&self, id: NetId) -> bool {
        self.nets[id.0 as usize].state == LineState::Floating
    }

    pub fn pending_state(&self, id: NetId) -> LineState {
        self.nets[id.0 as usize].pending
    }

    pub fn pending_drivers(&self, id: NetId) -> &[DriverId] {
        &self.nets[id.0 as usize].pending_drivers
    }

    /// Contribute a logic level to the pending slot of a net.
    ///
    /// A driver writing the same pin twice in one tick is idempotent. Two
    /// distinct drivers agreeing on the level share the net; disagreeing
    /// drivers turn the pending state into a conflict.
    pub fn drive(&mut self, id: NetId, driver: DriverId, value: bool) {
        let net = &mut self.nets[id.0 as usize];
        if net.pending_drivers.contains(&driver) {
            return;
        }

        let wanted = if value {
            LineState::DrivenHigh
        } else {
            LineState::DrivenLow
        };

        match net.pending {
            LineState::Floating => net.pending = wanted,
            state if state == wanted => {}
            _ => net.pending = LineState::Conflict,
        }
        net.pending_drivers.push(driver);
    }

    /// Overwrite a net's pending slot wholesale. Reserved for the backplane
    /// merge, which replaces the per-net accumulation with a bus-wide union.
    pub fn set_pending(&mut self, id: NetId, state: LineState, drivers: Vec<DriverId>) {
        let net = &mut self.nets[id.0 as usize];
        net.pending = state;
        net.pending_drivers = drivers;
    }

    /// End-of-tick commit: the pending slot becomes visible and is reset.
    pub fn commit_all(&mut self) {
        for net in &mut self.nets {
            net.state = net.pending;
            std::mem::swap(&mut net.drivers, &mut net.pending_drivers);
            net.pending = LineState::Floating;
            net.pending_drivers.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with_one() -> (NetArena, NetId) {
        let mut arena = NetArena::new();
        let id = arena.add("T:NODE!").unwrap();
        (arena, id)
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let (mut arena, _) = arena_with_one();
        assert!(arena.add("T:NODE!").is_none());
        assert!(arena.add("T:OTHER!").is_some());
    }

    #[test]
    fn same_driver_twice_is_idempotent() {
        let (mut arena, id) = arena_with_one();
        arena.drive(id, DriverId(0), true);
        arena.drive(id, DriverId(0), true);
        assert_eq!(arena.pending_state(id), LineState::DrivenHigh);
        assert_eq!(arena.pending_drivers(id).len(), 1);

        // Even a contradictory second write from the same driver is ignored.
        arena.drive(id, DriverId(0), false);
        assert_eq!(arena.pending_state(id), LineState::DrivenHigh);
    }

    #[test]
    fn two_drivers_agreeing_share_the_net() {
        let (mut arena, id) = arena_with_one();
        arena.drive(id, DriverId(0), false);
        arena.drive(id, DriverId(1), false);
        arena.commit_all();
        assert_eq!(arena.state(id), LineState::DrivenLow);
        assert_eq!(arena.drivers(id), &[DriverId(0), DriverId(1)]);
    }

    #[test]
    fn two_drivers_disagreeing_conflict() {
        let (mut arena, id) = arena_with_one();
        arena.drive(id, DriverId(0), true);
        arena.drive(id, DriverId(1), false);
        arena.commit_all();
        assert_eq!(arena.state(id), LineState::Conflict);
        assert_eq!(arena.drivers(id), &[DriverId(0), DriverId(1)]);
    }

    #[test]
    fn read_is_true_only_for_driven_high() {
        let (mut arena, id) = arena_with_one();
        assert!(!arena.read(id)); // floating

        arena.drive(id, DriverId(0), true);
        arena.commit_all();
        assert!(arena.read(id));

        arena.drive(id, DriverId(0), false);
        arena.commit_all();
        assert!(!arena.read(id));

        arena.drive(id, DriverId(0), true);
        arena.drive(id, DriverId(1), false);
        arena.commit_all();
        assert_eq!(arena.state(id), LineState::Conflict);
        assert!(!arena.read(id));
    }

    #[test]
    fn commit_clears_the_pending_slot() {
        let (mut arena, id) = arena_with_one();
        arena.drive(id, DriverId(0), true);
        arena.commit_all();
        assert_eq!(arena.pending_state(id), LineState::Floating);
        assert!(arena.pending_drivers(id).is_empty());

        // Nothing drives during the next tick: the net floats again.
        arena.commit_all();
        assert_eq!(arena.state(id), LineState::Floating);
        assert!(arena.drivers(id).is_empty());
    }
}
