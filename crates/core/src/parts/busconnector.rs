// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::PinMap;
use crate::net::{NetId, Pin};

/// Edge connector bridging a module's local networks onto the backplane.
///
/// The part itself is inert during propagation: the loader registers every
/// binding with the backplane, and the backplane performs the bus-wide merge
/// after all components have run. Pin names are backplane positions
/// (A1..A82, B1..B82).
#[derive(Debug)]
pub struct BusConnector {
    bindings: Vec<(String, NetId)>,
}

impl BusConnector {
    pub fn wire(p: &PinMap) -> Self {
        let mut bindings: Vec<(String, NetId)> = p
            .iter()
            .map(|(pin, net)| (pin.to_string(), net))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        Self { bindings }
    }

    pub fn bindings(&self) -> &[(String, NetId)] {
        &self.bindings
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        self.bindings
            .iter()
            .map(|(pin, net)| (pin.clone(), Some(*net)))
            .collect()
    }
}
