// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::net::{DriverId, LineState, NetArena, NetId};

const PINS_PER_SIDE: usize = 82;
const PIN_COUNT: usize = PINS_PER_SIDE * 2;

/// Power rails, driven high while the backplane is powered.
const VCC_PINS: &[&str] = &[
    "A1", "A2", "A3", "A4", "A5", "B1", "B2", "B3", "B4", "B5",
];

/// Ground rails, driven low while the backplane is powered.
const GND_PINS: &[&str] = &[
    "A12", "A13", "A23", "A32", "A41", "A50", "A59", "A63", "A64", "A65", "A66", "A70", "A71",
    "A72", "A73", "A74", "A75", "A76", "B12", "B13", "B23", "B32", "B41", "B50", "B59", "B62",
    "B63", "B64", "B65", "B66", "B67", "B68", "B69", "B70", "B71", "B72", "B75", "B76",
];

/// The passive bus joining all modules.
///
/// Every `BusConnector` pin registers its local network here, keyed by the
/// backplane position (A1..A82, B1..B82). After all components of a tick
/// have run, [`Backplane::propagate`] drives the power rails and folds the
/// pending states of all networks bound to the same position into one
/// bus-wide state.
#[derive(Debug)]
pub struct Backplane {
    pins: Vec<Vec<NetId>>,
    power: bool,
}

impl Default for Backplane {
    fn default() -> Self {
        Self::new()
    }
}

impl Backplane {
    pub fn new() -> Self {
        Self {
            pins: vec![Vec::new(); PIN_COUNT],
            power: false,
        }
    }

    /// Index of a backplane position; `None` for anything that is not
    /// A1..A82 / B1..B82.
    fn pin_index(pin: &str) -> Option<usize> {
        let side = pin.get(..1)?;
        let number: usize = pin.get(1..)?.parse().ok()?;
        if !(1..=PINS_PER_SIDE).contains(&number) {
            return None;
        }
        match side {
            "A" => Some(number - 1),
            "B" => Some(PINS_PER_SIDE + number - 1),
            _ => None,
        }
    }

    /// Register one connector pin. Returns false for an unknown position.
    pub fn bind(&mut self, pin: &str, net: NetId) -> bool {
        match Self::pin_index(pin) {
            Some(idx) => {
                self.pins[idx].push(net);
                true
            }
            None => false,
        }
    }

    pub fn set_power(&mut self, on: bool) {
        self.power = on;
    }

    pub fn powered(&self) -> bool {
        self.power
    }

    /// Drive the rails and synchronize every backplane position.
    ///
    /// Merge rule, per position: floating if every bound net floats; a driven
    /// level iff all non-floating nets agree on it and the union of pending
    /// drivers has exactly one member; conflict otherwise. The merged state
    /// and driver union overwrite the pending slot of every bound net, which
    /// makes a re-run of the merge a no-op.
    pub fn propagate(&self, nets: &mut NetArena, driver: DriverId) {
        for pin in VCC_PINS {
            if let Some(idx) = Self::pin_index(pin) {
                for &net in &self.pins[idx] {
                    nets.drive(net, driver, self.power);
                }
            }
        }

        for pin in GND_PINS {
            if let Some(idx) = Self::pin_index(pin) {
                for &net in &self.pins[idx] {
                    nets.drive(net, driver, !self.power);
                }
            }
        }

        for bound in &self.pins {
            if bound.is_empty() {
                continue;
            }

            let mut merged = LineState::Floating;
            let mut drivers: Vec<DriverId> = Vec::new();

            for &net in bound {
                for &d in nets.pending_drivers(net) {
                    if !drivers.contains(&d) {
                        drivers.push(d);
                    }
                }

                let state = nets.pending_state(net);
                merged = match (merged, state) {
                    (m, LineState::Floating) => m,
                    (LineState::Floating, s) => s,
                    (m, s) if m == s => m,
                    _ => LineState::Conflict,
                };
            }

            if matches!(merged, LineState::DrivenHigh | LineState::DrivenLow)
                && drivers.len() != 1
            {
                merged = LineState::Conflict;
            }

            for &net in bound {
                nets.set_pending(net, merged, drivers.clone());
            }
        }
    }
}
