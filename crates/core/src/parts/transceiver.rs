// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{PinMap, TickCtx};
use crate::net::Pin;

/// 74245: octal bus transceiver. Active-low chip enable; DIR high transfers
/// A to B, DIR low transfers B to A. No storage, pin-by-pin copy.
#[derive(Debug)]
pub struct Transceiver245 {
    vcc: Pin,
    gnd: Pin,
    n_ce: Pin,
    dir: Pin,
    a: [Pin; 8],
    b: [Pin; 8],
}

impl Transceiver245 {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("20"),
            gnd: p.get("10"),
            n_ce: p.get("19"),
            dir: p.get("1"),
            a: [
                p.get("2"),
                p.get("3"),
                p.get("4"),
                p.get("5"),
                p.get("6"),
                p.get("7"),
                p.get("8"),
                p.get("9"),
            ],
            b: [
                p.get("18"),
                p.get("17"),
                p.get("16"),
                p.get("15"),
                p.get("14"),
                p.get("13"),
                p.get("12"),
                p.get("11"),
            ],
        }
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        if ctx.high(self.n_ce) {
            return;
        }

        let a_to_b = ctx.high(self.dir);
        for i in 0..8 {
            if a_to_b {
                let value = ctx.high(self.a[i]);
                ctx.drive(self.b[i], value);
            } else {
                let value = ctx.high(self.b[i]);
                ctx.drive(self.a[i], value);
            }
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![
            ("VCC".to_string(), self.vcc),
            ("GND".to_string(), self.gnd),
            ("N_CE".to_string(), self.n_ce),
            ("DIR".to_string(), self.dir),
        ];
        for i in 0..8 {
            out.push((format!("A{i}"), self.a[i]));
            out.push((format!("B{i}"), self.b[i]));
        }
        out
    }
}
