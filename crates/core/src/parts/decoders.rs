// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{PinMap, TickCtx};
use crate::net::Pin;

/// 74138: 3-to-8 decoder with active-low outputs.
///
/// Enabled when E2 is high and both N_E0/N_E1 are low; disabled parks every
/// output high.
#[derive(Debug)]
pub struct Decoder138 {
    vcc: Pin,
    gnd: Pin,
    a: [Pin; 3],
    n_e0: Pin,
    n_e1: Pin,
    e2: Pin,
    y: [Pin; 8],
}

impl Decoder138 {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("16"),
            gnd: p.get("8"),
            a: [p.get("1"), p.get("2"), p.get("3")],
            n_e0: p.get("4"),
            n_e1: p.get("5"),
            e2: p.get("6"),
            y: [
                p.get("15"),
                p.get("14"),
                p.get("13"),
                p.get("12"),
                p.get("11"),
                p.get("10"),
                p.get("9"),
                p.get("7"),
            ],
        }
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        let enabled = ctx.high(self.e2) && !ctx.high(self.n_e0) && !ctx.high(self.n_e1);
        if !enabled {
            for pin in self.y {
                ctx.drive(pin, true);
            }
            return;
        }

        let mut idx = 0usize;
        if ctx.high(self.a[2]) {
            idx += 4;
        }
        if ctx.high(self.a[1]) {
            idx += 2;
        }
        if ctx.high(self.a[0]) {
            idx += 1;
        }

        for (i, pin) in self.y.into_iter().enumerate() {
            ctx.drive(pin, i != idx);
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![
            ("VCC".to_string(), self.vcc),
            ("GND".to_string(), self.gnd),
            ("N_E0".to_string(), self.n_e0),
            ("N_E1".to_string(), self.n_e1),
            ("E2".to_string(), self.e2),
        ];
        for i in 0..3 {
            out.push((format!("A{i}"), self.a[i]));
        }
        for i in 0..8 {
            out.push((format!("Y{i}"), self.y[i]));
        }
        out
    }
}

/// 74154: 4-to-16 decoder, dual active-low enables, active-low outputs.
#[derive(Debug)]
pub struct Decoder154 {
    vcc: Pin,
    gnd: Pin,
    a: [Pin; 4],
    n_e0: Pin,
    n_e1: Pin,
    y: [Pin; 16],
}

impl Decoder154 {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("24"),
            gnd: p.get("12"),
            a: [p.get("23"), p.get("22"), p.get("21"), p.get("20")],
            n_e0: p.get("18"),
            n_e1: p.get("19"),
            y: [
                p.get("1"),
                p.get("2"),
                p.get("3"),
                p.get("4"),
                p.get("5"),
                p.get("6"),
                p.get("7"),
                p.get("8"),
                p.get("9"),
                p.get("10"),
                p.get("11"),
                p.get("13"),
                p.get("14"),
                p.get("15"),
                p.get("16"),
                p.get("17"),
            ],
        }
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        let enabled = !ctx.high(self.n_e0) && !ctx.high(self.n_e1);
        if !enabled {
            for pin in self.y {
                ctx.drive(pin, true);
            }
            return;
        }

        let mut idx = 0usize;
        if ctx.high(self.a[3]) {
            idx += 8;
        }
        if ctx.high(self.a[2]) {
            idx += 4;
        }
        if ctx.high(self.a[1]) {
            idx += 2;
        }
        if ctx.high(self.a[0]) {
            idx += 1;
        }

        for (i, pin) in self.y.into_iter().enumerate() {
            ctx.drive(pin, i != idx);
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![
            ("VCC".to_string(), self.vcc),
            ("GND".to_string(), self.gnd),
            ("N_E0".to_string(), self.n_e0),
            ("N_E1".to_string(), self.n_e1),
        ];
        for i in 0..4 {
            out.push((format!("A{i}"), self.a[i]));
        }
        for i in 0..16 {
            out.push((format!("Y{i}"), self.y[i]));
        }
        out
    }
}
