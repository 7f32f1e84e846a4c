// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{PinMap, TickCtx};
use crate::net::Pin;

/// 74273: octal D flip-flop with active-low master reset, rising-edge
/// clocked, outputs always driven. Exposes variable `Q` (8 bits).
#[derive(Debug)]
pub struct OctalDff273 {
    vcc: Pin,
    gnd: Pin,
    clk: Pin,
    n_mr: Pin,
    d: [Pin; 8],
    q: [Pin; 8],
    state: u8,
    prev_clk: bool,
}

impl OctalDff273 {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("20"),
            gnd: p.get("10"),
            clk: p.get("11"),
            n_mr: p.get("1"),
            d: [
                p.get("3"),
                p.get("4"),
                p.get("7"),
                p.get("8"),
                p.get("13"),
                p.get("14"),
                p.get("17"),
                p.get("18"),
            ],
            q: [
                p.get("2"),
                p.get("5"),
                p.get("6"),
                p.get("9"),
                p.get("12"),
                p.get("15"),
                p.get("16"),
                p.get("19"),
            ],
            state: 0,
            prev_clk: false,
        }
    }

    pub fn value(&self) -> u8 {
        self.state
    }

    pub fn preload(&mut self, value: u8) {
        self.state = value;
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        if !ctx.high(self.n_mr) {
            self.state = 0;
            self.update_outputs(ctx);
            self.prev_clk = ctx.high(self.clk);
            return;
        }

        let clk = ctx.high(self.clk);
        if clk && !self.prev_clk {
            self.state = self.sample_inputs(ctx);
        }

        self.update_outputs(ctx);
        self.prev_clk = clk;
    }

    fn sample_inputs(&self, ctx: &TickCtx) -> u8 {
        let mut val = 0u8;
        for (i, pin) in self.d.into_iter().enumerate() {
            if ctx.high(pin) {
                val |= 1 << i;
            }
        }
        val
    }

    fn update_outputs(&self, ctx: &mut TickCtx) {
        for (i, pin) in self.q.into_iter().enumerate() {
            ctx.drive(pin, self.state & (1 << i) != 0);
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![
            ("VCC".to_string(), self.vcc),
            ("GND".to_string(), self.gnd),
            ("CLK".to_string(), self.clk),
            ("N_MR".to_string(), self.n_mr),
        ];
        for i in 0..8 {
            out.push((format!("D{i}"), self.d[i]));
            out.push((format!("Q{i}"), self.q[i]));
        }
        out
    }
}

/// 74574: octal D flip-flop with tri-state outputs.
///
/// The clock keeps latching regardless of N_OE; outputs are released only
/// while N_OE is low. Exposes variable `Q` (8 bits).
#[derive(Debug)]
pub struct OctalDff574 {
    vcc: Pin,
    gnd: Pin,
    n_oe: Pin,
    clk: Pin,
    d: [Pin; 8],
    q: [Pin; 8],
    state: u8,
    prev_clk: bool,
}

impl OctalDff574 {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("20"),
            gnd: p.get("10"),
            n_oe: p.get("1"),
            clk: p.get("11"),
            d: [
                p.get("2"),
                p.get("3"),
                p.get("4"),
                p.get("5"),
                p.get("6"),
                p.get("7"),
                p.get("8"),
                p.get("9"),
            ],
            q: [
                p.get("19"),
                p.get("18"),
                p.get("17"),
                p.get("16"),
                p.get("15"),
                p.get("14"),
                p.get("13"),
                p.get("12"),
            ],
            state: 0,
            prev_clk: false,
        }
    }

    pub fn value(&self) -> u8 {
        self.state
    }

    pub fn preload(&mut self, value: u8) {
        self.state = value;
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        let clk = ctx.high(self.clk);
        if clk && !self.prev_clk {
            let mut val = 0u8;
            for (i, pin) in self.d.into_iter().enumerate() {
                if ctx.high(pin) {
                    val |= 1 << i;
                }
            }
            self.state = val;
        }
        self.prev_clk = clk;

        // N_OE high: outputs stay high-Z.
        if ctx.high(self.n_oe) {
            return;
        }

        for (i, pin) in self.q.into_iter().enumerate() {
            ctx.drive(pin, self.state & (1 << i) != 0);
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![
            ("VCC".to_string(), self.vcc),
            ("GND".to_string(), self.gnd),
            ("N_OE".to_string(), self.n_oe),
            ("CLK".to_string(), self.clk),
        ];
        for i in 0..8 {
            out.push((format!("D{i}"), self.d[i]));
            out.push((format!("Q{i}"), self.q[i]));
        }
        out
    }
}

/// 74573: transparent octal latch. While LE is high the latch follows the D
/// inputs; N_OE gates the outputs the same way the 74574 does. Exposes
/// variable `Q` (8 bits).
#[derive(Debug)]
pub struct OctalLatch573 {
    vcc: Pin,
    gnd: Pin,
    n_oe: Pin,
    le: Pin,
    d: [Pin; 8],
    q: [Pin; 8],
    state: u8,
}

impl OctalLatch573 {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("20"),
            gnd: p.get("10"),
            n_oe: p.get("1"),
            le: p.get("11"),
            d: [
                p.get("3"),
                p.get("4"),
                p.get("7"),
                p.get("8"),
                p.get("13"),
                p.get("14"),
                p.get("17"),
                p.get("18"),
            ],
            q: [
                p.get("2"),
                p.get("5"),
                p.get("6"),
                p.get("9"),
                p.get("12"),
                p.get("15"),
                p.get("16"),
                p.get("19"),
            ],
            state: 0,
        }
    }

    pub fn value(&self) -> u8 {
        self.state
    }

    pub fn preload(&mut self, value: u8) {
        self.state = value;
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        if ctx.high(self.le) {
            let mut val = 0u8;
            for (i, pin) in self.d.into_iter().enumerate() {
                if ctx.high(pin) {
                    val |= 1 << i;
                }
            }
            self.state = val;
        }

        if ctx.high(self.n_oe) {
            return;
        }

        for (i, pin) in self.q.into_iter().enumerate() {
            ctx.drive(pin, self.state & (1 << i) != 0);
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![
            ("VCC".to_string(), self.vcc),
            ("GND".to_string(), self.gnd),
            ("N_OE".to_string(), self.n_oe),
            ("LE".to_string(), self.le),
        ];
        for i in 0..8 {
            out.push((format!("D{i}"), self.d[i]));
            out.push((format!("Q{i}"), self.q[i]));
        }
        out
    }
}
