// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{PinMap, TickCtx};
use crate::net::Pin;

/// 74161: synchronous 4-bit counter.
///
/// Active-low master reset takes precedence over everything, active-low
/// parallel load wins over counting on the rising edge, counting requires
/// CEP and CET. TC is high while the count sits at 15 with CET high.
#[derive(Debug)]
pub struct Counter161 {
    vcc: Pin,
    gnd: Pin,
    clk: Pin,
    n_mr: Pin,
    n_pe: Pin,
    cet: Pin,
    cep: Pin,
    tc: Pin,
    d: [Pin; 4],
    q: [Pin; 4],
    count: u8,
    prev_clk: bool,
}

impl Counter161 {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("16"),
            gnd: p.get("8"),
            clk: p.get("2"),
            n_mr: p.get("1"),
            n_pe: p.get("9"),
            cet: p.get("10"),
            cep: p.get("7"),
            tc: p.get("15"),
            d: [p.get("3"), p.get("4"), p.get("5"), p.get("6")],
            q: [p.get("14"), p.get("13"), p.get("12"), p.get("11")],
            count: 0,
            prev_clk: false,
        }
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        if !ctx.high(self.n_mr) {
            self.count = 0;
            self.update_outputs(ctx);
            return;
        }

        let clk = ctx.high(self.clk);
        if clk && !self.prev_clk {
            if !ctx.high(self.n_pe) {
                let mut val = 0u8;
                for (i, pin) in self.d.into_iter().enumerate() {
                    if ctx.high(pin) {
                        val |= 1 << i;
                    }
                }
                self.count = val;
            } else if ctx.high(self.cep) && ctx.high(self.cet) {
                self.count = (self.count + 1) & 0x0F;
            }
        }

        self.update_outputs(ctx);

        let tc = self.count == 15 && ctx.high(self.cet);
        ctx.drive(self.tc, tc);

        self.prev_clk = clk;
    }

    fn update_outputs(&self, ctx: &mut TickCtx) {
        for (i, pin) in self.q.into_iter().enumerate() {
            ctx.drive(pin, self.count & (1 << i) != 0);
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![
            ("VCC".to_string(), self.vcc),
            ("GND".to_string(), self.gnd),
            ("CLK".to_string(), self.clk),
            ("N_MR".to_string(), self.n_mr),
            ("N_PE".to_string(), self.n_pe),
            ("CET".to_string(), self.cet),
            ("CEP".to_string(), self.cep),
            ("TC".to_string(), self.tc),
        ];
        for i in 0..4 {
            out.push((format!("D{i}"), self.d[i]));
            out.push((format!("Q{i}"), self.q[i]));
        }
        out
    }
}

/// 74193: 4-bit up/down counter with separate count-up and count-down clock
/// inputs, asynchronous master reset (active high) and active-low parallel
/// load. Borrow (N_TCD) and carry (N_TCU) pulse low on under/overflow.
///
/// Exposes its count as variable `Q` (4 bits); the program counter modules
/// are built from four of these.
#[derive(Debug)]
pub struct UpDown193 {
    vcc: Pin,
    gnd: Pin,
    p: [Pin; 4],
    mr: Pin,
    n_tcd: Pin,
    n_tcu: Pin,
    n_pl: Pin,
    q: [Pin; 4],
    cp_up: Pin,
    cp_dn: Pin,
    value: u8,
    prev_up: bool,
    prev_down: bool,
}

impl UpDown193 {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("16"),
            gnd: p.get("8"),
            p: [p.get("15"), p.get("1"), p.get("10"), p.get("9")],
            mr: p.get("14"),
            n_tcd: p.get("13"),
            n_tcu: p.get("12"),
            n_pl: p.get("11"),
            q: [p.get("3"), p.get("2"), p.get("6"), p.get("7")],
            cp_up: p.get("5"),
            cp_dn: p.get("4"),
            value: 0,
            prev_up: false,
            prev_down: false,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn preload(&mut self, value: u8) {
        self.value = value & 0x0F;
    }

    fn parallel_input(&self, ctx: &TickCtx) -> u8 {
        let mut val = 0u8;
        for (i, pin) in self.p.into_iter().enumerate() {
            if ctx.high(pin) {
                val |= 1 << i;
            }
        }
        val
    }

    fn apply(&mut self, ctx: &mut TickCtx, value: i32) {
        self.value = (value & 0x0F) as u8;
        for (i, pin) in self.q.into_iter().enumerate() {
            ctx.drive(pin, self.value & (1 << i) != 0);
        }
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        if ctx.high(self.mr) {
            self.apply(ctx, 0);
            return;
        }

        if !ctx.high(self.n_pl) {
            let input = self.parallel_input(ctx) as i32;
            self.apply(ctx, input);
            return;
        }

        let up = ctx.high(self.cp_up);
        let down = ctx.high(self.cp_dn);

        let mut value = self.value as i32;
        if up && !self.prev_up {
            value += 1;
        }
        if down && !self.prev_down {
            value -= 1;
        }

        ctx.drive(self.n_tcu, value <= 15);
        ctx.drive(self.n_tcd, value >= 0);

        self.apply(ctx, value);
        self.prev_up = up;
        self.prev_down = down;
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![
            ("VCC".to_string(), self.vcc),
            ("GND".to_string(), self.gnd),
            ("MR".to_string(), self.mr),
            ("N_TCD".to_string(), self.n_tcd),
            ("N_TCU".to_string(), self.n_tcu),
            ("N_PL".to_string(), self.n_pl),
            ("CPU".to_string(), self.cp_up),
            ("CPD".to_string(), self.cp_dn),
        ];
        for i in 0..4 {
            out.push((format!("P{i}"), self.p[i]));
            out.push((format!("Q{i}"), self.q[i]));
        }
        out
    }
}
