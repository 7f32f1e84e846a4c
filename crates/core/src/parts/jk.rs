// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{PinMap, TickCtx};
use crate::net::Pin;

/// 74109: two J-K' flip-flops, rising-edge clocked, with active-low
/// asynchronous preset (N_S) and clear (N_R).
///
/// Asserting both preset and clear is undefined on the real part; this model
/// resolves it to Q = high. The clock memory is refreshed only on the clocked
/// path: while an async override is held, edges are not consumed.
#[derive(Debug)]
pub struct DualJk {
    vcc: Pin,
    gnd: Pin,
    n_r: [Pin; 2],
    n_s: [Pin; 2],
    clk: [Pin; 2],
    j: [Pin; 2],
    n_k: [Pin; 2],
    q: [Pin; 2],
    n_q: [Pin; 2],
    state: [bool; 2],
    prev_clk: [bool; 2],
}

impl DualJk {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("16"),
            gnd: p.get("8"),
            n_r: [p.get("1"), p.get("15")],
            n_s: [p.get("5"), p.get("11")],
            clk: [p.get("4"), p.get("12")],
            j: [p.get("2"), p.get("14")],
            n_k: [p.get("3"), p.get("13")],
            q: [p.get("6"), p.get("10")],
            n_q: [p.get("7"), p.get("9")],
            state: [false; 2],
            prev_clk: [false; 2],
        }
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        for i in 0..2 {
            let clr = ctx.high(self.n_r[i]);
            let pre = ctx.high(self.n_s[i]);
            let mut next_q = self.state[i];

            if !clr && pre {
                next_q = false;
            } else if clr && !pre {
                next_q = true;
            } else if !clr && !pre {
                next_q = true;
            } else {
                let clk = ctx.high(self.clk[i]);
                if clk && !self.prev_clk[i] {
                    let j = ctx.high(self.j[i]);
                    let nk = ctx.high(self.n_k[i]);
                    next_q = match (j, nk) {
                        (false, true) => self.state[i],
                        (false, false) => false,
                        (true, true) => true,
                        (true, false) => !self.state[i],
                    };
                }
                self.prev_clk[i] = clk;
            }

            self.state[i] = next_q;
            ctx.drive(self.q[i], next_q);
            ctx.drive(self.n_q[i], !next_q);
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![("VCC".to_string(), self.vcc), ("GND".to_string(), self.gnd)];
        for i in 0..2 {
            let n = i + 1;
            out.push((format!("N_R{n}"), self.n_r[i]));
            out.push((format!("N_S{n}"), self.n_s[i]));
            out.push((format!("CLK{n}"), self.clk[i]));
            out.push((format!("J{n}"), self.j[i]));
            out.push((format!("N_K{n}"), self.n_k[i]));
            out.push((format!("Q{n}"), self.q[i]));
            out.push((format!("N_Q{n}"), self.n_q[i]));
        }
        out
    }
}
