// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{PinMap, TickCtx};
use crate::net::Pin;

/// 7400: four independent 2-input NAND gates.
#[derive(Debug)]
pub struct NandQuad {
    vcc: Pin,
    gnd: Pin,
    a: [Pin; 4],
    b: [Pin; 4],
    y: [Pin; 4],
}

impl NandQuad {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("14"),
            gnd: p.get("7"),
            a: [p.get("1"), p.get("4"), p.get("9"), p.get("12")],
            b: [p.get("2"), p.get("5"), p.get("10"), p.get("13")],
            y: [p.get("3"), p.get("6"), p.get("8"), p.get("11")],
        }
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        for i in 0..4 {
            let out = !(ctx.high(self.a[i]) && ctx.high(self.b[i]));
            ctx.drive(self.y[i], out);
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![("VCC".to_string(), self.vcc), ("GND".to_string(), self.gnd)];
        for i in 0..4 {
            out.push((format!("A{}", i + 1), self.a[i]));
            out.push((format!("B{}", i + 1), self.b[i]));
            out.push((format!("Y{}", i + 1), self.y[i]));
        }
        out
    }
}

/// 7402: four independent 2-input NOR gates.
#[derive(Debug)]
pub struct NorQuad {
    vcc: Pin,
    gnd: Pin,
    a: [Pin; 4],
    b: [Pin; 4],
    y: [Pin; 4],
}

impl NorQuad {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("14"),
            gnd: p.get("7"),
            a: [p.get("2"), p.get("5"), p.get("8"), p.get("11")],
            b: [p.get("3"), p.get("6"), p.get("9"), p.get("12")],
            y: [p.get("1"), p.get("4"), p.get("10"), p.get("13")],
        }
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        for i in 0..4 {
            let out = !(ctx.high(self.a[i]) || ctx.high(self.b[i]));
            ctx.drive(self.y[i], out);
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![("VCC".to_string(), self.vcc), ("GND".to_string(), self.gnd)];
        for i in 0..4 {
            out.push((format!("A{}", i + 1), self.a[i]));
            out.push((format!("B{}", i + 1), self.b[i]));
            out.push((format!("Y{}", i + 1), self.y[i]));
        }
        out
    }
}

/// 7404: six inverters.
#[derive(Debug)]
pub struct HexInverter {
    vcc: Pin,
    gnd: Pin,
    a: [Pin; 6],
    y: [Pin; 6],
}

impl HexInverter {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("14"),
            gnd: p.get("7"),
            a: [
                p.get("1"),
                p.get("3"),
                p.get("5"),
                p.get("9"),
                p.get("11"),
                p.get("13"),
            ],
            y: [
                p.get("2"),
                p.get("4"),
                p.get("6"),
                p.get("8"),
                p.get("10"),
                p.get("12"),
            ],
        }
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        for i in 0..6 {
            let out = !ctx.high(self.a[i]);
            ctx.drive(self.y[i], out);
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![("VCC".to_string(), self.vcc), ("GND".to_string(), self.gnd)];
        for i in 0..6 {
            out.push((format!("A{}", i + 1), self.a[i]));
            out.push((format!("Y{}", i + 1), self.y[i]));
        }
        out
    }
}
