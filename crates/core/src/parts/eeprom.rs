// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{PinMap, TickCtx};
use crate::net::Pin;
use crate::{SimResult, SimulationError};

const SIZE: usize = 32 * 1024;

/// 28C256-equivalent 32K x 8 EEPROM, used write-protected as a microcode
/// table ROM. Data outputs are released only while N_CS and N_OE are low with
/// N_WE high; a write attempt is reported as an error and otherwise ignored.
pub struct Eeprom {
    vcc: Pin,
    gnd: Pin,
    a: [Pin; 15],
    d: [Pin; 8],
    n_cs: Pin,
    n_oe: Pin,
    n_we: Pin,
    memory: Box<[u8; SIZE]>,
}

impl std::fmt::Debug for Eeprom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Eeprom").finish_non_exhaustive()
    }
}

impl Eeprom {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            vcc: p.get("28"),
            gnd: p.get("14"),
            a: [
                p.get("10"),
                p.get("9"),
                p.get("8"),
                p.get("7"),
                p.get("6"),
                p.get("5"),
                p.get("4"),
                p.get("3"),
                p.get("25"),
                p.get("24"),
                p.get("21"),
                p.get("23"),
                p.get("2"),
                p.get("26"),
                p.get("1"),
            ],
            d: [
                p.get("11"),
                p.get("12"),
                p.get("13"),
                p.get("15"),
                p.get("16"),
                p.get("17"),
                p.get("18"),
                p.get("19"),
            ],
            n_cs: p.get("20"),
            n_oe: p.get("22"),
            n_we: p.get("27"),
            memory: Box::new([0; SIZE]),
        }
    }

    /// Preload contents starting at `offset`. Used by the module loader to
    /// install the microcode table images.
    pub fn load_data(&mut self, data: &[u8], offset: usize) -> SimResult<()> {
        if offset >= SIZE || offset + data.len() > SIZE {
            return Err(SimulationError::EepromImage {
                offset,
                len: data.len(),
            });
        }
        self.memory[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn byte(&self, address: usize) -> u8 {
        self.memory[address & (SIZE - 1)]
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) {
        if !ctx.high(self.vcc) || ctx.high(self.gnd) {
            return;
        }

        if ctx.high(self.n_cs) {
            return;
        }

        if !ctx.high(self.n_we) {
            ctx.error("Write operation is not supported");
            return;
        }

        if !ctx.high(self.n_oe) {
            let mut address = 0usize;
            for (i, pin) in self.a.into_iter().enumerate() {
                if ctx.high(pin) {
                    address |= 1 << i;
                }
            }

            let data = self.memory[address];
            for (i, pin) in self.d.into_iter().enumerate() {
                ctx.drive(pin, data & (1 << i) != 0);
            }
        }
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = vec![
            ("VCC".to_string(), self.vcc),
            ("GND".to_string(), self.gnd),
            ("N_CS".to_string(), self.n_cs),
            ("N_OE".to_string(), self.n_oe),
            ("N_WE".to_string(), self.n_we),
        ];
        for i in 0..15 {
            out.push((format!("A{i}"), self.a[i]));
        }
        for i in 0..8 {
            out.push((format!("D{i}"), self.d[i]));
        }
        out
    }
}
