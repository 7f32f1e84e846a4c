// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{PinMap, TickCtx};
use crate::net::{NetArena, Pin};
use crate::SimResult;

bitflags::bitflags! {
    /// Active-low strobe lines of the external connector, sampled from the
    /// committed net states. A set bit means the line is asserted (not high).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StrobeLines: u8 {
        const HALT = 0x1;
        const INTACK = 0x2;
        const MEMREAD = 0x4;
        const MEMWRITE = 0x8;
    }
}

/// The single external-interface connector of the CPU.
///
/// Bridges the gate-level world to the motherboard: on the falling edge of
/// the externally scheduled clock it samples the address and data buses and
/// performs one memory transaction through the memory bus; the byte returned
/// by a read is driven onto the data pins until the next falling edge.
///
/// The edge is detected against the stored clock sample and the externally
/// scheduled next level, before the sample is updated.
#[derive(Debug)]
pub struct Interface {
    address: [Pin; 16],
    data: [Pin; 8],
    intreq: Pin,
    reset_out: Pin,
    n_clk: Pin,
    n_halt: Pin,
    n_intack: Pin,
    n_memread: Pin,
    n_memwrite: Pin,
    n_wait: Pin,
    gnd: [Pin; 6],

    reset: bool,
    wait: bool,
    clock: bool,
    clock_new: bool,
    data_out: Option<u8>,
}

impl Interface {
    pub fn wire(p: &PinMap) -> Self {
        Self {
            address: [
                p.get("22"),
                p.get("23"),
                p.get("24"),
                p.get("25"),
                p.get("26"),
                p.get("27"),
                p.get("28"),
                p.get("29"),
                p.get("30"),
                p.get("31"),
                p.get("32"),
                p.get("33"),
                p.get("34"),
                p.get("35"),
                p.get("36"),
                p.get("37"),
            ],
            data: [
                p.get("4"),
                p.get("5"),
                p.get("6"),
                p.get("7"),
                p.get("8"),
                p.get("9"),
                p.get("10"),
                p.get("11"),
            ],
            intreq: p.get("16"),
            reset_out: p.get("18"),
            n_clk: p.get("2"),
            n_halt: p.get("14"),
            n_intack: p.get("17"),
            n_memread: p.get("13"),
            n_memwrite: p.get("12"),
            n_wait: p.get("15"),
            gnd: [
                p.get("1"),
                p.get("3"),
                p.get("19"),
                p.get("20"),
                p.get("21"),
                p.get("38"),
            ],
            reset: false,
            wait: false,
            clock: false,
            clock_new: false,
            data_out: None,
        }
    }

    pub fn set_clock(&mut self, value: bool) {
        self.clock_new = value;
    }

    pub fn set_wait(&mut self, value: bool) {
        self.wait = value;
    }

    pub fn set_reset(&mut self, value: bool) {
        self.reset = value;
    }

    pub fn clock(&self) -> bool {
        self.clock
    }

    pub fn wait(&self) -> bool {
        self.wait
    }

    pub fn reset(&self) -> bool {
        self.reset
    }

    pub fn set_variable(&mut self, variable: &str, value: bool) -> bool {
        match variable {
            "CLOCK" => self.set_clock(value),
            "RESET" => self.set_reset(value),
            "WAIT" => self.set_wait(value),
            _ => return false,
        }
        true
    }

    /// True while the CPU holds N_HALT asserted.
    pub fn halted(&self, nets: &NetArena) -> bool {
        !self
            .n_halt
            .map(|id| nets.read(id))
            .unwrap_or(false)
    }

    pub fn strobes(&self, nets: &NetArena) -> StrobeLines {
        let asserted = |pin: Pin| !pin.map(|id| nets.read(id)).unwrap_or(false);
        let mut lines = StrobeLines::empty();
        lines.set(StrobeLines::HALT, asserted(self.n_halt));
        lines.set(StrobeLines::INTACK, asserted(self.n_intack));
        lines.set(StrobeLines::MEMREAD, asserted(self.n_memread));
        lines.set(StrobeLines::MEMWRITE, asserted(self.n_memwrite));
        lines
    }

    fn bus_address(&self, ctx: &TickCtx) -> u16 {
        let mut addr = 0u16;
        for (i, pin) in self.address.into_iter().enumerate() {
            if ctx.high(pin) {
                addr |= 1 << i;
            }
        }
        addr
    }

    fn bus_data(&self, ctx: &TickCtx) -> u8 {
        let mut value = 0u8;
        for (i, pin) in self.data.into_iter().enumerate() {
            if ctx.high(pin) {
                value |= 1 << i;
            }
        }
        value
    }

    pub fn propagate(&mut self, ctx: &mut TickCtx) -> SimResult<()> {
        // Falling edge of the external clock: run the memory transaction.
        if self.clock && !self.clock_new {
            self.data_out = None;

            let read = !ctx.high(self.n_memread);
            let write = !ctx.high(self.n_memwrite);

            if read && write {
                ctx.warn("Both MEMREAD and MEMWRITE are active, ignoring");
            } else if write {
                let address = self.bus_address(ctx);
                let value = self.bus_data(ctx);
                ctx.info(format!("Write {value:#04x} to {address:#06x}"));
                ctx.memory.write(address, value)?;
            } else if read {
                let address = self.bus_address(ctx);
                let value = ctx.memory.read(address)?;
                ctx.info(format!("Read {value:#04x} from {address:#06x}"));
                self.data_out = Some(value);
            }
        }

        if let Some(value) = self.data_out {
            for (i, pin) in self.data.into_iter().enumerate() {
                ctx.drive(pin, value & (1 << i) != 0);
            }
        }

        // Interrupts are not serviced yet; the request line stays released.
        ctx.drive(self.intreq, false);

        ctx.drive(self.reset_out, self.reset);
        ctx.drive(self.n_wait, !self.wait);
        ctx.drive(self.n_clk, !self.clock_new);
        self.clock = self.clock_new;

        Ok(())
    }

    pub fn pinout(&self) -> Vec<(String, Pin)> {
        let mut out = Vec::new();
        for i in 0..16 {
            out.push((format!("ADDRESS{i}"), self.address[i]));
        }
        for i in 0..8 {
            out.push((format!("DATA{i}"), self.data[i]));
        }
        out.push(("INTREQ".to_string(), self.intreq));
        out.push(("RESET".to_string(), self.reset_out));
        out.push(("N_CLK".to_string(), self.n_clk));
        out.push(("N_HALT".to_string(), self.n_halt));
        out.push(("N_INTACK".to_string(), self.n_intack));
        out.push(("N_MEMREAD".to_string(), self.n_memread));
        out.push(("N_MEMWRITE".to_string(), self.n_memwrite));
        out.push(("N_WAIT".to_string(), self.n_wait));
        for i in 0..6 {
            out.push((format!("GND{i}"), self.gnd[i]));
        }
        out
    }
}
