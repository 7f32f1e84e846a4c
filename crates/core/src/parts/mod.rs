// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod alu;
pub mod busconnector;
pub mod counters;
pub mod decoders;
pub mod eeprom;
pub mod gates;
pub mod interface;
pub mod jk;
pub mod latches;
pub mod transceiver;

use crate::board::MemoryBus;
use crate::log::LogSink;
use crate::net::{DriverId, NetArena, NetId, Pin};
use crate::SimResult;
use std::collections::HashMap;

pub use alu::Alu181;
pub use busconnector::BusConnector;
pub use counters::{Counter161, UpDown193};
pub use decoders::{Decoder138, Decoder154};
pub use eeprom::Eeprom;
pub use gates::{HexInverter, NandQuad, NorQuad};
pub use interface::{Interface, StrobeLines};
pub use jk::DualJk;
pub use latches::{OctalDff273, OctalDff574, OctalLatch573};
pub use transceiver::Transceiver245;

/// Physical-pin to network bindings of one part, as produced by the netlist.
/// Keys are pin numbers in their schematic spelling ("1" .. "28").
#[derive(Debug, Default, Clone)]
pub struct PinMap {
    bindings: HashMap<String, NetId>,
}

impl PinMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pin: &str, net: NetId) {
        self.bindings.insert(pin.to_string(), net);
    }

    pub fn get(&self, pin: &str) -> Pin {
        self.bindings.get(pin).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NetId)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Per-sweep view handed to a part's `propagate`.
///
/// Reads go to the committed side of the arena, writes to the pending side,
/// so iteration order of parts within a tick cannot leak between them.
pub struct TickCtx<'a> {
    pub(crate) nets: &'a mut NetArena,
    pub(crate) driver: DriverId,
    pub(crate) source: &'a str,
    pub(crate) logs: &'a mut LogSink,
    pub(crate) memory: &'a mut dyn MemoryBus,
}

impl TickCtx<'_> {
    pub fn high(&self, pin: Pin) -> bool {
        pin.map(|id| self.nets.read(id)).unwrap_or(false)
    }

    pub fn floating(&self, pin: Pin) -> bool {
        pin.map(|id| self.nets.is_floating(id)).unwrap_or(true)
    }

    pub fn drive(&mut self, pin: Pin, value: bool) {
        if let Some(id) = pin {
            self.nets.drive(id, self.driver, value);
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.logs.info(self.source, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.logs.warn(self.source, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.logs.error(self.source, message);
    }
}

/// The closed universe of parts the netlists may instantiate.
///
/// Direct variant dispatch keeps the per-tick propagate loop free of vtable
/// indirection; persistent state (counter values, latched bytes, EEPROM
/// contents) lives inside the variant records.
#[derive(Debug)]
pub enum Part {
    NandQuad(NandQuad),
    NorQuad(NorQuad),
    HexInverter(HexInverter),
    DualJk(DualJk),
    Decoder138(Decoder138),
    Decoder154(Decoder154),
    Counter161(Counter161),
    UpDown193(UpDown193),
    Transceiver245(Transceiver245),
    OctalDff273(OctalDff273),
    OctalDff574(OctalDff574),
    OctalLatch573(OctalLatch573),
    Alu181(Alu181),
    Eeprom(Eeprom),
    BusConnector(BusConnector),
    Interface(Interface),
}

impl Part {
    /// Instantiate a part from its netlist type name, as found in `.ADD_COM`
    /// records. Both LS and HC family spellings are accepted.
    pub fn from_type_name(type_name: &str, pins: &PinMap) -> Option<Part> {
        let part = match type_name {
            "74LS00" | "74HC00" => Part::NandQuad(NandQuad::wire(pins)),
            "74LS02" | "74HC02" => Part::NorQuad(NorQuad::wire(pins)),
            "74LS04" | "74HC04" => Part::HexInverter(HexInverter::wire(pins)),
            "74LS109" | "74HC109" => Part::DualJk(DualJk::wire(pins)),
            "74LS138" | "74HC138" => Part::Decoder138(Decoder138::wire(pins)),
            "74LS154" | "74HC154" => Part::Decoder154(Decoder154::wire(pins)),
            "74LS161" | "74HC161" => Part::Counter161(Counter161::wire(pins)),
            "74LS181" | "74HC181" => Part::Alu181(Alu181::wire(pins)),
            "74LS193" | "74HC193" => Part::UpDown193(UpDown193::wire(pins)),
            "74LS245" | "74HC245" => Part::Transceiver245(Transceiver245::wire(pins)),
            "74LS273" | "74HC273" => Part::OctalDff273(OctalDff273::wire(pins)),
            "74LS573" | "74HC573" => Part::OctalLatch573(OctalLatch573::wire(pins)),
            "74LS574" | "74HC574" => Part::OctalDff574(OctalDff574::wire(pins)),
            "28C256" => Part::Eeprom(Eeprom::wire(pins)),
            "BusConnector" => Part::BusConnector(BusConnector::wire(pins)),
            "Conn_02x19_Counter_Clockwise" => Part::Interface(Interface::wire(pins)),
            _ => return None,
        };
        Some(part)
    }

    /// One combinational sweep. Only the interface can fail, and only with a
    /// memory-bus error; everything else a part has to say goes through the
    /// chunk log sink.
    pub fn propagate(&mut self, ctx: &mut TickCtx) -> SimResult<()> {
        match self {
            Part::NandQuad(p) => p.propagate(ctx),
            Part::NorQuad(p) => p.propagate(ctx),
            Part::HexInverter(p) => p.propagate(ctx),
            Part::DualJk(p) => p.propagate(ctx),
            Part::Decoder138(p) => p.propagate(ctx),
            Part::Decoder154(p) => p.propagate(ctx),
            Part::Counter161(p) => p.propagate(ctx),
            Part::UpDown193(p) => p.propagate(ctx),
            Part::Transceiver245(p) => p.propagate(ctx),
            Part::OctalDff273(p) => p.propagate(ctx),
            Part::OctalDff574(p) => p.propagate(ctx),
            Part::OctalLatch573(p) => p.propagate(ctx),
            Part::Alu181(p) => p.propagate(ctx),
            Part::Eeprom(p) => p.propagate(ctx),
            Part::BusConnector(_) => {}
            Part::Interface(p) => return p.propagate(ctx),
        }
        Ok(())
    }

    /// Named variables exposed through the waveform chunk.
    pub fn variables(&self) -> Vec<(&'static str, i64)> {
        match self {
            Part::UpDown193(p) => vec![("Q", p.value() as i64)],
            Part::OctalDff273(p) => vec![("Q", p.value() as i64)],
            Part::OctalDff574(p) => vec![("Q", p.value() as i64)],
            Part::OctalLatch573(p) => vec![("Q", p.value() as i64)],
            _ => Vec::new(),
        }
    }

    /// Bit widths of the exposed variables, for waveform register setup.
    pub fn variable_sizes(&self) -> Vec<(&'static str, u32)> {
        match self {
            Part::UpDown193(_) => vec![("Q", 4)],
            Part::OctalDff273(_) | Part::OctalDff574(_) | Part::OctalLatch573(_) => {
                vec![("Q", 8)]
            }
            _ => Vec::new(),
        }
    }

    /// Write a named variable from the outside. Returns false when the part
    /// has no such variable.
    pub fn set_variable(&mut self, variable: &str, value: i64) -> bool {
        match self {
            Part::UpDown193(p) if variable == "Q" => {
                p.preload((value & 0x0F) as u8);
                true
            }
            Part::OctalDff273(p) if variable == "Q" => {
                p.preload((value & 0xFF) as u8);
                true
            }
            Part::OctalDff574(p) if variable == "Q" => {
                p.preload((value & 0xFF) as u8);
                true
            }
            Part::OctalLatch573(p) if variable == "Q" => {
                p.preload((value & 0xFF) as u8);
                true
            }
            Part::Interface(p) => p.set_variable(variable, value != 0),
            _ => false,
        }
    }

    /// Pin aliases for the observation surface, in declaration order.
    pub fn pinout(&self) -> Vec<(String, Pin)> {
        match self {
            Part::NandQuad(p) => p.pinout(),
            Part::NorQuad(p) => p.pinout(),
            Part::HexInverter(p) => p.pinout(),
            Part::DualJk(p) => p.pinout(),
            Part::Decoder138(p) => p.pinout(),
            Part::Decoder154(p) => p.pinout(),
            Part::Counter161(p) => p.pinout(),
            Part::UpDown193(p) => p.pinout(),
            Part::Transceiver245(p) => p.pinout(),
            Part::OctalDff273(p) => p.pinout(),
            Part::OctalDff574(p) => p.pinout(),
            Part::OctalLatch573(p) => p.pinout(),
            Part::Alu181(p) => p.pinout(),
            Part::Eeprom(p) => p.pinout(),
            Part::BusConnector(p) => p.pinout(),
            Part::Interface(p) => p.pinout(),
        }
    }
}

/// A placed part: namespaced name plus its variant record.
#[derive(Debug)]
pub struct Component {
    pub name: String,
    pub part: Part,
}

impl Component {
    pub fn new(name: impl Into<String>, part: Part) -> Self {
        Self {
            name: name.into(),
            part,
        }
    }

    /// Local name without the module prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }
}
