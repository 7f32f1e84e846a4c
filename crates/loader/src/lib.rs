// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod netlist;

use anyhow::Context;
use dragonfly_core::backplane::Backplane;
use dragonfly_core::engine::SimulationEngine;
use dragonfly_core::machine::Machine;
use dragonfly_core::net::NetArena;
use dragonfly_core::parts::{Component, Part, PinMap};
use dragonfly_core::SimulationError;
use netlist::NetlistDoc;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Electrically passive footprints that the simulator drops.
pub const IGNORED_FOOTPRINTS: &[&str] = &["TestPoint:TestPoint_Pad_D1.0mm"];

/// Part type names dropped wholesale (decoupling capacitors).
pub const IGNORED_TYPES: &[&str] = &["C"];

/// Module prefix reserved for the backplane itself.
pub const BACKPLANE_PREFIX: &str = "BP";

pub const TABLE_COUNT: usize = 8;
pub const TABLE_SIZE: usize = 32 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("module prefix '{BACKPLANE_PREFIX}' is reserved for the backplane")]
    ReservedPrefix,
    #[error("component name {0} cannot contain ':'")]
    ColonInName(String),
    #[error("network name {0} cannot contain ':'")]
    ColonInNet(String),
    #[error("duplicate network name {0}")]
    DuplicateNet(String),
    #[error("unknown component type {0}")]
    UnknownType(String),
    #[error("bus connector pin {0} is not a backplane position")]
    UnknownBackplanePin(String),
    #[error("no interface connector found")]
    NoInterface,
    #[error("multiple interface connectors found")]
    MultipleInterfaces,
    #[error("microcode table {index} unreadable at {path}: {source}")]
    TableIo {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: table image has wrong size: {size} bytes (expected 32768)")]
    TableSize { path: PathBuf, size: usize },
    #[error("EEPROM {name} references invalid table slot {slot}")]
    InvalidTableSlot { name: String, slot: usize },
    #[error("failed to load table into {name}: {source}")]
    TableLoad {
        name: String,
        #[source]
        source: SimulationError,
    },
    #[error("missing EEPROM tables: {0:?}")]
    MissingTables(Vec<usize>),
}

/// Assemble parsed module netlists into one machine.
///
/// Every component and network name is prefixed with `MODULE:`; networks
/// additionally get the `!` marker of a resolved node. Bus connectors are
/// registered on the shared backplane as they appear, and exactly one
/// external interface must exist across all modules.
pub fn assemble(modules: Vec<(String, NetlistDoc)>) -> Result<Machine, LoaderError> {
    let mut nets = NetArena::new();
    let mut backplane = Backplane::new();
    let mut components: Vec<Component> = Vec::new();
    let mut interface: Option<usize> = None;

    for (prefix, doc) in modules {
        if prefix == BACKPLANE_PREFIX {
            return Err(LoaderError::ReservedPrefix);
        }

        let mut pin_maps: HashMap<String, PinMap> = HashMap::new();
        for net in &doc.nets {
            if net.name.contains(':') {
                return Err(LoaderError::ColonInNet(net.name.clone()));
            }
            let full = format!("{prefix}:{}!", net.name);
            let id = nets
                .add(&full)
                .ok_or_else(|| LoaderError::DuplicateNet(full.clone()))?;
            for (uuid, pin) in &net.terminals {
                pin_maps.entry(uuid.clone()).or_default().insert(pin, id);
            }
        }

        for record in &doc.parts {
            if IGNORED_FOOTPRINTS.contains(&record.footprint.as_str()) {
                continue;
            }
            if IGNORED_TYPES.contains(&record.type_name.as_str()) {
                continue;
            }
            if record.uuid.contains(':') {
                return Err(LoaderError::ColonInName(record.uuid.clone()));
            }

            let pins = pin_maps.remove(&record.uuid).unwrap_or_default();
            let part = Part::from_type_name(&record.type_name, &pins)
                .ok_or_else(|| LoaderError::UnknownType(record.type_name.clone()))?;

            if matches!(part, Part::Interface(_)) {
                if interface.is_some() {
                    return Err(LoaderError::MultipleInterfaces);
                }
                interface = Some(components.len());
            }

            if let Part::BusConnector(connector) = &part {
                for (pin, net) in connector.bindings() {
                    if !backplane.bind(pin, *net) {
                        return Err(LoaderError::UnknownBackplanePin(pin.clone()));
                    }
                }
            }

            components.push(Component::new(format!("{prefix}:{}", record.uuid), part));
        }

        debug!(module = %prefix, "module assembled");
    }

    let interface = interface.ok_or(LoaderError::NoInterface)?;
    info!(
        components = components.len(),
        networks = nets.len(),
        "machine assembled"
    );
    Ok(Machine::new(components, nets, backplane, Some(interface)))
}

/// Read the eight `table{0..7}.bin` EEPROM images from a microcode
/// directory. A missing or truncated file fails naming the slot.
pub fn load_tables(dir: &Path) -> Result<Vec<Vec<u8>>, LoaderError> {
    let mut tables = Vec::with_capacity(TABLE_COUNT);
    for index in 0..TABLE_COUNT {
        let path = dir.join(format!("table{index}.bin"));
        let data = std::fs::read(&path).map_err(|source| LoaderError::TableIo {
            index,
            path: path.clone(),
            source,
        })?;
        if data.len() != TABLE_SIZE {
            return Err(LoaderError::TableSize {
                path,
                size: data.len(),
            });
        }
        tables.push(data);
    }
    Ok(tables)
}

/// Bind the table images, by position, to the EEPROMs whose local names are
/// `TABLE1..TABLE8`. The bound slot set must be exactly 0..=7.
pub fn bind_tables(machine: &mut Machine, tables: &[Vec<u8>]) -> Result<(), LoaderError> {
    let mut bound: BTreeSet<usize> = BTreeSet::new();

    for component in &mut machine.components {
        let name = component.name.clone();
        let slot = component
            .local_name()
            .strip_prefix("TABLE")
            .and_then(|text| text.parse::<usize>().ok());
        let Part::Eeprom(rom) = &mut component.part else {
            continue;
        };
        let Some(slot) = slot else {
            continue;
        };
        if !(1..=TABLE_COUNT).contains(&slot) {
            return Err(LoaderError::InvalidTableSlot { name, slot });
        }

        rom.load_data(&tables[slot - 1], 0)
            .map_err(|source| LoaderError::TableLoad {
                name: name.clone(),
                source,
            })?;
        debug!(eeprom = %name, slot = slot - 1, "table bound");
        bound.insert(slot - 1);
    }

    let expected: BTreeSet<usize> = (0..TABLE_COUNT).collect();
    if bound != expected {
        let missing: Vec<usize> = expected.difference(&bound).copied().collect();
        return Err(LoaderError::MissingTables(missing));
    }
    Ok(())
}

/// Parse and assemble a list of (netlist path, module prefix) pairs.
pub fn load_modules(module_files: &[(PathBuf, String)]) -> anyhow::Result<Machine> {
    let mut parsed = Vec::with_capacity(module_files.len());
    for (path, prefix) in module_files {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read netlist {path:?}"))?;
        let mut doc = netlist::parse(&data)
            .with_context(|| format!("Failed to parse netlist {path:?}"))?;
        netlist::elide_resistors(&mut doc)
            .with_context(|| format!("Failed to elide resistors in {path:?}"))?;
        info!(module = %prefix, path = %path.display(), parts = doc.parts.len(), "netlist parsed");
        parsed.push((prefix.clone(), doc));
    }
    Ok(assemble(parsed)?)
}

/// Full load: modules plus the microcode table images.
pub fn load(module_files: &[(PathBuf, String)], tables_dir: &Path) -> anyhow::Result<Machine> {
    let mut machine = load_modules(module_files)?;
    let tables = load_tables(tables_dir)
        .with_context(|| format!("Failed to load microcode tables from {tables_dir:?}"))?;
    bind_tables(&mut machine, &tables)?;
    Ok(machine)
}

/// Load everything and wrap it into an engine with the program ROM
/// installed on the motherboard.
pub fn load_engine(
    module_files: &[(PathBuf, String)],
    tables_dir: &Path,
    rom: &[u8],
) -> anyhow::Result<SimulationEngine> {
    let machine = load(module_files, tables_dir)?;
    Ok(SimulationEngine::new(machine, rom))
}
