// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use dragonfly_core::net::LineState;
use dragonfly_core::waveform::WaveformChunk;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;
use vcd::{IdCode, TimescaleUnit, Value, VarType};

/// Nanoseconds per tick in the exported timeline.
const TICK_NS: u64 = 15;

/// Streams waveform chunks into a VCD file.
///
/// Networks become 1-bit wires grouped by module scope; exposed component
/// variables become sized registers grouped by component scope. Only value
/// changes are written.
pub struct VcdTrace<W: Write> {
    writer: vcd::Writer<W>,
    nets: BTreeMap<String, IdCode>,
    last_net: HashMap<String, Value>,
    vars: BTreeMap<(String, String), (IdCode, u32)>,
    last_var: HashMap<(String, String), i64>,
}

fn value_of(state: LineState) -> Value {
    match state {
        LineState::DrivenHigh => Value::V1,
        LineState::DrivenLow => Value::V0,
        LineState::Floating => Value::Z,
        LineState::Conflict => Value::X,
    }
}

/// VCD identifiers tolerate most characters, but viewers get confused by
/// scope separators; keep names plain.
fn sanitize(name: &str) -> String {
    name.trim_end_matches('!')
        .chars()
        .map(|c| match c {
            ':' | '/' | ' ' => '_',
            other => other,
        })
        .collect::<String>()
        .trim_start_matches('_')
        .to_string()
}

fn bits(value: i64, width: u32) -> Vec<Value> {
    (0..width)
        .rev()
        .map(|i| {
            if (value >> i) & 1 == 1 {
                Value::V1
            } else {
                Value::V0
            }
        })
        .collect()
}

impl<W: Write> VcdTrace<W> {
    pub fn new(
        sink: W,
        component_pins: &BTreeMap<String, BTreeMap<String, String>>,
        variable_sizes: &BTreeMap<String, BTreeMap<String, u32>>,
    ) -> anyhow::Result<Self> {
        let mut writer = vcd::Writer::new(sink);
        writer.timescale(1, TimescaleUnit::NS)?;

        // Group every referenced network under its module prefix.
        let mut by_module: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for pins in component_pins.values() {
            for net in pins.values() {
                let module = net.split(':').next().unwrap_or("top").to_string();
                by_module.entry(module).or_default().insert(net.clone());
            }
        }

        let mut nets = BTreeMap::new();
        writer.add_module("nets")?;
        for (module, module_nets) in &by_module {
            writer.add_module(&sanitize(module))?;
            for net in module_nets {
                let local = net.split_once(':').map(|(_, l)| l).unwrap_or(net);
                let id = writer.add_var(VarType::Wire, 1, &sanitize(local), None)?;
                nets.insert(net.clone(), id);
            }
            writer.upscope()?;
        }
        writer.upscope()?;

        let mut vars = BTreeMap::new();
        writer.add_module("vars")?;
        for (component, sizes) in variable_sizes {
            writer.add_module(&sanitize(component))?;
            for (variable, width) in sizes {
                let id = writer.add_var(VarType::Reg, *width, variable, None)?;
                vars.insert((component.clone(), variable.clone()), (id, *width));
            }
            writer.upscope()?;
        }
        writer.upscope()?;

        writer.enddefinitions()?;

        Ok(Self {
            writer,
            nets,
            last_net: HashMap::new(),
            vars,
            last_var: HashMap::new(),
        })
    }

    pub fn record(&mut self, chunk: &WaveformChunk) -> anyhow::Result<()> {
        self.writer.timestamp(chunk.tick * TICK_NS)?;

        for (net, id) in &self.nets {
            let Some(state) = chunk.network_states.get(net) else {
                continue;
            };
            let value = value_of(*state);
            if self.last_net.get(net) != Some(&value) {
                self.writer.change_scalar(*id, value)?;
                self.last_net.insert(net.clone(), value);
            }
        }

        for ((component, variable), (id, width)) in &self.vars {
            let Some(value) = chunk
                .variables
                .get(component)
                .and_then(|vars| vars.get(variable))
            else {
                continue;
            };
            let key = (component.clone(), variable.clone());
            if self.last_var.get(&key) != Some(value) {
                self.writer.change_vector(*id, bits(*value, *width))?;
                self.last_var.insert(key, *value);
            }
        }

        Ok(())
    }
}
