// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::collections::HashMap;

/// Part type names that are folded away as wires to VCC.
pub const RESISTOR_TYPES: &[&str] = &["R", "5kOhm"];

#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    #[error("line {line}: malformed directive: {text}")]
    Malformed { line: usize, text: String },
    #[error("line {line}: component {uuid} defined multiple times")]
    DuplicateComponent { line: usize, uuid: String },
    #[error("line {line}: network {name} defined multiple times")]
    DuplicateNet { line: usize, name: String },
    #[error("line {line}: component {uuid} not defined")]
    UnknownComponent { line: usize, uuid: String },
    #[error("line {line}: terminal before any .ADD_TER")]
    TerminalBeforeNet { line: usize },
    #[error("resistor {uuid} does not have exactly two connections")]
    ResistorShape { uuid: String },
    #[error("resistor {uuid} is not connected to VCC")]
    ResistorNotOnVcc { uuid: String },
}

#[derive(Debug, Clone)]
pub struct PartRecord {
    pub uuid: String,
    pub type_name: String,
    pub footprint: String,
}

#[derive(Debug, Clone)]
pub struct NetRecord {
    pub name: String,
    pub terminals: Vec<(String, String)>,
}

/// Parsed netlist of one module: parts and nets in file order.
#[derive(Debug, Default)]
pub struct NetlistDoc {
    pub parts: Vec<PartRecord>,
    pub nets: Vec<NetRecord>,
    part_index: HashMap<String, usize>,
    net_index: HashMap<String, usize>,
}

impl NetlistDoc {
    pub fn part(&self, uuid: &str) -> Option<&PartRecord> {
        self.part_index.get(uuid).map(|&i| &self.parts[i])
    }

    pub fn net(&self, name: &str) -> Option<&NetRecord> {
        self.net_index.get(name).map(|&i| &self.nets[i])
    }

    fn rebuild_indices(&mut self) {
        self.part_index = self
            .parts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.uuid.clone(), i))
            .collect();
        self.net_index = self
            .nets
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name.clone(), i))
            .collect();
    }
}

/// Split a directive line into tokens: runs of whitespace separate fields,
/// double quotes group one field verbatim (quotes stripped).
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '"' {
                    break;
                }
                token.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }
        tokens.push(token);
    }

    tokens
}

/// Parse the line-oriented netlist format:
///
/// ```text
/// .ADD_COM     <uuid>     "<type>"     "<footprint>"
/// .ADD_TER     <uuid>   <pin>     "<net>"
/// .TER     <uuid>   <pin>
/// ```
///
/// `.TER` (or a bare `<uuid> <pin>` line) appends to the most recently
/// opened net; other dot-directives and blank lines are skipped.
pub fn parse(data: &str) -> Result<NetlistDoc, NetlistError> {
    let mut doc = NetlistDoc::default();
    let mut open_net: Option<usize> = None;

    for (idx, raw) in data.lines().enumerate() {
        let line = idx + 1;
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }

        let tokens = tokenize(text);
        let malformed = || NetlistError::Malformed {
            line,
            text: text.to_string(),
        };

        match tokens[0].as_str() {
            ".ADD_COM" => {
                let [_, uuid, type_name, footprint] = tokens.as_slice() else {
                    return Err(malformed());
                };
                if doc.part_index.contains_key(uuid) {
                    return Err(NetlistError::DuplicateComponent {
                        line,
                        uuid: uuid.clone(),
                    });
                }
                doc.part_index.insert(uuid.clone(), doc.parts.len());
                doc.parts.push(PartRecord {
                    uuid: uuid.clone(),
                    type_name: type_name.clone(),
                    footprint: footprint.clone(),
                });
            }
            ".ADD_TER" => {
                let [_, uuid, pin, net] = tokens.as_slice() else {
                    return Err(malformed());
                };
                if doc.net_index.contains_key(net) {
                    return Err(NetlistError::DuplicateNet {
                        line,
                        name: net.clone(),
                    });
                }
                if !doc.part_index.contains_key(uuid) {
                    return Err(NetlistError::UnknownComponent {
                        line,
                        uuid: uuid.clone(),
                    });
                }
                open_net = Some(doc.nets.len());
                doc.net_index.insert(net.clone(), doc.nets.len());
                doc.nets.push(NetRecord {
                    name: net.clone(),
                    terminals: vec![(uuid.clone(), pin.clone())],
                });
            }
            ".TER" => {
                let [_, uuid, pin] = tokens.as_slice() else {
                    return Err(malformed());
                };
                append_terminal(&mut doc, open_net, line, uuid, pin)?;
            }
            other if other.starts_with('.') => {
                // Other capture directives carry no electrical information.
            }
            _ => {
                let [uuid, pin] = tokens.as_slice() else {
                    return Err(malformed());
                };
                append_terminal(&mut doc, open_net, line, uuid, pin)?;
            }
        }
    }

    Ok(doc)
}

fn append_terminal(
    doc: &mut NetlistDoc,
    open_net: Option<usize>,
    line: usize,
    uuid: &str,
    pin: &str,
) -> Result<(), NetlistError> {
    let Some(net_idx) = open_net else {
        return Err(NetlistError::TerminalBeforeNet { line });
    };
    if !doc.part_index.contains_key(uuid) {
        return Err(NetlistError::UnknownComponent {
            line,
            uuid: uuid.to_string(),
        });
    }
    doc.nets[net_idx]
        .terminals
        .push((uuid.to_string(), pin.to_string()));
    Ok(())
}

/// Fold resistors away: a resistor must have exactly two terminals, one of
/// them on the `VCC` net; the other net is merged into `VCC`. Pull-ups are
/// the only legitimate resistor use on these boards.
pub fn elide_resistors(doc: &mut NetlistDoc) -> Result<(), NetlistError> {
    let resistors: Vec<String> = doc
        .parts
        .iter()
        .filter(|p| RESISTOR_TYPES.contains(&p.type_name.as_str()))
        .map(|p| p.uuid.clone())
        .collect();

    for uuid in resistors {
        let touching: Vec<usize> = doc
            .nets
            .iter()
            .enumerate()
            .filter(|(_, n)| n.terminals.iter().any(|(u, _)| *u == uuid))
            .map(|(i, _)| i)
            .collect();

        if touching.len() != 2 {
            return Err(NetlistError::ResistorShape { uuid });
        }

        let Some(vcc_idx) = touching.iter().copied().find(|&i| doc.nets[i].name == "VCC") else {
            return Err(NetlistError::ResistorNotOnVcc { uuid });
        };
        let other_idx = if touching[0] == vcc_idx {
            touching[1]
        } else {
            touching[0]
        };

        let mut merged = Vec::new();
        for &idx in &[vcc_idx, other_idx] {
            for terminal in &doc.nets[idx].terminals {
                if terminal.0 != uuid {
                    merged.push(terminal.clone());
                }
            }
        }

        doc.nets[vcc_idx].terminals = merged;
        doc.nets.remove(other_idx);
        doc.parts.retain(|p| p.uuid != uuid);
        doc.rebuild_indices();
    }

    Ok(())
}
