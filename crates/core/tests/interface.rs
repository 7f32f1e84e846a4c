// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

mod common;

use common::Rig;
use dragonfly_core::log::LogLevel;
use dragonfly_core::net::LineState;
use dragonfly_core::parts::Part;
use dragonfly_core::SimulationError;

fn interface_rig() -> Rig {
    let mut pins = vec![
        ("2", "NCLK"),
        ("12", "NMEMWRITE"),
        ("13", "NMEMREAD"),
        ("14", "NHALT"),
        ("15", "NWAIT"),
        ("16", "INTREQ"),
        ("17", "NINTACK"),
        ("18", "RESETOUT"),
    ];
    let addr_pins = [
        "22", "23", "24", "25", "26", "27", "28", "29", "30", "31", "32", "33", "34", "35", "36",
        "37",
    ];
    let addr_names: Vec<String> = (0..16).map(|i| format!("A{i}")).collect();
    for i in 0..16 {
        pins.push((addr_pins[i], addr_names[i].as_str()));
    }
    let data_pins = ["4", "5", "6", "7", "8", "9", "10", "11"];
    let data_names: Vec<String> = (0..8).map(|i| format!("D{i}")).collect();
    for i in 0..8 {
        pins.push((data_pins[i], data_names[i].as_str()));
    }
    Rig::build(&[("PAD", "Conn_02x19_Counter_Clockwise", &pins)])
}

fn set_clock(rig: &mut Rig, value: bool) {
    match rig.part_mut("PAD") {
        Part::Interface(iface) => iface.set_clock(value),
        _ => unreachable!(),
    }
}

fn feed_address(rig: &mut Rig, address: u16) {
    for i in 0..16 {
        rig.feed(&format!("A{i}"), address & (1 << i) != 0);
    }
}

#[test]
fn rom_read_lands_on_the_data_pins_after_the_falling_edge() {
    let mut rig = interface_rig();
    let mut rom = vec![0u8; 3];
    rom[2] = 0xA5;
    {
        let mut logs = dragonfly_core::log::LogSink::new();
        rig.board.set_rom(&rom, &mut logs);
    }

    feed_address(&mut rig, 0x0002);
    rig.feed("NMEMREAD", false);
    rig.feed("NMEMWRITE", true);
    rig.settle(2);

    // Clock high, then low: the transaction happens on the falling edge.
    set_clock(&mut rig, true);
    rig.tick();
    set_clock(&mut rig, false);
    rig.tick();

    assert_eq!(rig.bus("D", 8), 0xA5);

    // The byte stays driven on subsequent ticks until the next falling edge.
    rig.tick();
    rig.tick();
    assert_eq!(rig.bus("D", 8), 0xA5);
}

#[test]
fn memory_write_reaches_the_motherboard() {
    let mut rig = interface_rig();
    feed_address(&mut rig, 0x4010);
    for i in 0..8 {
        rig.feed(&format!("D{i}"), 0x5Au8 & (1 << i) != 0);
    }
    rig.feed("NMEMREAD", true);
    rig.feed("NMEMWRITE", false);
    rig.settle(2);

    set_clock(&mut rig, true);
    rig.tick();
    set_clock(&mut rig, false);
    rig.tick();

    use dragonfly_core::board::MemoryBus;
    assert_eq!(rig.board.read(0x4010).unwrap(), 0x5A);
}

#[test]
fn both_strobes_warn_and_do_nothing() {
    let mut rig = interface_rig();
    feed_address(&mut rig, 0x4000);
    rig.feed("NMEMREAD", false);
    rig.feed("NMEMWRITE", false);
    rig.settle(2);
    rig.logs.drain();

    set_clock(&mut rig, true);
    rig.tick();
    set_clock(&mut rig, false);
    rig.tick();

    let entries = rig.logs.drain();
    assert!(entries
        .iter()
        .any(|e| e.level == LogLevel::Warning && e.message.contains("MEMREAD and MEMWRITE")));
    assert_eq!(rig.state("D0"), LineState::Floating);
}

#[test]
fn out_of_range_access_escapes_the_tick() {
    let mut rig = interface_rig();
    feed_address(&mut rig, 0x3000);
    rig.feed("NMEMREAD", false);
    rig.feed("NMEMWRITE", true);
    rig.settle(2);

    set_clock(&mut rig, true);
    rig.tick();
    set_clock(&mut rig, false);
    let err = rig.try_tick().unwrap_err();
    assert!(matches!(err, SimulationError::InvalidAddress(0x3000)));
}

#[test]
fn control_lines_follow_the_external_flags() {
    let mut rig = interface_rig();
    rig.settle(1);

    // Defaults: reset low, wait inactive (N_WAIT high), clock low (N_CLK
    // high), interrupt request released low.
    assert_eq!(rig.state("RESETOUT"), LineState::DrivenLow);
    assert_eq!(rig.state("NWAIT"), LineState::DrivenHigh);
    assert_eq!(rig.state("NCLK"), LineState::DrivenHigh);
    assert_eq!(rig.state("INTREQ"), LineState::DrivenLow);

    match rig.part_mut("PAD") {
        Part::Interface(iface) => {
            iface.set_reset(true);
            iface.set_wait(true);
            iface.set_clock(true);
        }
        _ => unreachable!(),
    }
    rig.settle(1);
    assert_eq!(rig.state("RESETOUT"), LineState::DrivenHigh);
    assert_eq!(rig.state("NWAIT"), LineState::DrivenLow);
    assert_eq!(rig.state("NCLK"), LineState::DrivenLow);
}

#[test]
fn variable_surface_accepts_clock_reset_wait() {
    let mut rig = interface_rig();
    let part = rig.part_mut("PAD");
    assert!(part.set_variable("CLOCK", 1));
    assert!(part.set_variable("RESET", 1));
    assert!(part.set_variable("WAIT", 0));
    assert!(!part.set_variable("Q", 3));

    rig.settle(1);
    assert_eq!(rig.state("RESETOUT"), LineState::DrivenHigh);
    assert_eq!(rig.state("NCLK"), LineState::DrivenLow);
}
