// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

mod common;

use common::Rig;
use dragonfly_core::engine::SimulationEngine;
use dragonfly_core::net::LineState;
use dragonfly_core::parts::StrobeLines;
use dragonfly_core::stepper::CycleStepper;

const ROM_SIZE: usize = 10 * 1024;

/// An interface whose halt line is strapped to a backplane ground rail, plus
/// a NAND powered from the rails.
fn strapped_machine(halt_strapped: bool) -> Rig {
    let mut rig = Rig::build(&[
        (
            "PAD",
            "Conn_02x19_Counter_Clockwise",
            &[
                ("2", "NCLK"),
                ("12", "NMEMWRITE"),
                ("13", "NMEMREAD"),
                ("14", "NHALT"),
                ("15", "NWAIT"),
                ("16", "INTREQ"),
                ("18", "RESETOUT"),
            ],
        ),
        (
            "U1",
            "74LS00",
            &[
                ("14", "VCC"),
                ("7", "GND"),
                ("1", "A1"),
                ("2", "B1"),
                ("3", "Y1"),
            ],
        ),
    ]);
    let vcc = rig.net("VCC");
    let gnd = rig.net("GND");
    assert!(rig.machine.backplane.bind("A1", vcc));
    assert!(rig.machine.backplane.bind("A12", gnd));
    // N_HALT is strapped to a ground rail (asserted) or a power rail
    // (released); floating would read as asserted.
    let halt = rig.net("NHALT");
    if halt_strapped {
        assert!(rig.machine.backplane.bind("A13", halt));
    } else {
        assert!(rig.machine.backplane.bind("A2", halt));
    }
    rig
}

#[test]
fn step_runs_period_plus_settle_ticks_and_ends_clock_high() {
    let rig = strapped_machine(false);
    let mut engine = SimulationEngine::new(rig.machine, &vec![0u8; ROM_SIZE]);
    engine.set_power(true);

    let stepper = CycleStepper::new(8).unwrap();
    let chunk = stepper.step(&mut engine).unwrap();

    assert_eq!(engine.metrics.ticks(), 9); // 4 low + 1 settle + 4 high
    assert!(chunk.clock);
    // The interface inverts the scheduled clock onto N_CLK.
    assert_eq!(chunk.network_states["T:NCLK!"], LineState::DrivenLow);

    let chunk = stepper.step(&mut engine).unwrap();
    assert_eq!(engine.metrics.ticks(), 18);
    assert!(chunk.clock);
}

#[test]
fn power_on_holds_reset_then_releases_it() {
    let rig = strapped_machine(false);
    let mut engine = SimulationEngine::new(rig.machine, &vec![0u8; ROM_SIZE]);

    let stepper = CycleStepper::new(8).unwrap();
    let chunk = stepper.power_on(&mut engine, 6, 4).unwrap();

    assert_eq!(engine.metrics.ticks(), 10);
    assert!(!chunk.reset);
    assert_eq!(chunk.network_states["T:VCC!"], LineState::DrivenHigh);
    assert_eq!(chunk.network_states["T:RESETOUT!"], LineState::DrivenLow);
}

#[test]
fn run_until_halt_stops_on_the_halt_strobe() {
    let rig = strapped_machine(true);
    let mut engine = SimulationEngine::new(rig.machine, &vec![0u8; ROM_SIZE]);
    engine.set_power(true);

    let stepper = CycleStepper::new(4).unwrap();
    let (chunk, cycles) = stepper.run_until_halt(&mut engine, 10).unwrap();

    // N_HALT is strapped to ground, so the very first cycle reports halt.
    assert_eq!(cycles, 1);
    assert!(chunk.halt);
    assert!(engine.strobes().contains(StrobeLines::HALT));
}

#[test]
fn run_until_halt_respects_the_cycle_budget() {
    let rig = strapped_machine(false);
    let mut engine = SimulationEngine::new(rig.machine, &vec![0u8; ROM_SIZE]);
    engine.set_power(true);

    let stepper = CycleStepper::new(4).unwrap();
    let (chunk, cycles) = stepper.run_until_halt(&mut engine, 3).unwrap();

    assert_eq!(cycles, 3);
    // N_HALT rides a power rail here, so the CPU never reports halt.
    assert!(!chunk.halt);
}
