// Dragonfly 8b9m - Gate-Level CPU Simulator
// Copyright (C) 2026 Dragonfly Project
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

mod vcd_trace;

use anyhow::Context;
use clap::Parser;
use dragonfly_config::microcode::{ControlBusNames, MicrocodeIndex};
use dragonfly_config::SystemManifest;
use dragonfly_core::log::{LogEntry, LogLevel};
use dragonfly_core::stepper::CycleStepper;
use dragonfly_core::waveform::{Waveform, WaveformChunk};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use vcd_trace::VcdTrace;

const EXIT_PASS: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

#[derive(Parser, Debug)]
#[command(author, version, about = "Dragonfly 8b9m gate-level simulator", long_about = None)]
struct Cli {
    /// Path to the system manifest (YAML)
    #[arg(short, long)]
    system: PathBuf,

    /// Override the program ROM image from the manifest
    #[arg(long)]
    rom: Option<PathBuf>,

    /// Number of CPU clock cycles to run (stops early on halt)
    #[arg(long, default_value = "16")]
    cycles: u64,

    /// Override the clock period (ticks) from the manifest
    #[arg(long)]
    period: Option<u64>,

    /// Write a VCD trace of every tick
    #[arg(long)]
    vcd: Option<PathBuf>,

    /// Write the raw waveform chunks as JSON
    #[arg(long)]
    waveform: Option<PathBuf>,

    /// Echo INFO/OK component messages (warnings and errors always print)
    #[arg(short, long)]
    trace: bool,
}

fn level_color(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "\x1b[34m",
        LogLevel::Ok => "\x1b[32m",
        LogLevel::Warning => "\x1b[33m",
        LogLevel::Error => "\x1b[31m",
    }
}

fn print_log(entry: &LogEntry, verbose: bool) {
    if !verbose && matches!(entry.level, LogLevel::Info | LogLevel::Ok) {
        return;
    }
    println!(
        "{}[{}] {}\x1b[0m",
        level_color(entry.level),
        entry.source,
        entry.message
    );
}

fn report_conflicts(chunk: &WaveformChunk) {
    for (net, drivers) in chunk.conflicts() {
        println!(
            "{}[{net}] Conflict: {drivers:?}\x1b[0m",
            level_color(LogLevel::Error)
        );
    }
}

struct Session {
    engine: dragonfly_core::engine::SimulationEngine,
    stepper: CycleStepper,
    manifest: SystemManifest,
    microcode: Option<MicrocodeIndex>,
    rom_digest: String,
    vcd: Option<VcdTrace<std::io::BufWriter<std::fs::File>>>,
    waveform: Option<Waveform>,
}

fn prepare(cli: &Cli) -> anyhow::Result<Session> {
    let manifest = SystemManifest::from_file(&cli.system)?;
    let base = cli
        .system
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let modules = manifest.resolved_modules(&base);
    let tables_dir = base.join(&manifest.microcode);

    let rom_path = cli.rom.clone().unwrap_or_else(|| base.join(&manifest.rom));
    let rom = std::fs::read(&rom_path)
        .with_context(|| format!("Failed to read ROM image {rom_path:?}"))?;
    let rom_digest: String = Sha256::digest(&rom)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    info!(rom = %rom_path.display(), bytes = rom.len(), sha256 = %rom_digest, "ROM loaded");

    let engine = dragonfly_loader::load_engine(&modules, &tables_dir, &rom)?;

    let microcode = match MicrocodeIndex::from_file(tables_dir.join("table.csv")) {
        Ok(index) => {
            info!(opcodes = index.len(), "opcode table loaded");
            Some(index)
        }
        Err(err) => {
            warn!("No usable opcode table: {err:#}");
            None
        }
    };
    match ControlBusNames::from_file(tables_dir.join("components.json")) {
        Ok(names) => info!(
            readers = names.readers.len(),
            writers = names.writers.len(),
            "control bus names loaded"
        ),
        Err(err) => warn!("No usable control bus names: {err:#}"),
    }

    let stepper = CycleStepper::new(cli.period.unwrap_or(manifest.period))?;

    let component_pins = engine.get_component_pins()?;
    let variable_sizes = engine.get_component_variable_sizes();

    let vcd = match &cli.vcd {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create VCD file {path:?}"))?;
            Some(VcdTrace::new(
                std::io::BufWriter::new(file),
                &component_pins,
                &variable_sizes,
            )?)
        }
        None => None,
    };
    let waveform = cli.waveform.is_some().then(|| Waveform::new(component_pins));

    Ok(Session {
        engine,
        stepper,
        manifest,
        microcode,
        rom_digest,
        vcd,
        waveform,
    })
}

fn execute(cli: &Cli, session: &mut Session) -> anyhow::Result<()> {
    let verbose = cli.trace;

    let mut sink_err = None;
    let mut handle = |chunk: &WaveformChunk,
                      vcd: &mut Option<VcdTrace<std::io::BufWriter<std::fs::File>>>,
                      waveform: &mut Option<Waveform>| {
        for entry in &chunk.logs {
            print_log(entry, verbose);
        }
        report_conflicts(chunk);
        if let Some(trace) = vcd {
            if let Err(err) = trace.record(chunk) {
                sink_err.get_or_insert(err);
            }
        }
        if let Some(wave) = waveform {
            wave.push(chunk.clone());
        }
    };

    let Session {
        engine,
        stepper,
        manifest,
        vcd,
        waveform,
        ..
    } = session;

    stepper.power_on_with(engine, manifest.init_ticks, manifest.startup_ticks, |c| {
        handle(c, vcd, waveform)
    })?;

    let mut halted = false;
    let mut cycles_run = 0;
    for _ in 0..cli.cycles {
        let chunk = stepper.step_with(engine, |c| handle(c, vcd, waveform))?;
        cycles_run += 1;
        if chunk.halt {
            halted = true;
            break;
        }
    }

    drop(handle);
    if let Some(err) = sink_err {
        return Err(err).context("Failed to write VCD trace");
    }

    if let Some(wave) = &session.waveform {
        let path = cli.waveform.as_ref().expect("waveform path");
        wave.to_file(path)?;
        info!(path = %path.display(), chunks = wave.len(), "waveform written");
    }

    let metrics = &session.engine.metrics;
    println!(
        "done: {cycles_run} cycles, {} ticks, {} conflicts, {:.0} ticks/s{}",
        metrics.ticks(),
        metrics.conflicts(),
        metrics.ticks_per_second(),
        if halted { ", CPU halted" } else { "" }
    );
    println!("rom sha256: {}", session.rom_digest);
    if let Some(index) = &session.microcode {
        println!("opcode table: {} opcodes known", index.len());
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.trace {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .init();

    let mut session = match prepare(&cli) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("configuration error: {err:#}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    match execute(&cli, &mut session) {
        Ok(()) => ExitCode::from(EXIT_PASS),
        Err(err) => {
            eprintln!("simulation error: {err:#}");
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}
