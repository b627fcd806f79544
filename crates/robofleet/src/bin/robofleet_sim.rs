//! # ROBOFLEET Headless Simulation
//!
//! Runs a scripted session against a live fleet and prints statistics:
//!
//! 1. activate every robot
//! 2. snap to a grid formation
//! 3. hand the first ten robots a critical mission, enable AI
//! 4. emergency stop, clear, resume
//!
//! Usage: `robofleet_sim [config.toml]`. Log level via `RUST_LOG`
//! (default `info`).

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use robofleet::{CommandSender, FleetCommand, FleetCoordinator, FleetRuntime};
use robofleet_core::{FleetConfig, FleetResult, FleetStats, Priority};
use tracing_subscriber::EnvFilter;

/// Ticks to let each phase run for.
const PHASE_TICKS: u32 = 20;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("   ✗ FATAL: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> FleetResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => FleetConfig::load(path)?,
        None => FleetConfig::default(),
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                 ROBOFLEET - HEADLESS SIMULATION                  ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ CONFIGURATION ──────────────────────────────────────────────────┐");
    println!("│ Fleet Size:         {:<45}│", config.fleet_size);
    println!("│ Surface:            {:<45}│", format!("{}x{}", config.width, config.height));
    println!("│ Tick Interval:      {:<45}│", format!("{} ms", config.tick_interval_ms));
    println!("│ Seed:               {:<45}│", format!("{:#x}", config.seed));
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let phase = config.tick_interval() * PHASE_TICKS;
    let fleet = Arc::new(FleetCoordinator::new(config)?);
    let mut runtime = FleetRuntime::start(Arc::clone(&fleet))?;
    let tx = runtime.sender();
    let ids = fleet.robot_ids();

    print_stats("initial", &fleet.fleet_stats());

    step(&tx, phase, FleetCommand::Activate(ids.clone()));
    print_stats("activated", &fleet.fleet_stats());

    step(&tx, phase, FleetCommand::SetFormation("grid".to_string()));
    print_stats("grid formation", &fleet.fleet_stats());

    let tasked = ids.iter().copied().take(10).collect();
    queue(&tx, FleetCommand::AssignMission {
        ids: tasked,
        text: "patrol sector 7".to_string(),
        priority: Priority::Critical,
    });
    step(&tx, phase, FleetCommand::ToggleAi);
    print_stats("critical mission + AI", &fleet.fleet_stats());

    step(&tx, phase, FleetCommand::EmergencyStop);
    print_stats("emergency stop", &fleet.fleet_stats());

    queue(&tx, FleetCommand::ClearEmergency);
    queue(&tx, FleetCommand::SetRunning(true));
    step(&tx, phase, FleetCommand::Activate(ids));
    print_stats("resumed", &fleet.fleet_stats());

    runtime.shutdown();
    let timing = runtime.tick_stats();
    let snapshot = fleet.snapshot();

    println!("┌─ TICK TIMING ────────────────────────────────────────────────────┐");
    println!("│ Ticks:              {:<45}│", snapshot.tick);
    println!("│ Measured:           {:<45}│", timing.total_ticks);
    if timing.total_ticks > 0 {
        println!("│ Min / Avg / Max:    {:<45}│", format!(
            "{} / {} / {} us",
            timing.min_tick_us, timing.avg_tick_us, timing.max_tick_us
        ));
    }
    println!("│ Late Ticks:         {:<45}│", timing.late_ticks);
    println!("└──────────────────────────────────────────────────────────────────┘");
    Ok(())
}

/// Queues a command, then lets the clock run for one phase.
fn step(tx: &CommandSender, phase: Duration, command: FleetCommand) {
    queue(tx, command);
    thread::sleep(phase);
}

/// Queues a command, warning if it was dropped.
fn queue(tx: &CommandSender, command: FleetCommand) -> bool {
    let sent = tx.send(command);
    if !sent {
        tracing::warn!("command dropped");
    }
    sent
}

fn print_stats(label: &str, stats: &FleetStats) {
    let counts = &stats.counts;
    println!("── {label} ──");
    println!(
        "   total {:>4} | active {:>4} | patrol {:>4} | charging {:>4} | inactive {:>4} | maint {:>3} | error {:>3}",
        stats.total_robots,
        counts.active,
        counts.patrol,
        counts.charging,
        counts.inactive,
        counts.maintenance,
        counts.error,
    );
    println!(
        "   battery avg {:>5.1}% | missions active {:>4} / held {:>4}",
        stats.average_battery, stats.active_missions, stats.queued_missions,
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use robofleet::CommandBus;

    #[test]
    fn test_queue_reports_dropped_commands() {
        let bus = CommandBus::new(1);
        let tx = bus.sender();
        assert!(queue(&tx, FleetCommand::ClearEmergency));
        assert!(!queue(&tx, FleetCommand::SetRunning(true)));
    }
}
