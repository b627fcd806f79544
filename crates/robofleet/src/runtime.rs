//! # Fleet Runtime
//!
//! Background thread that drives the simulation clock and applies queued
//! commands.
//!
//! ```text
//!            ┌───────────────────── fleet-clock thread ─────────────────────┐
//! commands ──┤ select!                                                      │
//!            │   recv(commands) -> coordinator.apply(cmd)                   │
//! ticker   ──┤   recv(ticker)   -> coordinator.tick() + TickStats           │
//! shutdown ──┤   recv(shutdown) -> drain commands, exit                     │
//!            └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything happens on one thread, so commands and ticks are applied one
//! at a time in the order they are picked up. Stopping is cooperative: a
//! tick in progress always completes.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;
use robofleet_core::{FleetError, FleetResult};

use crate::clock::TickStats;
use crate::coordinator::FleetCoordinator;
use crate::events::{CommandBus, CommandReceiver, CommandSender, FleetCommand, DEFAULT_COMMAND_CAPACITY};

/// Name of the clock thread.
pub const CLOCK_THREAD_NAME: &str = "fleet-clock";

/// Handle to the running clock thread.
#[derive(Debug)]
pub struct FleetRuntime {
    coordinator: Arc<FleetCoordinator>,
    sender: CommandSender,
    stats: Arc<Mutex<TickStats>>,
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FleetRuntime {
    /// Starts the clock thread with the coordinator's tick interval.
    ///
    /// # Errors
    ///
    /// [`FleetError::Runtime`] if the thread cannot be spawned.
    pub fn start(coordinator: Arc<FleetCoordinator>) -> FleetResult<Self> {
        let bus = CommandBus::new(DEFAULT_COMMAND_CAPACITY);
        let sender = bus.sender();
        let commands = bus.receiver();
        let stats = Arc::new(Mutex::new(TickStats::default()));
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let interval = coordinator.config().tick_interval();

        let worker = ClockWorker {
            coordinator: Arc::clone(&coordinator),
            commands,
            shutdown: shutdown_rx,
            stats: Arc::clone(&stats),
            interval,
        };
        let handle = thread::Builder::new()
            .name(CLOCK_THREAD_NAME.to_string())
            .spawn(move || worker.run())
            .map_err(|err| FleetError::Runtime(format!("failed to spawn {CLOCK_THREAD_NAME}: {err}")))?;

        tracing::info!(interval_ms = interval.as_millis() as u64, "fleet runtime started");

        Ok(Self {
            coordinator,
            sender,
            stats,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Handle for queuing commands.
    #[must_use]
    pub fn sender(&self) -> CommandSender {
        self.sender.clone()
    }

    /// The coordinator being driven.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<FleetCoordinator> {
        &self.coordinator
    }

    /// Tick timing measured so far.
    #[must_use]
    pub fn tick_stats(&self) -> TickStats {
        *self.stats.lock()
    }

    /// Returns true while the clock thread is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the clock thread after it applies the commands already queued.
    pub fn shutdown(&mut self) {
        // Dropping the sender disconnects the shutdown channel.
        drop(self.shutdown.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("fleet-clock thread panicked");
            } else {
                tracing::info!(ticks = self.stats.lock().total_ticks, "fleet runtime stopped");
            }
        }
    }
}

impl Drop for FleetRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct ClockWorker {
    coordinator: Arc<FleetCoordinator>,
    commands: CommandReceiver,
    shutdown: Receiver<()>,
    stats: Arc<Mutex<TickStats>>,
    interval: Duration,
}

impl ClockWorker {
    fn run(self) {
        let ticker = crossbeam_channel::tick(self.interval);
        loop {
            select! {
                recv(self.commands.channel()) -> command => match command {
                    Ok(command) => self.apply(command),
                    Err(_) => break,
                },
                recv(ticker) -> _ => self.tick(),
                recv(self.shutdown) -> _ => break,
            }
        }
        for command in self.commands.drain() {
            self.apply(command);
        }
    }

    fn apply(&self, command: FleetCommand) {
        if let Err(err) = self.coordinator.apply(command) {
            tracing::debug!(%err, "command rejected");
        }
    }

    fn tick(&self) {
        let start = Instant::now();
        let report = self.coordinator.tick();
        if report.skipped {
            return;
        }
        let elapsed = start.elapsed();
        if self.stats.lock().record(elapsed, self.interval) {
            tracing::warn!(
                tick = report.tick,
                elapsed_us = elapsed.as_micros() as u64,
                budget_us = self.interval.as_micros() as u64,
                "late tick"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robofleet_core::{FleetConfig, RobotStatus};

    fn coordinator(tick_interval_ms: u64) -> Arc<FleetCoordinator> {
        let config = FleetConfig {
            fleet_size: 20,
            tick_interval_ms,
            fault_rate: 0.0,
            ..FleetConfig::default()
        };
        Arc::new(FleetCoordinator::new(config).unwrap())
    }

    #[test]
    fn test_queued_commands_applied_before_shutdown() {
        // Long interval: no tick fires during the test.
        let fleet = coordinator(60_000);
        let mut runtime = FleetRuntime::start(Arc::clone(&fleet)).unwrap();
        let tx = runtime.sender();

        assert!(tx.send(FleetCommand::Activate(fleet.robot_ids())));
        assert!(tx.send(FleetCommand::EmergencyStop));
        runtime.shutdown();
        assert!(!runtime.is_alive());

        let stats = fleet.fleet_stats();
        assert_eq!(stats.counts.active + stats.counts.patrol, 0);
        assert!(fleet.snapshot().emergency_mode);
        assert!(fleet
            .snapshot()
            .robots
            .iter()
            .all(|r| r.status != RobotStatus::Active));
    }

    #[test]
    fn test_clock_advances_in_background() {
        let fleet = coordinator(1);
        let mut runtime = FleetRuntime::start(Arc::clone(&fleet)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while fleet.latest_snapshot().tick < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        runtime.shutdown();

        assert!(fleet.snapshot().tick >= 3);
        assert!(runtime.tick_stats().total_ticks >= 3);
    }

    #[test]
    fn test_stopped_clock_does_not_tick() {
        let fleet = coordinator(1);
        fleet.set_running(false);
        let mut runtime = FleetRuntime::start(Arc::clone(&fleet)).unwrap();
        thread::sleep(Duration::from_millis(20));
        runtime.shutdown();

        assert_eq!(fleet.snapshot().tick, 0);
        assert_eq!(runtime.tick_stats().total_ticks, 0);
    }
}
