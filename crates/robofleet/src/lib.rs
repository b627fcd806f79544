//! # ROBOFLEET
//!
//! Fleet simulation and coordination runtime.
//!
//! ```text
//! ┌──────────────┐ FleetCommand ┌──────────────┐        ┌──────────────────┐
//! │ Presentation │ ───────────> │ FleetRuntime │ ─────> │ FleetCoordinator │
//! │              │              │ (fleet-clock)│  tick  │ RwLock<FleetState│
//! │              │ <─────────── │              │        │ SimulationClock  │
//! └──────────────┘ Arc<Snapshot>└──────────────┘        └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`coordinator`]: command surface, one lock around the fleet
//! - [`clock`]: per-tick rule and tick timing
//! - [`strategy`]: pluggable AI heuristic
//! - [`events`]: command channel
//! - [`snapshot`]: published read-only snapshots
//! - [`runtime`]: background clock thread
//!
//! ## Example
//!
//! ```rust
//! use robofleet::FleetCoordinator;
//! use robofleet_core::{FleetConfig, Priority, RobotStatus};
//!
//! let fleet = FleetCoordinator::new(FleetConfig { fleet_size: 16, ..FleetConfig::default() }).unwrap();
//! let ids = fleet.robot_ids();
//!
//! fleet.activate(&ids);
//! fleet.set_formation_pattern("grid").unwrap();
//! fleet.assign_mission(&ids[..2], "patrol sector 7", Priority::Critical);
//! fleet.tick();
//!
//! fleet.emergency_stop();
//! let stats = fleet.fleet_stats();
//! assert_eq!(stats.counts.get(RobotStatus::Active) + stats.counts.get(RobotStatus::Patrol), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::perf)]

pub mod clock;
pub mod coordinator;
pub mod events;
pub mod runtime;
pub mod snapshot;
pub mod strategy;

pub use clock::{ClockSettings, SimulationClock, TickReport, TickStats};
pub use coordinator::FleetCoordinator;
pub use events::{CommandBus, CommandReceiver, CommandSender, FleetCommand};
pub use runtime::FleetRuntime;
pub use snapshot::SnapshotCell;
pub use strategy::{AiBias, AiStrategy, MissionPriorityStrategy, TickContext, MAX_SPEED_FACTOR};
