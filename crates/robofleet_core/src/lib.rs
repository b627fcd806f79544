//! # ROBOFLEET Core
//!
//! The fleet model: up to 1,000 simulated robots, each with a position,
//! status, battery and mission, plus the pure planners that act on them.
//!
//! ## Architecture Rules
//!
//! 1. **No threads, no clocks** - time and locking belong to `robofleet`
//! 2. **Validated transitions** - status changes go through [`Robot::apply_status`]
//! 3. **Deterministic** - formations are pure, randomness is seeded
//!
//! ## Example
//!
//! ```rust
//! use robofleet_core::{FleetConfig, FleetState, FormationPattern, FormationPlanner};
//!
//! let config = FleetConfig { fleet_size: 16, ..FleetConfig::default() };
//! let mut state = FleetState::spawn(&config);
//!
//! let planner = FormationPlanner::new(config.bounds(), config.formation_spacing);
//! let targets = planner.compute(FormationPattern::Grid, &state.ids());
//! state.set_formation_slots(&targets);
//! assert_eq!(targets.len(), 16);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod formation;
pub mod geometry;
pub mod mission;
pub mod robot;
pub mod state;

pub use config::{FleetConfig, MAX_FLEET_SIZE};
pub use error::{FleetError, FleetResult};
pub use formation::{FormationPattern, FormationPlanner};
pub use geometry::{Bounds, Position};
pub use robot::{Mission, Priority, Robot, RobotId, RobotStatus, BATTERY_MAX, BATTERY_MIN};
pub use state::{FleetSnapshot, FleetState, FleetStats, StatusCounts};
