//! # Agent Model
//!
//! The per-robot state record and its valid transitions.
//!
//! ## State Machine
//!
//! ```text
//!            ┌──────────┐   battery == 0   ┌──────────┐
//!            │  active  │ ───────────────> │ charging │
//!            │  patrol  │ <─────────────── │          │
//!            └────┬─────┘  battery == 100  └──────────┘
//!                 │        (mission/slot)
//!                 ▼
//!   inactive ◄─► maintenance          any ──► error ──(clear_fault)──► inactive
//! ```
//!
//! Every pair of non-error statuses is mutually reachable, with two guards:
//!
//! - `active`/`patrol` require `battery > 0`.
//! - `error` is reachable from anywhere but only left through
//!   [`Robot::clear_fault`], never through a plain status change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FleetError, FleetResult};
use crate::geometry::Position;

/// Lowest battery level.
pub const BATTERY_MIN: f32 = 0.0;

/// Highest battery level.
pub const BATTERY_MAX: f32 = 100.0;

/// Stable unique robot identifier, assigned at fleet creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RobotId(pub u32);

impl RobotId {
    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "robot-{:04}", self.0)
    }
}

/// Operational status of a robot. Exactly one holds at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotStatus {
    /// Moving and draining battery.
    Active,
    /// Recharging in place.
    Charging,
    /// Executing a patrol; moves and drains like `Active`.
    Patrol,
    /// Parked for service. Does not move.
    Maintenance,
    /// Faulted. Does not move; leaves only via maintenance clear.
    Error,
    /// Idle. Does not move or execute missions.
    Inactive,
}

impl RobotStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 6] = [
        Self::Active,
        Self::Charging,
        Self::Patrol,
        Self::Maintenance,
        Self::Error,
        Self::Inactive,
    ];

    /// Returns true for statuses that move and drain battery.
    #[inline]
    #[must_use]
    pub const fn is_draining(self) -> bool {
        matches!(self, Self::Active | Self::Patrol)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Charging => "charging",
            Self::Patrol => "patrol",
            Self::Maintenance => "maintenance",
            Self::Error => "error",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RobotStatus {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| FleetError::InvalidStatus(s.to_string()))
    }
}

/// Mission priority. Ordered `Low < Medium < High < Critical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Background work.
    Low,
    /// Default priority.
    Medium,
    /// Urgent work.
    High,
    /// Must be served before anything else.
    Critical,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| FleetError::InvalidPriority(s.to_string()))
    }
}

/// A single active task descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    /// Free-form mission text.
    pub text: String,
    /// Mission priority.
    pub priority: Priority,
}

impl Mission {
    /// Creates a new mission.
    #[must_use]
    pub fn new(text: impl Into<String>, priority: Priority) -> Self {
        Self {
            text: text.into(),
            priority,
        }
    }
}

/// One simulated agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    /// Immutable identifier.
    pub id: RobotId,
    /// Current position within the visualization bounds.
    pub position: Position,
    /// Current status.
    pub status: RobotStatus,
    /// Battery level in `[0, 100]`.
    pub battery: f32,
    /// Current mission, if any.
    pub mission: Option<Mission>,
    /// Target position under the active formation pattern.
    pub formation_slot: Option<Position>,
}

impl Robot {
    /// Creates a robot. Battery is clamped into range and a robot without
    /// charge is never created in a draining status.
    #[must_use]
    pub fn new(id: RobotId, position: Position, status: RobotStatus, battery: f32) -> Self {
        let battery = if battery.is_finite() {
            battery.clamp(BATTERY_MIN, BATTERY_MAX)
        } else {
            BATTERY_MIN
        };
        let status = if status.is_draining() && battery <= BATTERY_MIN {
            RobotStatus::Charging
        } else {
            status
        };
        Self {
            id,
            position,
            status,
            battery,
            mission: None,
            formation_slot: None,
        }
    }

    /// Transitions to `to`.
    ///
    /// Returns `Ok(false)` when the robot already has that status.
    ///
    /// # Errors
    ///
    /// [`FleetError::InvalidTransition`] when leaving `error` (use
    /// [`Robot::clear_fault`]) or entering `active`/`patrol` with an empty
    /// battery.
    pub fn apply_status(&mut self, to: RobotStatus) -> FleetResult<bool> {
        let from = self.status;
        if from == to {
            return Ok(false);
        }
        if from == RobotStatus::Error || (to.is_draining() && self.battery <= BATTERY_MIN) {
            return Err(FleetError::InvalidTransition {
                id: self.id,
                from,
                to,
            });
        }
        self.status = to;
        Ok(true)
    }

    /// Maintenance clear: moves an `error` or `maintenance` robot to
    /// `inactive`.
    ///
    /// # Errors
    ///
    /// [`FleetError::InvalidTransition`] for any other status.
    pub fn clear_fault(&mut self) -> FleetResult<()> {
        match self.status {
            RobotStatus::Error | RobotStatus::Maintenance => {
                self.status = RobotStatus::Inactive;
                Ok(())
            }
            from => Err(FleetError::InvalidTransition {
                id: self.id,
                from,
                to: RobotStatus::Inactive,
            }),
        }
    }

    /// Adds `delta` to the battery, clamped to `[0, 100]`.
    ///
    /// Reaching 0 while draining forces `charging`. Reaching 100 while
    /// charging resumes `active` if the robot holds a mission or a
    /// formation slot, otherwise `inactive`.
    ///
    /// Returns the status the robot was moved to, if any.
    pub fn apply_battery_delta(&mut self, delta: f32) -> Option<RobotStatus> {
        if !delta.is_finite() {
            return None;
        }
        self.battery = (self.battery + delta).clamp(BATTERY_MIN, BATTERY_MAX);

        let next = if self.battery <= BATTERY_MIN && self.status.is_draining() {
            RobotStatus::Charging
        } else if self.battery >= BATTERY_MAX && self.status == RobotStatus::Charging {
            if self.mission.is_some() || self.formation_slot.is_some() {
                RobotStatus::Active
            } else {
                RobotStatus::Inactive
            }
        } else {
            return None;
        };
        self.status = next;
        Some(next)
    }

    /// Returns true if the robot is currently executing its mission.
    #[inline]
    #[must_use]
    pub fn is_executing_mission(&self) -> bool {
        self.mission.is_some() && self.status.is_draining()
    }
}
