//! # AI Strategy
//!
//! Pluggable heuristic applied to moving robots while AI is enabled.
//!
//! A strategy looks at one robot plus the tick context and returns an
//! [`AiBias`]: a speed multiplier and an optional status suggestion. The
//! clock decides whether the suggestion is applied (transition rules and the
//! per-tick adjustment budget still hold).

use std::fmt;

use robofleet_core::{FormationPattern, Priority, Robot, RobotStatus};

/// Tick-scoped information handed to a strategy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickContext {
    /// Tick being applied.
    pub tick: u64,
    /// Active formation pattern.
    pub formation: FormationPattern,
    /// Position of this robot in the mission visit order (0 = first).
    pub rank: usize,
    /// Fleet size.
    pub fleet_size: usize,
    /// Battery level considered low.
    pub low_battery_threshold: f32,
}

/// Largest speed multiplier the clock honours. Larger factors are clamped.
pub const MAX_SPEED_FACTOR: f32 = 4.0;

/// Movement and status bias for one robot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AiBias {
    /// Multiplier on movement speed and wander step, clamped to
    /// `0.0..=MAX_SPEED_FACTOR`.
    pub speed_factor: f32,
    /// Suggested status change.
    pub status: Option<RobotStatus>,
}

impl AiBias {
    /// No speed change, no status change.
    pub const NEUTRAL: Self = Self {
        speed_factor: 1.0,
        status: None,
    };
}

impl Default for AiBias {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// A function from (robot, tick context) to a movement/status bias.
pub trait AiStrategy: Send + fmt::Debug {
    /// Advises on one `active`/`patrol` robot.
    fn advise(&self, robot: &Robot, ctx: &TickContext) -> AiBias;
}

/// Default strategy: serve missions by priority, keep batteries alive.
///
/// - below the low-battery threshold and not on a critical mission: charge
/// - `active` with a mission: switch to `patrol` to execute it
/// - `patrol` without a mission: fall back to `active`
/// - speed grows with mission priority
#[derive(Clone, Copy, Debug, Default)]
pub struct MissionPriorityStrategy;

impl MissionPriorityStrategy {
    /// Speed multiplier for a mission priority.
    #[must_use]
    pub const fn speed_factor(priority: Option<Priority>) -> f32 {
        match priority {
            None | Some(Priority::Low) => 1.0,
            Some(Priority::Medium) => 1.1,
            Some(Priority::High) => 1.25,
            Some(Priority::Critical) => 1.5,
        }
    }
}

impl AiStrategy for MissionPriorityStrategy {
    fn advise(&self, robot: &Robot, ctx: &TickContext) -> AiBias {
        let priority = robot.mission.as_ref().map(|m| m.priority);

        let status = if robot.battery < ctx.low_battery_threshold && priority != Some(Priority::Critical) {
            Some(RobotStatus::Charging)
        } else {
            match (robot.status, priority) {
                (RobotStatus::Active, Some(_)) => Some(RobotStatus::Patrol),
                (RobotStatus::Patrol, None) => Some(RobotStatus::Active),
                _ => None,
            }
        };

        AiBias {
            speed_factor: Self::speed_factor(priority),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robofleet_core::{Mission, Position, RobotId};

    fn ctx() -> TickContext {
        TickContext {
            tick: 0,
            formation: FormationPattern::None,
            rank: 0,
            fleet_size: 1,
            low_battery_threshold: 15.0,
        }
    }

    fn robot(status: RobotStatus, battery: f32, priority: Option<Priority>) -> Robot {
        let mut r = Robot::new(RobotId(1), Position::default(), status, battery);
        r.mission = priority.map(|p| Mission::new("m", p));
        r
    }

    #[test]
    fn test_low_battery_sends_to_charge_unless_critical() {
        let s = MissionPriorityStrategy;
        let low = robot(RobotStatus::Active, 10.0, Some(Priority::High));
        assert_eq!(s.advise(&low, &ctx()).status, Some(RobotStatus::Charging));

        let critical = robot(RobotStatus::Patrol, 10.0, Some(Priority::Critical));
        assert_eq!(s.advise(&critical, &ctx()).status, None);
    }

    #[test]
    fn test_mission_holders_patrol() {
        let s = MissionPriorityStrategy;
        let tasked = robot(RobotStatus::Active, 80.0, Some(Priority::Medium));
        assert_eq!(s.advise(&tasked, &ctx()).status, Some(RobotStatus::Patrol));

        let idle_patrol = robot(RobotStatus::Patrol, 80.0, None);
        assert_eq!(s.advise(&idle_patrol, &ctx()).status, Some(RobotStatus::Active));
    }

    #[test]
    fn test_speed_grows_with_priority() {
        let factors: Vec<f32> = Priority::ALL
            .into_iter()
            .map(|p| MissionPriorityStrategy::speed_factor(Some(p)))
            .collect();
        assert!(factors.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(AiBias::default(), AiBias::NEUTRAL);
    }
}
