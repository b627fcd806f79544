//! # Fleet State
//!
//! The process-wide fleet record and its read-only views.
//!
//! `FleetState` has exactly one logical owner (the coordinator). Robots are
//! created once with a fixed cardinality and mutated in place; nothing in
//! this module can add or remove a robot afterwards.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::FleetConfig;
use crate::formation::FormationPattern;
use crate::geometry::Position;
use crate::mission;
use crate::robot::{Mission, Robot, RobotId, RobotStatus, BATTERY_MAX};

/// Lowest battery level a freshly spawned robot can have.
pub const SPAWN_BATTERY_MIN: f32 = 20.0;

/// Shared fleet state.
#[derive(Clone, Debug)]
pub struct FleetState {
    robots: BTreeMap<RobotId, Robot>,
    /// Whether the simulation clock advances robots.
    pub is_running: bool,
    /// Current formation pattern.
    pub formation: FormationPattern,
    /// Whether AI adjustments are applied during ticks.
    pub ai_enabled: bool,
    /// Fleet-wide safe-state override.
    pub emergency_mode: bool,
    /// Ticks applied since creation.
    pub tick: u64,
}

impl FleetState {
    /// Creates the fleet with randomized positions, status and battery.
    ///
    /// Ids run from 1 to `fleet_size`. Each robot starts `active` or
    /// `inactive` with equal odds. The same seed always produces the same
    /// fleet.
    #[must_use]
    pub fn spawn(config: &FleetConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let bounds = config.bounds();

        let robots = (1..=config.fleet_size as u32).map(|raw| {
            let position = Position::new(
                rng.gen_range(0.0..=bounds.width),
                rng.gen_range(0.0..=bounds.height),
            );
            let status = if rng.gen_bool(0.5) {
                RobotStatus::Active
            } else {
                RobotStatus::Inactive
            };
            let battery = rng.gen_range(SPAWN_BATTERY_MIN..=BATTERY_MAX);
            Robot::new(RobotId(raw), position, status, battery)
        });

        let state = Self::with_robots(robots);
        tracing::info!(
            fleet_size = state.len(),
            seed = config.seed,
            active = state.stats().active_robots,
            "fleet spawned"
        );
        state
    }

    /// Creates a fleet from explicit robots. Later duplicates of an id
    /// replace earlier ones.
    pub fn with_robots(robots: impl IntoIterator<Item = Robot>) -> Self {
        Self {
            robots: robots.into_iter().map(|r| (r.id, r)).collect(),
            is_running: true,
            formation: FormationPattern::None,
            ai_enabled: false,
            emergency_mode: false,
            tick: 0,
        }
    }

    /// Number of robots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.robots.len()
    }

    /// Returns true for an empty fleet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    /// All robot ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<RobotId> {
        self.robots.keys().copied().collect()
    }

    /// Looks up a robot.
    #[must_use]
    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robots.get(&id)
    }

    /// Looks up a robot for in-place mutation.
    pub fn robot_mut(&mut self, id: RobotId) -> Option<&mut Robot> {
        self.robots.get_mut(&id)
    }

    /// Iterates robots in ascending id order.
    pub fn robots(&self) -> impl Iterator<Item = &Robot> {
        self.robots.values()
    }

    /// Iterates robots mutably in ascending id order.
    pub fn robots_mut(&mut self) -> impl Iterator<Item = &mut Robot> {
        self.robots.values_mut()
    }

    /// Sets or replaces the mission on the listed robots.
    pub fn assign_mission(&mut self, ids: &[RobotId], mission: &Mission) -> usize {
        mission::assign(&mut self.robots, ids, mission)
    }

    /// Removes the mission from the listed robots.
    pub fn clear_mission(&mut self, ids: &[RobotId]) -> usize {
        mission::clear(&mut self.robots, ids)
    }

    /// Robots in mission visit order.
    #[must_use]
    pub fn mission_visit_order(&self) -> Vec<RobotId> {
        mission::visit_order(&self.robots)
    }

    /// Replaces every robot's formation slot. Robots missing from
    /// `targets` lose their slot.
    pub fn set_formation_slots(&mut self, targets: &BTreeMap<RobotId, Position>) {
        for (id, robot) in &mut self.robots {
            robot.formation_slot = targets.get(id).copied();
        }
    }

    /// Forces every `active`/`patrol` robot to `inactive`.
    ///
    /// Returns the number of robots stopped.
    pub fn force_safe_state(&mut self) -> usize {
        let mut stopped = 0;
        for robot in self.robots.values_mut() {
            if robot.status.is_draining() && robot.apply_status(RobotStatus::Inactive).is_ok() {
                stopped += 1;
            }
        }
        stopped
    }

    /// Aggregates statistics from the current state.
    #[must_use]
    pub fn stats(&self) -> FleetStats {
        let mut counts = StatusCounts::default();
        let mut total_battery = 0.0_f64;
        let mut active_missions = 0;
        let mut queued_missions = 0;

        for robot in self.robots.values() {
            counts.record(robot.status);
            total_battery += f64::from(robot.battery);
            if robot.mission.is_some() {
                queued_missions += 1;
            }
            if robot.is_executing_mission() {
                active_missions += 1;
            }
        }

        let total_robots = self.robots.len();
        FleetStats {
            total_robots,
            active_robots: counts.active,
            counts,
            total_battery,
            average_battery: if total_robots == 0 {
                0.0
            } else {
                total_battery / total_robots as f64
            },
            active_missions,
            queued_missions,
        }
    }

    /// Point-in-time copy for presentation.
    #[must_use]
    pub fn snapshot(&self) -> FleetSnapshot {
        FleetSnapshot {
            tick: self.tick,
            robots: self.robots.values().cloned().collect(),
            is_running: self.is_running,
            formation: self.formation,
            ai_enabled: self.ai_enabled,
            emergency_mode: self.emergency_mode,
        }
    }
}

/// Robot count per status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Robots `active`.
    pub active: usize,
    /// Robots `charging`.
    pub charging: usize,
    /// Robots on `patrol`.
    pub patrol: usize,
    /// Robots in `maintenance`.
    pub maintenance: usize,
    /// Robots in `error`.
    pub error: usize,
    /// Robots `inactive`.
    pub inactive: usize,
}

impl StatusCounts {
    fn record(&mut self, status: RobotStatus) {
        *self.slot(status) += 1;
    }

    fn slot(&mut self, status: RobotStatus) -> &mut usize {
        match status {
            RobotStatus::Active => &mut self.active,
            RobotStatus::Charging => &mut self.charging,
            RobotStatus::Patrol => &mut self.patrol,
            RobotStatus::Maintenance => &mut self.maintenance,
            RobotStatus::Error => &mut self.error,
            RobotStatus::Inactive => &mut self.inactive,
        }
    }

    /// Count for one status.
    #[must_use]
    pub fn get(&self, status: RobotStatus) -> usize {
        match status {
            RobotStatus::Active => self.active,
            RobotStatus::Charging => self.charging,
            RobotStatus::Patrol => self.patrol,
            RobotStatus::Maintenance => self.maintenance,
            RobotStatus::Error => self.error,
            RobotStatus::Inactive => self.inactive,
        }
    }

    /// Sum over every status.
    #[must_use]
    pub fn total(&self) -> usize {
        RobotStatus::ALL.into_iter().map(|s| self.get(s)).sum()
    }
}

/// Aggregated fleet statistics, computed fresh on every read.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetStats {
    /// Fleet size.
    pub total_robots: usize,
    /// Robots with status `active`.
    pub active_robots: usize,
    /// Robots per status (`counts.active == active_robots`).
    pub counts: StatusCounts,
    /// Sum of all battery levels.
    pub total_battery: f64,
    /// Mean battery level, 0 for an empty fleet.
    pub average_battery: f64,
    /// Robots executing their mission (`active`/`patrol` with a mission).
    pub active_missions: usize,
    /// Robots holding a mission in any status.
    pub queued_missions: usize,
}

impl FleetStats {
    /// Robots in any status other than `active`.
    #[must_use]
    pub fn non_active_robots(&self) -> usize {
        self.counts.total() - self.counts.active
    }
}

/// Read-only copy of the fleet for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// Robots in ascending id order.
    pub robots: Vec<Robot>,
    /// Whether the clock is advancing.
    pub is_running: bool,
    /// Current formation pattern.
    pub formation: FormationPattern,
    /// Whether AI adjustments are on.
    pub ai_enabled: bool,
    /// Whether emergency mode is set.
    pub emergency_mode: bool,
}

impl FleetSnapshot {
    /// Finds a robot by id.
    #[must_use]
    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robots
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|index| &self.robots[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::Priority;

    fn small_config(fleet_size: usize) -> FleetConfig {
        FleetConfig {
            fleet_size,
            ..FleetConfig::default()
        }
    }

    #[test]
    fn test_spawn_is_seeded_and_valid() {
        let a = FleetState::spawn(&small_config(200));
        let b = FleetState::spawn(&small_config(200));
        assert_eq!(a.snapshot(), b.snapshot());

        assert_eq!(a.len(), 200);
        assert_eq!(a.ids().first(), Some(&RobotId(1)));
        assert_eq!(a.ids().last(), Some(&RobotId(200)));

        let bounds = small_config(1).bounds();
        for robot in a.robots() {
            assert!(bounds.contains(robot.position));
            assert!(matches!(robot.status, RobotStatus::Active | RobotStatus::Inactive));
            assert!((SPAWN_BATTERY_MIN..=BATTERY_MAX).contains(&robot.battery));
        }
    }

    #[test]
    fn test_stats_partition_the_fleet() {
        let mut state = FleetState::spawn(&small_config(50));
        state.robot_mut(RobotId(1)).unwrap().status = RobotStatus::Error;
        state.robot_mut(RobotId(2)).unwrap().status = RobotStatus::Maintenance;

        let stats = state.stats();
        assert_eq!(stats.total_robots, 50);
        assert_eq!(stats.active_robots + stats.non_active_robots(), stats.total_robots);
        assert_eq!(stats.counts.error, 1);
        assert_eq!(stats.counts.maintenance, 1);
    }

    #[test]
    fn test_mission_counts() {
        let mut state = FleetState::with_robots([
            Robot::new(RobotId(1), Position::default(), RobotStatus::Active, 50.0),
            Robot::new(RobotId(2), Position::default(), RobotStatus::Inactive, 50.0),
        ]);
        state.assign_mission(&[RobotId(1), RobotId(2)], &Mission::new("sweep", Priority::High));

        let stats = state.stats();
        assert_eq!(stats.queued_missions, 2);
        assert_eq!(stats.active_missions, 1);
        assert!((stats.average_battery - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_force_safe_state() {
        let mut state = FleetState::with_robots([
            Robot::new(RobotId(1), Position::default(), RobotStatus::Active, 50.0),
            Robot::new(RobotId(2), Position::default(), RobotStatus::Patrol, 50.0),
            Robot::new(RobotId(3), Position::default(), RobotStatus::Charging, 50.0),
        ]);
        assert_eq!(state.force_safe_state(), 2);
        let stats = state.stats();
        assert_eq!(stats.counts.active + stats.counts.patrol, 0);
        assert_eq!(stats.counts.charging, 1);
    }

    #[test]
    fn test_snapshot_lookup() {
        let state = FleetState::spawn(&small_config(10));
        let snap = state.snapshot();
        assert_eq!(snap.robot(RobotId(7)).map(|r| r.id), Some(RobotId(7)));
        assert!(snap.robot(RobotId(11)).is_none());
    }
}
