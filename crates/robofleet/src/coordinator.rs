//! # Fleet Coordinator
//!
//! The command surface over the shared fleet state.
//!
//! ## Locking
//!
//! ```text
//! command  : state.write()                  -> mutate -> publish snapshot
//! tick     : clock.lock() -> state.write()  -> tick   -> publish snapshot
//! read     : state.read()                   -> stats / snapshot
//! presenter: snapshots.load()               -> Arc<FleetSnapshot> (never waits on a tick)
//! ```
//!
//! Every command and every tick holds the state write lock for its whole
//! duration, so none of them can observe another half-applied. Lock order is
//! always clock before state.
//!
//! Commands are total: ids that do not name a robot are skipped, and
//! transitions the robot model rejects become no-ops. Only an unknown
//! formation pattern or priority name is reported back to the caller.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use robofleet_core::{
    FleetConfig, FleetError, FleetResult, FleetSnapshot, FleetState, FleetStats, FormationPattern,
    FormationPlanner, Mission, Priority, Robot, RobotId, RobotStatus,
};

use crate::clock::{SimulationClock, TickReport};
use crate::events::FleetCommand;
use crate::snapshot::SnapshotCell;
use crate::strategy::AiStrategy;

/// Owns the fleet and serializes every mutation of it.
#[derive(Debug)]
pub struct FleetCoordinator {
    config: FleetConfig,
    planner: FormationPlanner,
    clock: Mutex<SimulationClock>,
    state: RwLock<FleetState>,
    snapshots: SnapshotCell,
}

impl FleetCoordinator {
    /// Validates `config` and spawns the fleet.
    ///
    /// # Errors
    ///
    /// [`FleetError::InvalidConfig`] if the configuration is out of range.
    pub fn new(config: FleetConfig) -> FleetResult<Self> {
        config.validate()?;
        let clock = SimulationClock::new(&config);
        let state = FleetState::spawn(&config);
        Ok(Self::assemble(config, clock, state))
    }

    /// Like [`FleetCoordinator::new`] with a custom AI strategy.
    ///
    /// # Errors
    ///
    /// [`FleetError::InvalidConfig`] if the configuration is out of range.
    pub fn with_strategy(config: FleetConfig, strategy: Box<dyn AiStrategy>) -> FleetResult<Self> {
        config.validate()?;
        let clock = SimulationClock::with_strategy(&config, strategy);
        let state = FleetState::spawn(&config);
        Ok(Self::assemble(config, clock, state))
    }

    /// Takes ownership of an existing fleet instead of spawning one.
    ///
    /// # Errors
    ///
    /// [`FleetError::InvalidConfig`] if the configuration is out of range.
    pub fn from_state(config: FleetConfig, state: FleetState) -> FleetResult<Self> {
        config.validate()?;
        let clock = SimulationClock::new(&config);
        Ok(Self::assemble(config, clock, state))
    }

    fn assemble(config: FleetConfig, clock: SimulationClock, state: FleetState) -> Self {
        let planner = FormationPlanner::new(config.bounds(), config.formation_spacing);
        let snapshots = SnapshotCell::new(state.snapshot());
        Self {
            config,
            planner,
            clock: Mutex::new(clock),
            state: RwLock::new(state),
            snapshots,
        }
    }

    /// Configuration the fleet was created with.
    #[must_use]
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Sets the listed robots `active`.
    ///
    /// Robots with an empty battery or in `error` stay as they are. Does
    /// nothing while emergency mode is set.
    ///
    /// Returns the number of robots whose status changed.
    pub fn activate(&self, ids: &[RobotId]) -> usize {
        let mut state = self.state.write();
        if state.emergency_mode {
            tracing::debug!(requested = ids.len(), "activate ignored during emergency");
            return 0;
        }
        let changed = Self::transition(&mut state, ids, RobotStatus::Active);
        self.publish(&state);
        changed
    }

    /// Sets the listed robots `inactive`.
    ///
    /// Returns the number of robots whose status changed.
    pub fn deactivate(&self, ids: &[RobotId]) -> usize {
        let mut state = self.state.write();
        let changed = Self::transition(&mut state, ids, RobotStatus::Inactive);
        self.publish(&state);
        changed
    }

    fn transition(state: &mut FleetState, ids: &[RobotId], to: RobotStatus) -> usize {
        let mut changed = 0;
        for &id in ids {
            let Some(robot) = state.robot_mut(id) else {
                tracing::trace!(robot = %id, "unknown robot id skipped");
                continue;
            };
            match robot.apply_status(to) {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(err) => tracing::trace!(%err, "transition rejected"),
            }
        }
        changed
    }

    /// Enters emergency mode: stops the clock and forces every `active` or
    /// `patrol` robot to `inactive`.
    ///
    /// Returns the number of robots stopped.
    pub fn emergency_stop(&self) -> usize {
        let mut state = self.state.write();
        state.emergency_mode = true;
        state.is_running = false;
        let stopped = state.force_safe_state();
        tracing::warn!(stopped, tick = state.tick, "EMERGENCY STOP");
        self.publish(&state);
        stopped
    }

    /// Leaves emergency mode. The clock stays stopped until restarted
    /// explicitly.
    ///
    /// Returns false if emergency mode was not set.
    pub fn clear_emergency(&self) -> bool {
        let mut state = self.state.write();
        if !state.emergency_mode {
            return false;
        }
        state.emergency_mode = false;
        tracing::info!(tick = state.tick, "emergency cleared");
        self.publish(&state);
        true
    }

    /// Switches the formation by name.
    ///
    /// # Errors
    ///
    /// [`FleetError::InvalidFormationPattern`] for an unknown name; the
    /// previous formation is kept.
    pub fn set_formation_pattern(&self, name: &str) -> FleetResult<()> {
        let pattern = name.parse::<FormationPattern>().map_err(|err| {
            tracing::warn!(name, "unknown formation pattern");
            err
        })?;
        self.set_formation(pattern);
        Ok(())
    }

    /// Switches the formation and recomputes every robot's slot. Robots move
    /// toward their slots over the following ticks.
    pub fn set_formation(&self, pattern: FormationPattern) {
        let mut state = self.state.write();
        let targets = self.planner.compute(pattern, &state.ids());
        state.set_formation_slots(&targets);
        state.formation = pattern;
        tracing::info!(%pattern, slots = targets.len(), "formation set");
        self.publish(&state);
    }

    /// Gives the listed robots a mission, replacing any previous one.
    ///
    /// Statuses are left untouched.
    ///
    /// Returns the number of robots that received the mission.
    pub fn assign_mission(&self, ids: &[RobotId], text: &str, priority: Priority) -> usize {
        let mission = Mission::new(text, priority);
        let mut state = self.state.write();
        let assigned = state.assign_mission(ids, &mission);
        tracing::info!(assigned, %priority, mission = text, "mission assigned");
        self.publish(&state);
        assigned
    }

    /// [`FleetCoordinator::assign_mission`] with a priority name.
    ///
    /// # Errors
    ///
    /// [`FleetError::InvalidPriority`] for an unknown priority name; no
    /// robot is changed.
    pub fn assign_mission_str(&self, ids: &[RobotId], text: &str, priority: &str) -> FleetResult<usize> {
        let priority = priority.parse::<Priority>()?;
        Ok(self.assign_mission(ids, text, priority))
    }

    /// Removes the mission from the listed robots.
    pub fn clear_mission(&self, ids: &[RobotId]) -> usize {
        let mut state = self.state.write();
        let cleared = state.clear_mission(ids);
        tracing::debug!(cleared, "missions cleared");
        self.publish(&state);
        cleared
    }

    /// Maintenance clear: returns `error`/`maintenance` robots to
    /// `inactive`.
    pub fn clear_fault(&self, ids: &[RobotId]) -> usize {
        let mut state = self.state.write();
        let mut cleared = 0;
        for &id in ids {
            let Some(robot) = state.robot_mut(id) else {
                continue;
            };
            match robot.clear_fault() {
                Ok(()) => cleared += 1,
                Err(err) => tracing::trace!(%err, "fault clear rejected"),
            }
        }
        tracing::debug!(cleared, "faults cleared");
        self.publish(&state);
        cleared
    }

    /// Flips AI adjustments. Returns the new setting.
    pub fn toggle_ai(&self) -> bool {
        let mut state = self.state.write();
        state.ai_enabled = !state.ai_enabled;
        let enabled = state.ai_enabled;
        tracing::info!(enabled, "AI toggled");
        self.publish(&state);
        enabled
    }

    /// Flips the clock. Starting is refused while emergency mode is set.
    ///
    /// Returns whether the clock is running afterwards.
    pub fn toggle_running(&self) -> bool {
        let mut state = self.state.write();
        let running = !state.is_running;
        self.switch_clock(&mut state, running)
    }

    /// Starts or stops the clock. Starting is refused while emergency mode
    /// is set.
    ///
    /// Returns whether the clock is running afterwards.
    pub fn set_running(&self, running: bool) -> bool {
        let mut state = self.state.write();
        self.switch_clock(&mut state, running)
    }

    fn switch_clock(&self, state: &mut FleetState, running: bool) -> bool {
        if running && state.emergency_mode {
            tracing::warn!("cannot start the clock during emergency");
            return state.is_running;
        }
        if state.is_running != running {
            state.is_running = running;
            tracing::info!(running, tick = state.tick, "clock state changed");
            self.publish(state);
        }
        running
    }

    /// Applies one tick to the whole fleet.
    pub fn tick(&self) -> TickReport {
        let mut clock = self.clock.lock();
        let mut state = self.state.write();
        let report = clock.tick(&mut state);
        if report.faults > 0 {
            tracing::warn!(faults = report.faults, tick = report.tick, "robots faulted");
        }
        tracing::trace!(?report, "tick");
        self.publish(&state);
        report
    }

    /// Applies a queued command.
    ///
    /// # Errors
    ///
    /// Only [`FleetCommand::SetFormation`] can fail, with
    /// [`FleetError::InvalidFormationPattern`].
    pub fn apply(&self, command: FleetCommand) -> FleetResult<()> {
        match command {
            FleetCommand::Activate(ids) => {
                self.activate(&ids);
            }
            FleetCommand::Deactivate(ids) => {
                self.deactivate(&ids);
            }
            FleetCommand::EmergencyStop => {
                self.emergency_stop();
            }
            FleetCommand::ClearEmergency => {
                self.clear_emergency();
            }
            FleetCommand::SetFormation(name) => self.set_formation_pattern(&name)?,
            FleetCommand::AssignMission { ids, text, priority } => {
                self.assign_mission(&ids, &text, priority);
            }
            FleetCommand::ClearMission(ids) => {
                self.clear_mission(&ids);
            }
            FleetCommand::ClearFault(ids) => {
                self.clear_fault(&ids);
            }
            FleetCommand::ToggleAi => {
                self.toggle_ai();
            }
            FleetCommand::ToggleRunning => {
                self.toggle_running();
            }
            FleetCommand::SetRunning(running) => {
                self.set_running(running);
            }
        }
        Ok(())
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Statistics computed from the current state.
    #[must_use]
    pub fn fleet_stats(&self) -> FleetStats {
        self.state.read().stats()
    }

    /// Fresh point-in-time copy of the fleet.
    #[must_use]
    pub fn snapshot(&self) -> FleetSnapshot {
        self.state.read().snapshot()
    }

    /// Snapshot published after the last tick or command. Never blocks on
    /// a tick in progress.
    #[must_use]
    pub fn latest_snapshot(&self) -> Arc<FleetSnapshot> {
        self.snapshots.load()
    }

    /// Number of snapshots published so far.
    #[must_use]
    pub fn snapshot_generation(&self) -> u64 {
        self.snapshots.generation()
    }

    /// Copy of one robot.
    #[must_use]
    pub fn robot(&self, id: RobotId) -> Option<Robot> {
        self.state.read().robot(id).cloned()
    }

    /// All robot ids in ascending order.
    #[must_use]
    pub fn robot_ids(&self) -> Vec<RobotId> {
        self.state.read().ids()
    }

    /// Looks up a robot, reporting unknown ids.
    ///
    /// # Errors
    ///
    /// [`FleetError::UnknownId`] if no robot has this id.
    pub fn try_robot(&self, id: RobotId) -> FleetResult<Robot> {
        self.robot(id).ok_or(FleetError::UnknownId(id))
    }

    fn publish(&self, state: &FleetState) {
        self.snapshots.publish(state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robofleet_core::Position;

    fn config(fleet_size: usize) -> FleetConfig {
        FleetConfig {
            fleet_size,
            fault_rate: 0.0,
            ..FleetConfig::default()
        }
    }

    fn coordinator(robots: impl IntoIterator<Item = Robot>) -> FleetCoordinator {
        let state = FleetState::with_robots(robots);
        FleetCoordinator::from_state(config(1), state).unwrap()
    }

    fn robot(id: u32, status: RobotStatus, battery: f32) -> Robot {
        Robot::new(RobotId(id), Position::new(100.0, 100.0), status, battery)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = FleetCoordinator::new(config(0));
        assert!(matches!(result, Err(FleetError::InvalidConfig(_))));
    }

    #[test]
    fn test_activate_skips_empty_battery_and_unknown_ids() {
        let fleet = coordinator([
            robot(1, RobotStatus::Inactive, 50.0),
            robot(2, RobotStatus::Inactive, 0.0),
        ]);
        let changed = fleet.activate(&[RobotId(1), RobotId(2), RobotId(99)]);
        assert_eq!(changed, 1);
        assert_eq!(fleet.robot(RobotId(1)).unwrap().status, RobotStatus::Active);
        assert_eq!(fleet.robot(RobotId(2)).unwrap().status, RobotStatus::Inactive);
    }

    #[test]
    fn test_activate_is_idempotent() {
        let fleet = coordinator([robot(1, RobotStatus::Inactive, 50.0)]);
        assert_eq!(fleet.activate(&[RobotId(1)]), 1);
        let before = fleet.snapshot();
        assert_eq!(fleet.activate(&[RobotId(1)]), 0);
        assert_eq!(fleet.snapshot(), before);
    }

    #[test]
    fn test_emergency_stop_and_recovery() {
        let fleet = coordinator([
            robot(1, RobotStatus::Active, 50.0),
            robot(2, RobotStatus::Patrol, 50.0),
            robot(3, RobotStatus::Charging, 50.0),
        ]);
        assert_eq!(fleet.emergency_stop(), 2);

        let stats = fleet.fleet_stats();
        assert_eq!(stats.counts.active + stats.counts.patrol, 0);
        let snap = fleet.snapshot();
        assert!(snap.emergency_mode);
        assert!(!snap.is_running);

        // Gated while emergency mode is set.
        assert_eq!(fleet.activate(&[RobotId(1)]), 0);
        assert!(!fleet.toggle_running());
        assert!(!fleet.set_running(true));

        assert!(fleet.clear_emergency());
        assert!(!fleet.clear_emergency());
        assert!(!fleet.snapshot().is_running);

        assert!(fleet.set_running(true));
        assert_eq!(fleet.activate(&[RobotId(1)]), 1);
    }

    #[test]
    fn test_invalid_formation_keeps_previous() {
        let fleet = FleetCoordinator::new(config(16)).unwrap();
        fleet.set_formation_pattern("grid").unwrap();
        let before = fleet.snapshot();

        let err = fleet.set_formation_pattern("hexagon").unwrap_err();
        assert_eq!(err, FleetError::InvalidFormationPattern("hexagon".into()));
        assert_eq!(fleet.snapshot(), before);
        assert_eq!(before.formation, FormationPattern::Grid);
    }

    #[test]
    fn test_formation_does_not_move_robots() {
        let fleet = FleetCoordinator::new(config(16)).unwrap();
        let before = fleet.snapshot();
        fleet.set_formation_pattern("circle").unwrap();
        let after = fleet.snapshot();

        for (a, b) in before.robots.iter().zip(&after.robots) {
            assert_eq!(a.position, b.position);
            assert!(b.formation_slot.is_some());
        }

        fleet.set_formation_pattern("none").unwrap();
        assert!(fleet.snapshot().robots.iter().all(|r| r.formation_slot.is_none()));
    }

    #[test]
    fn test_assign_mission_by_name() {
        let fleet = coordinator([
            robot(1, RobotStatus::Inactive, 50.0),
            robot(2, RobotStatus::Active, 50.0),
            robot(3, RobotStatus::Active, 50.0),
        ]);
        let assigned = fleet
            .assign_mission_str(&[RobotId(1), RobotId(2)], "patrol sector 7", "critical")
            .unwrap();
        assert_eq!(assigned, 2);

        let expected = Some(Mission::new("patrol sector 7", Priority::Critical));
        assert_eq!(fleet.robot(RobotId(1)).unwrap().mission, expected);
        assert_eq!(fleet.robot(RobotId(2)).unwrap().mission, expected);
        assert_eq!(fleet.robot(RobotId(3)).unwrap().mission, None);
        // Deferred: no status change.
        assert_eq!(fleet.robot(RobotId(1)).unwrap().status, RobotStatus::Inactive);

        assert!(matches!(
            fleet.assign_mission_str(&[RobotId(3)], "x", "urgent"),
            Err(FleetError::InvalidPriority(_))
        ));
        assert_eq!(fleet.robot(RobotId(3)).unwrap().mission, None);

        assert_eq!(fleet.clear_mission(&[RobotId(1)]), 1);
        assert_eq!(fleet.fleet_stats().queued_missions, 1);
    }

    #[test]
    fn test_clear_fault() {
        let fleet = coordinator([
            robot(1, RobotStatus::Error, 50.0),
            robot(2, RobotStatus::Active, 50.0),
        ]);
        assert_eq!(fleet.activate(&[RobotId(1)]), 0);
        assert_eq!(fleet.clear_fault(&[RobotId(1), RobotId(2)]), 1);
        assert_eq!(fleet.robot(RobotId(1)).unwrap().status, RobotStatus::Inactive);
        assert_eq!(fleet.robot(RobotId(2)).unwrap().status, RobotStatus::Active);
    }

    #[test]
    fn test_snapshots_published_after_mutation() {
        let fleet = coordinator([robot(1, RobotStatus::Active, 50.0)]);
        let generation = fleet.snapshot_generation();

        fleet.tick();
        assert!(fleet.snapshot_generation() > generation);
        assert_eq!(fleet.latest_snapshot().tick, 1);
        assert_eq!(*fleet.latest_snapshot(), fleet.snapshot());
    }

    #[test]
    fn test_apply_commands() {
        let fleet = coordinator([robot(1, RobotStatus::Inactive, 50.0)]);
        fleet.apply(FleetCommand::Activate(vec![RobotId(1)])).unwrap();
        fleet.apply(FleetCommand::ToggleAi).unwrap();
        fleet.apply(FleetCommand::SetRunning(false)).unwrap();
        assert!(fleet.apply(FleetCommand::SetFormation("spiral".into())).is_err());

        let snap = fleet.snapshot();
        assert_eq!(snap.robots[0].status, RobotStatus::Active);
        assert!(snap.ai_enabled);
        assert!(!snap.is_running);
        assert_eq!(fleet.try_robot(RobotId(2)), Err(FleetError::UnknownId(RobotId(2))));
    }
}
