//! # Simulation Clock
//!
//! Advances every robot by one discrete time step.
//!
//! ## Per-robot rule (one tick)
//!
//! ```text
//! active / patrol : move (toward formation slot, else bounded random step)
//!                   battery -= drain        (0 => charging)
//!                   maybe fault            (fault_rate)
//!                   AI status suggestion    (if enabled, within budget)
//! charging        : battery += charge       (100 => active | inactive)
//! other           : unchanged
//! ```
//!
//! A tick is a single pass over a `&mut FleetState`. The caller holds the
//! exclusive lock for the whole pass, so no partial tick is ever visible.
//!
//! While `emergency_mode` is set the tick only re-applies the safe-state
//! override. While stopped it does nothing.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use robofleet_core::{Bounds, FleetConfig, FleetState, FormationPattern, Robot, RobotStatus};

use crate::strategy::{AiBias, AiStrategy, MissionPriorityStrategy, TickContext, MAX_SPEED_FACTOR};

/// RNG stream used by the clock, distinct from the spawn stream.
const CLOCK_RNG_STREAM: u64 = 1;

/// Clock tunables taken from [`FleetConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockSettings {
    /// Surface bounds; robots never leave them.
    pub bounds: Bounds,
    /// Battery lost per tick while draining.
    pub battery_drain: f32,
    /// Battery gained per tick while charging.
    pub battery_charge: f32,
    /// Step toward a formation slot.
    pub move_speed: f32,
    /// Maximum random displacement per axis.
    pub wander_step: f32,
    /// Battery level considered low by AI strategies.
    pub low_battery_threshold: f32,
    /// Per-tick fault chance for draining robots.
    pub fault_rate: f64,
    /// Maximum AI status changes per tick.
    pub ai_adjustment_budget: usize,
}

impl From<&FleetConfig> for ClockSettings {
    fn from(config: &FleetConfig) -> Self {
        Self {
            bounds: config.bounds(),
            battery_drain: config.battery_drain_per_tick,
            battery_charge: config.battery_charge_per_tick,
            move_speed: config.move_speed,
            wander_step: config.wander_step,
            low_battery_threshold: config.low_battery_threshold,
            fault_rate: config.fault_rate.clamp(0.0, 1.0),
            ai_adjustment_budget: config.ai_adjustment_budget,
        }
    }
}

/// What one tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick counter after this tick (unchanged if skipped).
    pub tick: u64,
    /// True if the clock was stopped or in emergency mode.
    pub skipped: bool,
    /// Robots that moved.
    pub moved: usize,
    /// Robots that drained battery.
    pub drained: usize,
    /// Robots that charged.
    pub charged: usize,
    /// Status changes of any cause.
    pub status_changes: usize,
    /// Robots that faulted into `error`.
    pub faults: usize,
    /// AI status suggestions applied.
    pub ai_adjustments: usize,
    /// Robots forced to a safe state by emergency mode.
    pub safe_stops: usize,
}

/// The tick engine. Owns the movement RNG and the AI strategy.
#[derive(Debug)]
pub struct SimulationClock {
    settings: ClockSettings,
    rng: ChaCha8Rng,
    strategy: Box<dyn AiStrategy>,
}

impl SimulationClock {
    /// Creates a clock with the default [`MissionPriorityStrategy`].
    #[must_use]
    pub fn new(config: &FleetConfig) -> Self {
        Self::with_strategy(config, Box::new(MissionPriorityStrategy))
    }

    /// Creates a clock with a custom AI strategy.
    #[must_use]
    pub fn with_strategy(config: &FleetConfig, strategy: Box<dyn AiStrategy>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        rng.set_stream(CLOCK_RNG_STREAM);
        Self {
            settings: ClockSettings::from(config),
            rng,
            strategy,
        }
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    /// Applies one tick to `state`.
    pub fn tick(&mut self, state: &mut FleetState) -> TickReport {
        let mut report = TickReport {
            tick: state.tick,
            ..TickReport::default()
        };

        if state.emergency_mode {
            report.safe_stops = state.force_safe_state();
            report.status_changes = report.safe_stops;
            report.skipped = true;
            return report;
        }
        if !state.is_running {
            report.skipped = true;
            return report;
        }

        let ai_enabled = state.ai_enabled;
        let order = if ai_enabled {
            state.mission_visit_order()
        } else {
            state.ids()
        };
        let mut ctx = TickContext {
            tick: state.tick,
            formation: state.formation,
            rank: 0,
            fleet_size: state.len(),
            low_battery_threshold: self.settings.low_battery_threshold,
        };
        let mut budget = if ai_enabled {
            self.settings.ai_adjustment_budget
        } else {
            0
        };

        for (rank, id) in order.into_iter().enumerate() {
            let Some(robot) = state.robot_mut(id) else {
                continue;
            };

            match robot.status {
                RobotStatus::Active | RobotStatus::Patrol => {
                    ctx.rank = rank;
                    let bias = if ai_enabled {
                        self.strategy.advise(robot, &ctx)
                    } else {
                        AiBias::NEUTRAL
                    };

                    self.advance(robot, ctx.formation, bias.speed_factor);
                    report.moved += 1;
                    report.drained += 1;

                    if robot.apply_battery_delta(-self.settings.battery_drain).is_some() {
                        report.status_changes += 1;
                        continue;
                    }

                    if self.settings.fault_rate > 0.0 && self.rng.gen_bool(self.settings.fault_rate) {
                        if robot.apply_status(RobotStatus::Error) == Ok(true) {
                            tracing::debug!(robot = %robot.id, "robot faulted");
                            report.faults += 1;
                            report.status_changes += 1;
                        }
                        continue;
                    }

                    if let Some(next) = bias.status {
                        if budget > 0 && robot.apply_status(next) == Ok(true) {
                            budget -= 1;
                            report.ai_adjustments += 1;
                            report.status_changes += 1;
                        }
                    }
                }
                RobotStatus::Charging => {
                    report.charged += 1;
                    if robot.apply_battery_delta(self.settings.battery_charge).is_some() {
                        report.status_changes += 1;
                    }
                }
                RobotStatus::Maintenance | RobotStatus::Error | RobotStatus::Inactive => {}
            }
        }

        state.tick += 1;
        report.tick = state.tick;
        report
    }

    /// Moves one robot toward its slot, or wanders when there is none.
    fn advance(&mut self, robot: &mut Robot, formation: FormationPattern, speed_factor: f32) {
        let speed_factor = if speed_factor.is_finite() {
            speed_factor.clamp(0.0, MAX_SPEED_FACTOR)
        } else {
            1.0
        };
        let slot = match formation {
            FormationPattern::None => None,
            _ => robot.formation_slot,
        };

        let next = match slot {
            Some(target) => robot
                .position
                .step_toward(target, self.settings.move_speed * speed_factor),
            None => {
                let step = self.settings.wander_step * speed_factor;
                if !step.is_finite() {
                    return;
                }
                let dx = self.rng.gen_range(-step..=step);
                let dy = self.rng.gen_range(-step..=step);
                robot.position.offset(dx, dy)
            }
        };
        robot.position = self.settings.bounds.clamp(next);
    }
}

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickStats {
    /// Minimum tick duration observed.
    pub min_tick_us: u64,
    /// Maximum tick duration observed.
    pub max_tick_us: u64,
    /// Average tick duration (rolling).
    pub avg_tick_us: u64,
    /// Number of late ticks (took longer than the interval).
    pub late_ticks: u64,
    /// Total ticks measured.
    pub total_ticks: u64,
}

impl Default for TickStats {
    fn default() -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: 0,
            late_ticks: 0,
            total_ticks: 0,
        }
    }
}

impl TickStats {
    /// Records one tick's duration against the interval budget.
    ///
    /// Returns true if the tick was late.
    pub fn record(&mut self, duration: Duration, budget: Duration) -> bool {
        let duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        self.min_tick_us = self.min_tick_us.min(duration_us);
        self.max_tick_us = self.max_tick_us.max(duration_us);
        self.avg_tick_us = if self.total_ticks == 0 {
            duration_us
        } else {
            (self.avg_tick_us.saturating_mul(15).saturating_add(duration_us)) / 16
        };
        self.total_ticks += 1;

        let late = duration > budget;
        if late {
            self.late_ticks += 1;
        }
        late
    }
}
