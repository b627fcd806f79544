//! # Mission Queue
//!
//! Per-robot mission assignment with priority semantics.
//!
//! A robot holds at most one mission. A new assignment overwrites the
//! previous one. Assigning to an `inactive` or `error` robot is accepted
//! but never changes its status: the mission waits until the robot is
//! activated independently.
//!
//! Priority only affects the order in which the simulation clock visits
//! robots for AI adjustments (see [`visit_order`]).

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::robot::{Mission, Robot, RobotId};

/// Sets or replaces the mission on every listed robot.
///
/// Unknown ids are skipped. Returns the number of robots updated.
pub fn assign(robots: &mut BTreeMap<RobotId, Robot>, ids: &[RobotId], mission: &Mission) -> usize {
    let mut assigned = 0;
    for id in ids {
        if let Some(robot) = robots.get_mut(id) {
            robot.mission = Some(mission.clone());
            assigned += 1;
        }
    }
    assigned
}

/// Removes the mission from every listed robot.
///
/// Returns the number of robots that actually held one.
pub fn clear(robots: &mut BTreeMap<RobotId, Robot>, ids: &[RobotId]) -> usize {
    let mut cleared = 0;
    for id in ids {
        if let Some(robot) = robots.get_mut(id) {
            if robot.mission.take().is_some() {
                cleared += 1;
            }
        }
    }
    cleared
}

/// Order in which robots are visited for mission-driven adjustments.
///
/// `critical > high > medium > low`, ties by ascending id. Robots without a
/// mission come last, also by ascending id.
#[must_use]
pub fn visit_order(robots: &BTreeMap<RobotId, Robot>) -> Vec<RobotId> {
    let mut order: Vec<(Reverse<Option<_>>, RobotId)> = robots
        .values()
        .map(|robot| (Reverse(robot.mission.as_ref().map(|m| m.priority)), robot.id))
        .collect();
    order.sort_unstable();
    order.into_iter().map(|(_, id)| id).collect()
}
