//! # Fleet Error Types
//!
//! All errors that can occur in the fleet model.
//!
//! None of these are fatal. The coordinator converts transition and id
//! errors into silent no-ops; only formation, parsing and startup errors
//! reach the caller.

use thiserror::Error;

use crate::robot::{RobotId, RobotStatus};

/// Errors that can occur in the fleet model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FleetError {
    /// A status change violates the robot state machine.
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        /// The robot that rejected the change.
        id: RobotId,
        /// Status before the attempted change.
        from: RobotStatus,
        /// Requested status.
        to: RobotStatus,
    },

    /// A command referenced a robot that is not part of the fleet.
    #[error("unknown robot id: {0}")]
    UnknownId(RobotId),

    /// Formation pattern name not recognized.
    #[error("invalid formation pattern: {0:?}")]
    InvalidFormationPattern(String),

    /// Mission priority name not recognized.
    #[error("invalid mission priority: {0:?}")]
    InvalidPriority(String),

    /// Robot status name not recognized.
    #[error("invalid robot status: {0:?}")]
    InvalidStatus(String),

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The background runtime could not be started.
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Result type for fleet operations.
pub type FleetResult<T> = Result<T, FleetError>;
