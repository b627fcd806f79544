//! # Fleet Command Channel
//!
//! Fire-and-forget commands from the presentation layer to the runtime.
//!
//! ```text
//! ┌──────────────┐  FleetCommand  ┌─────────────┐  apply  ┌─────────────┐
//! │ Presentation │ ─────────────> │   Runtime   │ ──────> │ Coordinator │
//! │   (panels)   │   (channel)    │ (one thread)│         │             │
//! └──────────────┘                └─────────────┘         └─────────────┘
//! ```
//!
//! The runtime thread takes commands and ticks from one loop, so they are
//! applied one at a time in the order they are picked up and never
//! interleave. Commands keep their relative order.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use robofleet_core::{Priority, RobotId};

/// Default command channel capacity.
pub const DEFAULT_COMMAND_CAPACITY: usize = 1024;

/// Commands accepted by the coordinator.
///
/// Id lists are the caller's current selection; unknown ids are ignored.
#[derive(Clone, Debug, PartialEq)]
pub enum FleetCommand {
    /// Set the listed robots `active`.
    Activate(Vec<RobotId>),
    /// Set the listed robots `inactive`.
    Deactivate(Vec<RobotId>),
    /// Enter emergency mode and stop the clock.
    EmergencyStop,
    /// Leave emergency mode (clock stays stopped).
    ClearEmergency,
    /// Switch formation pattern by name.
    SetFormation(String),
    /// Assign a mission to the listed robots.
    AssignMission {
        /// Target robots.
        ids: Vec<RobotId>,
        /// Mission text.
        text: String,
        /// Mission priority.
        priority: Priority,
    },
    /// Remove the mission from the listed robots.
    ClearMission(Vec<RobotId>),
    /// Maintenance clear for faulted robots.
    ClearFault(Vec<RobotId>),
    /// Flip AI adjustments on/off.
    ToggleAi,
    /// Flip the clock on/off.
    ToggleRunning,
    /// Start or stop the clock explicitly.
    SetRunning(bool),
}

/// Bounded command channel.
#[derive(Debug)]
pub struct CommandBus {
    sender: Sender<FleetCommand>,
    receiver: Receiver<FleetCommand>,
}

impl CommandBus {
    /// Creates a new bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum commands in flight before `send` starts
    ///   rejecting.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> CommandReceiver {
        CommandReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_CAPACITY)
    }
}

/// Handle for sending commands.
#[derive(Clone, Debug)]
pub struct CommandSender {
    sender: Sender<FleetCommand>,
}

impl CommandSender {
    /// Sends a command without blocking.
    ///
    /// Returns `false` if the channel is full or the runtime has shut down.
    #[inline]
    pub fn send(&self, command: FleetCommand) -> bool {
        match self.sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                tracing::warn!(?command, "command channel full, dropping command");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving commands.
#[derive(Clone, Debug)]
pub struct CommandReceiver {
    receiver: Receiver<FleetCommand>,
}

impl CommandReceiver {
    /// Receives all pending commands (non-blocking), oldest first.
    #[inline]
    pub fn drain(&self) -> Vec<FleetCommand> {
        self.receiver.try_iter().collect()
    }

    /// Receives one command (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<FleetCommand> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending commands.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Raw channel end for `select!`.
    pub(crate) fn channel(&self) -> &Receiver<FleetCommand> {
        &self.receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_arrive_in_order() {
        let bus = CommandBus::new(8);
        let tx = bus.sender();
        let rx = bus.receiver();

        assert!(tx.send(FleetCommand::Activate(vec![RobotId(1)])));
        assert!(tx.send(FleetCommand::EmergencyStop));
        assert_eq!(rx.pending_count(), 2);

        assert_eq!(
            rx.drain(),
            vec![FleetCommand::Activate(vec![RobotId(1)]), FleetCommand::EmergencyStop]
        );
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_full_channel_rejects() {
        let bus = CommandBus::new(1);
        let tx = bus.sender();
        assert!(tx.send(FleetCommand::ToggleAi));
        assert!(!tx.send(FleetCommand::ToggleAi));
    }

    #[test]
    fn test_disconnected_channel_rejects() {
        let bus = CommandBus::new(4);
        let tx = bus.sender();
        drop(bus);
        assert!(!tx.send(FleetCommand::ToggleRunning));
    }
}
