//! # Published Snapshots
//!
//! Readers (the presentation layer) should never wait on a tick. After
//! every tick or command the coordinator publishes an immutable
//! [`FleetSnapshot`] behind an `Arc`; readers clone the `Arc` and keep a
//! consistent view for as long as they like.
//!
//! ```text
//!   writer (tick/command)            readers
//!   ┌──────────────────┐   publish   ┌───────────────┐
//!   │ RwLock<FleetState│ ──────────> │ Arc<Snapshot> │ <── load()
//!   └──────────────────┘  (swap Arc) └───────────────┘ <── load()
//! ```
//!
//! The swap is the only write to the cell, so a reader holds the inner lock
//! for one `Arc::clone`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use robofleet_core::FleetSnapshot;

/// Latest published fleet snapshot.
#[derive(Debug)]
pub struct SnapshotCell {
    current: RwLock<Arc<FleetSnapshot>>,
    generation: AtomicU64,
}

impl SnapshotCell {
    /// Creates a cell holding `initial`.
    #[must_use]
    pub fn new(initial: FleetSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            generation: AtomicU64::new(0),
        }
    }

    /// Replaces the published snapshot.
    pub fn publish(&self, snapshot: FleetSnapshot) {
        let next = Arc::new(snapshot);
        *self.current.write() = next;
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Returns the latest published snapshot.
    #[must_use]
    pub fn load(&self) -> Arc<FleetSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Number of publishes since creation.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
