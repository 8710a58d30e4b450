//! Software interrupt requests.
//!
//! Load and Exec are deferred stages: callers raise a pending bit, and the
//! dispatcher hands out pending stages in priority order, Load before Exec.
//! A request for a stage that cannot act is dropped at raise time, so a
//! pending bit always means "worth running".

use bitflags::bitflags;

use crate::runtime::RunState;
use crate::staging::{Ownership, StagingBuffer};

bitflags! {
    /// Pending software interrupt bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Pending: u8 {
        /// Load stage requested.
        const LOAD = 0x01;
        /// Exec stage requested.
        const EXEC = 0x02;
    }
}

/// A deferred stage ready to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Transfer the staged segment into the runtime state.
    Load,
    /// Ask the planner for the next segment.
    Exec,
}

/// Pending request register.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingRequests {
    bits: Pending,
}

impl PendingRequests {
    /// Empty register.
    pub const fn new() -> Self {
        Self {
            bits: Pending::empty(),
        }
    }

    /// Raise Load if the Run stage is idle. Returns whether the bit is set.
    pub fn request_load(&mut self, run: &RunState) -> bool {
        if !run.is_busy() {
            self.bits.insert(Pending::LOAD);
        }
        self.bits.contains(Pending::LOAD)
    }

    /// Raise Exec if Exec owns the staging buffer. Returns whether the bit is set.
    pub fn request_exec(&mut self, staging: &StagingBuffer) -> bool {
        if staging.ownership() == Ownership::OwnedByExec {
            self.bits.insert(Pending::EXEC);
        }
        self.bits.contains(Pending::EXEC)
    }

    /// Take the highest-priority pending stage, clearing its bit.
    pub fn take_next(&mut self) -> Option<Stage> {
        if self.bits.contains(Pending::LOAD) {
            self.bits.remove(Pending::LOAD);
            Some(Stage::Load)
        } else if self.bits.contains(Pending::EXEC) {
            self.bits.remove(Pending::EXEC);
            Some(Stage::Exec)
        } else {
            None
        }
    }

    /// Currently pending bits.
    #[inline]
    pub fn pending(&self) -> Pending {
        self.bits
    }

    /// `true` when nothing is pending.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}
