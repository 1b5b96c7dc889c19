//! Error types for every coordinator operation.
//!
//! Nothing here is retried. Each class maps to a distinct process exit code
//! through [`AcquisitionError::exit_code`].

use platform::{Channel, ConfigFlags, DmaStage, FilterConfigError};

use crate::session::Mode;

/// Which side of a descriptor an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointRole {
    /// Source endpoint.
    Source,
    /// Destination endpoint.
    Destination,
}

/// Descriptor rejected before any hardware is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Endpoint address not aligned to its element width.
    #[error("{endpoint:?} address {addr:#x} not aligned to its element width")]
    Misaligned {
        /// Offending endpoint.
        endpoint: EndpointRole,
        /// Its address.
        addr: usize,
    },
    /// Window interrupts would arrive faster than they can be serviced.
    #[error("window of {window} elements below the minimum of {min}")]
    WindowTooSmall {
        /// Requested window.
        window: u32,
        /// Configured service-time bound.
        min: u32,
    },
    /// Window does not evenly divide the per-cycle element count.
    #[error("window of {window} elements does not divide the cycle of {cycle}")]
    WindowNotDivisor {
        /// Requested window.
        window: u32,
        /// Elements per cycle.
        cycle: u32,
    },
    /// Window larger than a whole cycle.
    #[error("window of {window} elements exceeds the cycle of {cycle}")]
    WindowExceedsCycle {
        /// Requested window.
        window: u32,
        /// Elements per cycle.
        cycle: u32,
    },
    /// Zero elements per cycle.
    #[error("transfer moves no elements")]
    EmptyTransfer,
    /// Both endpoints advance; one must be a fixed register.
    #[error("both endpoints advance")]
    EndpointsBothAdvance,
    /// Neither endpoint advances.
    #[error("no endpoint advances")]
    NoAdvancingEndpoint,
    /// Memory endpoint cannot hold a full cycle.
    #[error("buffer of {capacity} elements cannot hold a cycle of {cycle}")]
    BufferTooSmall {
        /// Endpoint capacity in elements.
        capacity: u32,
        /// Elements per cycle.
        cycle: u32,
    },
    /// Circular transfers must signal completion by interrupt.
    #[error("circular transfer with polled completion")]
    CircularWithoutInterrupt,
}

/// Engine refused to take the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LaunchError {
    /// The channel already carries a transfer.
    #[error("channel {channel:?} busy")]
    EngineBusy {
        /// Busy channel.
        channel: Channel,
    },
    /// A primitive answered something other than `Ok`.
    #[error("{stage:?} rejected the descriptor: {flags:?}")]
    Rejected {
        /// Primitive that answered.
        stage: DmaStage,
        /// Its answer.
        flags: ConfigFlags,
    },
    /// The gate would stop the transfer at a different element count.
    #[error("gate transaction size {gate} differs from the cycle of {cycle}")]
    GateSizeMismatch {
        /// Gate TransSize register.
        gate: u32,
        /// Descriptor elements per cycle.
        cycle: u32,
    },
    /// Arming outside the acquiring phase.
    #[error(transparent)]
    Mode(#[from] ModeError),
}

/// A wait ended without its predicate holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AwaitError {
    /// The wake budget ran out.
    #[error("timed out after {wakes} wakes")]
    Timeout {
        /// Wakes spent.
        wakes: u32,
    },
    /// The cancellation token was set.
    #[error("cancelled after {wakes} wakes")]
    Cancelled {
        /// Wakes spent.
        wakes: u32,
    },
    /// Waiting in the wrong phase.
    #[error(transparent)]
    Mode(#[from] ModeError),
}

/// Operation not legal in the current session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeError {
    /// Transition outside the state machine.
    #[error("illegal transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current mode.
        from: Mode,
        /// Requested mode.
        to: Mode,
    },
    /// Operation belongs to another phase.
    #[error("operation requires {expected:?}, session is {actual:?}")]
    WrongMode {
        /// Mode the operation runs in.
        expected: Mode,
        /// Current mode.
        actual: Mode,
    },
    /// No acquisition target has been awaited yet.
    #[error("no acquisition target awaited")]
    NoTarget,
    /// Fewer events observed than the awaited target.
    #[error("{observed} of {target} events observed")]
    TargetNotMet {
        /// Events since the session started.
        observed: u32,
        /// Awaited target.
        target: u32,
    },
    /// Bypass would make the level width finer than during acquisition.
    #[error("bypass level exponent {requested} below the current {current}")]
    NarrowingBypass {
        /// Exponent in the gate.
        current: u32,
        /// Exponent asked for.
        requested: u32,
    },
}

/// One failed integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntegrityError {
    /// Captured element differs from the reference.
    #[error("index {index}: expected {expected}, got {actual}")]
    Mismatch {
        /// Element position.
        index: usize,
        /// Reference value.
        expected: i32,
        /// Captured value.
        actual: i32,
    },
    /// The buffer holds fewer elements than the reference.
    #[error("captured {captured} elements, reference has {expected}")]
    Truncated {
        /// Elements available.
        captured: usize,
        /// Reference length.
        expected: usize,
    },
}

/// Maximum number of individual errors kept in an [`IntegrityReport`].
pub const MAX_REPORTED: usize = 16;

/// Aggregate of an integrity comparison.
///
/// `errors` counts every failure; `details` keeps the first
/// [`MAX_REPORTED`] of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntegrityReport {
    /// Total failures.
    pub errors: u32,
    /// First failures, in index order.
    pub details: heapless::Vec<IntegrityError, MAX_REPORTED>,
}

impl IntegrityReport {
    /// `true` when nothing failed.
    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    /// Record one failure.
    pub fn record(&mut self, error: IntegrityError) {
        self.errors = self.errors.saturating_add(1);
        let _ = self.details.push(error);
    }

    /// Mismatch entries among the kept details.
    pub fn mismatches(&self) -> impl Iterator<Item = &IntegrityError> {
        self.details
            .iter()
            .filter(|e| matches!(e, IntegrityError::Mismatch { .. }))
    }
}

/// `finalize` failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror_no_std::Error)]
pub enum FinalizeError {
    /// The session was already done.
    #[error(transparent)]
    Mode(#[from] ModeError),
    /// The captured data differs from the reference.
    #[error("integrity check failed with {} errors", .0.errors)]
    Integrity(IntegrityReport),
}

/// Everything a scenario can fail with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror_no_std::Error)]
pub enum AcquisitionError {
    /// Descriptor rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Filter parameters rejected.
    #[error(transparent)]
    Filter(#[from] FilterConfigError),
    /// Engine refused the transfer.
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// A wait ended early.
    #[error(transparent)]
    Await(#[from] AwaitError),
    /// Session mode violation.
    #[error(transparent)]
    Mode(#[from] ModeError),
    /// Captured data differs from the reference.
    #[error("integrity check failed with {} errors", .0.errors)]
    Integrity(IntegrityReport),
}

impl From<FinalizeError> for AcquisitionError {
    fn from(e: FinalizeError) -> Self {
        match e {
            FinalizeError::Mode(m) => Self::Mode(m),
            FinalizeError::Integrity(r) => Self::Integrity(r),
        }
    }
}

impl AcquisitionError {
    /// Process exit code. Zero is reserved for success.
    pub fn exit_code(&self) -> u32 {
        match self {
            Self::Integrity(_) => 1,
            Self::Config(_) | Self::Filter(_) => 2,
            Self::Launch(_) => 3,
            Self::Await(AwaitError::Mode(_)) | Self::Mode(_) => 5,
            Self::Await(_) => 4,
        }
    }
}
