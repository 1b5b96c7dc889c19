//! Interrupt-synchronised circular-DMA acquisition.
//!
//! The [`Coordinator`] streams samples from a front-end register through the
//! level-crossing gate into a [`ResultBuffer`], sleeps until enough window and
//! transaction interrupts have arrived, flips the gate into bypass, waits for
//! a gate event and finally checks the captured data against a reference.
//!
//! Everything hardware-facing goes through the `platform` traits, so the
//! whole pipeline runs on host against `platform::mocks`.
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod buffer;
pub mod coordinator;
pub mod descriptor;
pub mod error;
pub mod integrity;
pub mod session;
pub mod wait;

pub use buffer::{DmaWord, ResultBuffer};
pub use coordinator::{Armed, Coordinator, CoordinatorConfig};
pub use descriptor::{Ready, WindowPolicy};
pub use error::{
    AcquisitionError, AwaitError, ConfigError, EndpointRole, FinalizeError, IntegrityError,
    IntegrityReport, LaunchError, ModeError,
};
pub use session::{Mode, Session, SessionSnapshot};
pub use wait::WaitBudget;
