//! Hardware Abstraction Layer (HAL) for the cheep acquisition firmware
//!
//! This crate provides trait-based abstractions for the SoC blocks the
//! acquisition pipeline drives, so that the coordinator and the scenarios can
//! be developed and tested without silicon.
//!
//! # Architecture Layers
//!
//! ```text
//! Boot images (firmware crate, `hardware` feature)
//!         ↓
//! Scenarios (firmware crate: dual-channel, filter-chain)
//!         ↓
//! Acquisition coordinator (acquisition crate)
//!         ↓
//! Platform HAL (this crate - trait abstractions + passive types)
//!         ↓
//! Register backends (firmware::hw) / mocks (this crate, `std`)
//! ```
//!
//! # Modules
//!
//! - [`dma`] - Transfer descriptors and the DMA engine primitives
//! - [`dlc`] - Level-crossing encoder register contract and parameters
//! - [`irq`] - Interrupt flags, interrupt sources, global mask and wait
//! - [`afe`] - Analog front-end: VCO decoder, current DACs, decimation filter
//! - [`config`] - Application constants
//!
//! # Features
//!
//! - `std`: host mocks in [`mocks`]
//! - `defmt`: `defmt::Format` derives and the defmt logging backend
//! - `tracing`: tracing logging backend (host)

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod log;

pub mod afe;
pub mod config;
pub mod dlc;
pub mod dma;
pub mod irq;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export DMA types
pub use dma::{
    Channel, ConfigFlags, DataType, Dimensions, DmaEngine, DmaStage, Endpoint, IntegrityChecks, Realign,
    TransferDescriptor, TransferEnd, TransferMode, Trigger, CHANNEL_COUNT,
};

// Re-export encoder gate types
pub use dlc::{DeltaFormat, DlcParams, DlcRegister, EncoderGate};

// Re-export interrupt types
pub use irq::{CancelToken, EventCounter, InterruptControl, InterruptFlags, InterruptWait, IrqSource};

// Re-export analog front-end types
pub use afe::{
    CicConfig, CurrentDac, DacId, DecimationFilter, FilterConfig, FilterConfigError, SesConfig,
    VcoDecoder,
};
