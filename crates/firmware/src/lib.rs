//! cheep dLC acquisition firmware
//!
//! Runtime profiles, the two acquisition scenarios and the register backend
//! of the cheep SoC.
//!
//! # Architecture
//!
//! ```text
//! Boot images (src/bin, `hardware`)
//!         ↓
//! Scenarios (scenario module) ← profiles, golden data, stimulus table
//!         ↓
//! Acquisition coordinator (acquisition crate)
//!         ↓
//! Platform traits (platform crate)
//!         ↓
//! Register backend (hw module) / platform mocks on host
//! ```
//!
//! # Features
//!
//! - `hardware` - Build the boot images for the RISC-V target (riscv-rt, defmt-rtt)
//! - `std` - Host builds; the scenarios run against `platform::mocks`
//! - `defmt` / `tracing` - Logging backend
//!
//! # Examples
//!
//! ```bash
//! cargo build --release --target riscv32imc-unknown-none-elf --features hardware --bin dlc_vco
//! cargo test -p firmware
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod boot;
pub mod golden;
pub mod hw;
pub mod profile;
pub mod scenario;
pub mod stimulus;

pub use profile::{
    AcquisitionProfile, DualChannelProfile, FilterChainProfile, FilterPath, Scenario,
};
pub use scenario::{exit_code, Rig};
