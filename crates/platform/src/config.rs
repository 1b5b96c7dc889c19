//! Application constants
//!
//! Names and version strings shared by the boot images and the host tooling.
//! Everything else that varies per run is a runtime profile in the firmware
//! crate.

/// Firmware name, printed in the boot banner.
pub const APP_NAME: &str = "cheep-acquisition";

/// Firmware version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit code reported on success.
pub const EXIT_SUCCESS: u32 = 0;

/// Boot banner
pub const fn banner() -> &'static str {
    "cheep dLC acquisition firmware"
}
