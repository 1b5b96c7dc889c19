//! Reference data the scenarios compare their capture against.
//!
//! Both scenarios expect the same leading encoded events. The dual-channel
//! capture lands in half-word cells, the filter chain in bytes.

/// Leading events of the dual-channel capture.
pub const DUAL_CHANNEL: [i16; 3] = [61, 101, 213];

/// Leading events of the filter-chain capture, either filter path.
pub const FILTER_CHAIN: [u8; 3] = [61, 101, 213];
