//! Descriptor validation.
//!
//! Pure checks of the transfer invariants. Nothing here touches the engine;
//! a descriptor that passes is wrapped in [`Ready`] and only then can be
//! armed.

use platform::{Endpoint, TransferDescriptor};

use crate::error::{ConfigError, EndpointRole};

/// Lower bound on the window size.
///
/// The handler and the wait loop must finish before the next window
/// interrupt; below `min_window_du` elements that is not guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WindowPolicy {
    /// Smallest accepted non-zero window, in elements.
    pub min_window_du: u32,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self { min_window_du: 16 }
    }
}

/// A descriptor that passed every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ready {
    descriptor: TransferDescriptor,
    cycle: u32,
}

impl Ready {
    /// The validated descriptor.
    pub const fn descriptor(&self) -> &TransferDescriptor {
        &self.descriptor
    }

    /// Elements moved per cycle.
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }
}

/// Check every descriptor invariant.
///
/// Checks run in a fixed order so the same descriptor always yields the same
/// error.
pub fn check(descriptor: &TransferDescriptor, policy: &WindowPolicy) -> Result<Ready, ConfigError> {
    let cycle = descriptor.elements_per_cycle().unwrap_or(u32::MAX);
    if cycle == 0 {
        return Err(ConfigError::EmptyTransfer);
    }

    let memory = match (descriptor.src.advances(), descriptor.dst.advances()) {
        (true, true) => return Err(ConfigError::EndpointsBothAdvance),
        (false, false) => return Err(ConfigError::NoAdvancingEndpoint),
        (true, false) => descriptor.src,
        (false, true) => descriptor.dst,
    };

    for (role, endpoint) in [
        (EndpointRole::Source, descriptor.src),
        (EndpointRole::Destination, descriptor.dst),
    ] {
        if !endpoint.is_aligned() {
            return Err(ConfigError::Misaligned {
                endpoint: role,
                addr: endpoint.addr(),
            });
        }
    }

    if descriptor.is_circular() && !descriptor.signals_transaction() {
        return Err(ConfigError::CircularWithoutInterrupt);
    }

    let window = descriptor.window_du;
    if window != 0 {
        if window < policy.min_window_du {
            return Err(ConfigError::WindowTooSmall {
                window,
                min: policy.min_window_du,
            });
        }
        if window > cycle {
            return Err(ConfigError::WindowExceedsCycle { window, cycle });
        }
        if cycle.checked_rem(window) != Some(0) {
            return Err(ConfigError::WindowNotDivisor { window, cycle });
        }
    }

    if let Endpoint::Memory { capacity_du, .. } = memory {
        if capacity_du < cycle {
            return Err(ConfigError::BufferTooSmall {
                capacity: capacity_du,
                cycle,
            });
        }
    }

    Ok(Ready {
        descriptor: *descriptor,
        cycle,
    })
}
