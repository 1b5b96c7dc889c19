//! Low-power predicate wait.
//!
//! The predicate is evaluated with interrupts globally masked and the wait is
//! issued inside that masked region, so an interrupt landing between the
//! check and the sleep still wakes the hart. Unmasking right after the wait
//! runs the pending handler before the predicate is evaluated again.

use core::num::NonZeroU32;

use platform::{CancelToken, InterruptWait};

use crate::error::AwaitError;

/// Upper bound on a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitBudget {
    /// Wakes allowed before giving up; `None` waits until cancelled.
    pub max_wakes: Option<NonZeroU32>,
}

impl WaitBudget {
    /// No wake limit.
    pub const fn unbounded() -> Self {
        Self { max_wakes: None }
    }

    /// At most `wakes` wakes; zero means unbounded.
    pub const fn wakes(wakes: u32) -> Self {
        Self {
            max_wakes: NonZeroU32::new(wakes),
        }
    }

    fn exhausted(&self, wakes: u32) -> bool {
        self.max_wakes.is_some_and(|max| wakes >= max.get())
    }
}

/// Sleep until `ready` holds.
///
/// Returns the number of wakes spent. A wake that leaves `ready` false (a
/// spurious wake or an interrupt from another source) just loops.
pub fn wait_until<W, F>(
    irq: &mut W,
    budget: WaitBudget,
    cancel: Option<&CancelToken>,
    mut ready: F,
) -> Result<u32, AwaitError>
where
    W: InterruptWait + ?Sized,
    F: FnMut() -> bool,
{
    let mut wakes: u32 = 0;
    loop {
        irq.mask_global();
        if ready() {
            irq.unmask_global();
            return Ok(wakes);
        }
        if cancel.is_some_and(CancelToken::is_cancelled) {
            irq.unmask_global();
            return Err(AwaitError::Cancelled { wakes });
        }
        if budget.exhausted(wakes) {
            irq.unmask_global();
            return Err(AwaitError::Timeout { wakes });
        }
        irq.wait_for_interrupt();
        irq.unmask_global();
        wakes = wakes.saturating_add(1);
    }
}
