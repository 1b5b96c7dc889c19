//! Interrupt flags, sources and the global mask / wait contract.
//!
//! Handlers only bump an [`EventCounter`] and acknowledge their source. The
//! main context reads the counters from its wait loop. Counters never
//! decrease: a consumer that needs "events since X" keeps its own baseline.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::dma::{Channel, CHANNEL_COUNT};

/// Monotonic event counter shared between interrupt and thread context.
///
/// Increments are serialised in a critical section so that a read-modify-write
/// is never interleaved with another increment, even on targets without
/// atomic RMW instructions. Saturates at `u32::MAX`.
#[derive(Debug, Default)]
pub struct EventCounter(AtomicU32);

impl EventCounter {
    /// Counter at zero.
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Add one event.
    pub fn increment(&self) {
        critical_section::with(|_| {
            let current = self.0.load(Ordering::Relaxed);
            self.0.store(current.saturating_add(1), Ordering::Release);
        });
    }

    /// Current value.
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }
}

/// Process-wide interrupt counters.
///
/// Placed in a `static` by the boot image and shared by reference with the
/// coordinator; the trap handler calls the `on_*` methods.
#[derive(Debug, Default)]
pub struct InterruptFlags {
    window: [EventCounter; CHANNEL_COUNT],
    transaction: [EventCounter; CHANNEL_COUNT],
    gate: EventCounter,
}

impl InterruptFlags {
    /// All counters at zero.
    pub const fn new() -> Self {
        Self {
            window: [EventCounter::new(), EventCounter::new()],
            transaction: [EventCounter::new(), EventCounter::new()],
            gate: EventCounter::new(),
        }
    }

    /// Window-done interrupt on `channel`. Unknown channels are ignored.
    pub fn on_window_done(&self, channel: Channel) {
        if let Some(counter) = self.window.get(channel.index()) {
            counter.increment();
        }
    }

    /// Transaction-done interrupt on `channel`. Unknown channels are ignored.
    pub fn on_transaction_done(&self, channel: Channel) {
        if let Some(counter) = self.transaction.get(channel.index()) {
            counter.increment();
        }
    }

    /// Encoder gate event (external interrupt).
    pub fn on_gate_event(&self) {
        self.gate.increment();
    }

    /// Window-done count on `channel`, zero for unknown channels.
    pub fn window_count(&self, channel: Channel) -> u32 {
        self.window.get(channel.index()).map_or(0, EventCounter::get)
    }

    /// Transaction-done count on `channel`, zero for unknown channels.
    pub fn transaction_count(&self, channel: Channel) -> u32 {
        self.transaction
            .get(channel.index())
            .map_or(0, EventCounter::get)
    }

    /// Gate event count.
    pub fn gate_count(&self) -> u32 {
        self.gate.get()
    }
}

/// Interrupt sources the coordinator arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqSource {
    /// Machine timer (wait timeout).
    Timer,
    /// DMA transaction-done.
    DmaTransactionDone,
    /// DMA window-done.
    DmaWindowDone,
    /// External interrupt carrying the encoder gate event.
    External,
}

impl IrqSource {
    /// All sources, in enable-register bit order.
    pub const ALL: [Self; 4] = [
        Self::Timer,
        Self::DmaTransactionDone,
        Self::DmaWindowDone,
        Self::External,
    ];

    /// Bit position in the machine interrupt-enable register.
    pub const fn bit(self) -> u32 {
        match self {
            Self::Timer => 7,
            Self::DmaTransactionDone => 19,
            Self::DmaWindowDone => 30,
            Self::External => 31,
        }
    }

    /// Enable-register mask.
    pub const fn mask(self) -> u32 {
        1_u32 << self.bit()
    }

    /// Source for a trap cause code, if it is one of ours.
    pub fn from_cause(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.bit() == code)
    }
}

/// Per-source enable control.
pub trait InterruptControl {
    /// Let `source` reach the hart.
    fn enable(&mut self, source: IrqSource);

    /// Keep `source` from reaching the hart.
    fn disable(&mut self, source: IrqSource);

    /// `true` if `source` is enabled.
    fn is_enabled(&self, source: IrqSource) -> bool;
}

/// Global mask and low-power wait.
///
/// The coordinator's loop is: mask, check, wait, unmask. `wait_for_interrupt`
/// is called with the global mask set and must return once any enabled
/// source is pending, so that an interrupt arriving between the check and the
/// wait is not lost. Busy polling is an acceptable implementation.
pub trait InterruptWait {
    /// Mask interrupts globally.
    fn mask_global(&mut self);

    /// Unmask interrupts globally; pending handlers run now.
    fn unmask_global(&mut self);

    /// Sleep until an interrupt is pending.
    fn wait_for_interrupt(&mut self);
}

impl<T: InterruptControl + ?Sized> InterruptControl for &mut T {
    fn enable(&mut self, source: IrqSource) {
        (**self).enable(source);
    }

    fn disable(&mut self, source: IrqSource) {
        (**self).disable(source);
    }

    fn is_enabled(&self, source: IrqSource) -> bool {
        (**self).is_enabled(source)
    }
}

impl<T: InterruptWait + ?Sized> InterruptWait for &mut T {
    fn mask_global(&mut self) {
        (**self).mask_global();
    }

    fn unmask_global(&mut self) {
        (**self).unmask_global();
    }

    fn wait_for_interrupt(&mut self) {
        (**self).wait_for_interrupt();
    }
}

/// Cancellation flag checked by every wait loop.
///
/// Typically set from the timer interrupt. Stays set until
/// [`reset`](Self::reset), which belongs before arming the next deadline.
#[derive(Debug, Default)]
pub struct CancelToken(AtomicBool);

impl CancelToken {
    /// Token not yet cancelled.
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clear an earlier cancellation.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
