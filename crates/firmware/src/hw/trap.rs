//! Interrupt dispatch.
//!
//! The handler only acknowledges the hardware and bumps the shared counters;
//! all decisions are taken by the coordinator on the main path.

use platform::{CancelToken, Channel, InterruptFlags, IrqSource, CHANNEL_COUNT};

use super::dma::CheepDma;
use super::map::MemoryMap;
use super::mmio::Mmio;
use super::soc::FastIntrCtrl;
use super::timer::RvTimer;

/// Counters shared between the trap handler and the coordinator.
pub static FLAGS: InterruptFlags = InterruptFlags::new();

/// Set by the timer when the acquisition deadline passes.
pub static CANCEL: CancelToken = CancelToken::new();

/// Register blocks the handler acknowledges.
///
/// Separate instances from the ones the main path owns: the handler only
/// touches read-to-clear flags, pending bits and the timer comparator.
pub struct TrapContext {
    dma: CheepDma,
    timer: RvTimer,
    fic: FastIntrCtrl,
}

impl TrapContext {
    /// Handler view of the SoC.
    ///
    /// # Safety
    ///
    /// `map` must describe the SoC the code runs on.
    pub unsafe fn new(map: &MemoryMap) -> Self {
        // SAFETY: forwarded to the caller.
        let (dma, timer, fic) = unsafe {
            (
                Mmio::new(map.dma),
                Mmio::new(map.timer),
                Mmio::new(map.fast_intr),
            )
        };
        Self::from_blocks(dma, timer, fic)
    }

    pub(crate) fn from_blocks(dma: Mmio, timer: Mmio, fic: Mmio) -> Self {
        Self {
            dma: CheepDma::new(dma),
            timer: RvTimer::new(timer),
            fic: FastIntrCtrl::new(fic),
        }
    }

    /// Handle machine interrupt `code`. Unknown codes are ignored.
    pub fn dispatch(&mut self, code: u32, flags: &InterruptFlags, cancel: &CancelToken) {
        let Some(source) = IrqSource::from_cause(code) else {
            return;
        };
        match source {
            IrqSource::Timer => {
                if self.timer.take_expired() {
                    platform::warn!("acquisition deadline passed");
                    cancel.cancel();
                }
            }
            IrqSource::DmaWindowDone => {
                for channel in channels() {
                    if self.dma.take_window_done(channel) {
                        flags.on_window_done(channel);
                    }
                }
            }
            IrqSource::DmaTransactionDone => {
                for channel in channels() {
                    if self.dma.take_transaction_done(channel) {
                        flags.on_transaction_done(channel);
                    }
                }
            }
            IrqSource::External => flags.on_gate_event(),
        }
        self.fic.clear_pending(source);
    }
}

fn channels() -> impl Iterator<Item = Channel> {
    (0..CHANNEL_COUNT).filter_map(|i| u8::try_from(i).ok()).map(Channel)
}

#[cfg(all(feature = "hardware", target_arch = "riscv32"))]
#[export_name = "DefaultHandler"]
fn default_handler() {
    let cause = riscv::register::mcause::read();
    if !cause.is_interrupt() {
        return;
    }
    let code = u32::try_from(cause.code()).unwrap_or(u32::MAX);
    // SAFETY: the firmware only runs on this SoC.
    let mut ctx = unsafe { TrapContext::new(&MemoryMap::CHEEP) };
    ctx.dispatch(code, &FLAGS, &CANCEL);
}
