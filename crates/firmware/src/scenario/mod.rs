//! Acquisition scenarios.
//!
//! Each scenario powers its front end, drives one [`Coordinator`] session to
//! completion and powers the front end down again, whatever the outcome. A
//! failed session is aborted so no DMA channel is left running.

pub mod dual_channel;
pub mod filter_chain;

use acquisition::{AcquisitionError, Coordinator, CoordinatorConfig, Mode};
use platform::config::EXIT_SUCCESS;
use platform::{CancelToken, DmaEngine, EncoderGate, InterruptControl, InterruptFlags, InterruptWait};

/// The hardware shared by every scenario.
pub struct Rig<'a, D, G, I> {
    /// DMA engine.
    pub dma: D,
    /// Encoder gate.
    pub gate: G,
    /// Interrupt controller of the hart.
    pub irq: I,
    /// Counters bumped by the interrupt handlers.
    pub flags: &'a InterruptFlags,
    /// Set by the deadline timer.
    pub cancel: Option<&'a CancelToken>,
}

impl<'a, D, G, I> Rig<'a, D, G, I>
where
    D: DmaEngine,
    G: EncoderGate,
    I: InterruptControl + InterruptWait,
{
    /// Open a session on this hardware.
    pub fn into_coordinator(self, config: CoordinatorConfig) -> Coordinator<'a, D, G, I> {
        let coordinator = Coordinator::new(self.dma, self.gate, self.irq, self.flags, config);
        match self.cancel {
            Some(token) => coordinator.with_cancel(token),
            None => coordinator,
        }
    }
}

/// Abort the session unless it already ended.
fn settle<T, D, G, I>(
    coordinator: &mut Coordinator<'_, D, G, I>,
    result: &Result<T, AcquisitionError>,
) where
    D: DmaEngine,
    G: EncoderGate,
    I: InterruptControl + InterruptWait,
{
    if let Err(e) = result {
        platform::error!("scenario failed, exit code {}", e.exit_code());
        if coordinator.mode() != Mode::Done {
            let _ = coordinator.abort();
        }
    }
}

/// Process exit code of a scenario run.
pub fn exit_code<T>(result: &Result<T, AcquisitionError>) -> u32 {
    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(e) => e.exit_code(),
    }
}
