//! Acquisition coordinator.
//!
//! Owns the DMA engine, the encoder gate and the interrupt controller for the
//! duration of one session and drives the session through its modes:
//!
//! ```text
//! Acquiring ──switch_to_bypass──▶ BypassArmed ──first gate event──▶ BypassActive
//!     │                               │                                  │
//!     └──────────── finalize / abort ─┴──────────────────────────────────┴──▶ Done
//! ```
//!
//! Handlers never touch the coordinator; they bump the shared
//! [`InterruptFlags`] and the coordinator reads them relative to the session
//! baselines.

use platform::{
    CancelToken, Channel, DlcParams, DlcRegister, DmaEngine, DmaStage, EncoderGate,
    IntegrityChecks, InterruptControl, InterruptFlags, InterruptWait, IrqSource, Realign,
    CHANNEL_COUNT,
};

use crate::buffer::{DmaWord, ResultBuffer};
use crate::descriptor::{self, Ready, WindowPolicy};
use crate::error::{AwaitError, ConfigError, FinalizeError, LaunchError, ModeError};
use crate::integrity;
use crate::session::{Mode, Session, SessionSnapshot};
use crate::wait::{wait_until, WaitBudget};

/// Coordinator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoordinatorConfig {
    /// Channel whose window / transaction interrupts measure progress.
    pub acquisition_channel: Channel,
    /// Minimum window size.
    pub window_policy: WindowPolicy,
    /// Bound on every wait.
    pub wait_budget: WaitBudget,
    /// Log one line per integrity failure.
    pub verbose: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            acquisition_channel: Channel::ACQUISITION,
            window_policy: WindowPolicy::default(),
            wait_budget: WaitBudget::unbounded(),
            verbose: false,
        }
    }
}

/// A launched transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Armed {
    /// Channel carrying it.
    pub channel: Channel,
    /// Elements per cycle.
    pub cycle: u32,
}

/// Interrupt-synchronised acquisition over a circular DMA transfer.
pub struct Coordinator<'f, D, G, I> {
    dma: D,
    gate: G,
    irq: I,
    flags: &'f InterruptFlags,
    cancel: Option<&'f CancelToken>,
    config: CoordinatorConfig,
    session: Session,
    active: heapless::Vec<Channel, CHANNEL_COUNT>,
    armed_sources: heapless::Vec<IrqSource, 4>,
}

impl<'f, D, G, I> Coordinator<'f, D, G, I>
where
    D: DmaEngine,
    G: EncoderGate,
    I: InterruptControl + InterruptWait,
{
    /// Start a session. Counters are baselined now.
    pub fn new(dma: D, gate: G, irq: I, flags: &'f InterruptFlags, config: CoordinatorConfig) -> Self {
        Self {
            dma,
            gate,
            irq,
            flags,
            cancel: None,
            session: Session::start(flags, config.acquisition_channel),
            config,
            active: heapless::Vec::new(),
            armed_sources: heapless::Vec::new(),
        }
    }

    /// Abort waits once `token` is set.
    #[must_use]
    pub fn with_cancel(mut self, token: &'f CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.session.mode()
    }

    /// Settings.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Counters relative to the session start.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot(self.flags, 0)
    }

    /// Channels with a launched transfer.
    pub fn active_channels(&self) -> &[Channel] {
        &self.active
    }

    /// The DMA engine.
    pub fn dma(&self) -> &D {
        &self.dma
    }

    /// The encoder gate.
    pub fn gate(&self) -> &G {
        &self.gate
    }

    /// The interrupt controller.
    pub fn irq(&self) -> &I {
        &self.irq
    }

    /// Validate a descriptor. Touches no hardware.
    pub fn configure(&self, descriptor: &platform::TransferDescriptor) -> Result<Ready, ConfigError> {
        descriptor::check(descriptor, &self.config.window_policy)
    }

    /// Program the encoder gate for the acquisition phase.
    ///
    /// `trans_size` is the per-cycle element count of the transfer the gate
    /// will be monitoring.
    pub fn program_gate(&mut self, params: &DlcParams, trans_size: u32) -> Result<(), ModeError> {
        self.session.require(Mode::Acquiring)?;
        params.apply(&mut self.gate);
        self.gate.write(DlcRegister::TransSize, trans_size);
        platform::debug!(
            "gate: width 2^{} n_bits {} dt_mask {} size {}",
            params.log_level_width,
            params.delta_level_bits(),
            params.time_mask(),
            trans_size
        );
        Ok(())
    }

    /// Set the gate's starting level from a raw source reading.
    ///
    /// Uses the level exponent currently in the gate. Returns the level
    /// written.
    pub fn seed_level(&mut self, raw: u32) -> Result<u32, ModeError> {
        self.session.require(Mode::Acquiring)?;
        let exponent = self.gate.read(DlcRegister::LogLevelWidth);
        let level = DlcParams::level_at(raw, exponent);
        self.gate.write(DlcRegister::CurrentLevel, level);
        Ok(level)
    }

    /// Validate, load and launch a transfer.
    ///
    /// The channel's interrupt sources are enabled before the launch. A
    /// transfer feeding the gate (`hw_fifo`) must match the gate's
    /// transaction size.
    pub fn arm(&mut self, ready: Ready) -> Result<Armed, LaunchError> {
        self.session.require(Mode::Acquiring)?;
        let descriptor = *ready.descriptor();
        let channel = descriptor.channel;

        // A circular transfer between cycles can read as idle.
        if self.active.contains(&channel) || self.dma.is_busy(channel) {
            return Err(LaunchError::EngineBusy { channel });
        }
        if descriptor.hw_fifo {
            let gate = self.gate.read(DlcRegister::TransSize);
            if gate != ready.cycle() {
                return Err(LaunchError::GateSizeMismatch {
                    gate,
                    cycle: ready.cycle(),
                });
            }
        }

        let flags = self
            .dma
            .validate(&descriptor, Realign::Enabled, IntegrityChecks::Perform);
        if !flags.is_ok() {
            return Err(LaunchError::Rejected {
                stage: DmaStage::Validate,
                flags,
            });
        }
        let flags = self.dma.load(&descriptor);
        if !flags.is_ok() {
            return Err(LaunchError::Rejected {
                stage: DmaStage::Load,
                flags,
            });
        }

        if descriptor.signals_window() {
            self.enable_source(IrqSource::DmaWindowDone);
        }
        if descriptor.signals_transaction() {
            self.enable_source(IrqSource::DmaTransactionDone);
        }

        let flags = self.dma.launch(&descriptor);
        if !flags.is_ok() {
            return Err(LaunchError::Rejected {
                stage: DmaStage::Launch,
                flags,
            });
        }
        // At most CHANNEL_COUNT distinct channels reach this point.
        let _ = self.active.push(channel);

        platform::info!(
            "armed channel {:?}: cycle {} window {}",
            channel,
            ready.cycle(),
            descriptor.window_du
        );
        Ok(Armed {
            channel,
            cycle: ready.cycle(),
        })
    }

    /// Sleep until `target` window + transaction interrupts have arrived on
    /// the acquisition channel.
    pub fn await_progress(&mut self, target: u32) -> Result<SessionSnapshot, AwaitError> {
        self.session.require(Mode::Acquiring)?;
        self.session.set_target(target);

        let session = &self.session;
        let flags = self.flags;
        let result = wait_until(&mut self.irq, self.config.wait_budget, self.cancel, || {
            session.progress(flags) >= target
        });
        match result {
            Ok(wakes) => {
                let snap = self.session.snapshot(self.flags, wakes);
                platform::info!(
                    "progress {}/{} ({} windows, {} transactions, {} wakes)",
                    snap.progress(),
                    target,
                    snap.windows,
                    snap.transactions,
                    wakes
                );
                Ok(snap)
            }
            Err(e) => {
                platform::warn!(
                    "acquisition wait ended at {}/{}: {:?}",
                    self.session.progress(self.flags),
                    target,
                    e
                );
                Err(e)
            }
        }
    }

    /// Switch the gate to sparse event mode.
    ///
    /// Legal only while acquiring with the awaited target met, and only with
    /// an exponent no smaller than the one in the gate. Stops listening
    /// to the DMA, writes the widened level exponent and the bypass enable,
    /// then listens to gate events.
    pub fn switch_to_bypass(&mut self, log_level_width: u32) -> Result<(), ModeError> {
        if !self.session.mode().can_transition(Mode::BypassArmed) {
            return Err(ModeError::IllegalTransition {
                from: self.session.mode(),
                to: Mode::BypassArmed,
            });
        }
        let target = self.session.target().ok_or(ModeError::NoTarget)?;
        let observed = self.session.progress(self.flags);
        if observed < target {
            return Err(ModeError::TargetNotMet { observed, target });
        }
        let current = self.gate.read(DlcRegister::LogLevelWidth);
        if log_level_width < current {
            platform::warn!("bypass width 2^{} below 2^{}", log_level_width, current);
            return Err(ModeError::NarrowingBypass {
                current,
                requested: log_level_width,
            });
        }

        self.disable_source(IrqSource::DmaWindowDone);
        self.disable_source(IrqSource::DmaTransactionDone);
        self.session.rebase_gate(self.flags);
        self.gate.write(DlcRegister::LogLevelWidth, log_level_width);
        self.gate.write(DlcRegister::Bypass, 1);
        self.enable_source(IrqSource::External);
        self.session.transition(Mode::BypassArmed)?;

        platform::info!("bypass armed, level width 2^{}", log_level_width);
        Ok(())
    }

    /// Sleep until `target` gate events have arrived since bypass was armed.
    ///
    /// The first observed event moves the session to `BypassActive`.
    pub fn await_gate_event(&mut self, target: u32) -> Result<SessionSnapshot, AwaitError> {
        let mode = self.session.mode();
        if !matches!(mode, Mode::BypassArmed | Mode::BypassActive) {
            return Err(ModeError::WrongMode {
                expected: Mode::BypassArmed,
                actual: mode,
            }
            .into());
        }

        let session = &self.session;
        let flags = self.flags;
        let result = wait_until(&mut self.irq, self.config.wait_budget, self.cancel, || {
            session.gate_events(flags) >= target
        });

        if self.session.mode() == Mode::BypassArmed && self.session.gate_events(self.flags) > 0 {
            self.session.transition(Mode::BypassActive)?;
        }

        match result {
            Ok(wakes) => {
                let snap = self.session.snapshot(self.flags, wakes);
                platform::info!("{} gate events after {} wakes", snap.gate_events, wakes);
                Ok(snap)
            }
            Err(e) => {
                platform::warn!("gate wait ended: {:?}", e);
                Err(e)
            }
        }
    }

    /// Tear down and compare the captured data against `reference`.
    pub fn finalize<T: DmaWord, const N: usize>(
        &mut self,
        buffer: &ResultBuffer<T, N>,
        reference: &[T],
    ) -> Result<(), FinalizeError> {
        self.teardown()?;
        let report = integrity::compare(buffer.iter(), reference, self.config.verbose);
        if report.passed() {
            platform::info!("integrity: {} elements match", reference.len());
            Ok(())
        } else {
            platform::error!("integrity: {} errors", report.errors);
            Err(FinalizeError::Integrity(report))
        }
    }

    /// Tear down without comparing.
    pub fn abort(&mut self) -> Result<SessionSnapshot, ModeError> {
        self.teardown()?;
        platform::warn!("session aborted");
        Ok(self.session.snapshot(self.flags, 0))
    }

    /// The result buffer, handed back only once the session is done.
    pub fn results<'b, T: DmaWord, const N: usize>(
        &self,
        buffer: &'b ResultBuffer<T, N>,
    ) -> Result<&'b ResultBuffer<T, N>, ModeError> {
        self.session.require(Mode::Done)?;
        Ok(buffer)
    }

    /// Release the hardware.
    pub fn into_parts(self) -> (D, G, I) {
        (self.dma, self.gate, self.irq)
    }

    fn teardown(&mut self) -> Result<(), ModeError> {
        if !self.session.mode().can_transition(Mode::Done) {
            return Err(ModeError::IllegalTransition {
                from: self.session.mode(),
                to: Mode::Done,
            });
        }
        for channel in &self.active {
            self.dma.stop_circular(*channel);
        }
        self.active.clear();
        for source in &self.armed_sources {
            self.irq.disable(*source);
        }
        self.armed_sources.clear();
        self.session.transition(Mode::Done)
    }

    fn enable_source(&mut self, source: IrqSource) {
        self.irq.enable(source);
        if !self.armed_sources.contains(&source) {
            let _ = self.armed_sources.push(source);
        }
    }

    fn disable_source(&mut self, source: IrqSource) {
        self.irq.disable(source);
        self.armed_sources.retain(|s| *s != source);
    }
}
