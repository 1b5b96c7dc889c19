//! Mock implementations for testing
//!
//! Host stand-ins for every platform trait. The DMA mock records the calls it
//! receives, the interrupt mock replays a script of interrupt arrivals into a
//! shared [`InterruptFlags`], and the front-end mocks remember what they were
//! told.

#![cfg(any(test, feature = "std"))]

use core::cell::Cell;

use crate::afe::FilterConfigError;
use crate::*;

/// Capacity of the recorded call logs.
pub const LOG_CAPACITY: usize = 64;

/// Mutating call received by [`MockDma`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaCall {
    /// `load`
    Load(Channel),
    /// `launch`
    Launch(Channel),
    /// `stop_circular`
    StopCircular(Channel),
}

/// Mock DMA engine.
///
/// `launch` marks the channel busy until `stop_circular` or
/// [`complete`](Self::complete). A rejection can be injected for one stage.
#[derive(Debug, Default)]
pub struct MockDma {
    validations: Cell<u32>,
    calls: heapless::Vec<DmaCall, LOG_CAPACITY>,
    loaded: [Option<TransferDescriptor>; CHANNEL_COUNT],
    busy: [bool; CHANNEL_COUNT],
    reject: Option<(DmaStage, ConfigFlags)>,
}

impl MockDma {
    /// Engine accepting every descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine answering `flags` at `stage`.
    pub fn rejecting(stage: DmaStage, flags: ConfigFlags) -> Self {
        Self {
            reject: Some((stage, flags)),
            ..Self::default()
        }
    }

    /// Force the busy state of a channel.
    pub fn set_busy(&mut self, channel: Channel, busy: bool) {
        if let Some(b) = self.busy.get_mut(channel.index()) {
            *b = busy;
        }
    }

    /// Finish a one-shot transfer.
    pub fn complete(&mut self, channel: Channel) {
        self.set_busy(channel, false);
    }

    /// Number of `validate` calls.
    pub fn validations(&self) -> u32 {
        self.validations.get()
    }

    /// Mutating calls in arrival order.
    pub fn calls(&self) -> &[DmaCall] {
        &self.calls
    }

    /// Descriptor loaded on `channel`.
    pub fn loaded(&self, channel: Channel) -> Option<TransferDescriptor> {
        self.loaded.get(channel.index()).copied().flatten()
    }

    /// `true` if `stop_circular` was called on `channel`.
    pub fn stopped(&self, channel: Channel) -> bool {
        self.calls.contains(&DmaCall::StopCircular(channel))
    }

    fn injected(&self, stage: DmaStage) -> Option<ConfigFlags> {
        match self.reject {
            Some((s, flags)) if s == stage => Some(flags),
            _ => None,
        }
    }

    fn record(&mut self, call: DmaCall) {
        let _ = self.calls.push(call);
    }
}

impl DmaEngine for MockDma {
    fn validate(
        &self,
        descriptor: &TransferDescriptor,
        _realign: Realign,
        _checks: IntegrityChecks,
    ) -> ConfigFlags {
        self.validations.set(self.validations.get().saturating_add(1));
        if let Some(flags) = self.injected(DmaStage::Validate) {
            return flags;
        }
        if !descriptor.channel.is_valid() {
            return ConfigFlags::IncompatibleTrigger;
        }
        ConfigFlags::Ok
    }

    fn load(&mut self, descriptor: &TransferDescriptor) -> ConfigFlags {
        self.record(DmaCall::Load(descriptor.channel));
        if let Some(flags) = self.injected(DmaStage::Load) {
            return flags;
        }
        if self.is_busy(descriptor.channel) {
            return ConfigFlags::Busy;
        }
        match self.loaded.get_mut(descriptor.channel.index()) {
            Some(slot) => {
                *slot = Some(*descriptor);
                ConfigFlags::Ok
            }
            None => ConfigFlags::IncompatibleTrigger,
        }
    }

    fn launch(&mut self, descriptor: &TransferDescriptor) -> ConfigFlags {
        self.record(DmaCall::Launch(descriptor.channel));
        if let Some(flags) = self.injected(DmaStage::Launch) {
            return flags;
        }
        if self.loaded(descriptor.channel) != Some(*descriptor) {
            return ConfigFlags::NotLoaded;
        }
        self.set_busy(descriptor.channel, true);
        ConfigFlags::Ok
    }

    fn stop_circular(&mut self, channel: Channel) {
        self.record(DmaCall::StopCircular(channel));
        self.set_busy(channel, false);
    }

    fn is_busy(&self, channel: Channel) -> bool {
        self.busy.get(channel.index()).copied().unwrap_or(false)
    }
}

/// Mock encoder gate: a register file with a write log.
#[derive(Debug, Default)]
pub struct MockGate {
    regs: [u32; DlcRegister::COUNT],
    writes: heapless::Vec<(DlcRegister, u32), LOG_CAPACITY>,
}

impl MockGate {
    /// All registers at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register writes in arrival order.
    pub fn writes(&self) -> &[(DlcRegister, u32)] {
        &self.writes
    }

    /// Position of the first write to `reg` in the log.
    pub fn first_write(&self, reg: DlcRegister) -> Option<usize> {
        self.writes.iter().position(|(r, _)| *r == reg)
    }

    /// Position of the last write to `reg` in the log.
    pub fn last_write(&self, reg: DlcRegister) -> Option<usize> {
        self.writes.iter().rposition(|(r, _)| *r == reg)
    }
}

impl EncoderGate for MockGate {
    fn write(&mut self, reg: DlcRegister, value: u32) {
        if let Some(r) = self.regs.get_mut(reg.index()) {
            *r = value;
        }
        let _ = self.writes.push((reg, value));
    }

    fn read(&self, reg: DlcRegister) -> u32 {
        self.regs.get(reg.index()).copied().unwrap_or(0)
    }
}

/// One scripted interrupt arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqEvent {
    /// DMA window-done on a channel.
    WindowDone(Channel),
    /// DMA transaction-done on a channel.
    TransactionDone(Channel),
    /// Encoder gate event.
    GateEvent,
    /// Wake with nothing to handle.
    Spurious,
}

impl IrqEvent {
    /// Source that must be enabled for the event to wake the hart.
    pub const fn source(self) -> Option<IrqSource> {
        match self {
            Self::WindowDone(_) => Some(IrqSource::DmaWindowDone),
            Self::TransactionDone(_) => Some(IrqSource::DmaTransactionDone),
            Self::GateEvent => Some(IrqSource::External),
            Self::Spurious => None,
        }
    }

    fn deliver(self, flags: &InterruptFlags) {
        match self {
            Self::WindowDone(ch) => flags.on_window_done(ch),
            Self::TransactionDone(ch) => flags.on_transaction_done(ch),
            Self::GateEvent => flags.on_gate_event(),
            Self::Spurious => {}
        }
    }
}

/// Scripted interrupt source.
///
/// Each `wait_for_interrupt` takes the next scripted event whose source is
/// enabled (events for disabled sources are dropped, the hart never sees
/// them). The handler runs as soon as interrupts are globally unmasked, which
/// is when the counters in the shared [`InterruptFlags`] move. An exhausted
/// script wakes spuriously.
#[derive(Debug)]
pub struct ScriptedInterrupts<'a> {
    flags: &'a InterruptFlags,
    script: heapless::Deque<IrqEvent, LOG_CAPACITY>,
    pending: Option<IrqEvent>,
    enabled: u32,
    masked: bool,
    waits: u32,
    unmasked_waits: u32,
    dropped: u32,
    cancel_after: Option<(u32, &'a CancelToken)>,
}

impl<'a> ScriptedInterrupts<'a> {
    /// Empty script delivering into `flags`.
    pub fn new(flags: &'a InterruptFlags) -> Self {
        Self {
            flags,
            script: heapless::Deque::new(),
            pending: None,
            enabled: 0,
            masked: false,
            waits: 0,
            unmasked_waits: 0,
            dropped: 0,
            cancel_after: None,
        }
    }

    /// Script built from `events`; extra events beyond the capacity are ignored.
    pub fn with_script(flags: &'a InterruptFlags, events: &[IrqEvent]) -> Self {
        let mut irq = Self::new(flags);
        for event in events {
            if irq.push(*event).is_err() {
                break;
            }
        }
        irq
    }

    /// Set `token` once `waits` wakes have happened (models a timer interrupt).
    #[must_use]
    pub fn cancel_after(mut self, waits: u32, token: &'a CancelToken) -> Self {
        self.cancel_after = Some((waits, token));
        self
    }

    /// Append an event to the script.
    pub fn push(&mut self, event: IrqEvent) -> Result<(), IrqEvent> {
        self.script.push_back(event)
    }

    /// Number of `wait_for_interrupt` calls.
    pub fn waits(&self) -> u32 {
        self.waits
    }

    /// Waits issued while interrupts were globally unmasked.
    pub fn unmasked_waits(&self) -> u32 {
        self.unmasked_waits
    }

    /// Scripted events dropped because their source was disabled.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Events not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// `true` while interrupts are globally masked.
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    fn run_pending(&mut self) {
        if let Some(event) = self.pending.take() {
            event.deliver(self.flags);
        }
    }

    fn next_enabled(&mut self) -> IrqEvent {
        while let Some(event) = self.script.pop_front() {
            match event.source() {
                Some(source) if !self.is_enabled(source) => {
                    self.dropped = self.dropped.saturating_add(1);
                }
                _ => return event,
            }
        }
        IrqEvent::Spurious
    }
}

impl InterruptControl for ScriptedInterrupts<'_> {
    fn enable(&mut self, source: IrqSource) {
        self.enabled |= source.mask();
    }

    fn disable(&mut self, source: IrqSource) {
        self.enabled &= !source.mask();
    }

    fn is_enabled(&self, source: IrqSource) -> bool {
        self.enabled & source.mask() != 0
    }
}

impl InterruptWait for ScriptedInterrupts<'_> {
    fn mask_global(&mut self) {
        self.masked = true;
    }

    fn unmask_global(&mut self) {
        self.masked = false;
        self.run_pending();
    }

    fn wait_for_interrupt(&mut self) {
        self.waits = self.waits.saturating_add(1);
        if !self.masked {
            self.unmasked_waits = self.unmasked_waits.saturating_add(1);
        }
        if let Some((after, token)) = self.cancel_after {
            if self.waits >= after {
                token.cancel();
            }
        }
        let event = self.next_enabled();
        self.pending = Some(event);
        if !self.masked {
            self.run_pending();
        }
    }
}

/// Busy-polling wait for threaded tests.
///
/// Counters are moved by another thread; `wait_for_interrupt` only yields.
#[derive(Debug, Default)]
pub struct PollingWait {
    enabled: u32,
    waits: u32,
}

impl PollingWait {
    /// Nothing enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `wait_for_interrupt` calls.
    pub fn waits(&self) -> u32 {
        self.waits
    }
}

impl InterruptControl for PollingWait {
    fn enable(&mut self, source: IrqSource) {
        self.enabled |= source.mask();
    }

    fn disable(&mut self, source: IrqSource) {
        self.enabled &= !source.mask();
    }

    fn is_enabled(&self, source: IrqSource) -> bool {
        self.enabled & source.mask() != 0
    }
}

impl InterruptWait for PollingWait {
    fn mask_global(&mut self) {}

    fn unmask_global(&mut self) {}

    fn wait_for_interrupt(&mut self) {
        self.waits = self.waits.saturating_add(1);
        std::thread::yield_now();
    }
}

/// Mock VCO decoder.
#[derive(Debug, Clone, Default)]
pub struct MockVco {
    /// Positive / negative oscillator enables.
    pub enabled: (bool, bool),
    /// Last refresh rate.
    pub refresh_rate: u16,
    /// Value returned by `count`.
    pub count: u32,
    /// Value returned by `count_register_addr`.
    pub count_addr: usize,
}

impl VcoDecoder for MockVco {
    fn enable(&mut self, positive: bool, negative: bool) {
        self.enabled = (positive, negative);
    }

    fn set_refresh_rate(&mut self, cycles: u16) {
        self.refresh_rate = cycles;
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn count_register_addr(&self) -> usize {
        self.count_addr
    }
}

/// Mock current DAC pair.
#[derive(Debug, Clone, Default)]
pub struct MockDac {
    /// DAC enables.
    pub enabled: (bool, bool),
    /// Calibration codes.
    pub calibration: [u8; 2],
    /// Last refresh rate.
    pub refresh_rate: u16,
    /// Value returned by `current_register_addr`.
    pub current_addr: usize,
}

impl CurrentDac for MockDac {
    fn enable(&mut self, dac1: bool, dac2: bool) {
        self.enabled = (dac1, dac2);
    }

    fn calibrate(&mut self, dac: DacId, value: u8) {
        let slot = match dac {
            DacId::Dac1 => self.calibration.get_mut(0),
            DacId::Dac2 => self.calibration.get_mut(1),
        };
        if let Some(c) = slot {
            *c = value;
        }
    }

    fn set_refresh_rate(&mut self, cycles: u16) {
        self.refresh_rate = cycles;
    }

    fn current_register_addr(&self) -> usize {
        self.current_addr
    }
}

/// Mock decimation filter.
#[derive(Debug, Clone, Default)]
pub struct MockFilter {
    /// Last accepted configuration.
    pub config: Option<FilterConfig>,
    /// `true` between `start` and `stop`.
    pub running: bool,
    /// Number of `start` calls.
    pub starts: u32,
    /// Value returned by `rx_register_addr`.
    pub rx_addr: usize,
}

impl DecimationFilter for MockFilter {
    fn configure(&mut self, config: &FilterConfig) -> Result<(), FilterConfigError> {
        config.validate()?;
        self.config = Some(*config);
        Ok(())
    }

    fn start(&mut self) {
        self.running = true;
        self.starts = self.starts.saturating_add(1);
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn rx_register_addr(&self) -> usize {
        self.rx_addr
    }
}
