//! End-to-end coordinator runs against the platform mocks.

// Test files legitimately use arithmetic for verification; allow at file level.
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use acquisition::{
    AwaitError, Coordinator, CoordinatorConfig, FinalizeError, IntegrityError, LaunchError, Mode,
    ModeError, ResultBuffer, WaitBudget,
};
use platform::mocks::{DmaCall, IrqEvent, MockDma, MockGate, ScriptedInterrupts};
use platform::{
    CancelToken, Channel, ConfigFlags, DataType, DeltaFormat, Dimensions, DlcParams, DlcRegister,
    DmaEngine, DmaStage, EncoderGate, Endpoint, IntegrityChecks, InterruptControl, InterruptFlags,
    IrqSource, Realign, TransferDescriptor, TransferEnd, TransferMode, Trigger,
};

const ACQ: Channel = Channel::ACQUISITION;
const STIM: Channel = Channel::STIMULUS;
const GOLDEN: [i16; 3] = [61, 101, 213];
const VCO_COUNT_REG: usize = 0x2000_4010;

fn params() -> DlcParams {
    DlcParams {
        format: DeltaFormat::SignMagnitude,
        log_level_width: 7,
        amplitude_bits: 2,
        time_bits: 6,
        hysteresis: true,
        discard_bits: 0,
        bypass: false,
    }
}

fn acquisition(buffer: &ResultBuffer<i16, 200>) -> TransferDescriptor {
    TransferDescriptor {
        channel: ACQ,
        src: Endpoint::register(VCO_COUNT_REG, DataType::HalfWord, Trigger::ExtRx),
        dst: buffer.endpoint(),
        dim: Dimensions::OneD,
        size_d1_du: 200,
        mode: TransferMode::Circular,
        end: TransferEnd::Interrupt,
        window_du: 50,
        hw_fifo: true,
    }
}

fn config(wakes: u32) -> CoordinatorConfig {
    CoordinatorConfig {
        wait_budget: WaitBudget::wakes(wakes),
        verbose: true,
        ..CoordinatorConfig::default()
    }
}

fn capture(buffer: &ResultBuffer<i16, 200>, values: &[i16]) {
    for (i, v) in values.iter().enumerate() {
        assert!(buffer.write(i, *v));
    }
}

fn run_dual_phase(captured: &[i16]) -> (Result<(), FinalizeError>, MockDma, ScriptedInterrupts<'static>) {
    // Tests in this file run in parallel; each run gets its own counters.
    let flags: &'static InterruptFlags = Box::leak(Box::new(InterruptFlags::new()));
    let buffer: &'static ResultBuffer<i16, 200> = Box::leak(Box::new(ResultBuffer::new(0)));

    let irq = ScriptedInterrupts::with_script(
        flags,
        &[
            IrqEvent::WindowDone(ACQ),
            IrqEvent::WindowDone(ACQ),
            IrqEvent::WindowDone(ACQ),
            IrqEvent::TransactionDone(ACQ),
            IrqEvent::WindowDone(ACQ),
            IrqEvent::WindowDone(ACQ),
            IrqEvent::TransactionDone(ACQ),
            // Lands after the DMA sources are disabled.
            IrqEvent::WindowDone(ACQ),
            IrqEvent::GateEvent,
        ],
    );
    let mut c = Coordinator::new(MockDma::new(), MockGate::new(), irq, flags, config(32));

    c.program_gate(&params(), 200).unwrap();
    c.seed_level(0x1_0000).unwrap();
    let ready = c.configure(&acquisition(buffer)).unwrap();
    let armed = c.arm(ready).unwrap();
    assert_eq!(armed.cycle, 200);
    assert!(c.irq().is_enabled(IrqSource::DmaWindowDone));
    assert!(c.irq().is_enabled(IrqSource::DmaTransactionDone));

    let snap = c.await_progress(7).unwrap();
    assert_eq!(snap.windows, 5);
    assert_eq!(snap.transactions, 2);
    assert_eq!(snap.wakes, 7, "returned before the 7th event");
    assert_eq!(c.irq().remaining(), 2);

    c.switch_to_bypass(params().log_level_width + 2).unwrap();
    assert_eq!(c.mode(), Mode::BypassArmed);
    assert_eq!(c.gate().read(DlcRegister::LogLevelWidth), 9);
    assert_eq!(c.gate().read(DlcRegister::Bypass), 1);
    assert!(!c.irq().is_enabled(IrqSource::DmaWindowDone));
    assert!(c.irq().is_enabled(IrqSource::External));

    let gate = c.await_gate_event(1).unwrap();
    assert_eq!(gate.gate_events, 1);
    assert_eq!(c.mode(), Mode::BypassActive);
    assert_eq!(c.irq().dropped(), 1);

    capture(buffer, captured);
    let result = c.finalize(buffer, &GOLDEN);
    assert_eq!(c.mode(), Mode::Done);
    assert!(c.results(buffer).is_ok());
    let (dma, _gate, irq) = c.into_parts();
    (result, dma, irq)
}

#[test]
fn golden_capture_passes() {
    let (result, dma, irq) = run_dual_phase(&GOLDEN);
    assert_eq!(result, Ok(()));
    assert!(dma.stopped(ACQ));
    assert!(!dma.is_busy(ACQ));
    for source in IrqSource::ALL {
        assert!(!irq.is_enabled(source), "{source:?} left enabled");
    }
    assert_eq!(irq.unmasked_waits(), 0);
}

#[test]
fn mutated_capture_reports_exactly_one_mismatch() {
    let (result, _, _) = run_dual_phase(&[61, 102, 213]);
    match result {
        Err(FinalizeError::Integrity(report)) => {
            assert_eq!(report.errors, 1);
            assert_eq!(
                report.details.as_slice(),
                &[IntegrityError::Mismatch {
                    index: 1,
                    expected: 101,
                    actual: 102
                }]
            );
        }
        other => panic!("expected one mismatch, got {other:?}"),
    }
}

#[test]
fn forced_wake_below_threshold_does_not_return() {
    let flags = InterruptFlags::new();
    let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);
    let irq = ScriptedInterrupts::with_script(
        &flags,
        &[
            IrqEvent::WindowDone(ACQ),
            IrqEvent::Spurious,
            IrqEvent::WindowDone(STIM),
            IrqEvent::TransactionDone(STIM),
            IrqEvent::Spurious,
            IrqEvent::TransactionDone(ACQ),
        ],
    );
    let mut c = Coordinator::new(MockDma::new(), MockGate::new(), irq, &flags, config(16));
    c.program_gate(&params(), 200).unwrap();
    let ready = c.configure(&acquisition(&buffer)).unwrap();
    c.arm(ready).unwrap();

    let snap = c.await_progress(2).unwrap();
    assert_eq!(snap.progress(), 2);
    assert_eq!(snap.wakes, 6);
    assert_eq!(c.irq().remaining(), 0);
}

#[test]
fn bypass_before_target_met_fails() {
    let flags = InterruptFlags::new();
    let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);
    let irq = ScriptedInterrupts::with_script(&flags, &[IrqEvent::WindowDone(ACQ)]);
    let mut c = Coordinator::new(MockDma::new(), MockGate::new(), irq, &flags, config(3));
    c.program_gate(&params(), 200).unwrap();
    let ready = c.configure(&acquisition(&buffer)).unwrap();
    c.arm(ready).unwrap();

    assert_eq!(c.await_progress(7), Err(AwaitError::Timeout { wakes: 3 }));
    assert_eq!(
        c.switch_to_bypass(9),
        Err(ModeError::TargetNotMet {
            observed: 1,
            target: 7
        })
    );
    assert_eq!(c.gate().read(DlcRegister::Bypass), 0);

    let snap = c.abort().unwrap();
    assert_eq!(snap.mode, Mode::Done);
    assert!(c.dma().stopped(ACQ));
    assert_eq!(
        c.switch_to_bypass(9),
        Err(ModeError::IllegalTransition {
            from: Mode::Done,
            to: Mode::BypassArmed
        })
    );
}

#[test]
fn counters_from_before_the_session_are_ignored() {
    let flags = InterruptFlags::new();
    for _ in 0..10 {
        flags.on_window_done(ACQ);
    }
    flags.on_gate_event();

    let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);
    let irq = ScriptedInterrupts::with_script(&flags, &[IrqEvent::WindowDone(ACQ)]);
    let mut c = Coordinator::new(MockDma::new(), MockGate::new(), irq, &flags, config(4));
    c.program_gate(&params(), 200).unwrap();
    let ready = c.configure(&acquisition(&buffer)).unwrap();
    c.arm(ready).unwrap();

    let snap = c.await_progress(1).unwrap();
    assert_eq!(snap.windows, 1);
    assert_eq!(snap.gate_events, 0);
}

#[test]
fn busy_channel_is_refused() {
    let flags = InterruptFlags::new();
    let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);
    let mut dma = MockDma::new();
    dma.set_busy(ACQ, true);
    let mut c = Coordinator::new(dma, MockGate::new(), ScriptedInterrupts::new(&flags), &flags, config(1));
    c.program_gate(&params(), 200).unwrap();
    let ready = c.configure(&acquisition(&buffer)).unwrap();
    assert_eq!(c.arm(ready), Err(LaunchError::EngineBusy { channel: ACQ }));
    assert!(c.dma().calls().is_empty());
}

/// Engine whose status always reads idle, as a circular channel can between
/// cycles.
struct AlwaysIdle(MockDma);

impl DmaEngine for AlwaysIdle {
    fn validate(&self, d: &TransferDescriptor, realign: Realign, checks: IntegrityChecks) -> ConfigFlags {
        self.0.validate(d, realign, checks)
    }

    fn load(&mut self, d: &TransferDescriptor) -> ConfigFlags {
        self.0.set_busy(d.channel, false);
        self.0.load(d)
    }

    fn launch(&mut self, d: &TransferDescriptor) -> ConfigFlags {
        self.0.launch(d)
    }

    fn stop_circular(&mut self, channel: Channel) {
        self.0.stop_circular(channel);
    }

    fn is_busy(&self, _channel: Channel) -> bool {
        false
    }
}

#[test]
fn active_channel_is_refused_even_when_engine_reads_idle() {
    let flags = InterruptFlags::new();
    let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);
    let mut c = Coordinator::new(
        AlwaysIdle(MockDma::new()),
        MockGate::new(),
        ScriptedInterrupts::new(&flags),
        &flags,
        config(1),
    );
    c.program_gate(&params(), 200).unwrap();
    let first = c.configure(&acquisition(&buffer)).unwrap();
    c.arm(first).unwrap();

    let wider = TransferDescriptor {
        window_du: 100,
        ..acquisition(&buffer)
    };
    let second = c.configure(&wider).unwrap();
    assert_eq!(c.arm(second), Err(LaunchError::EngineBusy { channel: ACQ }));

    let launches = c
        .dma()
        .0
        .calls()
        .iter()
        .filter(|call| matches!(call, DmaCall::Launch(_)))
        .count();
    assert_eq!(launches, 1);
    assert_eq!(c.dma().0.loaded(ACQ).map(|d| d.window_du), Some(50));
    assert_eq!(c.active_channels(), &[ACQ]);
}

#[test]
fn bypass_never_narrows_the_level_width() {
    let flags = InterruptFlags::new();
    let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);
    let irq = ScriptedInterrupts::with_script(&flags, &[IrqEvent::WindowDone(ACQ); 7]);
    let mut c = Coordinator::new(MockDma::new(), MockGate::new(), irq, &flags, config(16));
    c.program_gate(&params(), 200).unwrap();
    let ready = c.configure(&acquisition(&buffer)).unwrap();
    c.arm(ready).unwrap();
    c.await_progress(7).unwrap();

    assert_eq!(
        c.switch_to_bypass(params().log_level_width - 2),
        Err(ModeError::NarrowingBypass {
            current: 7,
            requested: 5
        })
    );
    assert_eq!(c.mode(), Mode::Acquiring);
    assert_eq!(c.gate().read(DlcRegister::Bypass), 0);
    assert_eq!(c.gate().read(DlcRegister::LogLevelWidth), 7);
    assert!(c.irq().is_enabled(IrqSource::DmaWindowDone));

    // Keeping the same width is allowed.
    c.switch_to_bypass(params().log_level_width).unwrap();
    assert_eq!(c.mode(), Mode::BypassArmed);
    c.abort().unwrap();
}

#[test]
fn engine_rejection_reports_stage_and_flags() {
    for stage in [DmaStage::Validate, DmaStage::Load, DmaStage::Launch] {
        let flags = InterruptFlags::new();
        let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);
        let dma = MockDma::rejecting(stage, ConfigFlags::WindowSize);
        let mut c = Coordinator::new(dma, MockGate::new(), ScriptedInterrupts::new(&flags), &flags, config(1));
        c.program_gate(&params(), 200).unwrap();
        let ready = c.configure(&acquisition(&buffer)).unwrap();
        assert_eq!(
            c.arm(ready),
            Err(LaunchError::Rejected {
                stage,
                flags: ConfigFlags::WindowSize
            })
        );
        assert!(c.active_channels().is_empty());
        // Error paths still tear down cleanly.
        assert!(c.abort().is_ok());
    }
}

#[test]
fn gate_size_must_match_cycle() {
    let flags = InterruptFlags::new();
    let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);
    let mut c = Coordinator::new(MockDma::new(), MockGate::new(), ScriptedInterrupts::new(&flags), &flags, config(1));
    c.program_gate(&params(), 100).unwrap();
    let ready = c.configure(&acquisition(&buffer)).unwrap();
    assert_eq!(
        c.arm(ready),
        Err(LaunchError::GateSizeMismatch {
            gate: 100,
            cycle: 200
        })
    );
}

#[test]
fn stimulus_channel_runs_alongside_acquisition() {
    let flags = InterruptFlags::new();
    let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);
    let stimulus: ResultBuffer<u16, 200> = ResultBuffer::new(0x200);
    let mut c = Coordinator::new(MockDma::new(), MockGate::new(), ScriptedInterrupts::new(&flags), &flags, config(1));
    c.program_gate(&params(), 200).unwrap();

    let stim = TransferDescriptor {
        channel: STIM,
        src: stimulus.endpoint(),
        dst: Endpoint::register(0x2000_6000, DataType::HalfWord, Trigger::ExtTx),
        dim: Dimensions::OneD,
        size_d1_du: 200,
        mode: TransferMode::Circular,
        end: TransferEnd::Interrupt,
        window_du: 0,
        hw_fifo: false,
    };
    let ready = c.configure(&stim).unwrap();
    c.arm(ready).unwrap();
    let ready = c.configure(&acquisition(&buffer)).unwrap();
    c.arm(ready).unwrap();
    assert_eq!(c.active_channels(), &[STIM, ACQ]);

    c.abort().unwrap();
    assert!(c.dma().stopped(STIM));
    assert!(c.dma().stopped(ACQ));
    assert_eq!(
        c.dma()
            .calls()
            .iter()
            .filter(|call| matches!(call, DmaCall::StopCircular(_)))
            .count(),
        2
    );
}

#[test]
fn timer_cancellation_ends_the_wait() {
    let flags = InterruptFlags::new();
    let token = CancelToken::new();
    let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);
    let irq = ScriptedInterrupts::new(&flags).cancel_after(3, &token);
    let mut c = Coordinator::new(
        MockDma::new(),
        MockGate::new(),
        irq,
        &flags,
        CoordinatorConfig::default(),
    )
    .with_cancel(&token);
    c.program_gate(&params(), 200).unwrap();
    let ready = c.configure(&acquisition(&buffer)).unwrap();
    c.arm(ready).unwrap();

    assert_eq!(c.await_progress(7), Err(AwaitError::Cancelled { wakes: 3 }));
    assert!(c.abort().is_ok());
}

#[test]
fn threaded_producer_with_polling_wait() {
    use platform::mocks::PollingWait;

    let flags = InterruptFlags::new();
    let token = CancelToken::new();
    let buffer: ResultBuffer<i16, 200> = ResultBuffer::new(0);

    std::thread::scope(|s| {
        let mut c = Coordinator::new(
            MockDma::new(),
            MockGate::new(),
            PollingWait::new(),
            &flags,
            CoordinatorConfig::default(),
        )
        .with_cancel(&token);
        c.program_gate(&params(), 200).unwrap();
        let ready = c.configure(&acquisition(&buffer)).unwrap();
        c.arm(ready).unwrap();

        let producer = s.spawn(|| {
            for i in 0..7 {
                if i % 3 == 2 {
                    flags.on_transaction_done(ACQ);
                } else {
                    flags.on_window_done(ACQ);
                }
                std::thread::yield_now();
            }
        });

        let snap = c.await_progress(7).unwrap();
        assert!(snap.progress() >= 7);
        producer.join().unwrap();
        c.abort().unwrap();
    });
}
