//! Boot sequence shared by the two images.
//!
//! Order matters:
//!   1. Timer prescaled to microseconds (settling delays and the deadline
//!      both count in timer ticks)
//!   2. Cancellation cleared, deadline armed if the profile has one
//!   3. Scenario
//!   4. Deadline disarmed, exit code reported through SoC control
//!
//! The run functions take the interrupt controller and the shared counters
//! as parameters so the whole sequence also runs on the host against
//! register files and scripted interrupts.

use acquisition::ResultBuffer;
use platform::config::{banner, APP_NAME, APP_VERSION};
use platform::{CancelToken, InterruptControl, InterruptFlags, InterruptWait, IrqSource};

use crate::hw::{Board, MemoryMap, RvTimer};
use crate::profile::{DualChannelProfile, FilterChainProfile, FilterPath};
use crate::scenario::{dual_channel, exit_code, filter_chain, Rig};

/// Ordered boot steps, for documentation and tests.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. timer: prescale the system clock to 1 MHz",
    "2. deadline: clear the cancel token, arm the timer when the profile has a timeout",
    "3. scenario: run one acquisition session",
    "4. deadline: disarm, then report the exit code",
];

/// Interrupt counters and the cancellation token the trap handler feeds.
#[derive(Clone, Copy)]
pub struct Shared<'a> {
    /// Interrupt counters.
    pub flags: &'a InterruptFlags,
    /// Set when the deadline passes.
    pub cancel: &'a CancelToken,
}

/// Log the banner and bring the timer up.
pub fn init(board: &mut Board, map: &MemoryMap) {
    platform::info!("{} {} - {}", APP_NAME, APP_VERSION, banner());
    board.timer.init(map.sysclk_hz);
}

/// Arm the acquisition deadline. Returns `false` when there is none.
pub fn arm_deadline<I: InterruptControl + ?Sized>(
    timer: &mut RvTimer,
    irq: &mut I,
    timeout_us: Option<u32>,
) -> bool {
    let Some(us) = timeout_us else {
        return false;
    };
    platform::debug!("deadline in {} us", us);
    timer.arm_deadline(us);
    irq.enable(IrqSource::Timer);
    true
}

fn disarm_deadline<I: InterruptControl + ?Sized>(timer: &mut RvTimer, irq: &mut I) {
    irq.disable(IrqSource::Timer);
    timer.disarm();
}

/// Dual-channel session on `board`. Returns the exit code.
pub fn run_dual_channel<I, const N: usize>(
    board: &mut Board,
    irq: &mut I,
    shared: Shared<'_>,
    profile: &DualChannelProfile,
    results: &ResultBuffer<i16, N>,
) -> u32
where
    I: InterruptControl + InterruptWait,
{
    // An earlier session's deadline must not end this one.
    shared.cancel.reset();
    arm_deadline(&mut board.timer, irq, profile.timeout_us);
    let rig = Rig {
        dma: &mut board.dma,
        gate: &mut board.gate,
        irq: &mut *irq,
        flags: shared.flags,
        cancel: Some(shared.cancel),
    };
    let result = dual_channel::run(
        profile,
        rig,
        &mut board.vco,
        &mut board.dac,
        &mut board.timer,
        results,
    );
    disarm_deadline(&mut board.timer, irq);
    report(exit_code(&result))
}

/// Filter-chain session on `board`. Returns the exit code.
pub fn run_filter_chain<I, const N: usize>(
    board: &mut Board,
    irq: &mut I,
    shared: Shared<'_>,
    profile: &FilterChainProfile,
    results: &ResultBuffer<u8, N>,
) -> u32
where
    I: InterruptControl + InterruptWait,
{
    // An earlier session's deadline must not end this one.
    shared.cancel.reset();
    arm_deadline(&mut board.timer, irq, profile.timeout_us);
    let rig = Rig {
        dma: &mut board.dma,
        gate: &mut board.gate,
        irq: &mut *irq,
        flags: shared.flags,
        cancel: Some(shared.cancel),
    };
    let filter = match profile.path {
        FilterPath::Ses => &mut board.ses,
        FilterPath::Cic => &mut board.cic,
    };
    let result = filter_chain::run(profile, rig, filter, results);
    disarm_deadline(&mut board.timer, irq);
    report(exit_code(&result))
}

fn report(code: u32) -> u32 {
    if code == platform::config::EXIT_SUCCESS {
        platform::info!("acquisition passed");
    } else {
        platform::error!("acquisition failed, exit code {}", code);
    }
    code
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use platform::mocks::{IrqEvent, ScriptedInterrupts};
    use platform::{Channel, DlcRegister, EncoderGate};

    use super::*;
    use crate::golden;
    use crate::hw::mmio::RegisterFile;
    use crate::hw::{dma, CheepDma, DlcGate, FilterBlock, IdacBlock, SocCtrl, VcoBlock};

    const ACQ: Channel = Channel::ACQUISITION;

    struct Blocks {
        dma: RegisterFile<128>,
        dlc: RegisterFile<{ DlcRegister::COUNT }>,
        vco: RegisterFile<12>,
        idac: RegisterFile<6>,
        ses: RegisterFile<8>,
        cic: RegisterFile<8>,
        timer: RegisterFile<72>,
        soc: RegisterFile<2>,
    }

    impl Blocks {
        fn new() -> Self {
            let blocks = Self {
                dma: RegisterFile::new(),
                dlc: RegisterFile::new(),
                vco: RegisterFile::new(),
                idac: RegisterFile::new(),
                ses: RegisterFile::new(),
                cic: RegisterFile::new(),
                timer: RegisterFile::new(),
                soc: RegisterFile::new(),
            };
            // Both channels idle.
            blocks.dma.set_word(dma::reg::STATUS, 1);
            blocks
                .dma
                .set_word(crate::hw::map::DMA_CHANNEL_STRIDE + dma::reg::STATUS, 1);
            blocks
        }

        fn board(&self) -> Board {
            Board {
                dma: CheepDma::new(self.dma.mmio()),
                gate: DlcGate::new(self.dlc.mmio()),
                vco: VcoBlock::new(self.vco.mmio()),
                dac: IdacBlock::new(self.idac.mmio()),
                ses: FilterBlock::ses(self.ses.mmio()),
                cic: FilterBlock::cic(self.cic.mmio()),
                timer: RvTimer::new(self.timer.mmio()),
                soc: SocCtrl::new(self.soc.mmio()),
            }
        }
    }

    fn windows(n: usize) -> Vec<IrqEvent> {
        vec![IrqEvent::WindowDone(ACQ); n]
    }

    #[test]
    fn steps_are_ordered() {
        assert_eq!(BOOT_SEQUENCE_STEPS.len(), 4);
        assert!(BOOT_SEQUENCE_STEPS
            .iter()
            .enumerate()
            .all(|(i, s)| s.starts_with(&format!("{}.", i + 1))));
    }

    #[test]
    fn no_timeout_leaves_the_timer_alone() {
        let blocks = Blocks::new();
        let mut board = blocks.board();
        let flags = InterruptFlags::new();
        let mut irq = ScriptedInterrupts::new(&flags);
        assert!(!arm_deadline(&mut board.timer, &mut irq, None));
        assert!(!irq.is_enabled(IrqSource::Timer));

        assert!(arm_deadline(&mut board.timer, &mut irq, Some(1_000)));
        assert!(irq.is_enabled(IrqSource::Timer));
        assert_eq!(blocks.timer.word(0x118), 1_000);
    }

    #[test]
    fn filter_chain_passes_on_golden_capture() {
        let blocks = Blocks::new();
        let mut board = blocks.board();
        let flags = InterruptFlags::new();
        let cancel = CancelToken::new();
        let mut irq = ScriptedInterrupts::with_script(&flags, &windows(5));
        let profile = FilterChainProfile {
            timeout_us: Some(50_000),
            ..FilterChainProfile::new(FilterPath::Ses)
        };
        let results = ResultBuffer::<u8, 436>::new(0);
        for (i, v) in golden::FILTER_CHAIN.iter().enumerate() {
            assert!(results.write(i, *v));
        }

        let code = run_filter_chain(
            &mut board,
            &mut irq,
            Shared {
                flags: &flags,
                cancel: &cancel,
            },
            &profile,
            &results,
        );

        assert_eq!(code, 0);
        assert_eq!(board.gate.read(DlcRegister::TransSize), 64);
        // DMA left in single mode, filter stopped, deadline disarmed.
        assert_eq!(blocks.dma.word(dma::reg::MODE), 0);
        assert_eq!(blocks.ses.word(crate::hw::afe::ses::CONTROL), 0);
        assert_eq!(blocks.ses.word(crate::hw::afe::ses::DECIM_FACTOR), 32);
        assert!(!irq.is_enabled(IrqSource::Timer));
        assert_eq!(blocks.cic.word(crate::hw::afe::cic::DECIM_FACTOR), 0);
    }

    #[test]
    fn earlier_deadline_does_not_cancel_the_next_session() {
        let blocks = Blocks::new();
        let mut board = blocks.board();
        let flags = InterruptFlags::new();
        let cancel = CancelToken::new();
        // Deadline of the previous path fired.
        cancel.cancel();
        let mut irq = ScriptedInterrupts::with_script(&flags, &windows(5));
        let results = ResultBuffer::<u8, 436>::new(0);
        for (i, v) in golden::FILTER_CHAIN.iter().enumerate() {
            assert!(results.write(i, *v));
        }

        let code = run_filter_chain(
            &mut board,
            &mut irq,
            Shared {
                flags: &flags,
                cancel: &cancel,
            },
            &FilterChainProfile::new(FilterPath::Cic),
            &results,
        );

        assert_eq!(code, 0);
        assert!(!cancel.is_cancelled());
        assert_eq!(board.gate.read(DlcRegister::TransSize), 136);
    }

    #[test]
    fn cancelled_dual_channel_exits_with_wait_class() {
        let blocks = Blocks::new();
        let mut board = blocks.board();
        let flags = InterruptFlags::new();
        let cancel = CancelToken::new();
        let mut irq = ScriptedInterrupts::new(&flags).cancel_after(3, &cancel);
        let profile = DualChannelProfile {
            settle_us: 0,
            ..DualChannelProfile::default()
        };
        let results = ResultBuffer::<i16, 500>::new(0);

        let code = run_dual_channel(
            &mut board,
            &mut irq,
            Shared {
                flags: &flags,
                cancel: &cancel,
            },
            &profile,
            &results,
        );

        assert_eq!(code, 4);
        // Front end powered down on the failure path too.
        assert_eq!(blocks.vco.word(0x0C), 0);
        assert_eq!(blocks.idac.word(0x08), 0);
    }
}
