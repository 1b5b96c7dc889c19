//! SoC control (exit reporting) and the fast interrupt controller.

use platform::IrqSource;

use super::mmio::Mmio;

const EXIT_VALID: usize = 0x0;
const EXIT_VALUE: usize = 0x4;

const FIC_PENDING: usize = 0x0;
const FIC_CLEAR: usize = 0x4;
const FIC_ENABLE: usize = 0x8;

/// First machine interrupt code routed through the fast interrupt controller.
const FAST_BASE: u32 = 16;

/// SoC control block.
#[derive(Debug)]
pub struct SocCtrl {
    regs: Mmio,
}

impl SocCtrl {
    /// Control block at `regs`.
    pub const fn new(regs: Mmio) -> Self {
        Self { regs }
    }

    /// Publish `code` to the test bench. Value first, then the valid flag.
    pub fn report_exit(&mut self, code: u32) {
        self.regs.write(EXIT_VALUE, code);
        self.regs.write(EXIT_VALID, 1);
    }

    /// Publish `code` and park the hart.
    pub fn exit(&mut self, code: u32) -> ! {
        self.report_exit(code);
        loop {
            core::hint::spin_loop();
        }
    }
}

/// Fast interrupt line of `source`, if it is routed through the controller.
pub const fn fast_line(source: IrqSource) -> Option<u32> {
    source.bit().checked_sub(FAST_BASE)
}

/// Fast interrupt controller.
#[derive(Debug)]
pub struct FastIntrCtrl {
    regs: Mmio,
}

impl FastIntrCtrl {
    /// Controller at `regs`.
    pub const fn new(regs: Mmio) -> Self {
        Self { regs }
    }

    /// Route `source` to the hart. No-op for core-local sources.
    pub fn enable(&mut self, source: IrqSource) {
        if let Some(line) = fast_line(source) {
            self.regs.modify(FIC_ENABLE, |v| v | (1 << line));
        }
    }

    /// Stop routing `source` to the hart. No-op for core-local sources.
    pub fn disable(&mut self, source: IrqSource) {
        if let Some(line) = fast_line(source) {
            self.regs.modify(FIC_ENABLE, |v| v & !(1 << line));
        }
    }

    /// Acknowledge `source`. Must run before returning from its handler or
    /// the line fires again.
    pub fn clear_pending(&mut self, source: IrqSource) {
        if let Some(line) = fast_line(source) {
            self.regs.write(FIC_CLEAR, 1 << line);
        }
    }

    /// `true` if `source` is latched.
    pub fn is_pending(&self, source: IrqSource) -> bool {
        fast_line(source).is_some_and(|line| self.regs.read(FIC_PENDING) & (1 << line) != 0)
    }
}
