//! Encoder gate register backend.

use platform::{DlcRegister, EncoderGate};

use super::mmio::Mmio;

/// dLC register block.
#[derive(Debug)]
pub struct DlcGate {
    regs: Mmio,
}

impl DlcGate {
    /// Gate whose register block is at `regs`.
    pub const fn new(regs: Mmio) -> Self {
        Self { regs }
    }
}

impl EncoderGate for DlcGate {
    fn write(&mut self, reg: DlcRegister, value: u32) {
        self.regs.write(reg.offset(), value);
    }

    fn read(&self, reg: DlcRegister) -> u32 {
        self.regs.read(reg.offset())
    }
}
