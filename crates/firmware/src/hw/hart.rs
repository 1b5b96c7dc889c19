//! Machine-mode interrupt control of the local hart.

use core::arch::asm;

use platform::{InterruptControl, InterruptWait, IrqSource};
use riscv::register::{mie, mstatus};

use super::map::MemoryMap;
use super::mmio::Mmio;
use super::soc::FastIntrCtrl;

/// The hart's `mie`/`mstatus` view, plus the fast interrupt controller
/// that gates the DMA and gate lines.
pub struct Hart {
    fic: FastIntrCtrl,
}

impl Hart {
    /// Take interrupt control of the current hart.
    ///
    /// # Safety
    ///
    /// `map` must describe the SoC the code runs on, and only one `Hart`
    /// may exist.
    pub unsafe fn new(map: &MemoryMap) -> Self {
        // SAFETY: forwarded to the caller.
        let fic = unsafe { Mmio::new(map.fast_intr) };
        Self {
            fic: FastIntrCtrl::new(fic),
        }
    }
}

impl InterruptControl for Hart {
    fn enable(&mut self, source: IrqSource) {
        self.fic.enable(source);
        // SAFETY: setting an enable bit only lets an installed handler run.
        unsafe { asm!("csrs mie, {0}", in(reg) source.mask()) };
    }

    fn disable(&mut self, source: IrqSource) {
        // SAFETY: clearing an enable bit cannot break memory safety.
        unsafe { asm!("csrc mie, {0}", in(reg) source.mask()) };
        self.fic.disable(source);
    }

    fn is_enabled(&self, source: IrqSource) -> bool {
        mie::read().bits() & (source.mask() as usize) != 0
    }
}

impl InterruptWait for Hart {
    fn mask_global(&mut self) {
        // SAFETY: masking only delays handlers.
        unsafe { mstatus::clear_mie() };
    }

    fn unmask_global(&mut self) {
        // SAFETY: the trap handler only touches atomics and register blocks
        // owned by the trap module.
        unsafe { mstatus::set_mie() };
    }

    fn wait_for_interrupt(&mut self) {
        // wfi returns on a pending enabled interrupt even with mstatus.MIE
        // clear, so nothing arriving after the caller's check is lost.
        // SAFETY: wfi has no memory effects.
        unsafe { riscv::asm::wfi() };
    }
}
