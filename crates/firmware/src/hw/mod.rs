//! Register-level backend for the cheep SoC.
//!
//! Each block implements one of the platform traits over volatile MMIO; the
//! trap module holds the statics the interrupt handler shares with the main
//! path. Everything except [`hart`] builds on the host, where tests drive the
//! blocks through plain word arrays.

pub mod afe;
pub mod dma;
pub mod gate;
pub mod map;
pub mod mmio;
pub mod soc;
pub mod timer;
pub mod trap;

#[cfg(all(feature = "hardware", target_arch = "riscv32"))]
pub mod hart;

pub use afe::{FilterBlock, FilterKind, IdacBlock, VcoBlock};
pub use dma::CheepDma;
pub use gate::DlcGate;
pub use map::MemoryMap;
pub use mmio::Mmio;
pub use soc::{FastIntrCtrl, SocCtrl};
pub use timer::RvTimer;

/// Every block the scenarios drive, taken once at boot. The fast interrupt
/// controller belongs to the hart and the trap handler instead.
pub struct Board {
    /// DMA engine.
    pub dma: CheepDma,
    /// Encoder gate.
    pub gate: DlcGate,
    /// VCO decoder.
    pub vco: VcoBlock,
    /// Current DACs.
    pub dac: IdacBlock,
    /// SES filter.
    pub ses: FilterBlock,
    /// CIC decimator.
    pub cic: FilterBlock,
    /// Machine timer.
    pub timer: RvTimer,
    /// SoC control.
    pub soc: SocCtrl,
}

impl Board {
    /// Bind every block at its address in `map`.
    ///
    /// # Safety
    ///
    /// `map` must describe the SoC the code runs on, and only one `Board`
    /// may exist at a time.
    pub unsafe fn new(map: &MemoryMap) -> Self {
        // SAFETY: forwarded to the caller.
        unsafe {
            Self {
                dma: CheepDma::new(Mmio::new(map.dma)),
                gate: DlcGate::new(Mmio::new(map.dlc)),
                vco: VcoBlock::new(Mmio::new(map.vco)),
                dac: IdacBlock::new(Mmio::new(map.idac)),
                ses: FilterBlock::ses(Mmio::new(map.ses)),
                cic: FilterBlock::cic(Mmio::new(map.cic)),
                timer: RvTimer::new(Mmio::new(map.timer)),
                soc: SocCtrl::new(Mmio::new(map.soc_ctrl)),
            }
        }
    }
}
