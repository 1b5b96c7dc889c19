//! Peripheral base addresses.

/// Base address of every register block the firmware touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryMap {
    /// SoC control (exit value / exit valid).
    pub soc_ctrl: usize,
    /// DMA engine, channel 0; later channels follow at [`DMA_CHANNEL_STRIDE`].
    pub dma: usize,
    /// Always-on timer.
    pub timer: usize,
    /// Fast interrupt controller.
    pub fast_intr: usize,
    /// Level-crossing encoder gate.
    pub dlc: usize,
    /// VCO decoder.
    pub vco: usize,
    /// Current DAC controller.
    pub idac: usize,
    /// SES filter.
    pub ses: usize,
    /// CIC decimator.
    pub cic: usize,
    /// System clock, used to scale the timer to microseconds.
    pub sysclk_hz: u32,
}

/// Distance between two DMA channel register blocks.
pub const DMA_CHANNEL_STRIDE: usize = 0x100;

impl MemoryMap {
    /// cheep SoC.
    pub const CHEEP: Self = Self {
        soc_ctrl: 0x2000_0000,
        dma: 0x2003_0000,
        timer: 0x2006_0000,
        fast_intr: 0x2007_0000,
        dlc: 0x2008_0000,
        vco: 0x2008_1000,
        idac: 0x2008_2000,
        ses: 0x2008_3000,
        cic: 0x3006_0000,
        sysclk_hz: 20_000_000,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_do_not_share_a_page() {
        let m = MemoryMap::CHEEP;
        let mut bases = [
            m.soc_ctrl,
            m.dma,
            m.timer,
            m.fast_intr,
            m.dlc,
            m.vco,
            m.idac,
            m.ses,
            m.cic,
        ];
        bases.sort_unstable();
        assert!(bases.windows(2).all(|w| matches!(w, [a, b] if b.saturating_sub(*a) >= 0x1000)));
    }

    #[test]
    fn bases_are_word_aligned() {
        let m = MemoryMap::CHEEP;
        assert!([m.dma, m.dlc, m.vco, m.idac, m.ses, m.cic]
            .iter()
            .all(|b| b.trailing_zeros() >= 2));
    }
}
