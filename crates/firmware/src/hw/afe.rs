//! Analog front-end register backends: VCO decoder, current DACs and the
//! two decimation filters.

use platform::{CurrentDac, DacId, DecimationFilter, FilterConfig, FilterConfigError, VcoDecoder};

use super::mmio::Mmio;

mod vco {
    pub const REFRESH_CYCLES: usize = 0x00;
    pub const ENABLE: usize = 0x0C;
    pub const CNT: usize = 0x20;

    pub const P_ENABLE: u32 = 1 << 0;
    pub const N_ENABLE: u32 = 1 << 1;
}

mod idac {
    pub const REFRESH_CYCLES: usize = 0x00;
    pub const ENABLE: usize = 0x08;
    pub const CALIBRATION_1: usize = 0x0C;
    pub const CALIBRATION_2: usize = 0x10;
    pub const CURRENT: usize = 0x14;

    pub const IDAC1_ENABLE: u32 = 1 << 0;
    pub const IDAC2_ENABLE: u32 = 1 << 1;
    pub const CALIBRATION_MASK: u32 = 0x1F;
}

/// SES filter register offsets.
pub mod ses {
    /// Bit 0 runs the filter.
    pub const CONTROL: usize = 0x00;
    /// Smoothing window.
    pub const WINDOW_SIZE: usize = 0x08;
    /// Filter clock divider.
    pub const SYSCLK_DIVISION: usize = 0x0C;
    /// Output decimation.
    pub const DECIM_FACTOR: usize = 0x10;
    /// Stage enable mask.
    pub const ACTIVATED_STAGES: usize = 0x14;
    /// Six 5-bit gain fields, stage 0 in the low bits.
    pub const GAIN_STAGE: usize = 0x18;
    /// Filtered output, read by the DMA.
    pub const RX_DATA: usize = 0x1C;
}

/// CIC decimator register offsets.
pub mod cic {
    /// Bit 0 runs the decimator.
    pub const CONTROL: usize = 0x00;
    /// Filter clock divider.
    pub const SYSCLK_DIVISION: usize = 0x08;
    /// Output decimation.
    pub const DECIM_FACTOR: usize = 0x0C;
    /// Stage enable mask.
    pub const ACTIVATED_STAGES: usize = 0x10;
    /// Comb delay.
    pub const DELAY_COMB: usize = 0x14;
    /// Decimated output, read by the DMA.
    pub const RX_DATA: usize = 0x18;
}

const GAIN_FIELD_BITS: u32 = 5;
const GAIN_FIELD_MASK: u32 = 0x1F;

/// VCO-based ADC decoder.
#[derive(Debug)]
pub struct VcoBlock {
    regs: Mmio,
}

impl VcoBlock {
    /// Decoder whose register block is at `regs`.
    pub const fn new(regs: Mmio) -> Self {
        Self { regs }
    }
}

impl VcoDecoder for VcoBlock {
    fn enable(&mut self, positive: bool, negative: bool) {
        let mut bits = 0;
        if positive {
            bits |= vco::P_ENABLE;
        }
        if negative {
            bits |= vco::N_ENABLE;
        }
        self.regs.write(vco::ENABLE, bits);
    }

    fn set_refresh_rate(&mut self, cycles: u16) {
        self.regs.write(vco::REFRESH_CYCLES, u32::from(cycles));
    }

    fn count(&self) -> u32 {
        self.regs.read(vco::CNT)
    }

    fn count_register_addr(&self) -> usize {
        self.regs.addr(vco::CNT)
    }
}

/// Pair of current DACs.
#[derive(Debug)]
pub struct IdacBlock {
    regs: Mmio,
}

impl IdacBlock {
    /// DAC controller whose register block is at `regs`.
    pub const fn new(regs: Mmio) -> Self {
        Self { regs }
    }
}

impl CurrentDac for IdacBlock {
    fn enable(&mut self, dac1: bool, dac2: bool) {
        let mut bits = 0;
        if dac1 {
            bits |= idac::IDAC1_ENABLE;
        }
        if dac2 {
            bits |= idac::IDAC2_ENABLE;
        }
        self.regs.write(idac::ENABLE, bits);
    }

    fn calibrate(&mut self, dac: DacId, value: u8) {
        let offset = match dac {
            DacId::Dac1 => idac::CALIBRATION_1,
            DacId::Dac2 => idac::CALIBRATION_2,
        };
        self.regs.write(offset, u32::from(value) & idac::CALIBRATION_MASK);
    }

    fn set_refresh_rate(&mut self, cycles: u16) {
        self.regs.write(idac::REFRESH_CYCLES, u32::from(cycles));
    }

    fn current_register_addr(&self) -> usize {
        self.regs.addr(idac::CURRENT)
    }
}

/// Which decimator a [`FilterBlock`] drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterKind {
    /// Smoothing-exponential-sum filter.
    Ses,
    /// CIC decimator.
    Cic,
}

/// One of the two decimation filters.
#[derive(Debug)]
pub struct FilterBlock {
    regs: Mmio,
    kind: FilterKind,
}

impl FilterBlock {
    /// SES filter at `regs`.
    pub const fn ses(regs: Mmio) -> Self {
        Self {
            regs,
            kind: FilterKind::Ses,
        }
    }

    /// CIC decimator at `regs`.
    pub const fn cic(regs: Mmio) -> Self {
        Self {
            regs,
            kind: FilterKind::Cic,
        }
    }

    /// Decimator driven by this block.
    pub const fn kind(&self) -> FilterKind {
        self.kind
    }

    const fn control(&self) -> usize {
        match self.kind {
            FilterKind::Ses => ses::CONTROL,
            FilterKind::Cic => cic::CONTROL,
        }
    }
}

/// Pack the six stage gains into the gain register, 5 bits each.
pub fn pack_gains(gains: &[u32; 6]) -> u32 {
    gains
        .iter()
        .zip((0..).step_by(GAIN_FIELD_BITS as usize))
        .fold(0, |acc, (gain, shift): (&u32, u32)| {
            acc | (gain & GAIN_FIELD_MASK).checked_shl(shift).unwrap_or(0)
        })
}

impl DecimationFilter for FilterBlock {
    fn configure(&mut self, config: &FilterConfig) -> Result<(), FilterConfigError> {
        config.validate()?;
        match (self.kind, config) {
            (FilterKind::Ses, FilterConfig::Ses(p)) => {
                self.regs.write(ses::WINDOW_SIZE, p.window_size);
                self.regs.write(ses::SYSCLK_DIVISION, p.sysclk_division);
                self.regs.write(ses::DECIM_FACTOR, p.decim_factor);
                self.regs.write(ses::ACTIVATED_STAGES, p.activated_stages);
                self.regs.write(ses::GAIN_STAGE, pack_gains(&p.gains));
            }
            (FilterKind::Cic, FilterConfig::Cic(p)) => {
                self.regs.write(cic::SYSCLK_DIVISION, p.sysclk_division);
                self.regs.write(cic::DECIM_FACTOR, p.decim_factor);
                self.regs.write(cic::ACTIVATED_STAGES, p.activated_stages);
                self.regs.write(cic::DELAY_COMB, p.delay_comb);
            }
            (kind, _) => {
                platform::warn!("filter parameters do not match the {:?} block", kind);
                return Err(FilterConfigError::PathMismatch);
            }
        }
        Ok(())
    }

    fn start(&mut self) {
        self.regs.write(self.control(), 1);
    }

    fn stop(&mut self) {
        self.regs.write(self.control(), 0);
    }

    fn rx_register_addr(&self) -> usize {
        self.regs.addr(match self.kind {
            FilterKind::Ses => ses::RX_DATA,
            FilterKind::Cic => cic::RX_DATA,
        })
    }
}
