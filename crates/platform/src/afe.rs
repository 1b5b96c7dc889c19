//! Analog front-end abstractions
//!
//! The register-level drivers live behind these traits. The acquisition path
//! needs only enables, refresh rates and the DMA-facing register addresses.

/// VCO-based ADC decoder.
pub trait VcoDecoder {
    /// Enable or disable the positive and negative oscillators.
    fn enable(&mut self, positive: bool, negative: bool);

    /// Sampling period in system clock cycles.
    fn set_refresh_rate(&mut self, cycles: u16);

    /// Current decoder count.
    fn count(&self) -> u32;

    /// Address of the count register read by the DMA.
    fn count_register_addr(&self) -> usize;
}

/// Current-output DAC selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DacId {
    /// First DAC.
    Dac1,
    /// Second DAC.
    Dac2,
}

/// Pair of current-output DACs fed by one DMA channel.
pub trait CurrentDac {
    /// Enable or disable each DAC. `enable(false, false)` powers both down.
    fn enable(&mut self, dac1: bool, dac2: bool);

    /// Per-DAC calibration code.
    fn calibrate(&mut self, dac: DacId, value: u8);

    /// Update period in system clock cycles.
    fn set_refresh_rate(&mut self, cycles: u16);

    /// Address of the current register written by the DMA.
    fn current_register_addr(&self) -> usize;
}

/// Smoothing-exponential-sum filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SesConfig {
    /// Smoothing window.
    pub window_size: u32,
    /// Output decimation.
    pub decim_factor: u32,
    /// Filter clock divider from the system clock.
    pub sysclk_division: u32,
    /// Bitmask of active stages.
    pub activated_stages: u32,
    /// Per-stage gains.
    pub gains: [u32; 6],
}

/// CIC decimator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CicConfig {
    /// Filter clock divider from the system clock. Must be even.
    pub sysclk_division: u32,
    /// Output decimation. Odd values are fine.
    pub decim_factor: u32,
    /// Bitmask of active stages.
    pub activated_stages: u32,
    /// Comb delay.
    pub delay_comb: u32,
}

/// Decimation filter path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterConfig {
    /// Smoothing-exponential-sum filter.
    Ses(SesConfig),
    /// CIC decimator.
    Cic(CicConfig),
}

/// Rejected filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterConfigError {
    /// CIC clock division must be even.
    #[error("CIC clock division {0} is odd")]
    OddClockDivision(u32),
    /// Decimation factor of zero.
    #[error("decimation factor must be non-zero")]
    ZeroDecimation,
    /// Parameters for the other filter path.
    #[error("parameters are for the other filter path")]
    PathMismatch,
}

impl FilterConfig {
    /// Check the parameters the hardware cannot take.
    pub fn validate(&self) -> Result<(), FilterConfigError> {
        let decim = match self {
            Self::Ses(ses) => ses.decim_factor,
            Self::Cic(cic) => {
                if cic.sysclk_division & 1 != 0 {
                    return Err(FilterConfigError::OddClockDivision(cic.sysclk_division));
                }
                cic.decim_factor
            }
        };
        if decim == 0 {
            return Err(FilterConfigError::ZeroDecimation);
        }
        Ok(())
    }

    /// Decimation factor of the selected path.
    pub const fn decim_factor(&self) -> u32 {
        match self {
            Self::Ses(ses) => ses.decim_factor,
            Self::Cic(cic) => cic.decim_factor,
        }
    }

    /// Output words produced from `samples` input samples.
    pub const fn output_words(&self, samples: u32) -> u32 {
        match samples.checked_div(self.decim_factor()) {
            Some(words) => words,
            None => 0,
        }
    }
}

/// Decimation filter feeding the encoder gate.
pub trait DecimationFilter {
    /// Program the filter. Rejects parameters the hardware cannot take.
    fn configure(&mut self, config: &FilterConfig) -> Result<(), FilterConfigError>;

    /// Start producing output.
    fn start(&mut self);

    /// Stop producing output.
    fn stop(&mut self);

    /// Address of the output register read by the DMA.
    fn rx_register_addr(&self) -> usize;
}
