//! Runtime acquisition profiles.
//!
//! Every parameter set a scenario can run with is a value built here and
//! selected through [`Scenario`]; nothing is chosen at compile time.

use acquisition::{CoordinatorConfig, WaitBudget, WindowPolicy};
use platform::{CicConfig, DeltaFormat, DlcParams, FilterConfig, SesConfig};

use crate::stimulus;

/// Decimation filter in front of the encoder gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterPath {
    /// Smoothing-exponential-sum filter.
    Ses,
    /// CIC decimator.
    Cic,
}

/// Which acquisition to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scenario {
    /// VCO count through the gate while channel 1 drives the current DACs.
    DualChannel,
    /// Decimation filter output through the gate.
    FilterChain(FilterPath),
}

impl Scenario {
    /// Short name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DualChannel => "dual-channel",
            Self::FilterChain(FilterPath::Ses) => "filter-chain/ses",
            Self::FilterChain(FilterPath::Cic) => "filter-chain/cic",
        }
    }
}

/// Parameters of [`Scenario::DualChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DualChannelProfile {
    /// Calibration code written to both current DACs.
    pub dac_calibration: u8,
    /// DAC refresh period in system clock cycles.
    pub dac_refresh_cycles: u16,
    /// VCO decoder refresh period in system clock cycles.
    pub vco_refresh_cycles: u16,
    /// Gate parameters for the acquisition phase.
    pub dlc: DlcParams,
    /// VCO settling time before the gate level is seeded.
    pub settle_us: u32,
    /// Acquisition window, in elements.
    pub window_du: u32,
    /// Window + transaction interrupts to collect before bypass.
    pub target: u32,
    /// Added to the level exponent when switching to bypass.
    pub bypass_exponent_step: u32,
    /// Gate events to wait for in bypass.
    pub gate_events: u32,
    /// Bound on each wait.
    pub wait_budget: WaitBudget,
    /// Deadline for the whole run, armed on the hardware timer.
    pub timeout_us: Option<u32>,
    /// Log every integrity failure.
    pub verbose: bool,
}

impl Default for DualChannelProfile {
    fn default() -> Self {
        Self {
            dac_calibration: 16,
            dac_refresh_cycles: 200,
            vco_refresh_cycles: 50,
            dlc: DlcParams {
                format: DeltaFormat::SignMagnitude,
                log_level_width: 7,
                amplitude_bits: 2,
                time_bits: 6,
                hysteresis: true,
                discard_bits: 0,
                bypass: false,
            },
            settle_us: 100,
            window_du: 50,
            target: 7,
            bypass_exponent_step: 2,
            gate_events: 1,
            wait_budget: WaitBudget::unbounded(),
            timeout_us: None,
            verbose: true,
        }
    }
}

impl DualChannelProfile {
    /// Elements per acquisition cycle: one stimulus period.
    pub const fn cycle_du(&self) -> u32 {
        stimulus::len_du()
    }

    /// Level exponent used in bypass.
    pub const fn bypass_log_level_width(&self) -> u32 {
        self.dlc
            .log_level_width
            .saturating_add(self.bypass_exponent_step)
    }

    /// Coordinator settings for this profile.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            wait_budget: self.wait_budget,
            verbose: self.verbose,
            ..CoordinatorConfig::default()
        }
    }
}

/// Input samples fed through the filter by the filter-chain test bench.
pub const FILTER_INPUT_SAMPLES: u32 = 32_769;

/// Parameters of [`Scenario::FilterChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterChainProfile {
    /// Selected path.
    pub path: FilterPath,
    /// Filter parameters for `path`.
    pub filter: FilterConfig,
    /// Gate parameters.
    pub dlc: DlcParams,
    /// Input samples the filter will see.
    pub samples: u32,
    /// Acquisition window, in elements.
    pub window_du: u32,
    /// Window + transaction interrupts to collect.
    pub target: u32,
    /// Bound on each wait.
    pub wait_budget: WaitBudget,
    /// Deadline for the whole run, armed on the hardware timer.
    pub timeout_us: Option<u32>,
    /// Log every integrity failure.
    pub verbose: bool,
}

impl FilterChainProfile {
    /// Profile for `path`.
    pub fn new(path: FilterPath) -> Self {
        let (filter, format, window_du) = match path {
            FilterPath::Ses => (
                FilterConfig::Ses(SesConfig {
                    window_size: 4,
                    decim_factor: 32,
                    sysclk_division: 16,
                    activated_stages: 0b1111,
                    gains: [15, 0, 0, 0, 0, 0],
                }),
                DeltaFormat::SignMagnitude,
                16,
            ),
            FilterPath::Cic => (
                FilterConfig::Cic(CicConfig {
                    sysclk_division: 16,
                    decim_factor: 15,
                    activated_stages: 0b1111,
                    delay_comb: 1,
                }),
                DeltaFormat::TwosComplement,
                17,
            ),
        };
        Self {
            path,
            filter,
            dlc: DlcParams {
                format,
                log_level_width: 12,
                amplitude_bits: 2,
                time_bits: 6,
                hysteresis: true,
                discard_bits: 0,
                bypass: false,
            },
            samples: FILTER_INPUT_SAMPLES,
            window_du,
            target: 5,
            wait_budget: WaitBudget::unbounded(),
            timeout_us: None,
            verbose: true,
        }
    }

    /// Elements per acquisition cycle.
    ///
    /// The decimated output, taken as a byte count, is split into words and
    /// the word count into four cycles.
    pub const fn cycle_du(&self) -> u32 {
        match self.filter.output_words(self.samples).checked_div(16) {
            Some(cycle) => cycle,
            None => 0,
        }
    }

    /// Coordinator settings for this profile.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            window_policy: WindowPolicy::default(),
            wait_budget: self.wait_budget,
            verbose: self.verbose,
            ..CoordinatorConfig::default()
        }
    }
}

/// Profile of any scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionProfile {
    /// [`Scenario::DualChannel`]
    DualChannel(DualChannelProfile),
    /// [`Scenario::FilterChain`]
    FilterChain(FilterChainProfile),
}

impl AcquisitionProfile {
    /// Default profile of `scenario`.
    pub fn for_scenario(scenario: Scenario) -> Self {
        match scenario {
            Scenario::DualChannel => Self::DualChannel(DualChannelProfile::default()),
            Scenario::FilterChain(path) => Self::FilterChain(FilterChainProfile::new(path)),
        }
    }

    /// Scenario this profile belongs to.
    pub const fn scenario(&self) -> Scenario {
        match self {
            Self::DualChannel(_) => Scenario::DualChannel,
            Self::FilterChain(p) => Scenario::FilterChain(p.path),
        }
    }

    /// Run deadline, if any.
    pub const fn timeout_us(&self) -> Option<u32> {
        match self {
            Self::DualChannel(p) => p.timeout_us,
            Self::FilterChain(p) => p.timeout_us,
        }
    }
}
