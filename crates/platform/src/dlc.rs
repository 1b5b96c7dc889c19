//! Level-crossing encoder ("dLC") register contract.
//!
//! The gate sits between a source register and the DMA engine in the RX
//! path. Every register is written as a whole value; a change takes effect on
//! the next sample the gate processes, never synchronously.

/// Encoder gate registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DlcRegister {
    /// log2 of the level width.
    LogLevelWidth,
    /// Width of the delta-level field.
    NBits,
    /// Delta-level format, 1 = two's complement.
    Format,
    /// Delta-level field mask.
    LevelMask,
    /// Delta-time field mask.
    TimeMask,
    /// Elements the gate lets through per DMA cycle.
    TransSize,
    /// One-level hysteresis.
    HysteresisEnable,
    /// Input LSBs dropped before encoding.
    DiscardBits,
    /// Level the encoder starts from.
    CurrentLevel,
    /// Bypass: raise an event interrupt instead of streaming to the DMA.
    Bypass,
}

impl DlcRegister {
    /// Number of gate registers.
    pub const COUNT: usize = 10;

    /// Register position, `offset() / 4`.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Byte offset from the gate's base address.
    pub const fn offset(self) -> usize {
        match self {
            Self::LogLevelWidth => 0x00,
            Self::NBits => 0x04,
            Self::Format => 0x08,
            Self::LevelMask => 0x0C,
            Self::TimeMask => 0x10,
            Self::TransSize => 0x14,
            Self::HysteresisEnable => 0x18,
            Self::DiscardBits => 0x1C,
            Self::CurrentLevel => 0x20,
            Self::Bypass => 0x24,
        }
    }
}

/// Register access to the encoder gate.
pub trait EncoderGate {
    /// Write a whole register.
    fn write(&mut self, reg: DlcRegister, value: u32);

    /// Read a whole register.
    fn read(&self, reg: DlcRegister) -> u32;
}

impl<T: EncoderGate + ?Sized> EncoderGate for &mut T {
    fn write(&mut self, reg: DlcRegister, value: u32) {
        (**self).write(reg, value);
    }

    fn read(&self, reg: DlcRegister) -> u32 {
        (**self).read(reg)
    }
}

/// Delta-level encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeltaFormat {
    /// Sign bit plus magnitude; the sign takes one amplitude bit.
    SignMagnitude,
    /// Two's complement; all amplitude bits carry the delta.
    TwosComplement,
}

impl DeltaFormat {
    /// Value of the format register.
    pub const fn register_value(self) -> u32 {
        match self {
            Self::SignMagnitude => 0,
            Self::TwosComplement => 1,
        }
    }
}

/// Encoder gate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DlcParams {
    /// Delta-level format.
    pub format: DeltaFormat,
    /// log2 of the level width.
    pub log_level_width: u32,
    /// Amplitude bits per event.
    pub amplitude_bits: u32,
    /// Time bits per event.
    pub time_bits: u32,
    /// One-level hysteresis.
    pub hysteresis: bool,
    /// Input LSBs dropped before encoding.
    pub discard_bits: u32,
    /// Bypass mode.
    pub bypass: bool,
}

impl DlcParams {
    /// Width of the delta-level field.
    pub const fn delta_level_bits(&self) -> u32 {
        match self.format {
            DeltaFormat::TwosComplement => self.amplitude_bits,
            DeltaFormat::SignMagnitude => self.amplitude_bits.saturating_sub(1),
        }
    }

    /// Delta-level field mask.
    pub const fn level_mask(&self) -> u32 {
        low_mask(self.delta_level_bits())
    }

    /// Delta-time field mask.
    pub const fn time_mask(&self) -> u32 {
        low_mask(self.time_bits)
    }

    /// Bits per encoded event.
    pub const fn event_bits(&self) -> u32 {
        self.amplitude_bits.saturating_add(self.time_bits)
    }

    /// Starting level for a raw source reading.
    pub const fn initial_level(&self, raw: u32) -> u32 {
        Self::level_at(raw, self.log_level_width)
    }

    /// Level of `raw` at level width `2^log_level_width`. Exponents of 32
    /// and above give 0.
    pub const fn level_at(raw: u32, log_level_width: u32) -> u32 {
        match raw.checked_shr(log_level_width) {
            Some(level) => level,
            None => 0,
        }
    }

    /// Program every parameter register. Transaction size and current level
    /// are written separately.
    pub fn apply<G: EncoderGate + ?Sized>(&self, gate: &mut G) {
        gate.write(DlcRegister::Format, self.format.register_value());
        gate.write(DlcRegister::LogLevelWidth, self.log_level_width);
        gate.write(DlcRegister::NBits, self.delta_level_bits());
        gate.write(DlcRegister::LevelMask, self.level_mask());
        gate.write(DlcRegister::TimeMask, self.time_mask());
        gate.write(DlcRegister::HysteresisEnable, u32::from(self.hysteresis));
        gate.write(DlcRegister::DiscardBits, self.discard_bits);
        gate.write(DlcRegister::Bypass, u32::from(self.bypass));
    }
}

/// `bits` low bits set; saturates at 32.
const fn low_mask(bits: u32) -> u32 {
    match 1_u32.checked_shl(bits) {
        Some(bit) => bit.wrapping_sub(1),
        None => u32::MAX,
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn vco_params() -> DlcParams {
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

    #[derive(Default)]
    struct Regs([u32; DlcRegister::COUNT]);

    impl EncoderGate for Regs {
        fn write(&mut self, reg: DlcRegister, value: u32) {
            if let Some(r) = self.0.get_mut(reg.index()) {
                *r = value;
            }
        }

        fn read(&self, reg: DlcRegister) -> u32 {
            self.0.get(reg.index()).copied().unwrap_or(0)
        }
    }

    #[test]
    fn sign_magnitude_spends_a_bit_on_sign() {
        let p = vco_params();
        assert_eq!(p.delta_level_bits(), 1);
        assert_eq!(p.level_mask(), 0b1);
        assert_eq!(p.time_mask(), 0b11_1111);
        assert_eq!(p.event_bits(), 8);
    }

    #[test]
    fn twos_complement_uses_all_amplitude_bits() {
        let p = DlcParams {
            format: DeltaFormat::TwosComplement,
            ..vco_params()
        };
        assert_eq!(p.delta_level_bits(), 2);
        assert_eq!(p.level_mask(), 0b11);
    }

    #[test]
    fn masks_saturate_at_register_width() {
        let p = DlcParams {
            time_bits: 32,
            ..vco_params()
        };
        assert_eq!(p.time_mask(), u32::MAX);
        let p = DlcParams {
            amplitude_bits: 0,
            ..vco_params()
        };
        assert_eq!(p.delta_level_bits(), 0);
        assert_eq!(p.level_mask(), 0);
    }

    #[test]
    fn initial_level_shifts_by_exponent() {
        let p = vco_params();
        assert_eq!(p.initial_level(0x1234), 0x1234 >> 7);
        let wide = DlcParams {
            log_level_width: 40,
            ..p
        };
        assert_eq!(wide.initial_level(0xFFFF_FFFF), 0);
        assert_eq!(DlcParams::level_at(0x1234, 7), p.initial_level(0x1234));
        assert_eq!(DlcParams::level_at(1, 32), 0);
    }

    #[test]
    fn index_matches_offset() {
        assert_eq!(DlcRegister::Bypass.index(), DlcRegister::COUNT - 1);
        assert_eq!(DlcRegister::CurrentLevel.offset(), DlcRegister::CurrentLevel.index() * 4);
    }

    #[test]
    fn apply_writes_derived_values() {
        let mut regs = Regs::default();
        vco_params().apply(&mut regs);
        assert_eq!(regs.read(DlcRegister::Format), 0);
        assert_eq!(regs.read(DlcRegister::LogLevelWidth), 7);
        assert_eq!(regs.read(DlcRegister::NBits), 1);
        assert_eq!(regs.read(DlcRegister::LevelMask), 1);
        assert_eq!(regs.read(DlcRegister::TimeMask), 63);
        assert_eq!(regs.read(DlcRegister::HysteresisEnable), 1);
        assert_eq!(regs.read(DlcRegister::Bypass), 0);
    }
}
