//! Current-DAC stimulus table.
//!
//! Each half-word packs the two DAC currents the way the DAC current register
//! expects them: DAC 1 in the low byte, DAC 2 in the high byte. The two DACs
//! run in opposite directions over one triangle period.

use platform::{DataType, Endpoint};

/// Samples per stimulus period.
pub const STIMULUS_LEN: usize = 200;

/// One triangle period, streamed circularly into the DACs.
pub static STIMULUS: [u16; STIMULUS_LEN] = triangle();

/// Memory endpoint covering [`STIMULUS`].
pub fn endpoint() -> Endpoint {
    Endpoint::memory(STIMULUS.as_ptr() as usize, len_du(), DataType::HalfWord)
}

/// Stimulus length in data units.
#[allow(clippy::cast_possible_truncation)]
pub const fn len_du() -> u32 {
    STIMULUS_LEN as u32
}

/// Split a packed sample into (DAC 1, DAC 2) currents.
pub const fn currents(sample: u16) -> (u8, u8) {
    let [low, high] = sample.to_le_bytes();
    (low, high)
}

// Evaluated at compile time: an out-of-range index or overflow fails the build.
#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
const fn triangle() -> [u16; STIMULUS_LEN] {
    let mut table = [0u16; STIMULUS_LEN];
    let half = STIMULUS_LEN / 2;
    let mut i = 0;
    while i < STIMULUS_LEN {
        let step = if i < half { i } else { STIMULUS_LEN - 1 - i };
        let level = (step * 255 / (half - 1)) as u16;
        table[i] = level | ((255 - level) << 8);
        i += 1;
    }
    table
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn period_is_symmetric() {
        assert!(STIMULUS.iter().eq(STIMULUS.iter().rev()));
    }

    #[test]
    fn currents_are_complementary() {
        for sample in STIMULUS {
            let (dac1, dac2) = currents(sample);
            assert_eq!(u16::from(dac1) + u16::from(dac2), 255);
        }
    }

    #[test]
    fn ramp_spans_the_full_range() {
        assert_eq!(STIMULUS.first().map(|s| currents(*s)), Some((0, 255)));
        assert_eq!(STIMULUS.get(99).map(|s| currents(*s)), Some((255, 0)));
    }

    #[test]
    fn endpoint_is_half_word_memory() {
        let ep = endpoint();
        assert!(ep.advances());
        assert!(ep.is_aligned());
        assert_eq!(ep.data_type(), DataType::HalfWord);
    }
}
