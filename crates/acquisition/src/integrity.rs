//! Index-aligned comparison of captured data against a reference.

use crate::error::{IntegrityError, IntegrityReport};

/// Compare `captured` element by element against `reference`.
///
/// Only the first `reference.len()` captured elements are looked at. A
/// capture shorter than the reference adds one [`IntegrityError::Truncated`]
/// after the per-element mismatches. With `verbose` every failure is logged
/// at debug level.
pub fn compare<T, I>(captured: I, reference: &[T], verbose: bool) -> IntegrityReport
where
    T: Copy + Into<i32>,
    I: IntoIterator<Item = T>,
{
    let mut report = IntegrityReport::default();
    let mut seen: usize = 0;

    for (index, (actual, expected)) in captured.into_iter().zip(reference.iter()).enumerate() {
        seen = index.saturating_add(1);
        let (actual, expected): (i32, i32) = (actual.into(), (*expected).into());
        if actual != expected {
            if verbose {
                platform::debug!("X {} | {} | {}", index, actual, expected);
            }
            report.record(IntegrityError::Mismatch {
                index,
                expected,
                actual,
            });
        }
    }

    if seen < reference.len() {
        if verbose {
            platform::debug!("captured {} of {} reference elements", seen, reference.len());
        }
        report.record(IntegrityError::Truncated {
            captured: seen,
            expected: reference.len(),
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLDEN: [u8; 3] = [61, 101, 213];

    #[test]
    fn identical_data_passes() {
        let report = compare(GOLDEN, &GOLDEN, false);
        assert!(report.passed());
        assert!(report.details.is_empty());
    }

    #[test]
    fn extra_captured_elements_are_ignored() {
        let captured = [61u8, 101, 213, 7, 7, 7];
        assert!(compare(captured, &GOLDEN, true).passed());
    }

    #[test]
    fn single_mutation_is_reported_at_its_index() {
        let captured = [61u8, 102, 213];
        let report = compare(captured, &GOLDEN, true);
        assert_eq!(report.errors, 1);
        assert_eq!(
            report.details.as_slice(),
            &[IntegrityError::Mismatch {
                index: 1,
                expected: 101,
                actual: 102
            }]
        );
    }

    #[test]
    fn short_capture_is_truncated() {
        let report = compare([61u8], &GOLDEN, false);
        assert_eq!(report.errors, 1);
        assert_eq!(
            report.details.as_slice(),
            &[IntegrityError::Truncated {
                captured: 1,
                expected: 3
            }]
        );
    }

    #[test]
    fn signed_samples_compare_by_value() {
        let reference = [-3i16, 0, 12];
        let report = compare([-3i16, 1, 12], &reference, false);
        assert_eq!(report.mismatches().count(), 1);
    }
}
