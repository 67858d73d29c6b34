//! Detection and repair of a single merged edge.
//!
//! When the poll for a falling edge is late, the measured `low[l]` swallows
//! time that belongs to the next bit slot and `high[l + 1]` comes out short.
//! That signature, and only that one, is repaired.

use core::ops::RangeInclusive;

use crate::frame::{EdgeTimings, FRAME_BITS};

/// Accepted range of a `high` sample.
pub const HIGH_US: RangeInclusive<u32> = 50..=70;

/// Accepted range of a `low` sample encoding a `0`.
pub const SHORT_LOW_US: RangeInclusive<u32> = 25..=30;

/// Accepted range of a `low` sample encoding a `1`.
pub const LONG_LOW_US: RangeInclusive<u32> = 70..=75;

/// Nominal `high` sample width.
pub const CANONICAL_HIGH_US: u32 = 54;

/// Nominal `low` sample for a `1` bit.
pub const CANONICAL_LONG_LOW_US: u32 = 73;

/// Nominal `low` sample for a `0` bit.
pub const CANONICAL_SHORT_LOW_US: u32 = 26;

/// Whether `us` is an acceptable `high` sample.
pub fn valid_high_value(us: u32) -> bool {
    HIGH_US.contains(&us)
}

/// Whether `us` is an acceptable `low` sample for either bit value.
pub fn valid_low_value(us: u32) -> bool {
    SHORT_LOW_US.contains(&us) || LONG_LOW_US.contains(&us)
}

/// First out-of-range sample in each timing array.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Defects {
    /// Index of the first `high` sample outside [`HIGH_US`].
    pub high: Option<usize>,
    /// Index of the first `low` sample outside both low windows.
    pub low: Option<usize>,
}

impl Defects {
    /// Scans `timings`, independently of the frame's parity.
    pub fn scan(timings: &EdgeTimings) -> Self {
        Self {
            high: timings.high.iter().position(|us| !valid_high_value(*us)),
            low: timings.low.iter().position(|us| !valid_low_value(*us)),
        }
    }

    /// No sample is out of range.
    pub fn is_empty(&self) -> bool {
        self.high.is_none() && self.low.is_none()
    }

    /// Index `l` of a merged edge: a low defect at `l` directly followed by a
    /// short high defect at `l + 1`.
    fn merged_edge(&self, timings: &EdgeTimings) -> Option<usize> {
        let l = self.low?;
        let next = self.high?;
        (l + 1 < FRAME_BITS && next == l + 1 && timings.high[next] < *HIGH_US.start()).then_some(l)
    }
}

/// Outcome of one repair pass.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Correction {
    /// No sample was out of range; nothing was touched.
    NoDefect,
    /// The merged edge at `bit` was split back, with `low[bit]` set to `low`.
    Applied {
        /// Index of the oversized `low` sample.
        bit: usize,
        /// Canonical value written to `low[bit]`.
        low: u32,
    },
    /// The defects do not match the merged-edge signature, or no candidate fits.
    Uncorrectable,
}

/// Attempts to repair a single merged edge in place.
///
/// `timings` is only mutated when [`Correction::Applied`] is returned.
pub fn repair(timings: &mut EdgeTimings) -> Correction {
    let defects = Defects::scan(timings);
    if defects.is_empty() {
        return Correction::NoDefect;
    }
    let Some(l) = defects.merged_edge(timings) else {
        return Correction::Uncorrectable;
    };

    let tl_cur = i64::from(timings.low[l]);
    let th_next = i64::from(timings.high[l + 1]);
    let tl_next = i64::from(timings.low[l + 1]);

    for canonical in [CANONICAL_LONG_LOW_US, CANONICAL_SHORT_LOW_US] {
        let excess = tl_cur - i64::from(canonical);
        let th_fixed = th_next + excess - i64::from(CANONICAL_HIGH_US);
        let Ok(tl_fixed) = u32::try_from(tl_next + (th_fixed - th_next)) else {
            continue;
        };
        if valid_low_value(tl_fixed) {
            timings.low[l] = canonical;
            timings.high[l + 1] = CANONICAL_HIGH_US;
            timings.low[l + 1] = tl_fixed;
            return Correction::Applied {
                bit: l,
                low: canonical,
            };
        }
    }

    Correction::Uncorrectable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean() -> EdgeTimings {
        EdgeTimings::new([54; FRAME_BITS], [26; FRAME_BITS])
    }

    #[test]
    fn test_value_windows() {
        assert!(valid_high_value(50));
        assert!(valid_high_value(70));
        assert!(!valid_high_value(49));
        assert!(!valid_high_value(71));

        for us in [25, 30, 70, 75] {
            assert!(valid_low_value(us));
        }
        for us in [24, 31, 50, 69, 76] {
            assert!(!valid_low_value(us));
        }
    }

    #[test]
    fn test_scan_reports_first_defects() {
        let mut timings = clean();
        timings.high[3] = 80;
        timings.high[7] = 10;
        timings.low[5] = 40;

        let defects = Defects::scan(&timings);
        assert_eq!(defects.high, Some(3));
        assert_eq!(defects.low, Some(5));
        assert!(Defects::scan(&clean()).is_empty());
    }

    #[test]
    fn test_no_defect_is_untouched() {
        let mut timings = clean();
        assert_eq!(repair(&mut timings), Correction::NoDefect);
        assert_eq!(timings, clean());
    }

    #[test]
    fn test_merged_long_low() {
        let mut timings = clean();
        timings.low[10] = 99;
        timings.high[11] = 20;
        timings.low[11] = 54;

        assert_eq!(repair(&mut timings), Correction::Applied { bit: 10, low: 73 });
        assert_eq!(timings.low[10], 73);
        assert_eq!(timings.high[11], 54);
        assert_eq!(timings.low[11], 26);
        assert!(Defects::scan(&timings).is_empty());
    }

    #[test]
    fn test_falls_back_to_short_low() {
        let mut timings = clean();
        timings.low[4] = 52;
        timings.high[5] = 30;
        timings.low[5] = 55;

        // 73 would leave low[5] at 55 - 21 - 54 < 0, 26 gives 55 + 26 - 54 = 27
        assert_eq!(repair(&mut timings), Correction::Applied { bit: 4, low: 26 });
        assert_eq!(timings.low[4], 26);
        assert_eq!(timings.high[5], 54);
        assert_eq!(timings.low[5], 27);
    }

    #[test]
    fn test_no_candidate_leaves_timings() {
        let mut timings = clean();
        timings.low[10] = 99;
        timings.high[11] = 20;
        timings.low[11] = 73;
        let before = timings;

        assert_eq!(repair(&mut timings), Correction::Uncorrectable);
        assert_eq!(timings, before);
    }

    #[test]
    fn test_high_defect_must_be_short() {
        let mut timings = clean();
        timings.low[10] = 99;
        timings.high[11] = 90;
        timings.low[11] = 54;

        assert_eq!(repair(&mut timings), Correction::Uncorrectable);
    }

    #[test]
    fn test_last_slot_has_no_successor() {
        let mut timings = clean();
        timings.low[39] = 1008;

        assert_eq!(repair(&mut timings), Correction::Uncorrectable);
    }

    #[test]
    fn test_recorded_merged_edge() {
        // Captured read with a late falling edge in slot 12
        let mut timings = EdgeTimings::new(
            [
                54, 53, 54, 54, 54, 54, 54, 54, 67, 54, 54, 54, 54, 46, 54, 54, 67, 54, 55, 54, 54,
                54, 54, 54, 68, 54, 54, 55, 53, 54, 54, 54, 52, 54, 54, 54, 54, 54, 54, 47,
            ],
            [
                26, 26, 26, 26, 26, 26, 26, 73, 25, 26, 74, 26, 87, 68, 26, 73, 26, 26, 26, 26, 26,
                26, 26, 72, 26, 26, 73, 26, 73, 74, 26, 116, 74, 26, 74, 73, 26, 74, 72, 1008,
            ],
        );

        let defects = Defects::scan(&timings);
        assert_eq!(defects.low, Some(12));
        assert_eq!(defects.high, Some(13));

        assert_eq!(repair(&mut timings), Correction::Applied { bit: 12, low: 73 });
        assert_eq!(timings.low[12], 73);
        assert_eq!(timings.high[13], 54);
        assert_eq!(timings.low[13], 28);
    }

    #[test]
    fn test_recorded_non_adjacent_defects() {
        let mut timings = EdgeTimings::new(
            [
                54, 54, 54, 54, 54, 54, 54, 53, 68, 134, 54, 54, 54, 53, 54, 67, 54, 54, 54, 54, 54,
                54, 53, 68, 54, 54, 54, 55, 54, 54, 54, 65, 54, 54, 54, 54, 54, 54, 53, 47,
            ],
            [
                26, 26, 26, 26, 26, 26, 27, 73, 26, 25, 73, 74, 74, 73, 73, 26, 25, 26, 26, 26, 26,
                27, 73, 26, 25, 73, 26, 73, 26, 74, 72, 26, 73, 26, 26, 74, 74, 26, 25, 1004,
            ],
        );
        let before = timings;

        assert_eq!(repair(&mut timings), Correction::Uncorrectable);
        assert_eq!(timings, before);
    }
}
