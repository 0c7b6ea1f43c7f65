//! Shared rounding helpers.
//!
//! Every analysis rounds half-up. Integer percentages are computed in
//! integer arithmetic so that `2/3` always yields `67` regardless of
//! floating-point representation.

/// `numerator / denominator` as a whole percentage, rounded half-up.
///
/// Returns 0 for a zero denominator.
///
/// # Examples
///
/// ```
/// use coevo_history::stats::percentage;
///
/// assert_eq!(percentage(2, 3), 67);
/// assert_eq!(percentage(1, 8), 13); // 12.5 rounds up
/// assert_eq!(percentage(1, 1), 100);
/// assert_eq!(percentage(1, 0), 0);
/// ```
pub fn percentage(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    ((200 * numerator + denominator) / (2 * denominator)) as u32
}

/// Mean of two counts, rounded half-up.
///
/// ```
/// use coevo_history::stats::average_rounded;
///
/// assert_eq!(average_rounded(2, 3), 3);
/// assert_eq!(average_rounded(2, 4), 3);
/// ```
pub fn average_rounded(a: u32, b: u32) -> u32 {
    ((u64::from(a) + u64::from(b) + 1) / 2) as u32
}

/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator` rounded to two decimals; 0.0 for a zero denominator.
pub fn ratio2(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round2(numerator as f64 / denominator as f64)
}
