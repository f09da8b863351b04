//! Raw similarity to the 0..=100 percentage players see.
//!
//! 100 is reserved for the literal answer; everything else tops out at 99.

/// Percent shown for the answer itself.
pub const EXACT_PERCENT: u8 = 100;
/// Ceiling for every non-answer word.
pub const MAX_PERCENT: u8 = 99;

const CURVE_EXPONENT: f64 = 0.65;

/// How raw scores are turned into percentages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PercentScale {
    /// Fixed concave curve, independent of the day's candidates.
    Absolute,
    /// Linear against the best non-answer score of the day.
    Relative { max_raw_score: f64 },
}

impl PercentScale {
    /// Relative when the day's table has a positive maximum, otherwise the
    /// absolute curve.
    pub fn for_max(max_raw_score: f64) -> Self {
        if max_raw_score > 0.0 {
            PercentScale::Relative { max_raw_score }
        } else {
            PercentScale::Absolute
        }
    }

    pub fn percent(self, score: f64) -> u8 {
        match self {
            PercentScale::Absolute => absolute_percent(score),
            PercentScale::Relative { max_raw_score } => relative_percent(score, max_raw_score),
        }
    }
}

/// `round(100 * score^0.65)`, capped at 99.
pub fn absolute_percent(score: f64) -> u8 {
    if score.is_nan() || score <= 0.0 {
        return 0;
    }
    let curved = 100.0 * score.min(1.0).powf(CURVE_EXPONENT);
    (curved.round() as u8).min(MAX_PERCENT)
}

/// `round(99 * score / max_raw_score)`, 0 when either side is not positive.
pub fn relative_percent(score: f64, max_raw_score: f64) -> u8 {
    if score.is_nan() || score <= 0.0 || max_raw_score.is_nan() || max_raw_score <= 0.0 {
        return 0;
    }
    let scaled = f64::from(MAX_PERCENT) * score / max_raw_score;
    scaled.round().clamp(0.0, f64::from(MAX_PERCENT)) as u8
}
