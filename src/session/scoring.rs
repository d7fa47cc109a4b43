//! Time-weighted scoring
//!
//! A correct answer is worth one point, adjusted by how much of the
//! allotted time was used and clamped to `[0, 1]`. Incorrect answers are
//! worth nothing regardless of speed.

/// Bonus tiers keyed by the upper bound (inclusive) of the time ratio
const BONUS_TIERS: [(f64, f64); 3] = [(0.5, 0.3), (0.8, 0.15), (1.0, 0.0)];

/// Applied when the answer took longer than allotted
const OVERTIME_PENALTY: f64 = -0.2;

/// Bonus (or penalty) for answering with `time_taken / time_allotted == ratio`
pub fn time_bonus(ratio: f64) -> f64 {
    BONUS_TIERS
        .iter()
        .find(|(upper, _)| ratio <= *upper)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(OVERTIME_PENALTY)
}

/// Points earned by one answer.
///
/// Without timing (either value absent, or nothing was allotted) a correct
/// answer earns exactly one point.
pub fn score(is_correct: bool, time_taken: Option<u32>, time_allotted: Option<u32>) -> f64 {
    if !is_correct {
        return 0.0;
    }

    match (time_taken, time_allotted) {
        (Some(taken), Some(allotted)) if allotted > 0 => {
            let ratio = f64::from(taken) / f64::from(allotted);
            (1.0 + time_bonus(ratio)).clamp(0.0, 1.0)
        }
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_fall_into_lower_tier() {
        assert_eq!(time_bonus(0.5), 0.3);
        assert_eq!(time_bonus(0.8), 0.15);
        assert_eq!(time_bonus(1.0), 0.0);
        assert_eq!(time_bonus(1.0001), -0.2);
    }

    #[test]
    fn test_zero_allotted_is_untimed() {
        assert_eq!(score(true, Some(10), Some(0)), 1.0);
        assert_eq!(score(false, Some(10), Some(0)), 0.0);
    }
}
