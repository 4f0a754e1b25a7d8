// src/services/scoring.rs

/// Normalizes `correct` out of `total` onto a 0-10 scale with one decimal.
///
/// Works in integer tenths and rounds half to even, so 0.25 becomes 0.2 and
/// 0.75 becomes 0.8. A quiz without questions scores 0.0.
pub fn normalized_score(correct: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let correct = correct.clamp(0, total);

    let scaled = correct * 100;
    let mut tenths = scaled / total;
    let rem = scaled % total;
    if 2 * rem > total || (2 * rem == total && tenths % 2 == 1) {
        tenths += 1;
    }

    tenths as f64 / 10.0
}

/// The cap that actually applies. `None` and `0` both mean unlimited.
pub fn effective_cap(max_attempts: Option<i32>) -> Option<i32> {
    max_attempts.filter(|&max| max > 0)
}

/// Attempts left under the quiz cap, never negative. `None` when unlimited.
pub fn remaining_attempts(max_attempts: Option<i32>, attempt_count: i64) -> Option<i64> {
    effective_cap(max_attempts).map(|max| (i64::from(max) - attempt_count).max(0))
}
