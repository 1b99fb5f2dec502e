//! Experiment sizing: expected lift, sample size and run duration.

pub const MAX_EXPECTED_LIFT: f64 = 0.5;
/// Fraction of a path's summed weight assumed to carry through to the KPI.
pub const PATH_LIFT_FACTOR: f64 = 0.3;
pub const MIN_SAMPLE_SIZE: u32 = 100;
pub const MAX_SAMPLE_SIZE: u32 = 10_000;
/// Lifts at or below this are treated as undetectable.
pub const MIN_DETECTABLE_LIFT: f64 = 0.01;

/// `min(0.5, path_weight * 0.3)`, or `min(0.5, |historical|)` when a
/// measured effect exists for the lever.
pub fn expected_lift(path_weight: f64, historical_effect: Option<f64>) -> f64 {
    match historical_effect {
        Some(effect) => effect.abs().min(MAX_EXPECTED_LIFT),
        None => (path_weight * PATH_LIFT_FACTOR).min(MAX_EXPECTED_LIFT),
    }
}

/// Two-proportion approximation at power 0.8 and alpha 0.05: `16 / lift^2`,
/// rounded half to even and clamped to `[100, 10000]`.
pub fn sample_size(expected_lift: f64) -> u32 {
    if expected_lift.is_nan() || expected_lift <= MIN_DETECTABLE_LIFT {
        return MAX_SAMPLE_SIZE;
    }
    let raw = (16.0 / (expected_lift * expected_lift)).round_ties_even();
    raw.clamp(MIN_SAMPLE_SIZE as f64, MAX_SAMPLE_SIZE as f64) as u32
}

pub fn duration_bucket(sample_size: u32) -> &'static str {
    match sample_size {
        n if n < 1000 => "1-2 weeks",
        n if n < 3000 => "2-4 weeks",
        n if n < 7000 => "4-6 weeks",
        _ => "6-8 weeks",
    }
}
