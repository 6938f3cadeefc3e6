use crate::common::constants::NORMALIZATION_EPSILON;

pub(crate) fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

/// Compensated accumulator for long reductions over weight tables.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KahanSum {
    sum: f64,
    correction: f64,
}

impl KahanSum {
    pub fn add(&mut self, value: f64) {
        kahan_add(&mut self.sum, &mut self.correction, value);
    }

    pub fn value(&self) -> f64 {
        self.sum
    }
}

pub fn stable_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

pub fn stable_mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut accumulator = KahanSum::default();
    let mut count = 0_usize;
    for value in values {
        accumulator.add(value);
        count += 1;
    }

    (count > 0).then(|| accumulator.value() / count as f64)
}

/// `(min, max)` of a non-empty sequence, ignoring nothing.
pub fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |bounds, value| match bounds {
        None => Some((value, value)),
        Some((min, max)) => Some((min.min(value), max.max(value))),
    })
}

/// Maps `value` into `[0, 1]` relative to `[min, max]`; constant data maps to 0.
pub fn normalize_to_unit(value: f64, min: f64, max: f64) -> f64 {
    (value - min) / (max - min + NORMALIZATION_EPSILON)
}

pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
