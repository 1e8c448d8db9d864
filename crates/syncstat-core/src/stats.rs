use serde::Serialize;

// Central moments below this are floating-point noise from a constant sample.
const ROUNDING_FLOOR: f64 = 1e-14;

/// Shape of a sample: quartiles by linear interpolation, sample (n-1)
/// standard deviation and adjusted Fisher-Pearson skewness. An empty sample
/// describes as all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub mean: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub std: f64,
    pub skew: f64,
}

pub fn describe(values: &[f64]) -> Distribution {
    if values.is_empty() {
        return Distribution::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Distribution {
        count: sorted.len(),
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        mean: mean(&sorted),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
        std: sample_std(&sorted),
        skew: skewness(&sorted),
    }
}

/// `sorted` must be ascending.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mu = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
    (sum_sq / (n - 1) as f64).sqrt()
}

/// 0 for fewer than three values or a constant sample.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let count = n as f64;
    let mu = mean(values);
    let m2 = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / count;
    let m3 = values.iter().map(|v| (v - mu).powi(3)).sum::<f64>() / count;
    if m2 < ROUNDING_FLOOR {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    let adjusted = (count * (count - 1.0)).sqrt() / (count - 2.0) * g1;
    if adjusted.is_finite() {
        adjusted
    } else {
        0.0
    }
}
