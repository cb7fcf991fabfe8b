//! Sample statistics for one group of metric values.

/// z-value for a two-sided 95% interval under the normal approximation.
pub const CI95_Z: f64 = 1.96;

/// Summary statistics of a non-empty sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub n: usize,
    pub mean: f64,
    /// Bessel-corrected sample standard deviation; `None` when `n < 2`.
    pub stddev: Option<f64>,
    /// `CI95_Z * stddev / sqrt(n)`; `None` when `stddev` is.
    pub ci95: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl SampleStats {
    /// Compute statistics over `values`. Returns `None` for an empty sample.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let (&first, _) = values.split_first()?;
        let n = values.len();
        let count = n as f64;

        let (mut min, mut max, mut sum) = (first, first, 0.0);
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let mean = sum / count;

        let stddev = (n >= 2).then(|| {
            let squared: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (squared / (count - 1.0)).sqrt()
        });
        let ci95 = stddev.map(|s| CI95_Z * s / count.sqrt());

        Some(Self {
            n,
            mean,
            stddev,
            ci95,
            min,
            max,
        })
    }
}
