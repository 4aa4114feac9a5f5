use serde::{Deserialize, Serialize};

/// Online running statistics for one stream of non-negative scalars.
///
/// Tracks count, sum, sum of squares, min, and max incrementally. When
/// built with `keep_samples`, every observation is also retained so exact
/// nearest-rank percentiles can be answered later; `seal` sorts the store
/// once at end of stream and every percentile query indexes the sorted
/// samples directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    cnt: u64,
    sum: f64,
    sum_sq: f64,
    min: Option<f64>,
    max: Option<f64>,
    samples: Option<Vec<f64>>,
}

impl Accumulator {
    #[must_use]
    pub fn new(keep_samples: bool) -> Self {
        Self {
            cnt: 0,
            sum: 0.0,
            sum_sq: 0.0,
            min: None,
            max: None,
            samples: keep_samples.then(Vec::new),
        }
    }

    pub fn observe(&mut self, value: f64) {
        self.cnt += 1;
        self.sum += value;
        self.sum_sq += value * value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        if let Some(samples) = self.samples.as_mut() {
            samples.push(value);
        }
    }

    /// Sort the sample store ascending. Percentile queries assume a sealed
    /// accumulator; the aggregators seal once at end of stream.
    pub fn seal(&mut self) {
        if let Some(samples) = self.samples.as_mut() {
            samples.sort_by(f64::total_cmp);
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.cnt
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min.unwrap_or(0.0)
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max.unwrap_or(0.0)
    }

    #[must_use]
    pub fn avg(&self) -> f64 {
        if self.cnt == 0 {
            return 0.0;
        }
        self.sum / self.cnt as f64
    }

    #[must_use]
    pub fn stddev(&self) -> f64 {
        if self.cnt == 0 {
            return 0.0;
        }
        let avg = self.avg();
        let variance = self.sum_sq / self.cnt as f64 - avg * avg;
        variance.max(0.0).sqrt()
    }

    /// Nearest-rank percentile over the sealed samples, lower index on tie:
    /// `samples[floor(n * (len - 1) / 100)]`. Returns 0 when sampling is
    /// disabled or nothing was observed.
    #[must_use]
    pub fn percentile(&self, n: u8) -> f64 {
        let Some(samples) = self.samples.as_ref() else {
            return 0.0;
        };
        if samples.is_empty() {
            return 0.0;
        }
        let n = usize::from(n.min(100));
        let idx = n * (samples.len() - 1) / 100;
        samples[idx]
    }

    #[must_use]
    pub fn keeps_samples(&self) -> bool {
        self.samples.is_some()
    }
}
