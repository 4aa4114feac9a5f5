use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Metric a result table is ordered by.
///
/// The body keys read the response-body store in scenario mode and the
/// single body store in endpoint mode; `*ReqBody` keys exist for scenario
/// mode only and sort by the request-body store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Count,
    Uri,
    Method,
    MinResponseTime,
    MaxResponseTime,
    SumResponseTime,
    AvgResponseTime,
    StddevResponseTime,
    PercentileResponseTime,
    MinBody,
    MaxBody,
    SumBody,
    AvgBody,
    StddevBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOptions {
    pub key: SortKey,
    /// Rank used by `PercentileResponseTime`, from the `pN` sort value.
    pub percentile: u8,
    pub reverse: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            key: SortKey::Count,
            percentile: 99,
            reverse: false,
        }
    }
}

impl SortOptions {
    /// Parse a `--sort` value. Accepts the metric keywords of the output
    /// tables plus `pN` for a response-time percentile rank.
    pub fn parse(value: &str, reverse: bool) -> Result<Self, ConfigError> {
        let normalized = value.trim().to_ascii_lowercase();
        let (key, percentile) = match normalized.as_str() {
            "count" => (SortKey::Count, 99),
            "uri" => (SortKey::Uri, 99),
            "method" => (SortKey::Method, 99),
            "min" => (SortKey::MinResponseTime, 99),
            "max" => (SortKey::MaxResponseTime, 99),
            "sum" => (SortKey::SumResponseTime, 99),
            "avg" => (SortKey::AvgResponseTime, 99),
            "stddev" => (SortKey::StddevResponseTime, 99),
            "min_body" => (SortKey::MinBody, 99),
            "max_body" => (SortKey::MaxBody, 99),
            "sum_body" => (SortKey::SumBody, 99),
            "avg_body" => (SortKey::AvgBody, 99),
            "stddev_body" => (SortKey::StddevBody, 99),
            other => {
                let rank = other
                    .strip_prefix('p')
                    .and_then(|digits| digits.parse::<u8>().ok())
                    .filter(|rank| *rank <= 100)
                    .ok_or_else(|| ConfigError::InvalidSortKey {
                        value: value.to_owned(),
                    })?;
                (SortKey::PercentileResponseTime, rank)
            }
        };

        Ok(Self {
            key,
            percentile,
            reverse,
        })
    }
}

/// Row cap applied after sorting: keep the top N rows, or the top P percent
/// of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limit {
    Top(usize),
    Percent(u8),
}

impl Default for Limit {
    fn default() -> Self {
        Limit::Top(5000)
    }
}

impl Limit {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        let invalid = || ConfigError::InvalidLimit {
            value: value.to_owned(),
        };
        if let Some(percent) = trimmed.strip_suffix('%') {
            let percent: u8 = percent.parse().map_err(|_| invalid())?;
            if percent > 100 {
                return Err(invalid());
            }
            return Ok(Limit::Percent(percent));
        }
        trimmed.parse().map(Limit::Top).map_err(|_| invalid())
    }

    /// Number of rows to keep out of `total`.
    #[must_use]
    pub fn rows(&self, total: usize) -> usize {
        match self {
            Limit::Top(n) => (*n).min(total),
            Limit::Percent(p) => total * usize::from(*p) / 100,
        }
    }
}

/// Stable sort by a numeric metric; ties keep first-seen insertion order.
pub(crate) fn sort_numeric<T, F>(stats: &mut [T], reverse: bool, metric: F)
where
    F: Fn(&T) -> f64,
{
    stats.sort_by(|a, b| {
        let ord = metric(a).total_cmp(&metric(b));
        if reverse {
            ord.reverse()
        } else {
            ord
        }
    });
}

/// Stable sort by a string metric; ties keep first-seen insertion order.
pub(crate) fn sort_text<T, F>(stats: &mut [T], reverse: bool, metric: F)
where
    F: for<'a> Fn(&'a T) -> &'a str,
{
    stats.sort_by(|a, b| {
        let ord = metric(a).cmp(metric(b));
        if reverse {
            ord.reverse()
        } else {
            ord
        }
    });
}
