//! Record filtering: a predicate compiled once at startup and applied to
//! every parsed record before it reaches any accumulator.

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

use crate::error::ConfigError;
use crate::parse::ParsedRecord;

/// Raw filter settings from CLI/config, compiled into a [`Filter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Method whitelist; empty means no method restriction.
    pub methods: Vec<String>,
    /// Status codes or inclusive ranges, e.g. `200`, `301-399`.
    pub statuses: Vec<String>,
    pub include_uri: Option<String>,
    pub exclude_uri: Option<String>,
    /// Inclusive lower time bound.
    pub since: Option<String>,
    /// Inclusive upper time bound.
    pub until: Option<String>,
    /// strftime pattern for record timestamps; RFC 3339 when absent.
    pub time_format: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct StatusRange {
    lo: u16,
    hi: u16,
}

/// Compiled predicate. Evaluation is short-circuit, cheapest first:
/// method, status, include regex, exclude regex, time window.
#[derive(Debug)]
pub struct Filter {
    methods: Vec<String>,
    statuses: Vec<StatusRange>,
    include: Option<Regex>,
    exclude: Option<Regex>,
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
    time_format: Option<String>,
}

impl Filter {
    /// Compile the filter. Any invalid setting is a fatal startup error.
    pub fn compile(config: &FilterConfig) -> Result<Self, ConfigError> {
        let methods = config
            .methods
            .iter()
            .map(|m| m.trim().to_ascii_uppercase())
            .filter(|m| !m.is_empty())
            .collect();

        let mut statuses = Vec::with_capacity(config.statuses.len());
        for spec in &config.statuses {
            statuses.push(parse_status_range(spec)?);
        }

        let include = compile_uri_pattern(config.include_uri.as_deref())?;
        let exclude = compile_uri_pattern(config.exclude_uri.as_deref())?;

        let since = parse_bound(config.since.as_deref(), config.time_format.as_deref())?;
        let until = parse_bound(config.until.as_deref(), config.time_format.as_deref())?;

        Ok(Self {
            methods,
            statuses,
            include,
            exclude,
            since,
            until,
            time_format: config.time_format.clone(),
        })
    }

    /// Accept or reject one record. A rejected record is consumed but must
    /// not touch any accumulator.
    #[must_use]
    pub fn accepts(&self, record: &ParsedRecord) -> bool {
        if !self.methods.is_empty() {
            let method = record.method.to_ascii_uppercase();
            if !self.methods.iter().any(|m| *m == method) {
                return false;
            }
        }

        if !self.statuses.is_empty()
            && !self
                .statuses
                .iter()
                .any(|range| (range.lo..=range.hi).contains(&record.status))
        {
            return false;
        }

        if let Some(include) = self.include.as_ref() {
            if !include.is_match(&record.uri) {
                return false;
            }
        }

        if let Some(exclude) = self.exclude.as_ref() {
            if exclude.is_match(&record.uri) {
                return false;
            }
        }

        if self.since.is_some() || self.until.is_some() {
            let Some(timestamp) = parse_timestamp(&record.time, self.time_format.as_deref())
            else {
                return false;
            };
            if let Some(since) = self.since {
                if timestamp < since {
                    return false;
                }
            }
            if let Some(until) = self.until {
                if timestamp > until {
                    return false;
                }
            }
        }

        true
    }
}

fn compile_uri_pattern(pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|err| ConfigError::InvalidFilterRegex {
                pattern: p.to_owned(),
                source: err,
            })
        })
        .transpose()
}

fn parse_status_range(spec: &str) -> Result<StatusRange, ConfigError> {
    let invalid = || ConfigError::InvalidStatusFilter {
        value: spec.to_owned(),
    };

    let spec = spec.trim();
    let (lo, hi) = match spec.split_once('-') {
        Some((lo, hi)) => (
            lo.trim().parse::<u16>().map_err(|_| invalid())?,
            hi.trim().parse::<u16>().map_err(|_| invalid())?,
        ),
        None => {
            let code = spec.parse::<u16>().map_err(|_| invalid())?;
            (code, code)
        }
    };

    if lo > hi || !(100..=599).contains(&lo) || !(100..=599).contains(&hi) {
        return Err(invalid());
    }

    Ok(StatusRange { lo, hi })
}

fn parse_bound(
    value: Option<&str>,
    format: Option<&str>,
) -> Result<Option<NaiveDateTime>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };

    match parse_with(value, format) {
        Ok(ts) => Ok(Some(ts)),
        Err(err) => Err(ConfigError::InvalidTimeBound {
            value: value.to_owned(),
            source: err,
        }),
    }
}

fn parse_with(value: &str, format: Option<&str>) -> Result<NaiveDateTime, chrono::ParseError> {
    if let Some(format) = format {
        return NaiveDateTime::parse_from_str(value, format);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
}

/// Per-record timestamp parse; `None` means the record cannot be placed in
/// the window and is rejected while a bound is active.
fn parse_timestamp(value: &str, format: Option<&str>) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }
    parse_with(value, format).ok()
}
