use std::io::{Read, Write};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::canon::{self, MatchingGroups};
use crate::error::{ConfigError, StatsError};
use crate::parse::ParsedRecord;

use super::accumulator::Accumulator;
use super::sort::{sort_numeric, sort_text, Limit, SortKey, SortOptions};

/// Aggregation key for the endpoint table. Two keys are equal iff method,
/// canonical URI, and status are byte-equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointKey {
    pub method: String,
    pub uri: String,
    pub status: u16,
}

impl std::fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.method, self.uri, self.status)
    }
}

/// Running statistics for one endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointStat {
    key: EndpointKey,
    cnt: u64,
    response_time: Accumulator,
    body_bytes: Accumulator,
}

impl EndpointStat {
    fn new(key: EndpointKey, restime_percentile: bool, body_percentile: bool) -> Self {
        Self {
            key,
            cnt: 0,
            response_time: Accumulator::new(restime_percentile),
            body_bytes: Accumulator::new(body_percentile),
        }
    }

    fn observe(&mut self, response_time: f64, body_bytes: f64) {
        self.cnt += 1;
        self.response_time.observe(response_time);
        self.body_bytes.observe(body_bytes);
    }

    #[must_use]
    pub fn key(&self) -> &EndpointKey {
        &self.key
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.cnt
    }

    #[must_use]
    pub fn response_time(&self) -> &Accumulator {
        &self.response_time
    }

    #[must_use]
    pub fn body_bytes(&self) -> &Accumulator {
        &self.body_bytes
    }

    /// URI cell, percent-decoded for display when requested.
    #[must_use]
    pub fn uri_with_options(&self, decode: bool) -> String {
        if decode {
            canon::decode_uri(&self.key.uri)
        } else {
            self.key.uri.clone()
        }
    }
}

/// Endpoint aggregator: maps `(method, uri, status)` to accumulators,
/// preserving first-seen insertion order for deterministic output.
#[derive(Debug, Serialize, Deserialize)]
pub struct HttpStats {
    #[serde(skip)]
    index: FxHashMap<EndpointKey, usize>,
    stats: Vec<EndpointStat>,
    use_response_time_percentile: bool,
    use_body_bytes_percentile: bool,
    #[serde(skip)]
    matching_groups: MatchingGroups,
}

impl HttpStats {
    #[must_use]
    pub fn new(use_response_time_percentile: bool, use_body_bytes_percentile: bool) -> Self {
        Self {
            index: FxHashMap::default(),
            stats: Vec::new(),
            use_response_time_percentile,
            use_body_bytes_percentile,
            matching_groups: MatchingGroups::default(),
        }
    }

    pub fn set_matching_groups(&mut self, patterns: &[String]) -> Result<(), ConfigError> {
        self.matching_groups = canon::compile_matching_groups(patterns)?;
        Ok(())
    }

    /// Record one filtered-in observation.
    pub fn observe(&mut self, record: &ParsedRecord) {
        let uri = match self.matching_groups.rewrite(&record.uri) {
            Some(pattern) => pattern.to_owned(),
            None => record.uri.clone(),
        };
        let key = EndpointKey {
            method: record.method.clone(),
            uri,
            status: record.status,
        };

        let idx = match self.index.get(&key) {
            Some(idx) => *idx,
            None => {
                let idx = self.stats.len();
                self.stats.push(EndpointStat::new(
                    key.clone(),
                    self.use_response_time_percentile,
                    self.use_body_bytes_percentile,
                ));
                self.index.insert(key, idx);
                idx
            }
        };

        self.stats[idx].observe(record.response_time, record.body_bytes);
    }

    #[must_use]
    pub fn stats(&self) -> &[EndpointStat] {
        &self.stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Total observation count across all endpoints, for footer rows.
    #[must_use]
    pub fn count_all(&self) -> u64 {
        self.stats.iter().map(EndpointStat::count).sum()
    }

    /// Locate the baseline counterpart of `stat` by key equality.
    #[must_use]
    pub fn find(&self, stat: &EndpointStat) -> Option<&EndpointStat> {
        self.index.get(&stat.key).map(|idx| &self.stats[*idx])
    }

    /// Sort the sample stores; percentile queries are only valid afterwards.
    pub fn seal(&mut self) {
        for stat in &mut self.stats {
            stat.response_time.seal();
            stat.body_bytes.seal();
        }
    }

    pub fn sort(&mut self, options: &SortOptions) {
        let reverse = options.reverse;
        let rank = options.percentile;
        match options.key {
            SortKey::Count => sort_numeric(&mut self.stats, reverse, |s| s.cnt as f64),
            SortKey::Uri => sort_text(&mut self.stats, reverse, |s| s.key.uri.as_str()),
            SortKey::Method => sort_text(&mut self.stats, reverse, |s| s.key.method.as_str()),
            SortKey::MinResponseTime => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_time.min());
            }
            SortKey::MaxResponseTime => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_time.max());
            }
            SortKey::SumResponseTime => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_time.sum());
            }
            SortKey::AvgResponseTime => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_time.avg());
            }
            SortKey::StddevResponseTime => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_time.stddev());
            }
            SortKey::PercentileResponseTime => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_time.percentile(rank));
            }
            SortKey::MinBody => sort_numeric(&mut self.stats, reverse, |s| s.body_bytes.min()),
            SortKey::MaxBody => sort_numeric(&mut self.stats, reverse, |s| s.body_bytes.max()),
            SortKey::SumBody => sort_numeric(&mut self.stats, reverse, |s| s.body_bytes.sum()),
            SortKey::AvgBody => sort_numeric(&mut self.stats, reverse, |s| s.body_bytes.avg()),
            SortKey::StddevBody => {
                sort_numeric(&mut self.stats, reverse, |s| s.body_bytes.stddev());
            }
        }
        self.rebuild_index();
    }

    /// Keep the top rows after sorting.
    pub fn trim(&mut self, limit: &Limit) {
        let keep = limit.rows(self.stats.len());
        self.stats.truncate(keep);
        self.rebuild_index();
    }

    /// Serialize the full aggregator state. `dump` then `load` then `dump`
    /// is byte-identical.
    pub fn dump<W: Write>(&self, mut writer: W) -> Result<(), StatsError> {
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|err| StatsError::Dump { source: err })?;
        writer.write_all(b"\n").map_err(|err| StatsError::Io {
            context: "dump write",
            source: err,
        })
    }

    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), StatsError> {
        let mut loaded: HttpStats =
            serde_json::from_reader(reader).map_err(|err| StatsError::Load { source: err })?;
        loaded.rebuild_index();
        *self = loaded;
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .stats
            .iter()
            .enumerate()
            .map(|(idx, stat)| (stat.key.clone(), idx))
            .collect();
    }
}
