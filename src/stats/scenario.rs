use std::hash::Hasher;
use std::io::{Read, Write};

use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canon::{self, MatchingGroups};
use crate::error::{ConfigError, StatsError};

use super::accumulator::Accumulator;
use super::endpoint::EndpointKey;
use super::sort::{sort_numeric, sort_text, Limit, SortKey, SortOptions};

/// One request observed within a trace, in record order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDetail {
    pub key: EndpointKey,
    pub response_time: f64,
    pub request_body_bytes: f64,
    pub response_body_bytes: f64,
    /// Byte offset of the record in the input stream.
    pub pos: u64,
}

/// Digest of an ordered endpoint sequence. Deterministic across runs; the
/// full sequence is compared on every digest hit, so a collision never
/// merges distinct scenarios.
fn scenario_id(steps: &[EndpointKey]) -> String {
    let mut hasher = FxHasher::default();
    for step in steps {
        hasher.write(step.method.as_bytes());
        hasher.write(step.uri.as_bytes());
        hasher.write(step.status.to_string().as_bytes());
    }
    format!("{:016x}", hasher.finish())
}

/// Per-step accumulators within one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepStat {
    key: EndpointKey,
    cnt: u64,
    response_time: Accumulator,
    request_body_bytes: Accumulator,
    response_body_bytes: Accumulator,
}

impl StepStat {
    fn new(key: EndpointKey, percentiles: &PercentileFlags) -> Self {
        Self {
            key,
            cnt: 0,
            response_time: Accumulator::new(percentiles.response_time),
            request_body_bytes: Accumulator::new(percentiles.request_body),
            response_body_bytes: Accumulator::new(percentiles.response_body),
        }
    }

    fn observe(&mut self, detail: &RequestDetail) {
        self.cnt += 1;
        self.response_time.observe(detail.response_time);
        self.request_body_bytes.observe(detail.request_body_bytes);
        self.response_body_bytes.observe(detail.response_body_bytes);
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
    pub fn request_body_bytes(&self) -> &Accumulator {
        &self.request_body_bytes
    }

    #[must_use]
    pub fn response_body_bytes(&self) -> &Accumulator {
        &self.response_body_bytes
    }
}

/// Aggregated statistics for one scenario: an ordered endpoint sequence
/// observed across one or more traces.
///
/// The scenario-level accumulators hold per-trace sums across steps; the
/// per-step accumulators hold individual step observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStat {
    id: String,
    steps: Vec<EndpointKey>,
    cnt: u64,
    response_time: Accumulator,
    request_body_bytes: Accumulator,
    response_body_bytes: Accumulator,
    step_stats: Vec<StepStat>,
    trace_ids: Vec<String>,
}

impl ScenarioStat {
    fn new(id: String, steps: Vec<EndpointKey>, percentiles: &PercentileFlags) -> Self {
        let step_stats = steps
            .iter()
            .map(|key| StepStat::new(key.clone(), percentiles))
            .collect();
        Self {
            id,
            steps,
            cnt: 0,
            response_time: Accumulator::new(percentiles.response_time),
            request_body_bytes: Accumulator::new(percentiles.request_body),
            response_body_bytes: Accumulator::new(percentiles.response_body),
            step_stats,
            trace_ids: Vec::new(),
        }
    }

    /// Fold one trace instance in: per-trace sums at scenario level, one
    /// observation per step, and the trace ID on the roster.
    fn observe_trace(&mut self, trace_id: &str, details: &[RequestDetail]) {
        let mut restime = 0.0;
        let mut req_bytes = 0.0;
        let mut resp_bytes = 0.0;
        for detail in details {
            restime += detail.response_time;
            req_bytes += detail.request_body_bytes;
            resp_bytes += detail.response_body_bytes;
        }

        self.cnt += 1;
        self.response_time.observe(restime);
        self.request_body_bytes.observe(req_bytes);
        self.response_body_bytes.observe(resp_bytes);
        for (step, detail) in self.step_stats.iter_mut().zip(details) {
            step.observe(detail);
        }
        self.trace_ids.push(trace_id.to_owned());
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn steps(&self) -> &[EndpointKey] {
        &self.steps
    }

    #[must_use]
    pub fn step_stats(&self) -> &[StepStat] {
        &self.step_stats
    }

    #[must_use]
    pub fn trace_ids(&self) -> &[String] {
        &self.trace_ids
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
    pub fn request_body_bytes(&self) -> &Accumulator {
        &self.request_body_bytes
    }

    #[must_use]
    pub fn response_body_bytes(&self) -> &Accumulator {
        &self.response_body_bytes
    }

    /// Step sequence rendered as `METHOD uri STATUS` lines joined with
    /// `<br>`, optionally percent-decoded.
    #[must_use]
    pub fn uri_method_status(&self, decode: bool) -> String {
        let lines: Vec<String> = self
            .steps
            .iter()
            .map(|step| {
                let uri = if decode {
                    canon::decode_uri(&step.uri)
                } else {
                    step.uri.clone()
                };
                format!("{} {} {}", step.method, uri, step.status)
            })
            .collect();
        lines.join("<br>")
    }

    fn seal(&mut self) {
        self.response_time.seal();
        self.request_body_bytes.seal();
        self.response_body_bytes.seal();
        for step in &mut self.step_stats {
            step.response_time.seal();
            step.request_body_bytes.seal();
            step.response_body_bytes.seal();
        }
    }
}

/// Stream-wide accumulators over every individual step observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStat {
    response_time: Accumulator,
    request_body_bytes: Accumulator,
    response_body_bytes: Accumulator,
}

impl GlobalStat {
    fn new(percentiles: &PercentileFlags) -> Self {
        Self {
            response_time: Accumulator::new(percentiles.response_time),
            request_body_bytes: Accumulator::new(percentiles.request_body),
            response_body_bytes: Accumulator::new(percentiles.response_body),
        }
    }

    fn observe(&mut self, detail: &RequestDetail) {
        self.response_time.observe(detail.response_time);
        self.request_body_bytes.observe(detail.request_body_bytes);
        self.response_body_bytes.observe(detail.response_body_bytes);
    }

    #[must_use]
    pub fn response_time(&self) -> &Accumulator {
        &self.response_time
    }

    #[must_use]
    pub fn request_body_bytes(&self) -> &Accumulator {
        &self.request_body_bytes
    }

    #[must_use]
    pub fn response_body_bytes(&self) -> &Accumulator {
        &self.response_body_bytes
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PercentileFlags {
    response_time: bool,
    request_body: bool,
    response_body: bool,
}

/// Scenario aggregator: buffers per-trace request sequences during ingest
/// and folds them into scenario groups at end of stream.
#[derive(Debug, Serialize, Deserialize)]
pub struct TraceStats {
    #[serde(skip)]
    trace_index: FxHashMap<String, usize>,
    /// Unfinished traces in first-seen order; drained by `aggregate`.
    #[serde(skip)]
    buffer: Vec<(String, Vec<RequestDetail>)>,
    #[serde(skip)]
    digest_index: FxHashMap<String, Vec<usize>>,
    global: GlobalStat,
    stats: Vec<ScenarioStat>,
    percentiles: PercentileFlags,
    #[serde(skip)]
    matching_groups: MatchingGroups,
}

impl Default for TraceStats {
    fn default() -> Self {
        Self::new(true, false, false)
    }
}

impl TraceStats {
    #[must_use]
    pub fn new(
        use_response_time_percentile: bool,
        use_request_body_percentile: bool,
        use_response_body_percentile: bool,
    ) -> Self {
        let percentiles = PercentileFlags {
            response_time: use_response_time_percentile,
            request_body: use_request_body_percentile,
            response_body: use_response_body_percentile,
        };
        Self {
            trace_index: FxHashMap::default(),
            buffer: Vec::new(),
            digest_index: FxHashMap::default(),
            global: GlobalStat::new(&percentiles),
            stats: Vec::new(),
            percentiles,
            matching_groups: MatchingGroups::default(),
        }
    }

    pub fn set_matching_groups(&mut self, patterns: &[String]) -> Result<(), ConfigError> {
        self.matching_groups = canon::compile_matching_groups(patterns)?;
        Ok(())
    }

    /// Index one accepted record under its trace ID, preserving both the
    /// in-record order within a trace and the first-seen order of traces.
    pub fn append(&mut self, trace_id: &str, mut detail: RequestDetail) {
        if let Some(pattern) = self.matching_groups.rewrite(&detail.key.uri) {
            detail.key.uri = pattern.to_owned();
        }

        let idx = match self.trace_index.get(trace_id) {
            Some(idx) => *idx,
            None => {
                let idx = self.buffer.len();
                self.buffer.push((trace_id.to_owned(), Vec::new()));
                self.trace_index.insert(trace_id.to_owned(), idx);
                idx
            }
        };
        self.buffer[idx].1.push(detail);
    }

    /// Finalize scenarios from the buffered traces. Runs exactly once,
    /// after the producer signals end of stream; the buffer is drained.
    pub fn aggregate(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        self.trace_index.clear();

        for (trace_id, details) in &buffer {
            let steps: Vec<EndpointKey> =
                details.iter().map(|detail| detail.key.clone()).collect();
            let id = scenario_id(&steps);

            let candidates = self.digest_index.entry(id.clone()).or_default();
            let idx = match candidates
                .iter()
                .find(|idx| self.stats[**idx].steps == steps)
            {
                Some(idx) => *idx,
                None => {
                    if !candidates.is_empty() {
                        debug!(%id, "scenario digest collision, keeping sequences distinct");
                    }
                    let idx = self.stats.len();
                    self.stats
                        .push(ScenarioStat::new(id, steps, &self.percentiles));
                    candidates.push(idx);
                    idx
                }
            };

            self.stats[idx].observe_trace(trace_id, details);
            for detail in details {
                self.global.observe(detail);
            }
        }
    }

    #[must_use]
    pub fn stats(&self) -> &[ScenarioStat] {
        &self.stats
    }

    #[must_use]
    pub fn global(&self) -> &GlobalStat {
        &self.global
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Number of traces still buffered (zero after `aggregate`).
    #[must_use]
    pub fn buffered_traces(&self) -> usize {
        self.buffer.len()
    }

    /// Total trace count across all scenarios, for footer rows.
    #[must_use]
    pub fn count_all(&self) -> u64 {
        self.stats.iter().map(ScenarioStat::count).sum()
    }

    /// Locate the baseline counterpart of `stat`: same digest and same
    /// canonical step sequence.
    #[must_use]
    pub fn find(&self, stat: &ScenarioStat) -> Option<&ScenarioStat> {
        self.digest_index.get(&stat.id).and_then(|candidates| {
            candidates
                .iter()
                .map(|idx| &self.stats[*idx])
                .find(|candidate| candidate.steps == stat.steps)
        })
    }

    /// Sort the sample stores; percentile queries are only valid afterwards.
    pub fn seal(&mut self) {
        for stat in &mut self.stats {
            stat.seal();
        }
        self.global.response_time.seal();
        self.global.request_body_bytes.seal();
        self.global.response_body_bytes.seal();
    }

    pub fn sort(&mut self, options: &SortOptions) {
        let reverse = options.reverse;
        let rank = options.percentile;
        match options.key {
            SortKey::Count => sort_numeric(&mut self.stats, reverse, |s| s.cnt as f64),
            SortKey::Uri | SortKey::Method => {
                sort_text(&mut self.stats, reverse, |s| s.id.as_str());
            }
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
            SortKey::MinBody => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_body_bytes.min());
            }
            SortKey::MaxBody => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_body_bytes.max());
            }
            SortKey::SumBody => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_body_bytes.sum());
            }
            SortKey::AvgBody => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_body_bytes.avg());
            }
            SortKey::StddevBody => {
                sort_numeric(&mut self.stats, reverse, |s| s.response_body_bytes.stddev());
            }
        }
        self.rebuild_digest_index();
    }

    /// Keep the top rows after sorting.
    pub fn trim(&mut self, limit: &Limit) {
        let keep = limit.rows(self.stats.len());
        self.stats.truncate(keep);
        self.rebuild_digest_index();
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
        let mut loaded: TraceStats =
            serde_json::from_reader(reader).map_err(|err| StatsError::Load { source: err })?;
        loaded.rebuild_digest_index();
        *self = loaded;
        Ok(())
    }

    fn rebuild_digest_index(&mut self) {
        self.digest_index.clear();
        for (idx, stat) in self.stats.iter().enumerate() {
            self.digest_index
                .entry(stat.id.clone())
                .or_default()
                .push(idx);
        }
    }
}
