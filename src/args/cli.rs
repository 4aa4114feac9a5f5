use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::types::{CsvStrings, OutputFormat, Percentiles};

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Aggregate per trace scenario instead of per endpoint
    Trace(TraceArgs),
    /// Compare a persisted baseline against another dump or a fresh run
    Diff(DiffArgs),
}

#[derive(Debug, Args, Clone)]
pub struct TraceArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DiffArgs {
    /// Baseline dump to diff against
    pub from: PathBuf,

    /// Dump to compare; a fresh run over the input when omitted
    pub to: Option<PathBuf>,

    /// Diff scenario aggregations instead of endpoint aggregations
    #[arg(long)]
    pub trace: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Parser, Clone, Default)]
#[clap(
    version,
    about = "Trace-aware HTTP access log profiler - per-endpoint and per-scenario latency and size statistics with resumable reads and baseline diffs."
)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ProfileArgs {
    /// The flag set in effect: the subcommand's when one was given.
    #[must_use]
    pub fn flags(&self) -> &CommonArgs {
        match self.command.as_ref() {
            Some(Command::Trace(trace)) => &trace.common,
            Some(Command::Diff(diff)) => &diff.common,
            None => &self.common,
        }
    }
}

#[derive(Debug, Args, Clone, Default)]
pub struct CommonArgs {
    /// Access log file (stdin when omitted)
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Run configuration file (TOML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Columns to print: all, or a comma-separated keyword list
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// Percentile ranks to report (comma-separated integers, 0-100)
    #[arg(long)]
    pub percentiles: Option<Percentiles>,

    /// Sort key: count, uri, method, min, max, sum, avg, stddev, pN, or a *_body variant
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Keep only the top N rows, or the top P% of rows, after sorting
    #[arg(long)]
    pub limit: Option<String>,

    /// URI regex patterns; a match collapses the URI onto the pattern text
    #[arg(long = "matching-groups", short = 'm')]
    pub matching_groups: Option<CsvStrings>,

    /// Keep query strings in canonical URIs (parameters sorted by key)
    #[arg(long = "query-string", short = 'q')]
    pub query_string: bool,

    /// With --query-string, replace every parameter value with xxx
    #[arg(long = "qs-ignore-values")]
    pub qs_ignore_values: bool,

    /// Position file for resumable reads
    #[arg(long)]
    pub pos: Option<PathBuf>,

    /// Do not write the consumed byte offset back to the position file
    #[arg(long = "no-save-pos")]
    pub no_save_pos: bool,

    /// Load a persisted endpoint aggregation instead of ingesting
    #[arg(long)]
    pub load: Option<PathBuf>,

    /// Persist the aggregation state to this path
    #[arg(long)]
    pub dump: Option<PathBuf>,

    /// Omit the header row (tsv/csv)
    #[arg(long = "noheaders")]
    pub no_headers: bool,

    /// Append a totals footer row
    #[arg(long = "show-footers")]
    pub show_footers: bool,

    /// Percent-decode URIs for display
    #[arg(long = "decode-uri")]
    pub decode_uri: bool,

    /// Rows per page in HTML output
    #[arg(long)]
    pub page: Option<usize>,

    /// Fail on malformed lines instead of skipping them
    #[arg(long)]
    pub strict: bool,

    /// Only aggregate requests with one of these methods
    #[arg(long = "filter-methods")]
    pub filter_methods: Option<CsvStrings>,

    /// Only aggregate requests with these status codes or ranges (e.g. 200,301-399)
    #[arg(long = "filter-statuses")]
    pub filter_statuses: Option<CsvStrings>,

    /// Only aggregate URIs matching this regex
    #[arg(long = "include-uri")]
    pub include_uri: Option<String>,

    /// Drop URIs matching this regex
    #[arg(long = "exclude-uri")]
    pub exclude_uri: Option<String>,

    /// Inclusive lower bound on record timestamps
    #[arg(long = "time-since")]
    pub time_since: Option<String>,

    /// Inclusive upper bound on record timestamps
    #[arg(long = "time-until")]
    pub time_until: Option<String>,

    /// strftime pattern for record timestamps (RFC 3339 when omitted)
    #[arg(long = "time-format")]
    pub time_format: Option<String>,

    /// JSON field holding the request URI
    #[arg(long = "uri-key")]
    pub uri_key: Option<String>,

    /// JSON field holding the request method
    #[arg(long = "method-key")]
    pub method_key: Option<String>,

    /// JSON field holding the record timestamp
    #[arg(long = "time-key")]
    pub time_key: Option<String>,

    /// JSON field holding the response time
    #[arg(long = "restime-key")]
    pub restime_key: Option<String>,

    /// JSON field holding the request time (response-time fallback)
    #[arg(long = "reqtime-key")]
    pub reqtime_key: Option<String>,

    /// JSON field holding the body byte count
    #[arg(long = "body-bytes-key")]
    pub body_bytes_key: Option<String>,

    /// JSON field holding the response status
    #[arg(long = "status-key")]
    pub status_key: Option<String>,

    /// JSON field holding the trace ID
    #[arg(long = "trace-id-key")]
    pub trace_id_key: Option<String>,

    /// Verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
