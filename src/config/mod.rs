//! Run configuration: an optional TOML file merged under the CLI flags.
//!
//! Precedence is CLI over file over built-in defaults. The resolved
//! [`Options`] value fully describes a run; nothing else feeds the
//! profiler.

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::args::{CommonArgs, OutputFormat};
use crate::canon::QueryPolicy;
use crate::error::{AppResult, ConfigError};
use crate::filter::FilterConfig;
use crate::parse::FieldKeys;
use crate::printer::PrintOptions;
use crate::stats::{Limit, SortOptions};

/// Filter section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileFilter {
    pub methods: Option<Vec<String>>,
    pub statuses: Option<Vec<String>>,
    pub include_uri: Option<String>,
    pub exclude_uri: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub time_format: Option<String>,
}

/// Field-name mapping section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileFields {
    pub uri: Option<String>,
    pub method: Option<String>,
    pub time: Option<String>,
    pub response_time: Option<String>,
    pub request_time: Option<String>,
    pub body_bytes: Option<String>,
    pub status: Option<String>,
    pub trace_id: Option<String>,
}

/// The TOML config file. Every field is optional; unknown keys are
/// rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub file: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub output: Option<String>,
    pub percentiles: Option<Vec<u8>>,
    pub sort: Option<String>,
    pub reverse: Option<bool>,
    pub limit: Option<String>,
    pub matching_groups: Option<Vec<String>>,
    pub query_string: Option<bool>,
    pub qs_ignore_values: Option<bool>,
    pub pos: Option<PathBuf>,
    pub no_save_pos: Option<bool>,
    pub dump: Option<PathBuf>,
    pub noheaders: Option<bool>,
    pub show_footers: Option<bool>,
    pub decode_uri: Option<bool>,
    pub page: Option<usize>,
    pub strict: Option<bool>,
    #[serde(default)]
    pub filter: FileFilter,
    #[serde(default)]
    pub fields: FileFields,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            source: err,
        })?;
        toml::from_str(&text).map_err(|err| ConfigError::Toml {
            path: path.display().to_string(),
            source: err,
        })
    }
}

/// Fully resolved run configuration.
#[derive(Debug, Clone)]
pub struct Options {
    pub file: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: String,
    pub percentiles: Vec<u8>,
    pub sort: SortOptions,
    pub limit: Limit,
    pub matching_groups: Vec<String>,
    pub query_policy: QueryPolicy,
    pub pos_file: Option<PathBuf>,
    pub save_pos: bool,
    pub load: Option<PathBuf>,
    pub dump: Option<PathBuf>,
    pub print: PrintOptions,
    pub filter: FilterConfig,
    pub strict: bool,
    /// Scenario mode: group by trace ID and aggregate ordered sequences.
    pub trace: bool,
    pub keys: FieldKeys,
}

impl Options {
    /// Merge CLI flags over the optional config file and defaults.
    pub fn resolve(args: &CommonArgs, trace: bool) -> AppResult<Self> {
        let file_config = match args.config.as_deref() {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, &file_config, trace)
    }

    fn merge(args: &CommonArgs, file: &FileConfig, trace: bool) -> AppResult<Self> {
        let percentiles = match args.percentiles.as_ref() {
            Some(cli) => cli.0.clone(),
            None => match file.percentiles.as_ref() {
                Some(ranks) => validate_percentiles(ranks)?,
                None => vec![90, 95, 99],
            },
        };

        let reverse = args.reverse || file.reverse.unwrap_or(false);
        let sort = match args.sort.as_deref().or(file.sort.as_deref()) {
            Some(value) => SortOptions::parse(value, reverse)?,
            None => SortOptions {
                reverse,
                ..SortOptions::default()
            },
        };

        let limit = match args.limit.as_deref().or(file.limit.as_deref()) {
            Some(value) => Limit::parse(value)?,
            None => Limit::default(),
        };

        let query_string = args.query_string || file.query_string.unwrap_or(false);
        let qs_ignore_values = args.qs_ignore_values || file.qs_ignore_values.unwrap_or(false);

        let print = PrintOptions {
            no_headers: args.no_headers || file.noheaders.unwrap_or(false),
            show_footers: args.show_footers || file.show_footers.unwrap_or(false),
            decode_uri: args.decode_uri || file.decode_uri.unwrap_or(false),
            pagination_limit: args.page.or(file.page).unwrap_or(100),
        };

        let filter = FilterConfig {
            methods: args
                .filter_methods
                .as_ref()
                .map(|csv| csv.0.clone())
                .or_else(|| file.filter.methods.clone())
                .unwrap_or_default(),
            statuses: args
                .filter_statuses
                .as_ref()
                .map(|csv| csv.0.clone())
                .or_else(|| file.filter.statuses.clone())
                .unwrap_or_default(),
            include_uri: args
                .include_uri
                .clone()
                .or_else(|| file.filter.include_uri.clone()),
            exclude_uri: args
                .exclude_uri
                .clone()
                .or_else(|| file.filter.exclude_uri.clone()),
            since: args
                .time_since
                .clone()
                .or_else(|| file.filter.since.clone()),
            until: args
                .time_until
                .clone()
                .or_else(|| file.filter.until.clone()),
            time_format: args
                .time_format
                .clone()
                .or_else(|| file.filter.time_format.clone()),
        };

        let defaults = FieldKeys::default();
        let keys = FieldKeys {
            uri: pick_key(&args.uri_key, &file.fields.uri, defaults.uri),
            method: pick_key(&args.method_key, &file.fields.method, defaults.method),
            time: pick_key(&args.time_key, &file.fields.time, defaults.time),
            response_time: pick_key(
                &args.restime_key,
                &file.fields.response_time,
                defaults.response_time,
            ),
            request_time: pick_key(
                &args.reqtime_key,
                &file.fields.request_time,
                defaults.request_time,
            ),
            body_bytes: pick_key(
                &args.body_bytes_key,
                &file.fields.body_bytes,
                defaults.body_bytes,
            ),
            status: pick_key(&args.status_key, &file.fields.status, defaults.status),
            trace_id: pick_key(&args.trace_id_key, &file.fields.trace_id, defaults.trace_id),
        };

        if trace && args.load.is_some() {
            return Err(ConfigError::LoadUnsupportedInTraceMode.into());
        }

        Ok(Self {
            file: args.file.clone().or_else(|| file.file.clone()),
            format: args.format.or(file.format).unwrap_or(OutputFormat::Table),
            output: args
                .output
                .clone()
                .or_else(|| file.output.clone())
                .unwrap_or_else(|| "all".to_owned()),
            percentiles,
            sort,
            limit,
            matching_groups: args
                .matching_groups
                .as_ref()
                .map(|csv| csv.0.clone())
                .or_else(|| file.matching_groups.clone())
                .unwrap_or_default(),
            query_policy: QueryPolicy::from_flags(query_string, qs_ignore_values),
            pos_file: args.pos.clone().or_else(|| file.pos.clone()),
            save_pos: !(args.no_save_pos || file.no_save_pos.unwrap_or(false)),
            load: args.load.clone(),
            dump: args.dump.clone().or_else(|| file.dump.clone()),
            print,
            filter,
            strict: args.strict || file.strict.unwrap_or(false),
            trace,
            keys,
        })
    }
}

fn pick_key(cli: &Option<String>, file: &Option<String>, default: String) -> String {
    cli.clone()
        .or_else(|| file.clone())
        .filter(|key| !key.is_empty())
        .unwrap_or(default)
}

fn validate_percentiles(ranks: &[u8]) -> Result<Vec<u8>, ConfigError> {
    for rank in ranks {
        if *rank > 100 {
            return Err(ConfigError::InvalidPercentile {
                value: rank.to_string(),
            });
        }
    }
    Ok(ranks.to_vec())
}
