use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse config file {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid percentile: {value} (expected an integer between 0 and 100)")]
    InvalidPercentile { value: String },
    #[error("Invalid sort key: {value}")]
    InvalidSortKey { value: String },
    #[error("Invalid limit: {value} (expected a row count or a percentage like 10%)")]
    InvalidLimit { value: String },
    #[error("Invalid matching group {pattern}: {source}")]
    InvalidMatchingGroup {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid URI filter pattern {pattern}: {source}")]
    InvalidFilterRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid status filter: {value} (expected codes or ranges like 200,301-399)")]
    InvalidStatusFilter { value: String },
    #[error("Invalid time bound {value}: {source}")]
    InvalidTimeBound {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("--load is only supported in endpoint mode")]
    LoadUnsupportedInTraceMode,
}
