use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Cannot serialize stats dump: {source}")]
    Dump {
        #[source]
        source: serde_json::Error,
    },
    #[error("Cannot deserialize stats dump: {source}")]
    Load {
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}
