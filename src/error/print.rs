use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("invalid keywords: {keywords}")]
    UnknownKeywords { keywords: String },
    #[error("I/O error while writing output: {source}")]
    Write {
        #[from]
        source: std::io::Error,
    },
    #[error("Cannot encode HTML payload: {source}")]
    HtmlPayload {
        #[source]
        source: serde_json::Error,
    },
}
