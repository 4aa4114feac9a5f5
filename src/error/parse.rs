use thiserror::Error;

/// Record-level and stream-level parser outcomes.
///
/// `Eof` and `SkipLine` are control flow, not failures: the ingest loop
/// stops on the former and continues on the latter. Everything else aborts
/// the run.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("end of input")]
    Eof,
    #[error("skipped line")]
    SkipLine,
    #[error("invalid log line: {reason}")]
    InvalidLine { reason: String },
    #[error("I/O error while reading input: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Demote a structural failure to a line skip unless strict mode wants
    /// it fatal.
    pub fn skip_unless_strict(strict: bool, reason: impl Into<String>) -> Self {
        if strict {
            ParseError::InvalidLine {
                reason: reason.into(),
            }
        } else {
            ParseError::SkipLine
        }
    }
}
