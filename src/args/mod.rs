//! CLI argument types and parsing helpers.
mod cli;
mod types;


pub use cli::{Command, CommonArgs, DiffArgs, ProfileArgs, TraceArgs};
pub use types::{CsvStrings, OutputFormat, Percentiles};
