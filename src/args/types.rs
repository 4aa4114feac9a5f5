use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    #[value(alias = "markdown")]
    #[serde(alias = "markdown")]
    Md,
    Tsv,
    Csv,
    Html,
}

/// Comma-separated percentile ranks, each between 0 and 100.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Percentiles(pub Vec<u8>);

impl std::str::FromStr for Percentiles {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ranks = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let rank: u8 = part
                .parse()
                .map_err(|_| format!("invalid percentile: {part}"))?;
            if rank > 100 {
                return Err(format!("invalid percentile: {part}"));
            }
            ranks.push(rank);
        }
        Ok(Percentiles(ranks))
    }
}

/// Comma-separated string list flag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CsvStrings(pub Vec<String>);

impl std::str::FromStr for CsvStrings {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CsvStrings(
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_owned)
                .collect(),
        ))
    }
}
