use crate::error::PrintError;

/// Which aggregation the table renders; decides the keyword vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    Endpoint,
    Scenario,
}

/// One output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Count,
    Method,
    Uri,
    Status,
    UriMethodStatus,
    Min,
    Max,
    Sum,
    Avg,
    Stddev,
    MinBody,
    MaxBody,
    SumBody,
    AvgBody,
    MinReqBody,
    MaxReqBody,
    SumReqBody,
    AvgReqBody,
    Percentile(u8),
}

impl Keyword {
    fn parse(value: &str) -> Option<Keyword> {
        let keyword = match value {
            "count" => Keyword::Count,
            "method" => Keyword::Method,
            "uri" => Keyword::Uri,
            "status" => Keyword::Status,
            "uri_method_status" => Keyword::UriMethodStatus,
            "min" => Keyword::Min,
            "max" => Keyword::Max,
            "sum" => Keyword::Sum,
            "avg" => Keyword::Avg,
            "stddev" => Keyword::Stddev,
            "min_body" => Keyword::MinBody,
            "max_body" => Keyword::MaxBody,
            "sum_body" => Keyword::SumBody,
            "avg_body" => Keyword::AvgBody,
            "min_req_body" => Keyword::MinReqBody,
            "max_req_body" => Keyword::MaxReqBody,
            "sum_req_body" => Keyword::SumReqBody,
            "avg_req_body" => Keyword::AvgReqBody,
            other => {
                let rank = other
                    .strip_prefix('p')
                    .and_then(|digits| digits.parse::<u8>().ok())
                    .filter(|rank| *rank <= 100)?;
                Keyword::Percentile(rank)
            }
        };
        Some(keyword)
    }

    #[must_use]
    pub fn header(&self) -> String {
        match self {
            Keyword::Count => "Count".to_owned(),
            Keyword::Method => "Method".to_owned(),
            Keyword::Uri => "Uri".to_owned(),
            Keyword::Status => "Status".to_owned(),
            Keyword::UriMethodStatus => "UriMethodStatus".to_owned(),
            Keyword::Min => "Min".to_owned(),
            Keyword::Max => "Max".to_owned(),
            Keyword::Sum => "Sum".to_owned(),
            Keyword::Avg => "Avg".to_owned(),
            Keyword::Stddev => "Stddev".to_owned(),
            Keyword::MinBody => "Min(Body)".to_owned(),
            Keyword::MaxBody => "Max(Body)".to_owned(),
            Keyword::SumBody => "Sum(Body)".to_owned(),
            Keyword::AvgBody => "Avg(Body)".to_owned(),
            Keyword::MinReqBody => "Min(ReqBody)".to_owned(),
            Keyword::MaxReqBody => "Max(ReqBody)".to_owned(),
            Keyword::SumReqBody => "Sum(ReqBody)".to_owned(),
            Keyword::AvgReqBody => "Avg(ReqBody)".to_owned(),
            Keyword::Percentile(rank) => format!("P{}", rank),
        }
    }

    fn valid_for(&self, mode: TableMode) -> bool {
        match self {
            Keyword::Method | Keyword::Uri | Keyword::Status => mode == TableMode::Endpoint,
            Keyword::UriMethodStatus
            | Keyword::MinReqBody
            | Keyword::MaxReqBody
            | Keyword::SumReqBody
            | Keyword::AvgReqBody => mode == TableMode::Scenario,
            _ => true,
        }
    }
}

/// The `all` column set, in display order.
#[must_use]
pub fn default_keywords(mode: TableMode, percentiles: &[u8]) -> Vec<Keyword> {
    let mut keywords = vec![Keyword::Count];
    match mode {
        TableMode::Endpoint => {
            keywords.extend([Keyword::Method, Keyword::Uri, Keyword::Status]);
        }
        TableMode::Scenario => keywords.push(Keyword::UriMethodStatus),
    }
    keywords.extend([Keyword::Min, Keyword::Max, Keyword::Sum, Keyword::Avg]);
    keywords.extend(percentiles.iter().map(|rank| Keyword::Percentile(*rank)));
    keywords.extend([
        Keyword::Stddev,
        Keyword::MinBody,
        Keyword::MaxBody,
        Keyword::SumBody,
        Keyword::AvgBody,
    ]);
    if mode == TableMode::Scenario {
        keywords.extend([
            Keyword::MinReqBody,
            Keyword::MaxReqBody,
            Keyword::SumReqBody,
            Keyword::AvgReqBody,
        ]);
    }
    keywords
}

/// Resolve an `--output` value (`all` or a CSV keyword list) against the
/// mode's vocabulary. Unknown or out-of-mode keywords are a startup error
/// naming every offender.
pub fn resolve_keywords(
    output: &str,
    mode: TableMode,
    percentiles: &[u8],
) -> Result<Vec<Keyword>, PrintError> {
    let requested: Vec<&str> = output
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if requested.iter().any(|part| *part == "all") {
        return Ok(default_keywords(mode, percentiles));
    }

    let mut keywords = Vec::with_capacity(requested.len());
    let mut invalid = Vec::new();
    for part in requested {
        match Keyword::parse(part).filter(|keyword| keyword.valid_for(mode)) {
            Some(keyword) => keywords.push(keyword),
            None => invalid.push(part),
        }
    }

    if !invalid.is_empty() {
        return Err(PrintError::UnknownKeywords {
            keywords: invalid.join(","),
        });
    }

    Ok(keywords)
}
