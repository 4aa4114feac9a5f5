//! Keyword-driven multi-format rendering of aggregated statistics.
mod html;
mod keywords;


use std::io::Write;

use comfy_table::{presets, ContentArrangement, Table};

use crate::args::OutputFormat;
use crate::error::PrintError;
use crate::stats::{
    diff_count, diff_value, with_diff, EndpointStat, HttpStats, ScenarioStat, TraceStats,
};

pub use keywords::{default_keywords, resolve_keywords, Keyword, TableMode};

/// Three-decimal rendering used for every time and byte metric.
#[must_use]
pub fn round(value: f64) -> String {
    format!("{:.3}", value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    pub no_headers: bool,
    pub show_footers: bool,
    pub decode_uri: bool,
    pub pagination_limit: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            no_headers: false,
            show_footers: false,
            decode_uri: false,
            pagination_limit: 100,
        }
    }
}

/// Row source: one cell per keyword, plus a DIFF-annotated variant.
pub trait StatRow {
    fn cell(&self, keyword: &Keyword, options: &PrintOptions, quote_uri: bool) -> String;
    fn diff_cell(
        &self,
        from: &Self,
        keyword: &Keyword,
        options: &PrintOptions,
        quote_uri: bool,
    ) -> String;
}

fn quote_csv(value: String, quote: bool) -> String {
    if quote && value.contains(',') {
        format!("\"{}\"", value)
    } else {
        value
    }
}

impl StatRow for EndpointStat {
    fn cell(&self, keyword: &Keyword, options: &PrintOptions, quote_uri: bool) -> String {
        match keyword {
            Keyword::Count => self.count().to_string(),
            Keyword::Method => self.key().method.clone(),
            Keyword::Uri => quote_csv(self.uri_with_options(options.decode_uri), quote_uri),
            Keyword::Status => self.key().status.to_string(),
            Keyword::Min => round(self.response_time().min()),
            Keyword::Max => round(self.response_time().max()),
            Keyword::Sum => round(self.response_time().sum()),
            Keyword::Avg => round(self.response_time().avg()),
            Keyword::Stddev => round(self.response_time().stddev()),
            Keyword::MinBody => round(self.body_bytes().min()),
            Keyword::MaxBody => round(self.body_bytes().max()),
            Keyword::SumBody => round(self.body_bytes().sum()),
            Keyword::AvgBody => round(self.body_bytes().avg()),
            Keyword::Percentile(rank) => round(self.response_time().percentile(*rank)),
            // Scenario-only keywords never survive validation in endpoint mode.
            _ => String::new(),
        }
    }

    fn diff_cell(
        &self,
        from: &Self,
        keyword: &Keyword,
        options: &PrintOptions,
        quote_uri: bool,
    ) -> String {
        let diff_acc = |to: f64, from_value: f64| with_diff(&round(to), &diff_value(to, from_value));
        match keyword {
            Keyword::Count => with_diff(
                &self.count().to_string(),
                &diff_count(self.count(), from.count()),
            ),
            Keyword::Method | Keyword::Uri | Keyword::Status => {
                self.cell(keyword, options, quote_uri)
            }
            Keyword::Min => diff_acc(self.response_time().min(), from.response_time().min()),
            Keyword::Max => diff_acc(self.response_time().max(), from.response_time().max()),
            Keyword::Sum => diff_acc(self.response_time().sum(), from.response_time().sum()),
            Keyword::Avg => diff_acc(self.response_time().avg(), from.response_time().avg()),
            Keyword::Stddev => diff_acc(
                self.response_time().stddev(),
                from.response_time().stddev(),
            ),
            Keyword::MinBody => diff_acc(self.body_bytes().min(), from.body_bytes().min()),
            Keyword::MaxBody => diff_acc(self.body_bytes().max(), from.body_bytes().max()),
            Keyword::SumBody => diff_acc(self.body_bytes().sum(), from.body_bytes().sum()),
            Keyword::AvgBody => diff_acc(self.body_bytes().avg(), from.body_bytes().avg()),
            Keyword::Percentile(rank) => diff_acc(
                self.response_time().percentile(*rank),
                from.response_time().percentile(*rank),
            ),
            _ => String::new(),
        }
    }
}

impl StatRow for ScenarioStat {
    fn cell(&self, keyword: &Keyword, options: &PrintOptions, quote_uri: bool) -> String {
        match keyword {
            Keyword::Count => self.count().to_string(),
            Keyword::UriMethodStatus => {
                quote_csv(self.uri_method_status(options.decode_uri), quote_uri)
            }
            Keyword::Min => round(self.response_time().min()),
            Keyword::Max => round(self.response_time().max()),
            Keyword::Sum => round(self.response_time().sum()),
            Keyword::Avg => round(self.response_time().avg()),
            Keyword::Stddev => round(self.response_time().stddev()),
            Keyword::MinBody => round(self.response_body_bytes().min()),
            Keyword::MaxBody => round(self.response_body_bytes().max()),
            Keyword::SumBody => round(self.response_body_bytes().sum()),
            Keyword::AvgBody => round(self.response_body_bytes().avg()),
            Keyword::MinReqBody => round(self.request_body_bytes().min()),
            Keyword::MaxReqBody => round(self.request_body_bytes().max()),
            Keyword::SumReqBody => round(self.request_body_bytes().sum()),
            Keyword::AvgReqBody => round(self.request_body_bytes().avg()),
            Keyword::Percentile(rank) => round(self.response_time().percentile(*rank)),
            // Endpoint-only keywords never survive validation in scenario mode.
            _ => String::new(),
        }
    }

    fn diff_cell(
        &self,
        from: &Self,
        keyword: &Keyword,
        options: &PrintOptions,
        quote_uri: bool,
    ) -> String {
        let diff_acc = |to: f64, from_value: f64| with_diff(&round(to), &diff_value(to, from_value));
        match keyword {
            Keyword::Count => with_diff(
                &self.count().to_string(),
                &diff_count(self.count(), from.count()),
            ),
            Keyword::UriMethodStatus => self.cell(keyword, options, quote_uri),
            Keyword::Min => diff_acc(self.response_time().min(), from.response_time().min()),
            Keyword::Max => diff_acc(self.response_time().max(), from.response_time().max()),
            Keyword::Sum => diff_acc(self.response_time().sum(), from.response_time().sum()),
            Keyword::Avg => diff_acc(self.response_time().avg(), from.response_time().avg()),
            Keyword::Stddev => diff_acc(
                self.response_time().stddev(),
                from.response_time().stddev(),
            ),
            Keyword::MinBody => diff_acc(
                self.response_body_bytes().min(),
                from.response_body_bytes().min(),
            ),
            Keyword::MaxBody => diff_acc(
                self.response_body_bytes().max(),
                from.response_body_bytes().max(),
            ),
            Keyword::SumBody => diff_acc(
                self.response_body_bytes().sum(),
                from.response_body_bytes().sum(),
            ),
            Keyword::AvgBody => diff_acc(
                self.response_body_bytes().avg(),
                from.response_body_bytes().avg(),
            ),
            Keyword::MinReqBody => diff_acc(
                self.request_body_bytes().min(),
                from.request_body_bytes().min(),
            ),
            Keyword::MaxReqBody => diff_acc(
                self.request_body_bytes().max(),
                from.request_body_bytes().max(),
            ),
            Keyword::SumReqBody => diff_acc(
                self.request_body_bytes().sum(),
                from.request_body_bytes().sum(),
            ),
            Keyword::AvgReqBody => diff_acc(
                self.request_body_bytes().avg(),
                from.request_body_bytes().avg(),
            ),
            Keyword::Percentile(rank) => diff_acc(
                self.response_time().percentile(*rank),
                from.response_time().percentile(*rank),
            ),
            _ => String::new(),
        }
    }
}

/// Renders one aggregation (optionally against a baseline) in the
/// configured format.
#[derive(Debug)]
pub struct Printer {
    keywords: Vec<Keyword>,
    headers: Vec<String>,
    format: OutputFormat,
    options: PrintOptions,
}

impl Printer {
    /// Build a printer; unknown keywords are rejected here, at startup.
    pub fn new(
        output: &str,
        format: OutputFormat,
        percentiles: &[u8],
        mode: TableMode,
        options: PrintOptions,
    ) -> Result<Self, PrintError> {
        let keywords = resolve_keywords(output, mode, percentiles)?;
        let headers = keywords.iter().map(Keyword::header).collect();
        Ok(Self {
            keywords,
            headers,
            format,
            options,
        })
    }

    pub fn print_endpoints<W: Write>(
        &self,
        writer: &mut W,
        current: &HttpStats,
        baseline: Option<&HttpStats>,
    ) -> Result<(), PrintError> {
        let totals = (current.count_all(), baseline.map(HttpStats::count_all));
        self.render(writer, current.stats(), totals, |stat| {
            baseline.and_then(|b| b.find(stat))
        })
    }

    pub fn print_scenarios<W: Write>(
        &self,
        writer: &mut W,
        current: &TraceStats,
        baseline: Option<&TraceStats>,
    ) -> Result<(), PrintError> {
        let totals = (current.count_all(), baseline.map(TraceStats::count_all));
        self.render(writer, current.stats(), totals, |stat| {
            baseline.and_then(|b| b.find(stat))
        })
    }

    fn build_rows<'b, T, F>(&self, stats: &[T], baseline_for: F, quote_uri: bool) -> Vec<Vec<String>>
    where
        T: StatRow + 'b,
        F: Fn(&T) -> Option<&'b T>,
    {
        stats
            .iter()
            .map(|stat| {
                self.keywords
                    .iter()
                    .map(|keyword| match baseline_for(stat) {
                        Some(from) => stat.diff_cell(from, keyword, &self.options, quote_uri),
                        None => stat.cell(keyword, &self.options, quote_uri),
                    })
                    .collect()
            })
            .collect()
    }

    fn footer(&self, totals: (u64, Option<u64>)) -> Vec<String> {
        let (current, baseline) = totals;
        self.keywords
            .iter()
            .map(|keyword| match keyword {
                Keyword::Count => match baseline {
                    Some(from) => with_diff(&current.to_string(), &diff_count(current, from)),
                    None => current.to_string(),
                },
                _ => String::new(),
            })
            .collect()
    }

    fn render<'b, T, F>(
        &self,
        writer: &mut dyn Write,
        stats: &[T],
        totals: (u64, Option<u64>),
        baseline_for: F,
    ) -> Result<(), PrintError>
    where
        T: StatRow + 'b,
        F: Fn(&T) -> Option<&'b T>,
    {
        match self.format {
            OutputFormat::Table => self.render_table(writer, stats, totals, baseline_for, false),
            OutputFormat::Md => self.render_table(writer, stats, totals, baseline_for, true),
            OutputFormat::Tsv => self.render_delimited(writer, stats, baseline_for, '\t', false),
            OutputFormat::Csv => self.render_delimited(writer, stats, baseline_for, ',', true),
            OutputFormat::Html => self.render_html(writer, stats, baseline_for),
        }
    }

    fn render_table<'b, T, F>(
        &self,
        writer: &mut dyn Write,
        stats: &[T],
        totals: (u64, Option<u64>),
        baseline_for: F,
        markdown: bool,
    ) -> Result<(), PrintError>
    where
        T: StatRow + 'b,
        F: Fn(&T) -> Option<&'b T>,
    {
        let mut table = Table::new();
        table.load_preset(if markdown {
            presets::ASCII_MARKDOWN
        } else {
            presets::ASCII_FULL
        });
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(self.headers.clone());

        for row in self.build_rows(stats, baseline_for, false) {
            table.add_row(row);
        }
        if self.options.show_footers {
            table.add_row(self.footer(totals));
        }

        writeln!(writer, "{table}")?;
        Ok(())
    }

    fn render_delimited<'b, T, F>(
        &self,
        writer: &mut dyn Write,
        stats: &[T],
        baseline_for: F,
        delimiter: char,
        quote_uri: bool,
    ) -> Result<(), PrintError>
    where
        T: StatRow + 'b,
        F: Fn(&T) -> Option<&'b T>,
    {
        let delimiter = delimiter.to_string();
        if !self.options.no_headers {
            writeln!(writer, "{}", self.headers.join(&delimiter))?;
        }
        for row in self.build_rows(stats, baseline_for, quote_uri) {
            writeln!(writer, "{}", row.join(&delimiter))?;
        }
        Ok(())
    }

    fn render_html<'b, T, F>(
        &self,
        writer: &mut dyn Write,
        stats: &[T],
        baseline_for: F,
    ) -> Result<(), PrintError>
    where
        T: StatRow + 'b,
        F: Fn(&T) -> Option<&'b T>,
    {
        let rows = self.build_rows(stats, baseline_for, false);
        let document = html::render_grid(
            "traceprof",
            &self.headers,
            &rows,
            self.options.pagination_limit,
        )?;
        writeln!(writer, "{document}")?;
        Ok(())
    }
}
