//! The run orchestrator: wires a parser, filter, the two aggregators,
//! position-file resume, dump/load, and the printer around one streaming
//! ingest loop.
pub mod pos;

#[cfg(test)]
mod tests;

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::config::Options;
use crate::error::{AppResult, ParseError};
use crate::filter::Filter;
use crate::parse::{JsonParser, Parser};
use crate::printer::{Printer, TableMode};
use crate::stats::{EndpointKey, HttpStats, RequestDetail, TraceStats};

pub struct Profiler<'a> {
    options: &'a Options,
}

impl<'a> Profiler<'a> {
    #[must_use]
    pub fn new(options: &'a Options) -> Self {
        Self { options }
    }

    fn printer(&self, mode: TableMode) -> AppResult<Printer> {
        Ok(Printer::new(
            &self.options.output,
            self.options.format,
            &self.options.percentiles,
            mode,
            self.options.print,
        )?)
    }

    fn open_input(&self) -> AppResult<Box<dyn BufRead>> {
        match self.options.file.as_deref() {
            Some(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
            None => Ok(Box::new(BufReader::new(io::stdin()))),
        }
    }

    /// Run one aggregation (endpoint or scenario mode) and print it.
    pub fn run<W: Write>(&self, out: &mut W) -> AppResult<()> {
        if self.options.trace {
            let printer = self.printer(TableMode::Scenario)?;
            let (_, mut trace_stats) = self.ingest()?;
            if let Some(path) = self.options.dump.as_deref() {
                trace_stats.dump(dump_file(path)?)?;
            }
            trace_stats.sort(&self.options.sort);
            trace_stats.trim(&self.options.limit);
            printer.print_scenarios(out, &trace_stats, None)?;
        } else {
            let printer = self.printer(TableMode::Endpoint)?;

            if let Some(path) = self.options.load.as_deref() {
                let mut stats = HttpStats::new(true, false);
                stats.load(File::open(path)?)?;
                stats.seal();
                stats.sort(&self.options.sort);
                printer.print_endpoints(out, &stats, None)?;
                return Ok(());
            }

            let (mut http_stats, _) = self.ingest()?;
            if let Some(path) = self.options.dump.as_deref() {
                http_stats.dump(dump_file(path)?)?;
            }
            http_stats.sort(&self.options.sort);
            http_stats.trim(&self.options.limit);
            printer.print_endpoints(out, &http_stats, None)?;
        }
        Ok(())
    }

    /// Diff a baseline dump against another dump or a fresh run.
    pub fn run_diff<W: Write>(
        &self,
        out: &mut W,
        from: &Path,
        to: Option<&Path>,
    ) -> AppResult<()> {
        if self.options.trace {
            let printer = self.printer(TableMode::Scenario)?;

            let mut baseline = TraceStats::new(true, false, false);
            baseline.load(File::open(from)?)?;
            baseline.seal();

            let mut current = TraceStats::new(true, false, false);
            match to {
                Some(path) => {
                    current.load(File::open(path)?)?;
                    current.seal();
                }
                None => current = self.ingest()?.1,
            }

            current.sort(&self.options.sort);
            current.trim(&self.options.limit);
            printer.print_scenarios(out, &current, Some(&baseline))?;
        } else {
            let printer = self.printer(TableMode::Endpoint)?;

            let mut baseline = HttpStats::new(true, false);
            baseline.load(File::open(from)?)?;
            baseline.seal();

            let mut current = HttpStats::new(true, false);
            match to {
                Some(path) => {
                    current.load(File::open(path)?)?;
                    current.seal();
                }
                None => current = self.ingest()?.0,
            }

            current.sort(&self.options.sort);
            current.trim(&self.options.limit);
            printer.print_endpoints(out, &current, Some(&baseline))?;
        }
        Ok(())
    }

    /// The streaming ingest loop. Returns both aggregators sealed; the
    /// scenario aggregator is finalized when trace mode is on.
    fn ingest(&self) -> AppResult<(HttpStats, TraceStats)> {
        let filter = Filter::compile(&self.options.filter)?;

        let mut http_stats = HttpStats::new(true, false);
        http_stats.set_matching_groups(&self.options.matching_groups)?;
        let mut trace_stats = TraceStats::new(true, false, false);
        trace_stats.set_matching_groups(&self.options.matching_groups)?;

        let reader = self.open_input()?;
        let mut parser = JsonParser::new(
            reader,
            self.options.keys.clone(),
            self.options.strict,
            self.options.query_policy,
            self.options.trace,
        );

        if let Some(path) = self.options.pos_file.as_deref() {
            let offset = pos::read_pos(path);
            if offset > 0 {
                parser.seek(offset)?;
                parser.set_read_bytes(offset);
                info!(offset, "resuming from position file");
            }
        }

        let mut skipped: u64 = 0;
        loop {
            let record = match parser.parse() {
                Ok(record) => record,
                Err(ParseError::Eof) => break,
                Err(ParseError::SkipLine) => {
                    skipped += 1;
                    debug!(offset = parser.read_bytes(), "skipped line");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            if !filter.accepts(&record) {
                continue;
            }

            http_stats.observe(&record);

            if self.options.trace {
                trace_stats.append(
                    &record.trace_id,
                    RequestDetail {
                        key: EndpointKey {
                            method: record.method.clone(),
                            uri: record.uri.clone(),
                            status: record.status,
                        },
                        response_time: record.response_time,
                        request_body_bytes: 0.0,
                        response_body_bytes: record.body_bytes,
                        pos: parser.read_bytes(),
                    },
                );
            }
        }

        if self.options.trace {
            trace_stats.aggregate();
        }
        http_stats.seal();
        trace_stats.seal();

        if self.options.save_pos {
            if let Some(path) = self.options.pos_file.as_deref() {
                pos::write_pos(path, parser.read_bytes())?;
            }
        }

        info!(
            endpoints = http_stats.len(),
            scenarios = trace_stats.len(),
            skipped,
            read_bytes = parser.read_bytes(),
            "ingest complete"
        );

        Ok((http_stats, trace_stats))
    }
}

fn dump_file(path: &Path) -> AppResult<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}
