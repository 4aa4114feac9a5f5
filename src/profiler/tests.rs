use super::*;
use crate::args::OutputFormat;
use crate::canon::QueryPolicy;
use crate::config::Options;
use crate::filter::FilterConfig;
use crate::parse::FieldKeys;
use crate::printer::PrintOptions;
use crate::stats::{Limit, SortOptions};

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

fn base_options(file: Option<PathBuf>) -> Options {
    Options {
        file,
        format: OutputFormat::Tsv,
        output: "count,method,uri,status,min,max,sum,avg".to_owned(),
        percentiles: vec![90, 95, 99],
        sort: SortOptions::default(),
        limit: Limit::default(),
        matching_groups: Vec::new(),
        query_policy: QueryPolicy::Strip,
        pos_file: None,
        save_pos: true,
        load: None,
        dump: None,
        print: PrintOptions::default(),
        filter: FilterConfig::default(),
        strict: false,
        trace: false,
        keys: FieldKeys::default(),
    }
}

fn line(method: &str, uri: &str, status: u16, restime: f64, bytes: u64, trace: &str) -> String {
    format!(
        r#"{{"method":"{method}","uri":"{uri}","status":{status},"response_time":{restime},"body_bytes":{bytes},"trace_id":"{trace}"}}"#
    )
}

fn run_to_string(options: &Options) -> String {
    let mut out = Vec::new();
    Profiler::new(options).run(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn endpoint_aggregation_over_two_records() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("access.log");
    fs::write(
        &log,
        format!(
            "{}\n{}\n",
            line("GET", "/a", 200, 0.10, 100, "t1"),
            line("GET", "/a", 200, 0.30, 200, "t2"),
        ),
    )
    .unwrap();

    let options = base_options(Some(log));
    let text = run_to_string(&options);
    let mut lines = text.lines();
    lines.next(); // header
    assert_eq!(
        lines.next(),
        Some("2\tGET\t/a\t200\t0.100\t0.300\t0.400\t0.200")
    );
}

#[test]
fn query_string_obscuring_groups_endpoints() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("access.log");
    fs::write(
        &log,
        format!(
            "{}\n{}\n",
            line("GET", "/p?x=1&y=2", 200, 0.1, 1, "t1"),
            line("GET", "/p?x=9&y=9", 200, 0.1, 1, "t2"),
        ),
    )
    .unwrap();

    let mut options = base_options(Some(log));
    options.query_policy = QueryPolicy::ObscureValues;
    options.output = "count,uri".to_owned();
    let text = run_to_string(&options);
    assert!(text.contains("2\t/p?x=xxx&y=xxx"), "got: {text}");
}

#[test]
fn matching_groups_rewrite_to_the_pattern_text() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("access.log");
    fs::write(
        &log,
        format!(
            "{}\n{}\n",
            line("GET", "/users/42", 200, 0.1, 1, "t1"),
            line("GET", "/users/43", 200, 0.1, 1, "t2"),
        ),
    )
    .unwrap();

    let mut options = base_options(Some(log));
    options.matching_groups = vec![r"^/users/\d+$".to_owned()];
    options.output = "count,uri".to_owned();
    let text = run_to_string(&options);
    assert!(text.contains(&format!("2\t{}", r"^/users/\d+$")), "got: {text}");
}

#[test]
fn trace_mode_groups_ordered_scenarios() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("access.log");
    fs::write(
        &log,
        [
            line("GET", "/a", 200, 0.1, 10, "t1"),
            line("POST", "/b", 201, 0.2, 20, "t1"),
            line("GET", "/a", 200, 0.1, 10, "t2"),
            line("POST", "/b", 201, 0.2, 20, "t2"),
            line("POST", "/b", 201, 0.2, 20, "t3"),
            line("GET", "/a", 200, 0.1, 10, "t3"),
        ]
        .join("\n"),
    )
    .unwrap();

    let mut options = base_options(Some(log));
    options.trace = true;
    options.output = "count,uri_method_status".to_owned();
    let text = run_to_string(&options);

    assert!(
        text.contains("2\tGET /a 200<br>POST /b 201"),
        "got: {text}"
    );
    assert!(
        text.contains("1\tPOST /b 201<br>GET /a 200"),
        "got: {text}"
    );
}

/// Count column of the row whose URI cell matches, from TSV output.
fn count_for(text: &str, uri: &str) -> u64 {
    text.lines()
        .filter_map(|row| {
            let mut cells = row.split('\t');
            let count = cells.next()?;
            cells.find(|cell| *cell == uri)?;
            count.parse().ok()
        })
        .next()
        .unwrap_or(0)
}

#[test]
fn resumed_run_complements_the_first_pass_exactly() {
    let all_lines = [
        line("GET", "/a", 200, 0.10, 100, "t1"),
        line("GET", "/a", 200, 0.30, 200, "t2"),
        line("POST", "/b", 201, 0.20, 50, "t3"),
        line("GET", "/a", 200, 0.20, 150, "t4"),
    ];
    let prefix = format!("{}\n{}\n", all_lines[0], all_lines[1]);
    let full = format!("{}\n", all_lines.join("\n"));

    let dir = TempDir::new().unwrap();

    // Reference: one pass over the full input.
    let reference_log = dir.path().join("full.log");
    fs::write(&reference_log, &full).unwrap();
    let reference = run_to_string(&base_options(Some(reference_log)));

    // Resumable: first the prefix, then the grown file with the stored
    // offset.
    let log = dir.path().join("grow.log");
    let pos = dir.path().join("grow.pos");
    fs::write(&log, &prefix).unwrap();

    let mut options = base_options(Some(log.clone()));
    options.pos_file = Some(pos.clone());
    let first = run_to_string(&options);
    assert_eq!(
        fs::read_to_string(&pos).unwrap().trim(),
        prefix.len().to_string()
    );

    fs::write(&log, &full).unwrap();
    let resumed = run_to_string(&options);

    // No record is double-counted or lost: the two passes partition the
    // single-pass totals, and the offset now covers the whole file.
    assert_eq!(
        count_for(&reference, "/a"),
        count_for(&first, "/a") + count_for(&resumed, "/a")
    );
    assert_eq!(
        count_for(&reference, "/b"),
        count_for(&first, "/b") + count_for(&resumed, "/b")
    );
    assert_eq!(count_for(&resumed, "/a"), 1);
    assert_eq!(count_for(&resumed, "/b"), 1);
    assert_eq!(
        fs::read_to_string(&pos).unwrap().trim(),
        full.len().to_string()
    );
}

#[test]
fn dump_then_load_prints_the_same_rows() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("access.log");
    fs::write(
        &log,
        format!(
            "{}\n{}\n",
            line("GET", "/a", 200, 0.10, 100, "t1"),
            line("POST", "/b", 201, 0.20, 50, "t2"),
        ),
    )
    .unwrap();
    let dump = dir.path().join("stats.json");

    let mut options = base_options(Some(log));
    options.dump = Some(dump.clone());
    let from_ingest = run_to_string(&options);

    let mut load_options = base_options(None);
    load_options.load = Some(dump);
    let from_load = run_to_string(&load_options);

    assert_eq!(from_ingest, from_load);
}

#[test]
fn diff_against_a_baseline_dump() {
    let dir = TempDir::new().unwrap();

    let baseline_log = dir.path().join("before.log");
    fs::write(
        &baseline_log,
        format!("{}\n", line("GET", "/a", 200, 0.10, 100, "t1")),
    )
    .unwrap();
    let baseline_dump = dir.path().join("before.json");
    let mut options = base_options(Some(baseline_log));
    options.dump = Some(baseline_dump.clone());
    run_to_string(&options);

    let current_log = dir.path().join("after.log");
    fs::write(
        &current_log,
        format!(
            "{}\n{}\n",
            line("GET", "/a", 200, 0.10, 100, "t2"),
            line("GET", "/a", 200, 0.30, 100, "t3"),
        ),
    )
    .unwrap();

    let mut diff_options = base_options(Some(current_log));
    diff_options.output = "count,uri,max".to_owned();
    let mut out = Vec::new();
    Profiler::new(&diff_options)
        .run_diff(&mut out, &baseline_dump, None)
        .unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("2 (+1)"), "got: {text}");
    assert!(text.contains("0.300 (+0.200)"), "got: {text}");
}

#[test]
fn rejected_records_touch_no_accumulator() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("access.log");
    fs::write(
        &log,
        format!(
            "{}\n{}\n",
            line("GET", "/api/users", 200, 0.1, 1, "t1"),
            line("GET", "/static/app.js", 200, 0.1, 1, "t2"),
        ),
    )
    .unwrap();

    let mut options = base_options(Some(log));
    options.filter.include_uri = Some("^/api/".to_owned());
    options.output = "count,uri".to_owned();
    let text = run_to_string(&options);

    assert!(text.contains("1\t/api/users"), "got: {text}");
    assert!(!text.contains("/static/app.js"), "got: {text}");
}

#[test]
fn strict_mode_turns_bad_lines_fatal() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("access.log");
    fs::write(&log, "not json\n").unwrap();

    let mut options = base_options(Some(log.clone()));
    let mut out = Vec::new();
    assert!(Profiler::new(&options).run(&mut out).is_ok());

    options.strict = true;
    let mut out = Vec::new();
    assert!(Profiler::new(&options).run(&mut out).is_err());
}

#[test]
fn missing_pos_file_means_offset_zero() {
    let dir = TempDir::new().unwrap();
    assert_eq!(pos::read_pos(&dir.path().join("absent.pos")), 0);

    let empty = dir.path().join("empty.pos");
    fs::write(&empty, "").unwrap();
    assert_eq!(pos::read_pos(&empty), 0);

    let garbage = dir.path().join("garbage.pos");
    fs::write(&garbage, "not a number\n").unwrap();
    assert_eq!(pos::read_pos(&garbage), 0);
}

#[test]
fn write_pos_truncates_leftover_tail() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("file.pos");
    fs::write(&path, "123456789012\n").unwrap();
    pos::write_pos(&path, 42).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "42\n");
}
