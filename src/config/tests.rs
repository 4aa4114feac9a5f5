use super::*;
use crate::args::{CommonArgs, OutputFormat, Percentiles};
use crate::stats::{Limit, SortKey};

use std::fs;

use tempfile::TempDir;

fn resolve_with_file(args: &CommonArgs, toml_text: &str) -> crate::error::AppResult<Options> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("traceprof.toml");
    fs::write(&path, toml_text).unwrap();
    let mut args = args.clone();
    args.config = Some(path);
    Options::resolve(&args, false)
}

#[test]
fn defaults_without_cli_or_file() {
    let options = Options::resolve(&CommonArgs::default(), false).unwrap();
    assert_eq!(options.format, OutputFormat::Table);
    assert_eq!(options.output, "all");
    assert_eq!(options.percentiles, vec![90, 95, 99]);
    assert_eq!(options.limit, Limit::Top(5000));
    assert_eq!(options.sort.key, SortKey::Count);
    assert!(options.save_pos);
    assert!(!options.trace);
    assert_eq!(options.print.pagination_limit, 100);
    assert_eq!(options.keys.uri, "uri");
}

#[test]
fn file_values_apply_when_cli_is_silent() {
    let options = resolve_with_file(
        &CommonArgs::default(),
        r#"
format = "tsv"
output = "count,uri"
percentiles = [50, 99]
sort = "max"
reverse = true
limit = "10"
query_string = true
show_footers = true
page = 25

[filter]
methods = ["GET"]
statuses = ["200-299"]

[fields]
uri = "path"
"#,
    )
    .unwrap();

    assert_eq!(options.format, OutputFormat::Tsv);
    assert_eq!(options.output, "count,uri");
    assert_eq!(options.percentiles, vec![50, 99]);
    assert_eq!(options.sort.key, SortKey::MaxResponseTime);
    assert!(options.sort.reverse);
    assert_eq!(options.limit, Limit::Top(10));
    assert_eq!(options.query_policy, crate::canon::QueryPolicy::Keep);
    assert!(options.print.show_footers);
    assert_eq!(options.print.pagination_limit, 25);
    assert_eq!(options.filter.methods, vec!["GET".to_owned()]);
    assert_eq!(options.filter.statuses, vec!["200-299".to_owned()]);
    assert_eq!(options.keys.uri, "path");
    assert_eq!(options.keys.method, "method");
}

#[test]
fn cli_flags_win_over_the_file() {
    let args = CommonArgs {
        format: Some(OutputFormat::Csv),
        output: Some("count".to_owned()),
        percentiles: Some(Percentiles(vec![75])),
        ..CommonArgs::default()
    };
    let options = resolve_with_file(
        &args,
        r#"
format = "html"
output = "all"
percentiles = [50]
"#,
    )
    .unwrap();

    assert_eq!(options.format, OutputFormat::Csv);
    assert_eq!(options.output, "count");
    assert_eq!(options.percentiles, vec![75]);
}

#[test]
fn unknown_file_keys_are_rejected() {
    let err = resolve_with_file(&CommonArgs::default(), "no_such_option = true\n");
    assert!(err.is_err());
}

#[test]
fn file_percentiles_above_100_are_rejected() {
    let err = resolve_with_file(&CommonArgs::default(), "percentiles = [101]\n");
    assert!(err.is_err());
}

#[test]
fn bad_sort_and_limit_are_config_errors() {
    let args = CommonArgs {
        sort: Some("bogus".to_owned()),
        ..CommonArgs::default()
    };
    assert!(Options::resolve(&args, false).is_err());

    let args = CommonArgs {
        limit: Some("-3".to_owned()),
        ..CommonArgs::default()
    };
    assert!(Options::resolve(&args, false).is_err());
}

#[test]
fn load_is_rejected_in_trace_mode() {
    let args = CommonArgs {
        load: Some("stats.json".into()),
        ..CommonArgs::default()
    };
    assert!(Options::resolve(&args, true).is_err());
    assert!(Options::resolve(&args, false).is_ok());
}

#[test]
fn missing_config_file_is_an_error() {
    let args = CommonArgs {
        config: Some("/no/such/traceprof.toml".into()),
        ..CommonArgs::default()
    };
    assert!(Options::resolve(&args, false).is_err());
}
