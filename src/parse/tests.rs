use super::*;
use crate::canon::QueryPolicy;
use crate::error::ParseError;

use std::io::Cursor;

fn parser(input: &str) -> JsonParser<Cursor<Vec<u8>>> {
    JsonParser::new(
        Cursor::new(input.as_bytes().to_vec()),
        FieldKeys::default(),
        false,
        QueryPolicy::Strip,
        false,
    )
}

const LINE_A: &str =
    r#"{"method":"GET","uri":"/a","status":200,"response_time":0.10,"body_bytes":100,"trace_id":"t1","time":"2026-01-01T00:00:00Z"}"#;

#[test]
fn parses_one_record_per_line() {
    let input = format!("{LINE_A}\n");
    let mut parser = parser(&input);

    let record = parser.parse().unwrap();
    assert_eq!(record.method, "GET");
    assert_eq!(record.uri, "/a");
    assert_eq!(record.status, 200);
    assert!((record.response_time - 0.10).abs() < 1e-9);
    assert!((record.body_bytes - 100.0).abs() < 1e-9);
    assert_eq!(record.trace_id, "t1");
    assert_eq!(record.time, "2026-01-01T00:00:00Z");

    assert!(matches!(parser.parse(), Err(ParseError::Eof)));
}

#[test]
fn read_bytes_counts_terminators_and_skipped_lines() {
    let input = format!("{LINE_A}\n\n{LINE_A}\n");
    let mut parser = parser(&input);

    parser.parse().unwrap();
    assert_eq!(parser.read_bytes(), LINE_A.len() as u64 + 1);

    assert!(matches!(parser.parse(), Err(ParseError::SkipLine)));
    assert_eq!(parser.read_bytes(), LINE_A.len() as u64 + 2);

    parser.parse().unwrap();
    assert_eq!(parser.read_bytes(), input.len() as u64);
}

#[test]
fn final_line_without_newline_still_parses() {
    let mut parser = parser(LINE_A);
    let record = parser.parse().unwrap();
    assert_eq!(record.uri, "/a");
    assert_eq!(parser.read_bytes(), LINE_A.len() as u64);
    assert!(matches!(parser.parse(), Err(ParseError::Eof)));
}

#[test]
fn crlf_terminators_are_trimmed_but_counted() {
    let input = format!("{LINE_A}\r\n");
    let mut parser = parser(&input);
    parser.parse().unwrap();
    assert_eq!(parser.read_bytes(), input.len() as u64);
}

#[test]
fn malformed_json_is_a_skip() {
    let mut parser = parser("not json\n");
    assert!(matches!(parser.parse(), Err(ParseError::SkipLine)));
}

#[test]
fn malformed_json_is_fatal_in_strict_mode() {
    let mut parser = JsonParser::new(
        Cursor::new(b"not json\n".to_vec()),
        FieldKeys::default(),
        true,
        QueryPolicy::Strip,
        false,
    );
    assert!(matches!(
        parser.parse(),
        Err(ParseError::InvalidLine { .. })
    ));
}

#[test]
fn missing_uri_is_a_skip() {
    let mut parser = parser(r#"{"method":"GET","status":200,"response_time":0.1,"body_bytes":1}"#);
    assert!(matches!(parser.parse(), Err(ParseError::SkipLine)));
}

#[test]
fn out_of_range_status_is_a_skip() {
    for status in ["0", "99", "600"] {
        let line = format!(
            r#"{{"uri":"/a","method":"GET","status":{status},"response_time":0.1,"body_bytes":1}}"#
        );
        let mut parser = parser(&line);
        assert!(
            matches!(parser.parse(), Err(ParseError::SkipLine)),
            "status {status} should skip"
        );
    }
}

#[test]
fn response_time_falls_back_to_request_time() {
    let mut parser =
        parser(r#"{"uri":"/a","method":"GET","status":200,"request_time":0.42,"body_bytes":1}"#);
    let record = parser.parse().unwrap();
    assert!((record.response_time - 0.42).abs() < 1e-9);
}

#[test]
fn missing_trace_id_skips_only_when_required() {
    let line = r#"{"uri":"/a","method":"GET","status":200,"response_time":0.1,"body_bytes":1}"#;

    let mut lenient = parser(line);
    assert!(lenient.parse().is_ok());

    let mut requiring = JsonParser::new(
        Cursor::new(line.as_bytes().to_vec()),
        FieldKeys::default(),
        false,
        QueryPolicy::Strip,
        true,
    );
    assert!(matches!(requiring.parse(), Err(ParseError::SkipLine)));
}

#[test]
fn query_policy_is_applied_before_the_record_is_returned() {
    let line = r#"{"uri":"/p?y=2&x=1","method":"GET","status":200,"response_time":0.1,"body_bytes":1}"#;
    let mut parser = JsonParser::new(
        Cursor::new(line.as_bytes().to_vec()),
        FieldKeys::default(),
        false,
        QueryPolicy::ObscureValues,
        false,
    );
    let record = parser.parse().unwrap();
    assert_eq!(record.uri, "/p?x=xxx&y=xxx");
}

#[test]
fn numeric_fields_accept_string_values() {
    let line = r#"{"uri":"/a","method":"GET","status":"200","response_time":"0.5","body_bytes":"9"}"#;
    let mut parser = parser(line);
    let record = parser.parse().unwrap();
    assert_eq!(record.status, 200);
    assert!((record.response_time - 0.5).abs() < 1e-9);
    assert!((record.body_bytes - 9.0).abs() < 1e-9);
}

#[test]
fn entries_preserve_all_fields_stringified() {
    let line = r#"{"uri":"/a","method":"GET","status":200,"response_time":0.1,"body_bytes":1,"host":"api-1","cached":true}"#;
    let mut parser = parser(line);
    let record = parser.parse().unwrap();
    assert_eq!(record.entries.get("host").map(String::as_str), Some("api-1"));
    assert_eq!(record.entries.get("cached").map(String::as_str), Some("true"));
    assert_eq!(record.entries.get("status").map(String::as_str), Some("200"));
}

#[test]
fn custom_field_keys_remap_the_record() {
    let keys = FieldKeys {
        uri: "path".to_owned(),
        status: "code".to_owned(),
        ..FieldKeys::default()
    };
    let line = r#"{"path":"/x","method":"GET","code":204,"response_time":0.1,"body_bytes":0}"#;
    let mut parser = JsonParser::new(
        Cursor::new(line.as_bytes().to_vec()),
        keys,
        false,
        QueryPolicy::Strip,
        false,
    );
    let record = parser.parse().unwrap();
    assert_eq!(record.uri, "/x");
    assert_eq!(record.status, 204);
}

#[test]
fn seek_discards_exactly_n_bytes() {
    let input = format!("{LINE_A}\n{LINE_A}\n");
    let mut parser = parser(&input);
    let offset = LINE_A.len() as u64 + 1;

    parser.seek(offset).unwrap();
    parser.set_read_bytes(offset);

    parser.parse().unwrap();
    assert_eq!(parser.read_bytes(), input.len() as u64);
    assert!(matches!(parser.parse(), Err(ParseError::Eof)));
}

#[test]
fn seek_past_the_end_is_an_error() {
    let mut parser = parser("short\n");
    assert!(parser.seek(1000).is_err());
}
