use std::collections::BTreeMap;
use std::io::{self, BufRead, Read};

use serde_json::Value;

use crate::canon::{self, QueryPolicy};
use crate::error::ParseError;

use super::{read_line, FieldKeys, ParsedRecord, Parser};

/// Parser for one-JSON-object-per-line logs with a configurable field-name
/// mapping. Structural failures are skips, or fatal in strict mode.
#[derive(Debug)]
pub struct JsonParser<R> {
    reader: R,
    keys: FieldKeys,
    strict: bool,
    query_policy: QueryPolicy,
    require_trace_id: bool,
    read_bytes: u64,
}

impl<R: BufRead> JsonParser<R> {
    #[must_use]
    pub fn new(
        reader: R,
        keys: FieldKeys,
        strict: bool,
        query_policy: QueryPolicy,
        require_trace_id: bool,
    ) -> Self {
        Self {
            reader,
            keys,
            strict,
            query_policy,
            require_trace_id,
            read_bytes: 0,
        }
    }

    fn to_record(&self, object: &serde_json::Map<String, Value>) -> Result<ParsedRecord, ParseError> {
        let skip = |reason: &str| ParseError::skip_unless_strict(self.strict, reason);

        let raw_uri = stringify(object.get(self.keys.uri.as_str()));
        let uri = canon::canonicalize(&raw_uri, self.query_policy)
            .ok_or_else(|| skip("missing or unparseable uri"))?;

        let response_time = parse_f64(object, &self.keys.response_time)
            .or_else(|| parse_f64(object, &self.keys.request_time))
            .ok_or_else(|| skip("missing response time"))?;
        if !response_time.is_finite() {
            return Err(skip("non-finite response time"));
        }

        let body_bytes =
            parse_f64(object, &self.keys.body_bytes).ok_or_else(|| skip("missing body bytes"))?;
        if !body_bytes.is_finite() {
            return Err(skip("non-finite body bytes"));
        }

        let status = stringify(object.get(self.keys.status.as_str()))
            .parse::<u16>()
            .ok()
            .filter(|status| (100..=599).contains(status))
            .ok_or_else(|| skip("missing or out-of-range status"))?;

        let trace_id = stringify(object.get(self.keys.trace_id.as_str()));
        if self.require_trace_id && trace_id.is_empty() {
            return Err(skip("missing trace id"));
        }

        let entries: BTreeMap<String, String> = object
            .iter()
            .map(|(key, value)| (key.clone(), stringify(Some(value))))
            .collect();

        Ok(ParsedRecord {
            uri,
            method: stringify(object.get(self.keys.method.as_str())),
            time: stringify(object.get(self.keys.time.as_str())),
            response_time,
            body_bytes,
            status,
            trace_id,
            entries,
        })
    }
}

impl<R: BufRead> Parser for JsonParser<R> {
    fn parse(&mut self) -> Result<ParsedRecord, ParseError> {
        let (line, consumed) = read_line(&mut self.reader)?;
        self.read_bytes += consumed;

        if line.is_empty() {
            return Err(ParseError::SkipLine);
        }

        let value: Value = serde_json::from_slice(&line)
            .map_err(|err| ParseError::skip_unless_strict(self.strict, err.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| ParseError::skip_unless_strict(self.strict, "line is not an object"))?;

        self.to_record(object)
    }

    fn read_bytes(&self) -> u64 {
        self.read_bytes
    }

    fn set_read_bytes(&mut self, n: u64) {
        self.read_bytes = n;
    }

    fn seek(&mut self, n: u64) -> Result<(), ParseError> {
        let discarded = io::copy(&mut self.reader.by_ref().take(n), &mut io::sink())?;
        if discarded < n {
            return Err(ParseError::Io {
                source: io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("cannot seek to offset {} (input has {} bytes)", n, discarded),
                ),
            });
        }
        Ok(())
    }
}

/// Stringify a JSON value the way the pass-through entries expect: strings
/// verbatim, scalars via their display form, null as empty.
fn stringify(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn parse_f64(object: &serde_json::Map<String, Value>, key: &str) -> Option<f64> {
    match object.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}
