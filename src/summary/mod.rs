//! Compact per-unit-of-work summary records.
//!
//! # Responsibilities
//! - Open a summary window when a unit of work starts (a request, or one
//!   downstream call)
//! - Close it exactly once with the outcome, deriving the elapsed time
//!   locally and truncating free-text fields
//! - Emit through the shared sink, optionally on a detached task so the
//!   request path never waits on summary I/O
//!
//! # Design Decisions
//! - `elapsed_ms` is always `out_time - in_time` measured here; callers
//!   cannot supply it
//! - A handle is consumed by `finish`, so double emission cannot compile
//! - Ordering across different requests' summaries is unspecified

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TelemetryConfig;
use crate::sink::LogSink;

/// Free-text fields are cut to this many characters before emission.
pub const TEXT_LIMIT: usize = 2000;

/// The emitted summary artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub hostname: String,
    pub app_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    /// What was called: a URL, a topic, a peer service name.
    pub target_id: String,
    pub invoke: String,
    pub in_time: String,
    pub out_time: String,
    pub elapsed_ms: u64,
    pub input: String,
    pub output: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
}

/// An open summary window. Created by [`SummaryAggregator::begin`] and
/// consumed exactly once by `finish`.
#[must_use = "an unfinished summary emits nothing"]
#[derive(Debug)]
pub struct SummaryHandle {
    target_id: String,
    invoke: String,
    in_wall: DateTime<Utc>,
    in_instant: Instant,
}

/// Builds and emits one summary record per unit of work.
#[derive(Debug, Clone)]
pub struct SummaryAggregator {
    sink: Arc<LogSink>,
    hostname: String,
    app_name: String,
    instance_id: Option<String>,
}

impl SummaryAggregator {
    pub fn new(config: &TelemetryConfig, sink: Arc<LogSink>) -> Self {
        Self {
            sink,
            hostname: config.hostname(),
            app_name: config.app_name.clone(),
            instance_id: config.instance(),
        }
    }

    /// Open the window for one unit of work, capturing its start time and
    /// identity.
    pub fn begin(&self, target: &str, invoke: &str) -> SummaryHandle {
        SummaryHandle {
            target_id: target.to_string(),
            invoke: invoke.to_string(),
            in_wall: Utc::now(),
            in_instant: Instant::now(),
        }
    }

    /// Close the window and emit the record. Failures are diagnostics only;
    /// the caller is never failed by summary emission.
    pub fn finish(
        &self,
        handle: SummaryHandle,
        status_code: u16,
        input: String,
        output: String,
        result_code: Option<String>,
    ) {
        let record = self.build_record(handle, status_code, input, output, result_code);
        match serde_json::to_string(&record) {
            Ok(line) => self.sink.write_line(&line),
            Err(e) => {
                tracing::error!(error = %e, invoke = %record.invoke,
                    "failed to serialize summary record, artifact dropped");
            }
        }
    }

    /// Like [`finish`](SummaryAggregator::finish) but emitted on a detached
    /// task, off the request's critical path. Must be called from within a
    /// Tokio runtime.
    pub fn finish_detached(
        &self,
        handle: SummaryHandle,
        status_code: u16,
        input: String,
        output: String,
        result_code: Option<String>,
    ) {
        let aggregator = self.clone();
        tokio::spawn(async move {
            aggregator.finish(handle, status_code, input, output, result_code);
        });
    }

    fn build_record(
        &self,
        handle: SummaryHandle,
        status_code: u16,
        input: String,
        output: String,
        result_code: Option<String>,
    ) -> SummaryRecord {
        let out_wall = Utc::now();
        SummaryRecord {
            hostname: self.hostname.clone(),
            app_name: self.app_name.clone(),
            instance_id: self.instance_id.clone(),
            target_id: handle.target_id,
            invoke: handle.invoke,
            in_time: format_timestamp(handle.in_wall),
            out_time: format_timestamp(out_wall),
            elapsed_ms: handle.in_instant.elapsed().as_millis() as u64,
            input: truncate_chars(input, TEXT_LIMIT),
            output: truncate_chars(output, TEXT_LIMIT),
            status_code,
            result_code,
        }
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Cut `s` to at most `max` characters, on a character boundary.
fn truncate_chars(mut s: String, max: usize) -> String {
    let cut = s.char_indices().nth(max).map(|(idx, _)| idx);
    if let Some(idx) = cut {
        s.truncate(idx);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_aggregator() -> SummaryAggregator {
        let mut config = TelemetryConfig::default();
        config.app_name = "summary-test".to_string();
        config.host = Some("test-host".to_string());
        config.log_to_console = false;
        config.log_to_file = false;
        let sink = LogSink::new(&config);
        SummaryAggregator::new(&config, sink)
    }

    #[test]
    fn test_truncation_is_exact() {
        assert_eq!(truncate_chars("a".repeat(2001), TEXT_LIMIT).len(), 2000);
        assert_eq!(truncate_chars("a".repeat(2000), TEXT_LIMIT).len(), 2000);
        assert_eq!(truncate_chars("a".repeat(1999), TEXT_LIMIT).len(), 1999);
        assert_eq!(truncate_chars(String::new(), TEXT_LIMIT), "");
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let s = "é".repeat(2500);
        let cut = truncate_chars(s, TEXT_LIMIT);
        assert_eq!(cut.chars().count(), 2000);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_elapsed_is_derived_locally() {
        let aggregator = quiet_aggregator();
        let handle = aggregator.begin("http://peer/api", "i1");
        std::thread::sleep(std::time::Duration::from_millis(20));
        let record =
            aggregator.build_record(handle, 200, "in".to_string(), "out".to_string(), None);

        assert!(record.elapsed_ms >= 15, "elapsed was {} ms", record.elapsed_ms);
        assert!(record.in_time <= record.out_time);
    }

    #[test]
    fn test_record_field_names() {
        let aggregator = quiet_aggregator();
        let handle = aggregator.begin("kafka://client", "i9");
        let record = aggregator.build_record(
            handle,
            201,
            "{}".to_string(),
            "{}".to_string(),
            Some("20100".to_string()),
        );

        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "hostname",
            "appName",
            "targetId",
            "invoke",
            "inTime",
            "outTime",
            "elapsedMs",
            "input",
            "output",
            "statusCode",
            "resultCode",
        ] {
            assert!(object.contains_key(key), "missing field {key}");
        }
        assert_eq!(object["statusCode"], serde_json::json!(201));
    }

    #[test]
    fn test_absent_result_code_is_omitted() {
        let aggregator = quiet_aggregator();
        let handle = aggregator.begin("t", "i");
        let record = aggregator.build_record(handle, 200, String::new(), String::new(), None);
        let value = serde_json::to_value(&record).unwrap();
        assert!(!value.as_object().unwrap().contains_key("resultCode"));
    }
}
