//! Per-request event recorder (the detail trace).
//!
//! # Data Flow
//! ```text
//! ingress ──→ Trace::new (identity fields, ambient protocol)
//! handler ──→ record_outbound_request / record_inbound_response   → input
//!         ──→ record_inbound_request_mirror / record_outbound_response → output
//! completion → finalize() → serialize → LogSink → reset (reusable)
//! ```
//!
//! # Design Decisions
//! - The trace is exclusively owned by the request's execution unit; its
//!   sequences and timer table need no locking
//! - Pairing rule: `record_inbound_request_mirror` arms the timer for an
//!   invoke, `record_inbound_response` resolves it; the two request/response
//!   recorders on the outbound side never touch timers
//! - `finalize()` on an empty trace is a reported error, scoped to that
//!   call; serialization and sink failures stay on the diagnostic channel
//!   and never reach the request path

pub mod event;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::TelemetryConfig;
use crate::context::InvocationContext;
use crate::correlate::PendingTimers;
use crate::sink::LogSink;
pub use event::{Event, EventKind};

/// Error type for trace lifecycle misuse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraceError {
    #[error("finalize called with no recorded events")]
    EmptyTrace,
}

/// The serialized shape of one finalized trace.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TraceRecord {
    host: String,
    app_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance_id: Option<String>,
    session_id: String,
    init_invoke: String,
    scenario: String,
    identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_timestamp: Option<String>,
    input: Vec<Event>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_timestamp: Option<String>,
    output: Vec<Event>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    processing_time: Option<u64>,
}

/// Ordered event record for one request, flushed through the [`LogSink`].
///
/// The same instance may be finalized more than once within a request's
/// lifetime; each `finalize()` clears the sequences and timestamps while
/// identity fields survive for the next cycle.
pub struct Trace {
    record: TraceRecord,
    sink: Arc<LogSink>,
    raw_capture: bool,
    log_to_console: bool,
    log_to_file: bool,
    ambient_protocol: Option<String>,
    timers: PendingTimers,
    created: Option<(DateTime<Utc>, Instant)>,
    input_time: Option<DateTime<Utc>>,
    output_time: Option<DateTime<Utc>>,
}

impl Trace {
    /// Create the trace for one inbound request. Session comes from the
    /// invocation context; `init_invoke`, `scenario` and `identity` describe
    /// the unit of work being traced.
    pub fn new(
        config: &TelemetryConfig,
        sink: Arc<LogSink>,
        ctx: &InvocationContext,
        init_invoke: impl Into<String>,
        scenario: impl Into<String>,
        identity: impl Into<String>,
    ) -> Self {
        Self {
            record: TraceRecord {
                host: config.hostname(),
                app_name: config.app_name.clone(),
                instance_id: config.instance(),
                session_id: ctx.session().to_string(),
                init_invoke: init_invoke.into(),
                scenario: scenario.into(),
                identity: identity.into(),
                input_timestamp: None,
                input: Vec::new(),
                output_timestamp: None,
                output: Vec::new(),
                created_at: None,
                processing_time: None,
            },
            sink,
            raw_capture: config.raw_data_capture,
            log_to_console: config.log_to_console,
            log_to_file: config.log_to_file,
            ambient_protocol: None,
            timers: PendingTimers::new(),
            created: Some((Utc::now(), Instant::now())),
            input_time: None,
            output_time: None,
        }
    }

    /// Stamp the protocol/method of the inbound request (e.g. `"http"`,
    /// `"post"`); outbound-request events carry it as context.
    pub fn with_ambient_protocol(mut self, protocol: &str, method: &str) -> Self {
        self.ambient_protocol = event::protocol_value(protocol, method);
        self
    }

    /// Record a request sent to another node. Appends to the input
    /// sequence with the ambient protocol of the inbound request.
    pub fn record_outbound_request(
        &mut self,
        node: &str,
        cmd: &str,
        invoke: &str,
        raw_payload: Option<Value>,
        payload: Value,
    ) {
        let protocol = self.ambient_protocol.clone();
        self.push_input(Event {
            invoke: invoke.to_string(),
            event_name: event::event_name(node, cmd),
            protocol,
            kind: EventKind::OutboundRequest,
            raw_payload: self.gate_raw(raw_payload),
            payload,
            elapsed_ms: None,
        });
    }

    /// Record a response received from another node. Resolves the pending
    /// timer for `invoke` when one is armed and attaches the elapsed time.
    pub fn record_inbound_response(
        &mut self,
        node: &str,
        cmd: &str,
        invoke: &str,
        raw_payload: Option<Value>,
        payload: Value,
        protocol: &str,
        method: &str,
    ) {
        let elapsed_ms = self.timers.resolve(invoke, Instant::now());
        self.push_input(Event {
            invoke: invoke.to_string(),
            event_name: event::event_name(node, cmd),
            protocol: event::protocol_value(protocol, method),
            kind: EventKind::InboundResponse,
            raw_payload: self.gate_raw(raw_payload),
            payload,
            elapsed_ms,
        });
    }

    /// Mirror the inbound request on the output side and arm the pending
    /// timer for `invoke`; a later [`record_inbound_response`] with the
    /// same invoke resolves it.
    ///
    /// [`record_inbound_response`]: Trace::record_inbound_response
    pub fn record_inbound_request_mirror(
        &mut self,
        node: &str,
        cmd: &str,
        invoke: &str,
        raw_payload: Option<Value>,
        payload: Value,
    ) {
        self.timers.arm(invoke, Instant::now());
        self.push_output(Event {
            invoke: invoke.to_string(),
            event_name: event::event_name(node, cmd),
            protocol: None,
            kind: EventKind::InboundRequestMirror,
            raw_payload: self.gate_raw(raw_payload),
            payload,
            elapsed_ms: None,
        });
    }

    /// Record the final response sent back to the caller. Neither arms nor
    /// consumes a timer.
    pub fn record_outbound_response(
        &mut self,
        node: &str,
        cmd: &str,
        invoke: &str,
        raw_payload: Option<Value>,
        payload: Value,
    ) {
        self.push_output(Event {
            invoke: invoke.to_string(),
            event_name: event::event_name(node, cmd),
            protocol: None,
            kind: EventKind::OutboundResponse,
            raw_payload: self.gate_raw(raw_payload),
            payload,
            elapsed_ms: None,
        });
    }

    /// Serialize and flush this trace, then reset it for a further cycle.
    ///
    /// Requires at least one recording call since creation or the last
    /// reset; an empty trace is a reported error. Serialization and sink
    /// failures are diagnostics only: the trace still resets and the call
    /// still succeeds.
    pub fn finalize(&mut self) -> Result<(), TraceError> {
        if self.record.input.is_empty() && self.record.output.is_empty() {
            return Err(TraceError::EmptyTrace);
        }
        let Some((created_wall, created_instant)) = self.created else {
            return Err(TraceError::EmptyTrace);
        };

        self.record.created_at = Some(format_timestamp(created_wall));
        self.record.processing_time = Some(created_instant.elapsed().as_millis() as u64);
        self.record.input_timestamp = self.input_time.map(format_timestamp);
        self.record.output_timestamp = self.output_time.map(format_timestamp);

        if self.log_to_console || self.log_to_file {
            match serde_json::to_string(&self.record) {
                Ok(line) => self.sink.write_line(&line),
                Err(e) => {
                    tracing::error!(error = %e, session = %self.record.session_id,
                        "failed to serialize detail trace, artifact dropped");
                }
            }
        }

        self.reset();
        Ok(())
    }

    /// Events recorded on the input sequence since the last reset.
    pub fn input(&self) -> &[Event] {
        &self.record.input
    }

    /// Events recorded on the output sequence since the last reset.
    pub fn output(&self) -> &[Event] {
        &self.record.output
    }

    /// Number of timers armed but not yet resolved.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn push_input(&mut self, event: Event) {
        let now = Utc::now();
        self.input_time = Some(now);
        self.arm_creation(now);
        self.record.input.push(event);
    }

    fn push_output(&mut self, event: Event) {
        let now = Utc::now();
        self.output_time = Some(now);
        self.arm_creation(now);
        self.record.output.push(event);
    }

    /// The first recording call after a reset restarts the processing-time
    /// window.
    fn arm_creation(&mut self, now: DateTime<Utc>) {
        if self.created.is_none() {
            self.created = Some((now, Instant::now()));
        }
    }

    fn gate_raw(&self, raw_payload: Option<Value>) -> Option<Value> {
        if self.raw_capture {
            raw_payload
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.record.input.clear();
        self.record.output.clear();
        self.record.input_timestamp = None;
        self.record.output_timestamp = None;
        self.record.created_at = None;
        self.record.processing_time = None;
        self.timers.clear();
        self.created = None;
        self.input_time = None;
        self.output_time = None;
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
