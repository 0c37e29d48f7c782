//! Per-request correlation and structured-telemetry pipeline.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → context   (invocation id, session)
//!     → trace     (ordered input/output event sequences)
//!         ↳ correlate (pending timers: mirror arms, response resolves)
//!     → finalize  → sink (console + rotating, compressed file)
//!
//! each unit of work
//!     → summary begin … finish → sink (detached task allowed)
//! ```
//!
//! Two JSON artifacts leave the pipeline: a detailed per-request *trace*
//! and a compact per-unit-of-work *summary*. Telemetry failures never
//! surface to the service's own callers; they are reported on the
//! `tracing` diagnostic channel and dropped.

// Core subsystems
pub mod config;
pub mod context;
pub mod correlate;
pub mod sink;
pub mod summary;
pub mod trace;

// Boundaries and cross-cutting concerns
pub mod diagnostics;
pub mod downstream;

pub use config::{RotationConfig, TelemetryConfig};
pub use context::{new_invocation_id, InvocationContext};
pub use sink::LogSink;
pub use summary::{SummaryAggregator, SummaryHandle, SummaryRecord};
pub use trace::{Event, EventKind, Trace, TraceError};
