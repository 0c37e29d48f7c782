//! Shared dual-output log sink.
//!
//! # Data Flow
//! ```text
//! Trace::finalize() ─┐
//!                    ├─→ LogSink::write_line ─┬─→ stdout (one JSON per line)
//! SummaryAggregator ─┘                        └─→ rotating file (rotation.rs)
//! ```
//!
//! # Design Decisions
//! - Explicitly constructed and shared via `Arc`; no process-wide singleton
//! - Concurrent writers are serialized by a mutex around the file writer,
//!   so rotation is atomic with respect to writes
//! - A failure to set up the file output degrades to console-only; write
//!   failures are diagnostics, never errors on the request path

pub mod rotation;

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::TelemetryConfig;
use rotation::{RollingFile, END_OF_LINE};

/// Process-wide writer for emitted telemetry artifacts.
#[derive(Debug)]
pub struct LogSink {
    console: bool,
    file: Mutex<Option<RollingFile>>,
}

impl LogSink {
    /// Build the sink from config. File-output setup failure is reported
    /// once and the sink degrades to console-only; this never fails.
    pub fn new(config: &TelemetryConfig) -> Arc<Self> {
        let file = if config.log_to_file {
            match RollingFile::open(
                std::path::Path::new(&config.log_dir),
                &config.app_name,
                &config.rotation,
            ) {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::error!(error = %e, dir = %config.log_dir,
                        "failed to open log file, falling back to console only");
                    None
                }
            }
        } else {
            None
        };

        Arc::new(Self {
            console: config.log_to_console,
            file: Mutex::new(file),
        })
    }

    /// Append one serialized artifact. Write failures go to the fallback
    /// diagnostic channel; callers are never blocked or failed by them.
    pub fn write_line(&self, line: &str) {
        if self.console {
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(line.as_bytes());
            let _ = out.write_all(END_OF_LINE.as_bytes());
        }

        if let Some(file) = self.file_guard().as_mut() {
            if let Err(e) = file.write_line(line) {
                tracing::error!(error = %e, "failed to write telemetry artifact to file");
            }
        }
    }

    /// Flush buffered file output.
    pub fn flush(&self) {
        if let Some(file) = self.file_guard().as_mut() {
            if let Err(e) = file.flush() {
                tracing::error!(error = %e, "failed to flush log file");
            }
        }
    }

    /// Flush and release the file output. Subsequent writes are
    /// console-only.
    pub fn shutdown(&self) {
        self.flush();
        self.file_guard().take();
    }

    /// Path of the active log file, when file output is healthy.
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file_guard().as_ref().map(|f| f.path().to_path_buf())
    }

    fn file_guard(&self) -> MutexGuard<'_, Option<RollingFile>> {
        // A writer that panicked mid-append only loses its own line.
        match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
