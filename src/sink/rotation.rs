//! Size/age-bounded rotating file writer with gzip compression.
//!
//! # Responsibilities
//! - Append lines to `<appName>_<YYYYMMDD>_<HHMMSS>.log` (name fixed at
//!   construction)
//! - Rotate the active file when it crosses the size threshold
//! - Compress rotated segments and prune them by count and age
//!
//! # Design Decisions
//! - Rotation happens inline under the sink's writer lock, so it is atomic
//!   with respect to concurrent writers
//! - A failed rotation keeps appending to the current segment rather than
//!   dropping lines

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::config::RotationConfig;

/// Platform line terminator for emitted artifacts.
#[cfg(windows)]
pub const END_OF_LINE: &str = "\r\n";
#[cfg(not(windows))]
pub const END_OF_LINE: &str = "\n";

/// Generate the log file name (pattern: `appName_YYYYMMDD_HHmmss.log`).
pub fn log_file_name(app_name: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.log", app_name, at.format("%Y%m%d_%H%M%S"))
}

/// An append-only log file that rotates by size and retires old segments.
#[derive(Debug)]
pub struct RollingFile {
    dir: PathBuf,
    path: PathBuf,
    file: File,
    written: u64,
    max_size: u64,
    max_backups: usize,
    max_age: Duration,
    compress: bool,
    rotations: u64,
}

impl RollingFile {
    /// Open (creating the directory if needed) the active log file for
    /// `app_name` under `dir`.
    pub fn open(dir: &Path, app_name: &str, rotation: &RotationConfig) -> io::Result<Self> {
        fs::create_dir_all(dir)?;

        let path = dir.join(log_file_name(app_name, Local::now()));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir: dir.to_path_buf(),
            path,
            file,
            written,
            max_size: rotation.max_size_mb.saturating_mul(1024 * 1024),
            max_backups: rotation.max_backups,
            max_age: Duration::from_secs(rotation.max_age_days.saturating_mul(86_400)),
            compress: rotation.compress,
            rotations: 0,
        })
    }

    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line, rotating first if it would cross the threshold.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = (line.len() + END_OF_LINE.len()) as u64;
        if self.written > 0 && self.written + len > self.max_size {
            if let Err(e) = self.rotate() {
                tracing::warn!(error = %e, path = %self.path.display(),
                    "log rotation failed, continuing on current segment");
            }
        }

        self.file.write_all(line.as_bytes())?;
        self.file.write_all(END_OF_LINE.as_bytes())?;
        self.written += len;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    /// Retire the active file into a numbered backup segment and start a
    /// fresh one under the same name.
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        self.rotations += 1;
        let backup = self
            .dir
            .join(format!("{}.{}", self.file_name(), self.rotations));
        fs::rename(&self.path, &backup)?;

        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.written = 0;

        if self.compress {
            if let Err(e) = compress_segment(&backup) {
                tracing::warn!(error = %e, segment = %backup.display(),
                    "failed to compress rotated segment");
            }
        }
        self.prune_backups();
        Ok(())
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Remove rotated segments beyond the retention count or older than the
    /// maximum age. Prune failures are diagnostics, not errors.
    fn prune_backups(&self) {
        let prefix = format!("{}.", self.file_name());
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, dir = %self.dir.display(), "failed to scan log directory");
                return;
            }
        };

        let mut backups: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().starts_with(&prefix))
                    .unwrap_or(false)
            })
            .collect();
        // Oldest first; the numbered suffix grows with time, so the
        // modification time is the reliable order either way.
        backups.sort_by_key(|p| modified_at(p));

        let cutoff = SystemTime::now().checked_sub(self.max_age);
        let mut remaining = backups.len();
        for backup in backups {
            let expired = match (cutoff, modified_at(&backup)) {
                (Some(cutoff), Some(modified)) => modified < cutoff,
                _ => false,
            };
            if remaining > self.max_backups || expired {
                if let Err(e) = fs::remove_file(&backup) {
                    tracing::warn!(error = %e, segment = %backup.display(),
                        "failed to remove retired segment");
                }
                remaining -= 1;
            }
        }
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Gzip a rotated segment in place (`<segment>` -> `<segment>.gz`).
fn compress_segment(path: &Path) -> io::Result<()> {
    let mut gz_name = path.as_os_str().to_owned();
    gz_name.push(".gz");
    let gz_path = PathBuf::from(gz_name);

    let mut reader = BufReader::new(File::open(path)?);
    let mut encoder = GzEncoder::new(File::create(&gz_path)?, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?.flush()?;

    fs::remove_file(path)
}
