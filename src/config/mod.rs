//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → semantic validation
//!     → TelemetryConfig (validated, immutable)
//!     → shared by value/reference with sink, trace and summary
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Host and instance fall back to the environment so embedding services
//!   need not wire them explicitly

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{RotationConfig, TelemetryConfig};
