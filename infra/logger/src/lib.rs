//! # Logger
//!
//! Logging for the Bastion crates, in two halves:
//!
//! * [`Logger::builder`] installs the process-wide `tracing` subscriber: console output,
//!   optional rolling files with a non-blocking writer, and `RUST_LOG` or programmatic
//!   filter directives.
//! * [`SecureLogger`] is the privacy-classified contract the key management service and
//!   the crypto providers log through. Every metadata value is tagged
//!   [`PrivacyLevel::Public`], [`PrivacyLevel::Private`] or [`PrivacyLevel::Sensitive`];
//!   [`TracingLogger`] substitutes placeholders before anything reaches a sink.
//!
//! ## Example
//!
//! ```rust
//! # use bastion_logger::{LevelFilter, LogMetadata, Logger, SecureLogger, TracingLogger};
//!
//! let _logger = Logger::builder()
//!     .name("bastion")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//!
//! let metadata = LogMetadata::new().private("key_id", "k1");
//! TracingLogger::new().info("store_key", "Key stored", &metadata);
//! ```

mod error;
mod privacy;
mod subscriber;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::privacy::{
    CapturingLogger, LogEntry, LogField, LogMetadata, PrivacyLevel, SecureLogger, TracingLogger,
};
pub use crate::subscriber::{Logger, LoggerBuilder, NoFile, NoName, WithFile, WithName};
pub use tracing::Level;
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;
