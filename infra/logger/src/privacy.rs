use parking_lot::Mutex;
use std::borrow::Cow;
use std::fmt::{self, Debug, Write};
use tracing::Level;

const PRIVATE_PLACEHOLDER: &str = "<private>";
const SENSITIVE_PLACEHOLDER: &str = "<redacted>";
const SECURE_TARGET: &str = "bastion::secure";

/// Classification attached to every metadata value handed to a [`SecureLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PrivacyLevel {
    /// Safe to emit verbatim (sizes, algorithm names, outcomes).
    Public,
    /// Identifiers and similar values that are only revealed in development.
    Private,
    /// Never rendered by any sink.
    Sensitive,
}

/// One classified key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogField {
    pub key: Cow<'static, str>,
    pub value: String,
    pub privacy: PrivacyLevel,
}

/// Ordered set of classified fields accompanying a log record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogMetadata {
    fields: Vec<LogField>,
}

impl LogMetadata {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    #[must_use]
    pub fn with(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl ToString,
        privacy: PrivacyLevel,
    ) -> Self {
        self.fields.push(LogField { key: key.into(), value: value.to_string(), privacy });
        self
    }

    #[must_use]
    pub fn public(self, key: impl Into<Cow<'static, str>>, value: impl ToString) -> Self {
        self.with(key, value, PrivacyLevel::Public)
    }

    #[must_use]
    pub fn private(self, key: impl Into<Cow<'static, str>>, value: impl ToString) -> Self {
        self.with(key, value, PrivacyLevel::Private)
    }

    #[must_use]
    pub fn sensitive(self, key: impl Into<Cow<'static, str>>, value: impl ToString) -> Self {
        self.with(key, value, PrivacyLevel::Sensitive)
    }

    pub fn fields(&self) -> &[LogField] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&LogField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders `key=value` pairs with placeholders substituted per privacy level.
    #[must_use]
    pub fn render(&self, reveal_private: bool) -> String {
        let mut out = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let value = match field.privacy {
                PrivacyLevel::Public => field.value.as_str(),
                PrivacyLevel::Private if reveal_private => field.value.as_str(),
                PrivacyLevel::Private => PRIVATE_PLACEHOLDER,
                PrivacyLevel::Sensitive => SENSITIVE_PLACEHOLDER,
            };
            let _ = write!(out, "{}={value}", field.key);
        }
        out
    }
}

/// Privacy-aware logging sink injected into the key management service and providers.
///
/// Implementations decide how classified values are rendered; callers only promise
/// to classify them.
pub trait SecureLogger: Send + Sync + Debug {
    fn log(&self, level: Level, operation: &str, message: &str, metadata: &LogMetadata);

    fn debug(&self, operation: &str, message: &str, metadata: &LogMetadata) {
        self.log(Level::DEBUG, operation, message, metadata);
    }

    fn info(&self, operation: &str, message: &str, metadata: &LogMetadata) {
        self.log(Level::INFO, operation, message, metadata);
    }

    fn warn(&self, operation: &str, message: &str, metadata: &LogMetadata) {
        self.log(Level::WARN, operation, message, metadata);
    }

    fn error(&self, operation: &str, message: &str, metadata: &LogMetadata) {
        self.log(Level::ERROR, operation, message, metadata);
    }
}

/// Forwards records to `tracing` under the `bastion::secure` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger {
    reveal_private: bool,
}

impl TracingLogger {
    #[must_use]
    pub const fn new() -> Self {
        Self { reveal_private: false }
    }

    /// Renders `Private` values verbatim. Intended for development deployments only.
    #[must_use]
    pub const fn reveal_private(mut self, reveal: bool) -> Self {
        self.reveal_private = reveal;
        self
    }
}

impl SecureLogger for TracingLogger {
    fn log(&self, level: Level, operation: &str, message: &str, metadata: &LogMetadata) {
        let fields = metadata.render(self.reveal_private);
        match level {
            Level::ERROR => tracing::error!(target: SECURE_TARGET, operation, %fields, "{message}"),
            Level::WARN => tracing::warn!(target: SECURE_TARGET, operation, %fields, "{message}"),
            Level::INFO => tracing::info!(target: SECURE_TARGET, operation, %fields, "{message}"),
            Level::DEBUG => tracing::debug!(target: SECURE_TARGET, operation, %fields, "{message}"),
            Level::TRACE => tracing::trace!(target: SECURE_TARGET, operation, %fields, "{message}"),
        }
    }
}

/// A record kept by [`CapturingLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub operation: String,
    pub message: String,
    pub metadata: LogMetadata,
}

/// In-memory sink that keeps every record unredacted, for assertions in tests.
#[derive(Default)]
pub struct CapturingLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl CapturingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn entries_for(&self, operation: &str) -> Vec<LogEntry> {
        self.entries.lock().iter().filter(|e| e.operation == operation).cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// True when `needle` occurs in any message or field value.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|e| {
            e.message.contains(needle)
                || e.metadata.fields().iter().any(|f| f.value.contains(needle))
        })
    }
}

impl Debug for CapturingLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturingLogger").field("entries", &self.len()).finish()
    }
}

impl SecureLogger for CapturingLogger {
    fn log(&self, level: Level, operation: &str, message: &str, metadata: &LogMetadata) {
        self.entries.lock().push(LogEntry {
            level,
            operation: operation.to_owned(),
            message: message.to_owned(),
            metadata: metadata.clone(),
        });
    }
}
