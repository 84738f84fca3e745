//! Reader configuration.

use crate::types::{FormatParameters, PayloadPolicy};

/// Default upper bound on a single record's payload, in bytes.
pub const DEFAULT_MAX_RECORD_LEN: u64 = 1 << 30;

/// Options for opening a [`RecordStream`](crate::RecordStream) or one of the
/// diagnostic file readers.
///
/// # Example
///
/// ```
/// use gsi_diag_rs::{FormatParameters, PayloadPolicy, ReaderConfig};
///
/// let config = ReaderConfig::new()
///     .with_fallback(FormatParameters::with_swap(true))
///     .with_max_record_len(64 << 20)
///     .with_payload_policy(PayloadPolicy::Strict);
///
/// assert_eq!(config.max_record_len, 64 << 20);
/// assert!(config.format.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderConfig {
    /// Explicit framing. When set, detection is skipped.
    pub format: Option<FormatParameters>,
    /// Framing to use when detection finds no valid candidate.
    pub fallback: Option<FormatParameters>,
    /// Largest record payload the reader will allocate for.
    pub max_record_len: u64,
    /// Overrides the reader's own payload-size policy.
    pub payload_policy: Option<PayloadPolicy>,
}

impl ReaderConfig {
    /// Detect the format, no fallback, 1 GiB record limit, reader's default
    /// payload policy.
    pub fn new() -> Self {
        Self {
            format: None,
            fallback: None,
            max_record_len: DEFAULT_MAX_RECORD_LEN,
            payload_policy: None,
        }
    }

    /// Skip detection and use `format`.
    pub fn with_format(mut self, format: FormatParameters) -> Self {
        self.format = Some(format);
        self
    }

    /// Use `format` if detection fails.
    pub fn with_fallback(mut self, format: FormatParameters) -> Self {
        self.fallback = Some(format);
        self
    }

    /// Set the record size limit in bytes.
    pub fn with_max_record_len(mut self, bytes: u64) -> Self {
        self.max_record_len = bytes;
        self
    }

    /// Set the payload-size policy.
    pub fn with_payload_policy(mut self, policy: PayloadPolicy) -> Self {
        self.payload_policy = Some(policy);
        self
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::new()
    }
}
