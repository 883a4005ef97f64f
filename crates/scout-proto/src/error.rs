//! Error taxonomy and the per-call error trace.
//!
//! Two raised error kinds exist: [`DiscoveryError::Configuration`] for
//! bad or missing resolver setup, and [`DiscoveryError::Lookup`] for
//! runtime resolution/validation failures. A lookup error carries the
//! full [`ErrorTrace`] accumulated during the call, which is the basis
//! for distinguishing a legitimate empty result from a masked failure.

use crate::status::StatusCode;
use std::fmt;
use thiserror::Error;

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Error raised by discovery operations.
#[derive(Error, Debug, Clone)]
pub enum DiscoveryError {
    /// Bad or missing static setup: resolver addresses, trust anchor,
    /// invalid parameters. Always classified [`StatusCode::ConfigurationError`].
    #[error("{}: {message}", StatusCode::ConfigurationError)]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// Runtime resolution or validation failure.
    #[error("{status}: {message}")]
    Lookup {
        /// Status class indicating the root cause category.
        status: StatusCode,
        /// Description of the failure.
        message: String,
        /// Per-attempt classifications recorded during the call.
        trace: ErrorTrace,
    },
}

impl DiscoveryError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a lookup error with an empty trace.
    pub fn lookup(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Lookup {
            status,
            message: message.into(),
            trace: ErrorTrace::new(),
        }
    }

    /// Creates a lookup error carrying a snapshot of the call's trace.
    pub fn lookup_with_trace(
        status: StatusCode,
        message: impl Into<String>,
        trace: &ErrorTrace,
    ) -> Self {
        Self::Lookup {
            status,
            message: message.into(),
            trace: trace.clone(),
        }
    }

    /// Returns the status class of this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Configuration { .. } => StatusCode::ConfigurationError,
            Self::Lookup { status, .. } => *status,
        }
    }
}

/// One recorded attempt classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Key identifying the attempt: resolver, query target and phase.
    pub key: String,
    /// Classified outcome of the attempt.
    pub status: StatusCode,
}

/// Per-call accumulator of attempt classifications.
///
/// One trace is created at the start of each logical call and passed
/// explicitly through every stage of the tree walk; it is never shared
/// between concurrently executing calls. Entries are kept in insertion
/// order; recording under an existing key replaces the previous status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTrace {
    entries: Vec<TraceEntry>,
}

impl ErrorTrace {
    /// Creates an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a trace key from a resolver identifier, a query target
    /// and the walk phase that classified the attempt.
    pub fn key(resolver: &str, target: &str, phase: &str) -> String {
        format!("[{resolver}] {target} ({phase})")
    }

    /// Records an attempt classification, replacing any entry already
    /// recorded under the same key.
    pub fn record(&mut self, key: String, status: StatusCode) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.status = status;
        } else {
            self.entries.push(TraceEntry { key, status });
        }
    }

    /// Returns the recorded entries in insertion order.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true iff every recorded *error* is a negative answer
    /// ("name does not exist" or "RR type not found").
    ///
    /// Successful-operation entries do not count against the check. An
    /// empty result is a legitimate negative answer exactly when this
    /// holds; otherwise the call must surface a lookup failure.
    pub fn only_name_resolution(&self) -> bool {
        self.entries
            .iter()
            .filter(|e| e.status.is_error())
            .all(|e| e.status.is_negative_answer())
    }
}

impl fmt::Display for ErrorTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} => {}", entry.key, entry.status)?;
        }
        Ok(())
    }
}
