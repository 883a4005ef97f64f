//! Discovery status codes.
//!
//! A closed enumeration of outcome classes spanning two numeric ranges
//! in IANA-style assignment: [9000, 9999] for DNS-specific conditions
//! and [10000, 19999] for generic protocol conditions.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// Status class of a discovery operation or of a single lookup attempt.
///
/// Each class carries a stable numeric code and a human label for
/// external reporting. Codes are part of the public contract and must
/// not be renumbered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
pub enum StatusCode {
    /// The operation completed without error.
    SuccessfulOperation = 10000,

    /// Inconsistent or unusable resolver/trust-anchor setup.
    ConfigurationError = 10001,

    /// The DNS server was unreachable or the query timed out.
    NetworkError = 10002,

    /// The name does not exist (NXDOMAIN).
    ResolutionNameError = 9001,

    /// The DNS server failed to process the query.
    ServerError = 9002,

    /// Aggregate resolution failure that cannot be explained as a
    /// legitimate negative answer.
    ResourceLookupError = 9003,

    /// The name exists but carries no record of the requested type.
    ResolutionRrTypeError = 9007,

    /// A DNSSEC signature failed to verify.
    SignatureError = 9016,

    /// The response failed DNSSEC validation or was served unsigned
    /// where an authenticated chain was required.
    ResourceInsecureError = 9505,

    /// A resource record of an unexpected type was returned.
    ResourceUnexpected = 9506,
}

impl StatusCode {
    /// Returns the stable numeric code.
    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Returns the human-readable label for external reporting.
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SuccessfulOperation => "Successful DNS Operation",
            Self::ConfigurationError => "Inconsistent secured DNS settings",
            Self::NetworkError => "Unreachable DNS or timeout expired",
            Self::ResourceLookupError => "DNS Resolution error",
            Self::ResourceInsecureError => "Unsecured DNS packet",
            Self::ResourceUnexpected => "Unexpected Resource Record Type",
            Self::SignatureError => "DNS failed to verify",
            Self::ServerError => "DNS server failure",
            Self::ResolutionNameError => "DNS name does not exist",
            Self::ResolutionRrTypeError => "RR Type does not exist",
        }
    }

    /// Returns true if this status reports a successful outcome.
    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::SuccessfulOperation)
    }

    /// Returns true if this status reports an error.
    #[inline]
    pub const fn is_error(self) -> bool {
        !self.is_success()
    }

    /// Returns true if this status is a negative answer: the name or
    /// the record type does not exist, as opposed to a failure.
    #[inline]
    pub const fn is_negative_answer(self) -> bool {
        matches!(self, Self::ResolutionNameError | Self::ResolutionRrTypeError)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.label())
    }
}
