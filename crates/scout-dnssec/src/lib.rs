//! # Scout DNSSEC Verdict Interpretation
//!
//! Issues an authenticating probe through a validating resolver and
//! maps the outcome — response code, authenticated-data flag and the
//! validator's diagnostic annotation — to a discovery status class
//! (RFC 4035 validation states as seen from a stub's perspective).
//!
//! Transport failures are deliberately *not* raised: a validation probe
//! that never reached the server says nothing about the chain of
//! trust, so the caller retries with its next resolver instead of
//! failing hard.

#![warn(missing_docs)]
#![warn(clippy::all)]

use scout_proto::{DiscoveryError, Fqdn, StatusCode};
use scout_resolver::{classify_reply, ExchangeReply, RecordType, ResolverHandle, ResponseCode};
use tracing::debug;

/// Annotation fragment reported for an unsigned delegation.
const INSECURE: &str = "insecure";
/// Annotation fragment reported for a broken chain of trust.
const CHAIN_OF_TRUST: &str = "chain of trust";
/// Annotation fragment reported for a provably missing name.
const NO_DATA: &str = "nodata";
/// Annotation fragment reported for a missing signature.
const NO_SIGNATURE: &str = "missing signature";

/// Classifies a validating resolver's reply.
///
/// - `SERVFAIL` is disambiguated through the diagnostic annotation:
///   insecurity or a broken chain of trust is an insecure resource, a
///   missing signature a name-resolution failure, a no-data report a
///   network-class failure; an unannotated `SERVFAIL` passes.
/// - `NXDOMAIN` is a name-resolution failure.
/// - `NOERROR` without the authenticated-data flag is an insecure
///   resource even though no failure code was returned.
pub fn classify_verdict(reply: &ExchangeReply) -> StatusCode {
    let reason = reply
        .reason
        .as_deref()
        .unwrap_or("")
        .to_ascii_lowercase();

    match reply.code {
        ResponseCode::ServFail => {
            if reason.contains(INSECURE) || reason.contains(CHAIN_OF_TRUST) {
                StatusCode::ResourceInsecureError
            } else if reason.contains(NO_SIGNATURE) {
                StatusCode::ResolutionNameError
            } else if reason.contains(NO_DATA) {
                StatusCode::NetworkError
            } else {
                StatusCode::SuccessfulOperation
            }
        }
        ResponseCode::NXDomain => StatusCode::ResolutionNameError,
        ResponseCode::NoError if !reply.authenticated => StatusCode::ResourceInsecureError,
        _ => StatusCode::SuccessfulOperation,
    }
}

/// Validates the DNSSEC trust chain for `name` through `resolver`.
///
/// Issues an authenticating A-record probe. Returns `Ok(true)` when the
/// chain validates and `Ok(false)` on a transport failure (transient —
/// retry with the next resolver). Any other non-success classification
/// raises a lookup error carrying that status class.
pub async fn check_chain(
    name: &Fqdn,
    resolver: &ResolverHandle,
) -> Result<bool, DiscoveryError> {
    let reply = match resolver.query(&name.fqdn(), RecordType::A).await {
        Ok(reply) => reply,
        Err(e) => {
            debug!(name = %name, server = resolver.server(), error = %e,
                   "validation probe failed in transit");
            return Ok(false);
        }
    };

    let verdict = classify_verdict(&reply);
    debug!(name = %name, server = resolver.server(), %verdict,
           lookup = %classify_reply(&reply), "validation probe classified");

    if verdict.is_success() {
        Ok(true)
    } else {
        Err(DiscoveryError::lookup(verdict, "DNSSEC Validation Failed"))
    }
}
