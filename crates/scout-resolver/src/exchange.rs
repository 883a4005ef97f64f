//! The query seam between the discovery engine and the DNS transport.

use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{Record, RecordType};
use scout_proto::StatusCode;
use std::io;
use thiserror::Error;

/// Transport-level failure of a single query round-trip.
///
/// Exchange errors are always classified as
/// [`StatusCode::NetworkError`]; response-level conditions are
/// reported through [`ExchangeReply`] instead.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Socket-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The query timed out.
    #[error("query timed out")]
    Timeout,

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// One DNS response as seen by the discovery engine.
#[derive(Debug, Clone)]
pub struct ExchangeReply {
    /// Response code.
    pub code: ResponseCode,
    /// Whether the authenticated-data flag was set.
    pub authenticated: bool,
    /// Answer-section records.
    pub answers: Vec<Record>,
    /// Validator diagnostic annotation, when the exchange validates
    /// DNSSEC and the response carried one (additional-section TXT at
    /// the root name).
    pub reason: Option<String>,
}

impl ExchangeReply {
    /// A successful reply carrying the given answers.
    pub fn answer(answers: Vec<Record>) -> Self {
        Self {
            code: ResponseCode::NoError,
            authenticated: false,
            answers,
            reason: None,
        }
    }

    /// An empty reply with the given response code.
    pub fn empty(code: ResponseCode) -> Self {
        Self {
            code,
            authenticated: false,
            answers: Vec::new(),
            reason: None,
        }
    }
}

/// A DNS query/response exchange.
///
/// Implementations perform one blocking round-trip per call; the
/// engine issues calls strictly serially. Implementations must be safe
/// for concurrent use across calls on one engine instance.
#[async_trait]
pub trait DnsExchange: Send + Sync {
    /// Sends one query and returns the response.
    async fn exchange(
        &self,
        name: &str,
        rtype: RecordType,
    ) -> Result<ExchangeReply, ExchangeError>;
}

/// Classifies a reply into a discovery status class.
///
/// - `NXDOMAIN` means the name does not exist.
/// - `NOERROR` with an empty answer section means the name exists but
///   carries no record of the requested type.
/// - Every other non-`NOERROR` code is a server failure.
pub fn classify_reply(reply: &ExchangeReply) -> StatusCode {
    match reply.code {
        ResponseCode::NXDomain => StatusCode::ResolutionNameError,
        ResponseCode::NoError if reply.answers.is_empty() => StatusCode::ResolutionRrTypeError,
        ResponseCode::NoError => StatusCode::SuccessfulOperation,
        _ => StatusCode::ServerError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::PTR;
    use hickory_proto::rr::{Name, RData};
    use std::str::FromStr;

    fn ptr_record(target: &str) -> Record {
        Record::from_rdata(
            Name::from_str("q.example.com.").unwrap(),
            300,
            RData::PTR(PTR(Name::from_str(target).unwrap())),
        )
    }

    #[test]
    fn test_classify_nxdomain() {
        let reply = ExchangeReply::empty(ResponseCode::NXDomain);
        assert_eq!(classify_reply(&reply), StatusCode::ResolutionNameError);
    }

    #[test]
    fn test_classify_empty_noerror() {
        let reply = ExchangeReply::empty(ResponseCode::NoError);
        assert_eq!(classify_reply(&reply), StatusCode::ResolutionRrTypeError);
    }

    #[test]
    fn test_classify_answered() {
        let reply = ExchangeReply::answer(vec![ptr_record("t.example.com.")]);
        assert_eq!(classify_reply(&reply), StatusCode::SuccessfulOperation);
    }

    #[test]
    fn test_classify_server_failure() {
        for code in [
            ResponseCode::ServFail,
            ResponseCode::Refused,
            ResponseCode::NotImp,
        ] {
            let reply = ExchangeReply::empty(code);
            assert_eq!(classify_reply(&reply), StatusCode::ServerError);
        }
    }
}
