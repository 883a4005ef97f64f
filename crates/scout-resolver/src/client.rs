//! Production exchanges backed by `hickory-client`.
//!
//! [`PlainExchange`] performs plain UDP queries; [`ValidatingExchange`]
//! wraps the same transport in a DNSSEC-validating client loaded with a
//! trust anchor and surfaces the validator's diagnostic annotation.

use crate::exchange::{DnsExchange, ExchangeError, ExchangeReply};
use async_trait::async_trait;
use hickory_client::client::{AsyncClient, AsyncDnssecClient, ClientHandle};
use hickory_client::udp::UdpClientStream;
use hickory_proto::rr::dnssec::TrustAnchor;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use hickory_proto::xfer::DnsResponse;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::trace;

/// A plain (non-validating) UDP exchange against one nameserver.
pub struct PlainExchange {
    client: AsyncClient,
}

impl PlainExchange {
    /// Connects to the nameserver at `addr` with a per-query timeout.
    ///
    /// No query is sent at connect time; the socket is bound locally
    /// and the exchange background task is spawned.
    pub async fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self, ExchangeError> {
        let stream = UdpClientStream::<UdpSocket>::with_timeout(addr, timeout);
        let (client, background) = AsyncClient::connect(stream)
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        tokio::spawn(background);
        Ok(Self { client })
    }
}

#[async_trait]
impl DnsExchange for PlainExchange {
    async fn exchange(
        &self,
        name: &str,
        rtype: RecordType,
    ) -> Result<ExchangeReply, ExchangeError> {
        let name = parse_query_name(name)?;
        trace!(%name, ?rtype, "sending query");
        let mut client = self.client.clone();
        let response = client
            .query(name, DNSClass::IN, rtype)
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        Ok(reply_from_response(response, false))
    }
}

/// A DNSSEC-validating UDP exchange against one nameserver.
pub struct ValidatingExchange {
    client: AsyncDnssecClient,
}

impl ValidatingExchange {
    /// Connects to the nameserver at `addr`, validating responses
    /// against `trust_anchor`.
    pub async fn connect(
        addr: SocketAddr,
        timeout: Duration,
        trust_anchor: TrustAnchor,
    ) -> Result<Self, ExchangeError> {
        let stream = UdpClientStream::<UdpSocket>::with_timeout(addr, timeout);
        let (client, background) = AsyncDnssecClient::builder(stream)
            .trust_anchor(trust_anchor)
            .build()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        tokio::spawn(background);
        Ok(Self { client })
    }
}

#[async_trait]
impl DnsExchange for ValidatingExchange {
    async fn exchange(
        &self,
        name: &str,
        rtype: RecordType,
    ) -> Result<ExchangeReply, ExchangeError> {
        let name = parse_query_name(name)?;
        trace!(%name, ?rtype, "sending validating query");
        let mut client = self.client.clone();
        let response = client
            .query(name, DNSClass::IN, rtype)
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        Ok(reply_from_response(response, true))
    }
}

/// Parses a rendered query name, stripping the DNS-SD quoting.
fn parse_query_name(name: &str) -> Result<Name, ExchangeError> {
    let name = name.trim_matches('"');
    Name::from_ascii(name).map_err(|e| ExchangeError::Transport(e.to_string()))
}

fn reply_from_response(response: DnsResponse, validating: bool) -> ExchangeReply {
    let reason = if validating {
        validation_reason(response.additionals())
    } else {
        None
    };
    ExchangeReply {
        code: response.response_code(),
        authenticated: response.header().authentic_data(),
        answers: response.answers().to_vec(),
        reason,
    }
}

/// Extracts the validator's diagnostic annotation: TXT data attached at
/// the root name in the additional section.
fn validation_reason(additionals: &[Record]) -> Option<String> {
    let mut reason = String::new();
    for record in additionals {
        if !record.name().is_root() {
            continue;
        }
        if let Some(RData::TXT(txt)) = record.data() {
            for segment in txt.txt_data() {
                reason.push_str(&String::from_utf8_lossy(segment));
            }
        }
    }
    if reason.is_empty() {
        None
    } else {
        Some(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::TXT;
    use std::str::FromStr;

    #[test]
    fn test_parse_query_name_strips_quoting() {
        let name = parse_query_name("\"a.example.com.\"").unwrap();
        assert_eq!(name.to_string(), "a.example.com.");
        assert!(parse_query_name("not a name!").is_err());
    }

    #[test]
    fn test_validation_reason_scrapes_root_txt() {
        let root_txt = Record::from_rdata(
            Name::root(),
            0,
            RData::TXT(TXT::new(vec!["validation failure: ".into(), "insecure".into()])),
        );
        let other_txt = Record::from_rdata(
            Name::from_str("x.example.com.").unwrap(),
            0,
            RData::TXT(TXT::new(vec!["ignored".into()])),
        );

        let reason = validation_reason(&[other_txt.clone(), root_txt]);
        assert_eq!(reason.as_deref(), Some("validation failure: insecure"));

        assert_eq!(validation_reason(&[other_txt]), None);
        assert_eq!(validation_reason(&[]), None);
    }
}
