//! Resolver provisioning.
//!
//! Builds the ordered list of resolver handles the engine walks: one
//! handle for an explicitly configured server, or one per system
//! nameserver otherwise. When DNSSEC validation is requested every
//! handle wraps a validating exchange loaded with the trust anchor.

use crate::client::{PlainExchange, ValidatingExchange};
use crate::exchange::{DnsExchange, ExchangeError, ExchangeReply};
use crate::DNS_PORT;
use data_encoding::BASE64;
use hickory_proto::rr::dnssec::{PublicKeyBuf, TrustAnchor};
use hickory_proto::rr::RecordType;
use scout_proto::DiscoveryError;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const RESOLV_CONF: &str = "/etc/resolv.conf";

/// One provisioned resolver: a server identifier plus its exchange.
#[derive(Clone)]
pub struct ResolverHandle {
    server: String,
    exchange: Arc<dyn DnsExchange>,
}

impl ResolverHandle {
    /// Creates a handle around an exchange.
    pub fn new(server: impl Into<String>, exchange: Arc<dyn DnsExchange>) -> Self {
        Self {
            server: server.into(),
            exchange,
        }
    }

    /// Returns the server identifier.
    #[inline]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Sends one query through this resolver.
    pub async fn query(
        &self,
        name: &str,
        rtype: RecordType,
    ) -> Result<ExchangeReply, ExchangeError> {
        self.exchange.exchange(name, rtype).await
    }
}

impl fmt::Debug for ResolverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverHandle")
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

/// Builds the ordered resolver handle list.
///
/// With an explicit `server` the list holds exactly that resolver and a
/// construction failure is a `Configuration` error. Without one, every
/// nameserver from the system configuration is provisioned in listed
/// order, skipping servers that fail to build; an empty outcome is a
/// `Configuration` error.
pub async fn provision(
    secure: bool,
    trust_anchor: Option<&str>,
    server: Option<SocketAddr>,
    timeout: Duration,
) -> Result<Vec<ResolverHandle>, DiscoveryError> {
    match server {
        Some(addr) => {
            let handle = build_handle(secure, trust_anchor, addr, timeout)
                .await
                .map_err(|e| {
                    DiscoveryError::configuration(format!(
                        "Unable to retrieve a Resolver from [{addr}]: {e}"
                    ))
                })?;
            Ok(vec![handle])
        }
        None => {
            let mut handles = Vec::new();
            for addr in system_nameservers()? {
                match build_handle(secure, trust_anchor, addr, timeout).await {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        warn!(server = %addr, error = %e, "skipping default resolver");
                    }
                }
            }
            if handles.is_empty() {
                return Err(DiscoveryError::configuration(
                    "Unable to retrieve Default Resolvers",
                ));
            }
            Ok(handles)
        }
    }
}

async fn build_handle(
    secure: bool,
    trust_anchor: Option<&str>,
    addr: SocketAddr,
    timeout: Duration,
) -> Result<ResolverHandle, DiscoveryError> {
    let server = addr.to_string();
    debug!(%server, secure, "provisioning resolver");

    let exchange: Arc<dyn DnsExchange> = if secure {
        let anchor = parse_trust_anchor(trust_anchor)?;
        Arc::new(
            ValidatingExchange::connect(addr, timeout, anchor)
                .await
                .map_err(|e| DiscoveryError::configuration(e.to_string()))?,
        )
    } else {
        Arc::new(
            PlainExchange::connect(addr, timeout)
                .await
                .map_err(|e| DiscoveryError::configuration(e.to_string()))?,
        )
    };

    Ok(ResolverHandle::new(server, exchange))
}

/// Reads the system's configured nameservers in listed order.
pub fn system_nameservers() -> Result<Vec<SocketAddr>, DiscoveryError> {
    let buf = std::fs::read(RESOLV_CONF).map_err(|e| {
        DiscoveryError::configuration(format!("unable to read {RESOLV_CONF}: {e}"))
    })?;
    let config = resolv_conf::Config::parse(&buf).map_err(|e| {
        DiscoveryError::configuration(format!("unable to parse {RESOLV_CONF}: {e}"))
    })?;

    Ok(config
        .nameservers
        .iter()
        .map(|ip| {
            let ip = match ip {
                resolv_conf::ScopedIp::V4(v4) => IpAddr::V4(*v4),
                resolv_conf::ScopedIp::V6(v6, _) => IpAddr::V6(*v6),
            };
            SocketAddr::new(ip, DNS_PORT)
        })
        .collect())
}

/// Parses a trust anchor into the validator's key store.
///
/// Accepts a DNSKEY in presentation form — `[owner [class]] DNSKEY
/// <flags> <protocol> <algorithm> <base64-key>` — or the bare
/// whitespace-separated key fields. `None` selects the built-in root
/// key-signing keys.
pub fn parse_trust_anchor(anchor: Option<&str>) -> Result<TrustAnchor, DiscoveryError> {
    let Some(text) = anchor else {
        return Ok(TrustAnchor::default());
    };

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(DiscoveryError::configuration("empty trust anchor"));
    }

    // Skip everything up to and including the record-type token.
    let fields = match tokens
        .iter()
        .position(|t| t.eq_ignore_ascii_case("DNSKEY"))
    {
        Some(idx) => &tokens[idx + 1..],
        None => &tokens[..],
    };

    // <flags> <protocol> <algorithm> <base64...> — the key material may
    // be split across several tokens.
    if fields.len() < 4 {
        return Err(DiscoveryError::configuration(format!(
            "malformed trust anchor: [{text}]"
        )));
    }
    for numeric in &fields[..3] {
        numeric.parse::<u16>().map_err(|_| {
            DiscoveryError::configuration(format!("malformed trust anchor field: [{numeric}]"))
        })?;
    }

    let key_base64: String = fields[3..].concat();
    let key_bytes = BASE64.decode(key_base64.as_bytes()).map_err(|e| {
        DiscoveryError::configuration(format!("undecodable trust anchor key: {e}"))
    })?;

    let mut anchor = TrustAnchor::new();
    anchor.insert_trust_anchor(&PublicKeyBuf::new(key_bytes));
    Ok(anchor)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A syntactically valid DNSKEY line (key material is irrelevant to
    // parsing).
    const ANCHOR_LINE: &str = ". IN DNSKEY 257 3 8 AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTO iW7PZ6E=";

    #[test]
    fn test_default_anchor() {
        assert!(parse_trust_anchor(None).is_ok());
    }

    #[test]
    fn test_dnskey_presentation_form() {
        assert!(parse_trust_anchor(Some(ANCHOR_LINE)).is_ok());
    }

    #[test]
    fn test_bare_key_fields() {
        assert!(parse_trust_anchor(Some("257 3 8 AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW7PZ6E=")).is_ok());
    }

    #[test]
    fn test_malformed_anchors() {
        for bad in ["", "DNSKEY", "257 3 8", "x y z notbase64!", ". IN DS 19036 8 2 49AA"] {
            let result = parse_trust_anchor(Some(bad));
            assert!(result.is_err(), "expected failure for {bad:?}");
        }
    }
}
