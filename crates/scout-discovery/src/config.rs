//! Engine configuration.

use scout_proto::{DiscoveryError, Fqdn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Static configuration supplied at engine construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Explicit DNS server. `None` selects the system's configured
    /// nameservers.
    pub dns_server: Option<SocketAddr>,

    /// DNSSEC trust anchor in DNSKEY presentation form. `None` selects
    /// the built-in root key-signing keys.
    pub trust_anchor: Option<String>,

    /// Domain probed by `is_dnssec_valid` when the caller names none.
    pub dnssec_domain: String,

    /// Per-query transport timeout (milliseconds).
    pub timeout_ms: u64,

    /// Maximum entries in the record cache.
    pub cache_size: usize,

    /// Ceiling on how long a cached answer may live (seconds).
    pub cache_ttl_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            dns_server: None,
            trust_anchor: None,
            dnssec_domain: "iana.org".to_string(),
            timeout_ms: 5000,
            cache_size: 1000,
            cache_ttl_secs: 15 * 60,
        }
    }
}

impl DiscoveryConfig {
    /// Validates the static configuration.
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.timeout_ms == 0 {
            return Err(DiscoveryError::configuration(
                "timeout_ms must be at least 1",
            ));
        }
        Fqdn::parse(&self.dnssec_domain)?;
        Ok(())
    }

    /// Returns the per-query timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the cache TTL ceiling.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
