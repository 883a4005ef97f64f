//! Structured label syntax for service types and TLSA prefixes.
//!
//! A [`CompoundLabel`] addresses a service (sub)type as
//! `label[:subtype:proto|:proto]` and renders the DNS-SD browsing
//! prefix `_[subtype._sub.]type._proto.` (RFC 6763 §7). A
//! [`TlsaPrefix`] addresses a DANE certificate association as
//! `port[:protocol]` and renders `_port._protocol` (RFC 6698 §3).

use crate::error::DiscoveryError;
use crate::{SUBTYPE_LABEL, TCP_LABEL, TLSA_DEFAULT_PORT, TLSA_DEFAULT_PROTOCOL, UDP_LABEL};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

const SEPARATOR: char = ':';

/// A compound service type label.
///
/// Identity considers `(type, subtype)` only; the protocol does not
/// participate in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundLabel {
    /// Service type, never empty.
    type_: String,
    /// Optional subtype, empty when absent.
    sub_type: String,
    /// Transport protocol, `tcp` or `udp` (stored without underscore).
    proto: String,
}

impl CompoundLabel {
    /// Creates a label with no subtype and the default `tcp` protocol.
    pub fn new(type_: &str) -> Result<Self, DiscoveryError> {
        Self::with_parts(type_, "", TLSA_DEFAULT_PROTOCOL)
    }

    /// Creates a label with a subtype and the default `tcp` protocol.
    pub fn with_subtype(type_: &str, sub_type: &str) -> Result<Self, DiscoveryError> {
        Self::with_parts(type_, sub_type, TLSA_DEFAULT_PROTOCOL)
    }

    /// Creates a label from all three components.
    pub fn with_parts(type_: &str, sub_type: &str, proto: &str) -> Result<Self, DiscoveryError> {
        if type_.is_empty() {
            return Err(DiscoveryError::configuration(
                "compound label requires a non-empty type",
            ));
        }
        let proto = proto.trim_start_matches('_').to_ascii_lowercase();
        Ok(Self {
            type_: type_.to_string(),
            sub_type: sub_type.to_string(),
            proto: if proto.is_empty() {
                TLSA_DEFAULT_PROTOCOL.to_string()
            } else {
                proto
            },
        })
    }

    /// Returns true iff `label` uses the compound `type:...` syntax.
    pub fn is_compound(label: &str) -> Result<bool, DiscoveryError> {
        if label.is_empty() {
            return Err(DiscoveryError::configuration(
                "input label cannot be empty",
            ));
        }
        Ok(label.len() > 1 && label.contains(SEPARATOR))
    }

    /// Returns the service type.
    #[inline]
    pub fn service_type(&self) -> &str {
        &self.type_
    }

    /// Returns the subtype, empty when absent.
    #[inline]
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// Returns the transport protocol.
    #[inline]
    pub fn proto(&self) -> &str {
        &self.proto
    }

    /// Returns true iff a subtype is present.
    #[inline]
    pub fn has_sub_type(&self) -> bool {
        !self.sub_type.is_empty()
    }

    /// Renders the DNS-SD browsing prefix, e.g. `_coap._tcp.` or
    /// `_light._sub._coap._udp.`.
    ///
    /// The rendered prefix always starts with `_` and ends with `.`;
    /// the subtype segment appears iff a subtype was supplied.
    pub fn prefix_string(&self) -> String {
        let mut prefix = String::from("_");
        if self.has_sub_type() {
            prefix.push_str(&self.sub_type);
            prefix.push('.');
            prefix.push_str(SUBTYPE_LABEL);
            prefix.push('.');
            prefix.push('_');
        }
        prefix.push_str(&self.type_);
        prefix.push('.');
        prefix.push('_');
        prefix.push_str(&self.proto);
        prefix.push('.');
        prefix
    }
}

impl FromStr for CompoundLabel {
    type Err = DiscoveryError;

    /// Parses `label[:subtype:proto|:proto]`.
    ///
    /// A single trailing component is taken as the protocol when it
    /// names one (`tcp`/`udp`, case-insensitive), as the subtype
    /// otherwise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_compound(s)? {
            return Err(DiscoveryError::configuration(format!(
                "label should respect the format 'label[:subtype:proto|:proto]': [{s}]"
            )));
        }

        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        if parts[0].is_empty() {
            return Err(DiscoveryError::configuration(format!(
                "malformed label, empty type: [{s}]"
            )));
        }

        let tcp = TCP_LABEL.trim_start_matches('_');
        let udp = UDP_LABEL.trim_start_matches('_');
        if parts.len() > 1
            && !parts[1].is_empty()
            && (parts[1].eq_ignore_ascii_case(tcp) || parts[1].eq_ignore_ascii_case(udp))
        {
            return Self::with_parts(parts[0], "", parts[1]);
        }

        let sub_type = parts.get(1).copied().unwrap_or("");
        let proto = parts.get(2).copied().unwrap_or("");
        Self::with_parts(parts[0], sub_type, proto)
    }
}

impl PartialEq for CompoundLabel {
    fn eq(&self, other: &Self) -> bool {
        self.type_ == other.type_ && self.sub_type == other.sub_type
    }
}

impl Eq for CompoundLabel {}

impl Hash for CompoundLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_.hash(state);
        self.sub_type.hash(state);
    }
}

impl fmt::Display for CompoundLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ServiceType {{ type={}, subType={} }}",
            self.type_, self.sub_type
        )
    }
}

/// A TLSA query-name prefix: port and protocol (RFC 6698 §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TlsaPrefix {
    /// TCP/UDP port, defaults to 0.
    port: u16,
    /// Transport protocol, defaults to `tcp`.
    protocol: String,
}

impl TlsaPrefix {
    /// Returns the port.
    #[inline]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the protocol.
    #[inline]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }
}

impl Default for TlsaPrefix {
    fn default() -> Self {
        Self {
            port: TLSA_DEFAULT_PORT,
            protocol: TLSA_DEFAULT_PROTOCOL.to_string(),
        }
    }
}

impl FromStr for TlsaPrefix {
    type Err = DiscoveryError;

    /// Parses `port[:protocol]` or `:protocol`; omitted fields take
    /// their defaults (port 0, protocol `tcp`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }

        let parse_port = |p: &str| {
            p.parse::<u16>().map_err(|_| {
                DiscoveryError::configuration(format!("invalid port value: [{p}]"))
            })
        };

        match s.find(SEPARATOR) {
            None => Ok(Self {
                port: parse_port(s)?,
                ..Self::default()
            }),
            Some(0) => {
                let protocol = &s[1..];
                Ok(Self {
                    port: TLSA_DEFAULT_PORT,
                    protocol: if protocol.is_empty() {
                        TLSA_DEFAULT_PROTOCOL.to_string()
                    } else {
                        protocol.to_string()
                    },
                })
            }
            Some(idx) => {
                let protocol = &s[idx + 1..];
                Ok(Self {
                    port: parse_port(&s[..idx])?,
                    protocol: if protocol.is_empty() {
                        TLSA_DEFAULT_PROTOCOL.to_string()
                    } else {
                        protocol.to_string()
                    },
                })
            }
        }
    }
}

impl fmt::Display for TlsaPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}._{}", self.port, self.protocol)
    }
}
