//! Typed discovery records.
//!
//! Answers coming back from the transport are wrapped into one of four
//! concrete record types — pointer (PTR), service (SRV), text (TXT) and
//! certificate (TLSA) — unified by the [`DiscoveryRecord`] tagged
//! union. Each wrapper keeps the raw textual rdata alongside the TTL
//! and exposes the capability accessors that make sense for its type.
//!
//! Identity and ordering are rdata-based: sets of discovery records
//! deduplicate on the raw data, with the exception of
//! [`ServiceRecord`], which orders by the RFC 2782 selection tuple
//! (priority ascending, weight descending, then host and port).

use crate::error::DiscoveryError;
use crate::status::StatusCode;
use crate::{DNS_LABEL_DELIMITER, LABEL_SUFFIX};
use data_encoding::HEXUPPER;
use hickory_proto::rr::{RData, Record};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// A pointer (PTR) discovery record.
///
/// The rdata is the PTR target name; the accessors extract the
/// discovery tokens embedded in targets produced by the `_label` /
/// `_name` indirection layer and by zone enumeration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerRecord {
    rdata: String,
    ttl: u64,
}

impl PointerRecord {
    /// Creates a pointer record from its raw target string.
    pub fn new(rdata: impl Into<String>, ttl: u64) -> Self {
        Self {
            rdata: rdata.into(),
            ttl,
        }
    }

    /// Returns the raw rdata.
    #[inline]
    pub fn rdata(&self) -> &str {
        &self.rdata
    }

    /// Returns the TTL.
    #[inline]
    pub const fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Extracts the canonical DNS label: the target prefix preceding
    /// `._label`, if present.
    pub fn dns_label(&self) -> Option<String> {
        self.rdata
            .find(LABEL_SUFFIX)
            .map(|idx| self.rdata[..idx].to_string())
    }

    /// Extracts the service type: the first label of the target with
    /// its leading underscore removed.
    pub fn service_type(&self) -> Option<String> {
        self.rdata
            .find(DNS_LABEL_DELIMITER)
            .filter(|&idx| idx >= 1)
            .map(|idx| self.rdata[1..idx].to_string())
    }

    /// Extracts the zone advertising `dns_label`: the target suffix
    /// following the label, if the target carries it.
    pub fn service_zone(&self, dns_label: &str) -> Option<String> {
        if dns_label.is_empty() || !self.rdata.contains(dns_label) {
            return None;
        }
        self.rdata.get(dns_label.len() + 1..).map(str::to_string)
    }

    /// Returns the full target as a service instance name when it
    /// carries `dns_label`.
    pub fn service_name(&self, dns_label: &str) -> Option<String> {
        if !dns_label.is_empty() && self.rdata.contains(dns_label) {
            Some(self.rdata.clone())
        } else {
            None
        }
    }
}

impl fmt::Display for PointerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} PTR {}", self.ttl, self.rdata)
    }
}

impl PartialEq for PointerRecord {
    fn eq(&self, other: &Self) -> bool {
        self.rdata == other.rdata
    }
}

impl Eq for PointerRecord {}

impl PartialOrd for PointerRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PointerRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rdata.cmp(&other.rdata)
    }
}

/// A service (SRV) discovery record (RFC 2782).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    host: String,
    port: u16,
    priority: u16,
    weight: u16,
    ttl: u64,
    rdata: String,
}

impl ServiceRecord {
    /// Creates a service record from SRV fields.
    pub fn new(host: &str, port: u16, priority: u16, weight: u16, ttl: u64) -> Self {
        Self {
            host: host.to_string(),
            port,
            priority,
            weight,
            ttl,
            rdata: format!("{host} {port} {priority} {weight} {ttl}"),
        }
    }

    /// Returns the target host.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the service port.
    #[inline]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the priority (lower is more preferred).
    #[inline]
    pub const fn priority(&self) -> u16 {
        self.priority
    }

    /// Returns the weight (higher wins within equal priority).
    #[inline]
    pub const fn weight(&self) -> u16 {
        self.weight
    }

    /// Returns the TTL.
    #[inline]
    pub const fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Returns the raw rdata.
    #[inline]
    pub fn rdata(&self) -> &str {
        &self.rdata
    }

    fn host_trimmed(&self) -> &str {
        self.host.strip_suffix('.').unwrap_or(&self.host)
    }
}

impl fmt::Display for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} SRV {} {} {}:{}",
            self.ttl,
            self.priority,
            self.weight,
            self.host_trimmed(),
            self.port
        )
    }
}

impl PartialEq for ServiceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ServiceRecord {}

impl PartialOrd for ServiceRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceRecord {
    /// RFC 2782 selection order: priority ascending, weight descending,
    /// then host and port ascending.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.weight.cmp(&self.weight))
            .then_with(|| self.host.cmp(&other.host))
            .then_with(|| self.port.cmp(&other.port))
    }
}

/// A text (TXT) discovery record.
///
/// The rdata keeps the zone-file presentation: each character-string
/// quoted, segments separated by a space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRecord {
    rdata: String,
    ttl: u64,
}

impl TextRecord {
    /// Creates a text record from its presentation rdata.
    pub fn new(rdata: impl Into<String>, ttl: u64) -> Self {
        Self {
            rdata: rdata.into(),
            ttl,
        }
    }

    /// Creates a text record from raw character-string segments.
    pub fn from_segments<S: AsRef<[u8]>>(segments: &[S], ttl: u64) -> Self {
        let rdata = segments
            .iter()
            .map(|s| {
                let text = String::from_utf8_lossy(s.as_ref())
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"");
                format!("\"{text}\"")
            })
            .collect::<Vec<_>>()
            .join(" ");
        Self { rdata, ttl }
    }

    /// Flattens a TXT rrset into a single record: rdata concatenated in
    /// set order, TTL taken as the maximum across the set.
    pub fn flatten(records: &BTreeSet<TextRecord>) -> Self {
        let mut rdata = String::new();
        let mut max_ttl = 0u64;
        for record in records {
            rdata.push_str(&record.rdata);
            max_ttl = max_ttl.max(record.ttl);
        }
        Self {
            rdata,
            ttl: max_ttl,
        }
    }

    /// Returns the raw rdata.
    #[inline]
    pub fn rdata(&self) -> &str {
        &self.rdata
    }

    /// Returns the TTL.
    #[inline]
    pub const fn ttl(&self) -> u64 {
        self.ttl
    }
}

impl fmt::Display for TextRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} TXT {}", self.ttl, self.rdata)
    }
}

impl PartialEq for TextRecord {
    fn eq(&self, other: &Self) -> bool {
        self.rdata == other.rdata
    }
}

impl Eq for TextRecord {}

impl PartialOrd for TextRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rdata.cmp(&other.rdata)
    }
}

/// A certificate-association (TLSA) discovery record (RFC 6698).
///
/// The rdata is the uppercase hex rendering of the certificate
/// association data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertRecord {
    usage: u8,
    selector: u8,
    matching_type: u8,
    data: Vec<u8>,
    rdata: String,
    ttl: u64,
}

impl CertRecord {
    /// Creates a certificate record from TLSA fields.
    pub fn new(usage: u8, selector: u8, matching_type: u8, data: Vec<u8>, ttl: u64) -> Self {
        let rdata = HEXUPPER.encode(&data);
        Self {
            usage,
            selector,
            matching_type,
            data,
            rdata,
            ttl,
        }
    }

    /// Returns the certificate usage (0-3).
    #[inline]
    pub const fn usage(&self) -> u8 {
        self.usage
    }

    /// Returns the selector (0-1).
    #[inline]
    pub const fn selector(&self) -> u8 {
        self.selector
    }

    /// Returns the matching type (0-2).
    #[inline]
    pub const fn matching_type(&self) -> u8 {
        self.matching_type
    }

    /// Returns the certificate association data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the raw rdata (uppercase hex of the association data).
    #[inline]
    pub fn rdata(&self) -> &str {
        &self.rdata
    }

    /// Returns the TTL.
    #[inline]
    pub const fn ttl(&self) -> u64 {
        self.ttl
    }
}

impl fmt::Display for CertRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ttl, self.rdata)
    }
}

impl PartialEq for CertRecord {
    fn eq(&self, other: &Self) -> bool {
        self.rdata == other.rdata
    }
}

impl Eq for CertRecord {}

impl PartialOrd for CertRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CertRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rdata.cmp(&other.rdata)
    }
}

/// Tagged union over the discovery record variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryRecord {
    /// A PTR record.
    Pointer(PointerRecord),
    /// An SRV record.
    Service(ServiceRecord),
    /// A TXT record.
    Text(TextRecord),
    /// A TLSA record.
    Cert(CertRecord),
}

impl DiscoveryRecord {
    /// Wraps a raw transport answer into its discovery variant.
    ///
    /// Returns `None` for record types outside the discovery model
    /// (the caller classifies those as unexpected).
    pub fn from_answer(record: &Record) -> Option<Self> {
        let ttl = u64::from(record.ttl());
        match record.data()? {
            RData::PTR(ptr) => Some(Self::Pointer(PointerRecord::new(ptr.0.to_string(), ttl))),
            RData::SRV(srv) => Some(Self::Service(ServiceRecord::new(
                &srv.target().to_string(),
                srv.port(),
                srv.priority(),
                srv.weight(),
                ttl,
            ))),
            RData::TXT(txt) => Some(Self::Text(TextRecord::from_segments(txt.txt_data(), ttl))),
            RData::TLSA(tlsa) => Some(Self::Cert(CertRecord::new(
                tlsa.cert_usage().into(),
                tlsa.selector().into(),
                tlsa.matching().into(),
                tlsa.cert_data().to_vec(),
                ttl,
            ))),
            _ => None,
        }
    }

    /// Returns the raw rdata of the wrapped record.
    pub fn rdata(&self) -> &str {
        match self {
            Self::Pointer(r) => r.rdata(),
            Self::Service(r) => r.rdata(),
            Self::Text(r) => r.rdata(),
            Self::Cert(r) => r.rdata(),
        }
    }

    /// Returns the TTL of the wrapped record.
    pub fn ttl(&self) -> u64 {
        match self {
            Self::Pointer(r) => r.ttl(),
            Self::Service(r) => r.ttl(),
            Self::Text(r) => r.ttl(),
            Self::Cert(r) => r.ttl(),
        }
    }

    /// Extracts the service type; only pointer records support this.
    pub fn service_type(&self) -> Result<String, DiscoveryError> {
        match self {
            Self::Pointer(r) => r.service_type().ok_or_else(|| {
                DiscoveryError::lookup(
                    StatusCode::ResolutionNameError,
                    format!("no service type in [{}]", r.rdata()),
                )
            }),
            _ => Err(self.unsupported("service type")),
        }
    }

    /// Extracts the service zone; only pointer records support this.
    pub fn service_zone(&self, dns_label: &str) -> Result<String, DiscoveryError> {
        match self {
            Self::Pointer(r) => r.service_zone(dns_label).ok_or_else(|| {
                DiscoveryError::lookup(
                    StatusCode::ResolutionNameError,
                    format!("no service zone in [{}]", r.rdata()),
                )
            }),
            _ => Err(self.unsupported("service zone")),
        }
    }

    /// Extracts the service name; only pointer records support this.
    pub fn service_name(&self, dns_label: &str) -> Result<String, DiscoveryError> {
        match self {
            Self::Pointer(r) => r.service_name(dns_label).ok_or_else(|| {
                DiscoveryError::lookup(
                    StatusCode::ResolutionNameError,
                    format!("no service name in [{}]", r.rdata()),
                )
            }),
            _ => Err(self.unsupported("service name")),
        }
    }

    fn unsupported(&self, capability: &str) -> DiscoveryError {
        DiscoveryError::lookup(
            StatusCode::ResourceUnexpected,
            format!("{capability} not supported by {} record", self.kind()),
        )
    }

    /// Returns the variant name.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Pointer(_) => "PTR",
            Self::Service(_) => "SRV",
            Self::Text(_) => "TXT",
            Self::Cert(_) => "TLSA",
        }
    }
}

impl fmt::Display for DiscoveryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pointer(r) => r.fmt(f),
            Self::Service(r) => r.fmt(f),
            Self::Text(r) => r.fmt(f),
            Self::Cert(r) => r.fmt(f),
        }
    }
}
