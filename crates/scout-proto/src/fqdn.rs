//! Fully qualified domain name value type.
//!
//! An [`Fqdn`] pairs an optional entity label with a root domain and
//! renders prefixed query names for the discovery tree walk. Names are
//! validated at construction against a restricted domain-name grammar,
//! with an escape hatch for DNS-SD instance names containing escaped
//! characters, which render in a quoted form.

use crate::error::DiscoveryError;
use crate::{DNS_LABEL_DELIMITER, MAX_FQDN_LENGTH};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated, immutable fully qualified domain name with an optional
/// entity label.
///
/// Equality and hashing consider `(label, domain)` only; the domain is
/// normalized at construction so a trailing dot does not participate in
/// identity.
///
/// # Example
///
/// ```rust
/// use scout_proto::Fqdn;
/// use std::str::FromStr;
///
/// let name = Fqdn::from_str("example.com.").unwrap();
/// assert_eq!(name.fqdn(), "example.com.");
/// assert_eq!(name.fqdn_with_prefix("_services._dns-sd._udp"),
///            "_services._dns-sd._udp.example.com.");
///
/// // Trailing-dot normalization does not affect identity.
/// assert_eq!(name, Fqdn::from_str("example.com").unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fqdn {
    /// Entity label concatenated in front of the domain, may be empty.
    label: String,
    /// Root domain, stored without the trailing dot.
    domain: String,
}

impl Fqdn {
    /// Creates an FQDN from an entity label and a root domain.
    ///
    /// Fails with a `Configuration` error when the rendered name does
    /// not satisfy the domain-name grammar.
    pub fn new(label: &str, domain: &str) -> Result<Self, DiscoveryError> {
        let fqdn = Self {
            label: label.trim().to_string(),
            domain: domain.trim().trim_end_matches('.').to_string(),
        };
        validate_name(&fqdn.render(""))?;
        Ok(fqdn)
    }

    /// Creates an FQDN from a bare domain name (empty entity label).
    pub fn parse(domain: &str) -> Result<Self, DiscoveryError> {
        Self::new("", domain)
    }

    /// Returns the entity label.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the root domain (without trailing dot).
    #[inline]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Renders the fully qualified name, always with a trailing dot.
    pub fn fqdn(&self) -> String {
        self.quoted(self.render(""))
    }

    /// Renders the fully qualified name with `prefix` prepended.
    ///
    /// When the rendered name already contains the prefix it is
    /// returned unchanged, so a label used both as entity label and as
    /// query prefix is not doubled.
    pub fn fqdn_with_prefix(&self, prefix: &str) -> String {
        let plain = self.render("");
        if plain.contains(prefix) {
            self.quoted(plain)
        } else {
            self.quoted(self.render(prefix))
        }
    }

    /// Returns true if this name uses DNS-SD escape syntax.
    pub fn is_dns_sd(&self) -> bool {
        self.label.contains('\\') || self.domain.contains('\\')
    }

    fn render(&self, prefix: &str) -> String {
        let mut name = String::new();
        if !prefix.is_empty() {
            name.push_str(prefix);
            name.push_str(DNS_LABEL_DELIMITER);
        }
        if !self.label.is_empty() {
            name.push_str(&self.label);
            name.push_str(DNS_LABEL_DELIMITER);
        }
        name.push_str(&self.domain);
        name.push_str(DNS_LABEL_DELIMITER);
        name
    }

    fn quoted(&self, name: String) -> String {
        if name.contains('\\') {
            format!("\"{name}\"")
        } else {
            name
        }
    }
}

/// Validates a rendered name against the domain-name grammar.
///
/// Labels may contain alphanumerics, hyphens, underscores and spaces;
/// a name containing backslash escapes is a DNS-SD instance name and
/// bypasses the label grammar. Total length is capped at 255.
pub fn validate_name(name: &str) -> Result<(), DiscoveryError> {
    if name.is_empty() || name == DNS_LABEL_DELIMITER {
        return Err(DiscoveryError::configuration("null/blank name"));
    }
    if name.len() > MAX_FQDN_LENGTH {
        return Err(DiscoveryError::configuration(format!(
            "name exceeds {MAX_FQDN_LENGTH} octets: [{name}]"
        )));
    }
    if name.contains('\\') {
        // DNS-SD escaped instance name, addressed in quoted form.
        return Ok(());
    }

    let stripped = name.strip_suffix('.').unwrap_or(name);
    for label in stripped.split('.') {
        if label.is_empty() {
            return Err(DiscoveryError::configuration(format!(
                "empty label in [{name}]"
            )));
        }
        for c in label.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != ' ' {
                return Err(DiscoveryError::configuration(format!(
                    "invalid character '{c}' in [{name}]"
                )));
            }
        }
    }

    Ok(())
}

impl FromStr for Fqdn {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Fqdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqdn())
    }
}
