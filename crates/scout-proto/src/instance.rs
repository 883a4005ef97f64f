//! Service instances and the per-stage records container.

use crate::record::{ServiceRecord, TextRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A fully resolved service instance.
///
/// An instance is produced only once both the SRV and the TXT lookups
/// for a discovered name have succeeded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// The service type the instance was discovered under.
    service_type: String,
    /// Location data (host, port, priority, weight).
    service: ServiceRecord,
    /// Instance metadata.
    text: TextRecord,
}

impl ServiceInstance {
    /// Creates a service instance.
    pub fn new(service_type: impl Into<String>, service: ServiceRecord, text: TextRecord) -> Self {
        Self {
            service_type: service_type.into(),
            service,
            text,
        }
    }

    /// Returns the service type.
    #[inline]
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Returns the service record.
    #[inline]
    pub fn service(&self) -> &ServiceRecord {
        &self.service
    }

    /// Returns the text record.
    #[inline]
    pub fn text(&self) -> &TextRecord {
        &self.text
    }
}

impl fmt::Display for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.service_type, self.service, self.text)
    }
}

/// Ephemeral aggregation of lookup results, built fresh per logical
/// lookup step and never persisted.
#[derive(Debug, Default)]
pub struct RecordsContainer {
    /// Generic labels (zones, names, type tokens) in insertion order.
    labels: Vec<String>,
    /// Text records in rdata order.
    texts: BTreeSet<TextRecord>,
    /// Service records in RFC 2782 order.
    records: BTreeSet<ServiceRecord>,
}

impl RecordsContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label, preserving insertion order and uniqueness.
    pub fn add_label(&mut self, label: String) {
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
    }

    /// Returns the collected labels in insertion order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the collected text records.
    pub fn texts(&self) -> &BTreeSet<TextRecord> {
        &self.texts
    }

    /// Returns the collected text records mutably.
    pub fn texts_mut(&mut self) -> &mut BTreeSet<TextRecord> {
        &mut self.texts
    }

    /// Returns the collected service records.
    pub fn records(&self) -> &BTreeSet<ServiceRecord> {
        &self.records
    }

    /// Returns the collected service records mutably.
    pub fn records_mut(&mut self) -> &mut BTreeSet<ServiceRecord> {
        &mut self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_ordered_and_unique() {
        let mut container = RecordsContainer::new();
        container.add_label("b".into());
        container.add_label("a".into());
        container.add_label("b".into());
        assert_eq!(container.labels(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_instance_ordering() {
        let srv = ServiceRecord::new("h.example.com.", 80, 1, 1, 300);
        let txt = TextRecord::new("\"x\"", 300);

        let a = ServiceInstance::new("coap", srv.clone(), txt.clone());
        let b = ServiceInstance::new("mqtt", srv, txt);

        let set: BTreeSet<ServiceInstance> = [b.clone(), a.clone()].into_iter().collect();
        let ordered: Vec<&ServiceInstance> = set.iter().collect();
        assert_eq!(ordered, vec![&a, &b]);
    }
}
