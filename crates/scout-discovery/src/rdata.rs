//! Rdata scraping helpers for the `_label` / `_name` indirection layer.

use scout_proto::{DNS_LABEL_DELIMITER, LABEL_SUFFIX, NAME_SUFFIX, TCP_LABEL, UDP_LABEL};

/// Extracts the canonical service label from a PTR target.
///
/// A target carrying the `._label` marker yields the prefix before it;
/// otherwise a target whose second label names a transport protocol
/// (`_tcp`/`_udp`) yields its first two labels joined.
pub fn dns_label_from_rdata(rdata: &str) -> Option<String> {
    if let Some(idx) = rdata.find(LABEL_SUFFIX) {
        return Some(rdata[..idx].to_string());
    }

    let mut labels = rdata.split(DNS_LABEL_DELIMITER);
    let first = labels.next()?;
    let second = labels.next()?;
    if second == TCP_LABEL || second == UDP_LABEL {
        Some(format!("{first}{DNS_LABEL_DELIMITER}{second}"))
    } else {
        None
    }
}

/// Extracts the human-readable service type name from a PTR target
/// carrying the `._name` marker.
pub fn service_type_name_from_rdata(rdata: &str) -> Option<String> {
    rdata
        .find(NAME_SUFFIX)
        .map(|idx| rdata[..idx].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_marker_wins() {
        assert_eq!(
            dns_label_from_rdata("mycoap._label.example.com."),
            Some("mycoap".to_string())
        );
    }

    #[test]
    fn test_protocol_pair() {
        assert_eq!(
            dns_label_from_rdata("_coap._tcp.example.com."),
            Some("_coap._tcp".to_string())
        );
        assert_eq!(
            dns_label_from_rdata("_mqtt._udp.example.com."),
            Some("_mqtt._udp".to_string())
        );
    }

    #[test]
    fn test_no_label() {
        assert_eq!(dns_label_from_rdata("example"), None);
        assert_eq!(dns_label_from_rdata("www.example.com."), None);
    }

    #[test]
    fn test_service_type_name() {
        assert_eq!(
            service_type_name_from_rdata("coap._name.example.com."),
            Some("coap".to_string())
        );
        assert_eq!(service_type_name_from_rdata("coap.example.com."), None);
    }
}
