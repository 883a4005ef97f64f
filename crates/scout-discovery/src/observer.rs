//! Progress notification sink.
//!
//! Observers receive human-readable progress strings — the server in
//! use, each query issued, response summaries — formatted with
//! dig-style section headers. Notifications are purely informational;
//! no control flow depends on them.

use scout_proto::Fqdn;
use std::sync::Arc;
use tracing::debug;

/// Receiver of discovery progress notifications.
pub trait StatusObserver: Send + Sync {
    /// Called with one formatted progress message.
    fn status_change(&self, message: &str);
}

/// Observer forwarding progress to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl StatusObserver for TracingObserver {
    fn status_change(&self, message: &str) {
        debug!(target: "scout::status", "{message}");
    }
}

impl<T: StatusObserver + ?Sized> StatusObserver for Arc<T> {
    fn status_change(&self, message: &str) {
        (**self).status_change(message);
    }
}

/// Progress message formatting.
pub mod format {
    use super::Fqdn;

    /// Formats the resolver server banner.
    pub fn server(server: &str) -> String {
        format!(";; SERVER\n{server}\n")
    }

    /// Formats an issued query.
    pub fn query(name: &Fqdn, prefix: &str, rtype: &str) -> String {
        format!(";; QUERY\n{} {rtype}", name.fqdn_with_prefix(prefix))
    }

    /// Formats a response summary.
    pub fn response(content: &str) -> String {
        format!(";; RESPONSE\n{content}\n")
    }

    /// Formats a response event: the queried target, the record type
    /// and the collected values.
    pub fn event<I>(target: &str, rtype: &str, values: I) -> String
    where
        I: IntoIterator,
        I::Item: std::fmt::Display,
    {
        let mut message = format!(";; RESPONSE\n{target} {rtype}");
        for value in values {
            message.push('\n');
            message.push_str(&value.to_string());
        }
        message.push('\n');
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_format() {
        assert_eq!(format::server("198.51.100.1:53"), ";; SERVER\n198.51.100.1:53\n");
    }

    #[test]
    fn test_query_format() {
        let name = Fqdn::parse("example.com").unwrap();
        assert_eq!(
            format::query(&name, "_services._dns-sd._udp", "PTR"),
            ";; QUERY\n_services._dns-sd._udp.example.com. PTR"
        );
    }

    #[test]
    fn test_event_format() {
        let message = format::event("example.com.", "PTR", ["a", "b"]);
        assert_eq!(message, ";; RESPONSE\nexample.com. PTR\na\nb\n");
    }
}
