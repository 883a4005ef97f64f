//! # Scout Resolver
//!
//! Resolver provisioning and the query seam used by the discovery
//! engine.
//!
//! The engine talks to DNS through the [`DnsExchange`] trait; this
//! crate provides the production implementations backed by
//! `hickory-client` — a plain UDP exchange and a DNSSEC-validating
//! exchange loaded with a trust anchor — together with:
//!
//! - [`provision`]: building the ordered resolver handle list from an
//!   explicit server or from the system's configured nameservers
//! - [`classify_reply`]: mapping a reply to a discovery status class
//! - [`RecordCache`]: a bounded positive-response cache shared across
//!   calls on one engine instance

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod client;
pub mod exchange;
pub mod provision;

pub use cache::RecordCache;
pub use client::{PlainExchange, ValidatingExchange};
pub use exchange::{classify_reply, DnsExchange, ExchangeError, ExchangeReply};
pub use provision::{provision, system_nameservers, ResolverHandle};

// The record types the walk queries for, re-exported for callers.
pub use hickory_proto::op::ResponseCode;
pub use hickory_proto::rr::{Record, RecordType};

/// DNS port used when a nameserver address carries none.
pub const DNS_PORT: u16 = 53;
