//! # Scout Discovery Engine
//!
//! Client-side DNS-SD (RFC 6763) resolution with DNSSEC validation
//! (RFC 4035) and DANE/TLSA lookup (RFC 6698).
//!
//! [`ServiceDiscovery`] walks the PTR/SRV/TXT discovery tree across one
//! or more resolvers, classifies per-attempt failures into a per-call
//! trace, and distinguishes legitimate empty answers from masked
//! failures. All queries are issued strictly serially on the caller's
//! task; the engine spawns nothing and suspends only at resolver
//! round-trips.
//!
//! ## Example
//!
//! ```rust,ignore
//! use scout_discovery::{DiscoveryConfig, ServiceDiscovery};
//! use scout_proto::Fqdn;
//!
//! let engine = ServiceDiscovery::new(DiscoveryConfig::default())?;
//! let types = engine.list_service_types(&Fqdn::parse("example.com")?, false).await?;
//! for service_type in types {
//!     println!("{service_type}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod observer;
pub mod rdata;

pub use config::DiscoveryConfig;
pub use engine::ServiceDiscovery;
pub use observer::{StatusObserver, TracingObserver};
