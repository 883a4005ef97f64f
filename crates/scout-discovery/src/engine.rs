//! The discovery resolution engine.
//!
//! Four retrieval operations share one iteration pattern: walk the
//! provisioned resolvers in configured order, run the operation's query
//! sequence against each, stop at the first non-empty result, a fatal
//! error class, or resolver exhaustion. Per-attempt classifications
//! accumulate in a per-call [`ErrorTrace`]; when the aggregate result
//! is empty the trace decides whether that is a legitimate negative
//! answer or a masked failure.
//!
//! Queries are issued strictly serially — each stage depends on the
//! previous one's data (label before zones, zones before names, names
//! before records) — and the engine suspends only at resolver
//! round-trips.

use crate::config::DiscoveryConfig;
use crate::observer::{format, StatusObserver};
use crate::rdata::{dns_label_from_rdata, service_type_name_from_rdata};
use scout_dnssec::check_chain;
use scout_proto::{
    CertRecord, DiscoveryError, DiscoveryRecord, ErrorTrace, Fqdn, RecordsContainer,
    ServiceInstance, ServiceRecord, StatusCode, TextRecord, TlsaPrefix, LABEL_SUFFIX,
    NAME_SUFFIX, SERVICES_DNS_SD_UDP,
};
use scout_resolver::{classify_reply, provision, Record, RecordCache, RecordType, ResolverHandle};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

/// Parameters of one lookup stage, built fresh per stage and passed
/// explicitly down the call chain.
#[derive(Debug, Clone)]
struct QueryStep {
    /// Target name of this stage.
    name: Fqdn,
    /// Label prepended to the target when rendering the query name.
    prefix: String,
    /// Resource record type to query.
    rtype: RecordType,
    /// Whether the chain of trust must validate first.
    secure: bool,
}

impl QueryStep {
    fn new(name: Fqdn, prefix: impl Into<String>, rtype: RecordType, secure: bool) -> Self {
        Self {
            name,
            prefix: prefix.into(),
            rtype,
            secure,
        }
    }

    fn query_name(&self) -> String {
        self.name.fqdn_with_prefix(&self.prefix)
    }
}

/// What a parsing pass extracts from PTR targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scrape {
    /// Zones advertising a label.
    Zones,
    /// Fully qualified instance names.
    Names,
    /// Service type tokens.
    Types,
    /// No PTR scraping; collect SRV/TXT records only.
    Other,
}

/// Client-side DNS-SD resolution engine.
///
/// One engine owns its resolver pool and record cache for its
/// lifetime; every public operation creates its state (trace,
/// containers, steps) per call and discards it on return, so an engine
/// is safe to share across tasks.
pub struct ServiceDiscovery {
    config: DiscoveryConfig,
    cache: RecordCache,
    observers: Vec<Arc<dyn StatusObserver>>,
    fixed: Option<Vec<ResolverHandle>>,
    plain_pool: OnceCell<Vec<ResolverHandle>>,
    validating_pool: OnceCell<Vec<ResolverHandle>>,
}

impl ServiceDiscovery {
    /// Creates an engine provisioning resolvers from the configuration
    /// (explicit server or system defaults).
    pub fn new(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        config.validate()?;
        Ok(Self {
            cache: RecordCache::new(config.cache_size, config.cache_ttl()),
            config,
            observers: Vec::new(),
            fixed: None,
            plain_pool: OnceCell::new(),
            validating_pool: OnceCell::new(),
        })
    }

    /// Creates an engine over a fixed, ordered set of resolver handles
    /// instead of provisioning its own.
    pub fn with_resolvers(
        config: DiscoveryConfig,
        resolvers: Vec<ResolverHandle>,
    ) -> Result<Self, DiscoveryError> {
        config.validate()?;
        if resolvers.is_empty() {
            return Err(DiscoveryError::configuration("no resolvers supplied"));
        }
        Ok(Self {
            cache: RecordCache::new(config.cache_size, config.cache_ttl()),
            config,
            observers: Vec::new(),
            fixed: Some(resolvers),
            plain_pool: OnceCell::new(),
            validating_pool: OnceCell::new(),
        })
    }

    /// Registers a progress observer.
    pub fn add_observer(&mut self, observer: Arc<dyn StatusObserver>) {
        self.observers.push(observer);
    }

    /// Lists the service types advertised under `domain`.
    #[instrument(skip(self), fields(domain = %domain))]
    pub async fn list_service_types(
        &self,
        domain: &Fqdn,
        secure: bool,
    ) -> Result<BTreeSet<String>, DiscoveryError> {
        let resolvers = self.resolvers(secure).await?;
        let mut trace = ErrorTrace::new();
        let mut types = BTreeSet::new();

        for (position, resolver) in resolvers.iter().enumerate() {
            let last = position + 1 == resolvers.len();
            self.notify(&format::server(resolver.server()));

            match self.types_attempt(domain, secure, resolver, &mut trace).await {
                Ok(found) => {
                    types.extend(found);
                    self.notify(&format::event(&domain.fqdn(), "PTR", types.iter()));
                }
                Err(e) => self.route_failure(
                    e,
                    last,
                    &mut trace,
                    ErrorTrace::key(resolver.server(), &domain.fqdn(), "Retrieving-Types"),
                )?,
            }

            if !types.is_empty() {
                break;
            }
        }

        self.finish(types, trace, format!("Unable to resolve [{domain}]"))
    }

    /// Lists the fully resolved service instances of `service_type`
    /// under `domain`.
    #[instrument(skip(self), fields(domain = %domain, service_type))]
    pub async fn list_service_instances(
        &self,
        domain: &Fqdn,
        service_type: &str,
        secure: bool,
    ) -> Result<BTreeSet<ServiceInstance>, DiscoveryError> {
        require_label(service_type)?;
        let resolvers = self.resolvers(secure).await?;
        let mut trace = ErrorTrace::new();
        let mut instances = BTreeSet::new();

        for (position, resolver) in resolvers.iter().enumerate() {
            let last = position + 1 == resolvers.len();
            self.notify(&format::server(resolver.server()));

            match self
                .instances_attempt(domain, service_type, secure, resolver, &mut trace)
                .await
            {
                Ok(found) => instances.extend(found),
                Err(e) => self.route_failure(
                    e,
                    last,
                    &mut trace,
                    ErrorTrace::key(
                        resolver.server(),
                        &domain.fqdn_with_prefix(service_type),
                        "Retrieving-Instances",
                    ),
                )?,
            }

            if !instances.is_empty() {
                break;
            }
        }

        self.finish(
            instances,
            trace,
            format!("Unable to resolve [{}]", domain.fqdn_with_prefix(service_type)),
        )
    }

    /// Lists the service (SRV) records of `service_type` under
    /// `domain`.
    #[instrument(skip(self), fields(domain = %domain, service_type))]
    pub async fn list_service_records(
        &self,
        domain: &Fqdn,
        service_type: &str,
        secure: bool,
    ) -> Result<BTreeSet<ServiceRecord>, DiscoveryError> {
        require_label(service_type)?;
        let resolvers = self.resolvers(secure).await?;
        let mut trace = ErrorTrace::new();
        let mut records = BTreeSet::new();

        for (position, resolver) in resolvers.iter().enumerate() {
            let last = position + 1 == resolvers.len();
            self.notify(&format::server(resolver.server()));

            match self
                .records_attempt(domain, service_type, secure, resolver, &mut trace)
                .await
            {
                Ok(found) => records.extend(found),
                Err(e) => self.route_failure(
                    e,
                    last,
                    &mut trace,
                    ErrorTrace::key(
                        resolver.server(),
                        &domain.fqdn_with_prefix(service_type),
                        "Retrieving-Records",
                    ),
                )?,
            }

            if !records.is_empty() {
                break;
            }
        }

        self.finish(
            records,
            trace,
            format!("Unable to resolve [{}]", domain.fqdn_with_prefix(service_type)),
        )
    }

    /// Lists the text (TXT) records published at `<label>.<domain>`.
    #[instrument(skip(self), fields(domain = %domain, label))]
    pub async fn list_text_records(
        &self,
        domain: &Fqdn,
        label: &str,
        secure: bool,
    ) -> Result<BTreeSet<TextRecord>, DiscoveryError> {
        require_label(label)?;
        let text_name = Fqdn::new(label, domain.domain())?;
        let resolvers = self.resolvers(secure).await?;
        let mut trace = ErrorTrace::new();
        let mut texts = BTreeSet::new();

        for (position, resolver) in resolvers.iter().enumerate() {
            let last = position + 1 == resolvers.len();
            self.notify(&format::server(resolver.server()));

            let step = QueryStep::new(text_name.clone(), label, RecordType::TXT, secure);
            match self.lookup(&step, resolver, &mut trace).await {
                Ok(answers) => {
                    let mut container = RecordsContainer::new();
                    self.parse_records(&answers, &mut container, "", Scrape::Other, &mut trace);
                    texts.extend(container.texts().iter().cloned());
                    self.notify(&format::event(
                        &domain.fqdn_with_prefix(label),
                        "TXT",
                        texts.iter(),
                    ));
                }
                Err(e) => self.route_failure(
                    e,
                    last,
                    &mut trace,
                    ErrorTrace::key(
                        resolver.server(),
                        &domain.fqdn_with_prefix(label),
                        "Retrieving-Texts",
                    ),
                )?,
            }

            if !texts.is_empty() {
                break;
            }
        }

        self.finish(
            texts,
            trace,
            format!("Unable to resolve [{}]", domain.fqdn_with_prefix(label)),
        )
    }

    /// Lists the certificate-association (TLSA) records published at
    /// `<prefix>.<domain>`.
    #[instrument(skip(self), fields(domain = %domain, prefix = %tlsa_prefix))]
    pub async fn list_tlsa_records(
        &self,
        domain: &Fqdn,
        tlsa_prefix: &TlsaPrefix,
        secure: bool,
    ) -> Result<BTreeSet<CertRecord>, DiscoveryError> {
        let tlsa_name = Fqdn::parse(&format!("{tlsa_prefix}.{}", domain.fqdn()))?;
        let resolvers = self.resolvers(secure).await?;
        let mut trace = ErrorTrace::new();
        let mut certs = BTreeSet::new();

        for (position, resolver) in resolvers.iter().enumerate() {
            let last = position + 1 == resolvers.len();
            self.notify(&format::server(resolver.server()));

            let step = QueryStep::new(tlsa_name.clone(), "", RecordType::TLSA, secure);
            match self.lookup(&step, resolver, &mut trace).await {
                Ok(answers) => {
                    for answer in &answers {
                        if let Some(DiscoveryRecord::Cert(cert)) =
                            DiscoveryRecord::from_answer(answer)
                        {
                            certs.insert(cert);
                        }
                    }
                    self.notify(&format::event(&tlsa_name.fqdn(), "TLSA", certs.iter()));
                }
                Err(e) => self.route_failure(
                    e,
                    last,
                    &mut trace,
                    ErrorTrace::key(resolver.server(), domain.domain(), "Retrieving-Certificates"),
                )?,
            }

            if !certs.is_empty() {
                break;
            }
        }

        self.finish(certs, trace, format!("Unable to resolve [{domain}]"))
    }

    /// Checks whether `name` — or the configured probe domain when
    /// `None` — sits behind a valid DNSSEC chain of trust.
    ///
    /// Resolvers are walked in order until one validates; transient
    /// transport failures move on to the next resolver, any other
    /// non-success verdict propagates.
    #[instrument(skip(self))]
    pub async fn is_dnssec_valid(&self, name: Option<&Fqdn>) -> Result<bool, DiscoveryError> {
        let probe = match name {
            Some(name) => name.clone(),
            None => Fqdn::parse(&self.config.dnssec_domain)?,
        };

        let resolvers = self.resolvers(true).await?;
        let mut validated = false;

        for resolver in &resolvers {
            self.notify(&format::server(resolver.server()));
            self.notify(&format::query(&probe, "", "A"));

            match check_chain(&probe, resolver).await {
                Ok(true) => {
                    self.notify(&format::response(&format!(
                        "Received Authentic Data for [{}]",
                        probe.fqdn()
                    )));
                    validated = true;
                }
                Ok(false) => {
                    self.notify(&format::response(&format!(
                        "Network error validating [{}]",
                        probe.fqdn()
                    )));
                }
                Err(e) => {
                    let summary = if e.status() == StatusCode::ResourceLookupError {
                        format!("Unable to Resolve [{}]: Network/Server Error", probe.fqdn())
                    } else {
                        format!(
                            "Unable to Authenticate [{}]: Network/Server Error",
                            probe.fqdn()
                        )
                    };
                    self.notify(&format::response(&summary));
                    return Err(e);
                }
            }

            if validated {
                break;
            }
        }

        Ok(validated)
    }

    // ------------------------------------------------------------------
    // Per-resolver attempts
    // ------------------------------------------------------------------

    /// One resolver's attempt at the service type enumeration: the
    /// browsing PTR query, then one `<label>._label` PTR query per
    /// derived label token.
    async fn types_attempt(
        &self,
        domain: &Fqdn,
        secure: bool,
        resolver: &ResolverHandle,
        trace: &mut ErrorTrace,
    ) -> Result<BTreeSet<String>, DiscoveryError> {
        let step = QueryStep::new(domain.clone(), SERVICES_DNS_SD_UDP, RecordType::PTR, secure);
        let answers = self.lookup(&step, resolver, trace).await?;

        let mut types = BTreeSet::new();
        for answer in &answers {
            let Some(DiscoveryRecord::Pointer(pointer)) = DiscoveryRecord::from_answer(answer)
            else {
                continue;
            };
            let Some(dns_label) = dns_label_from_rdata(pointer.rdata()) else {
                continue;
            };

            let label_step = QueryStep::new(
                domain.clone(),
                format!("{dns_label}{LABEL_SUFFIX}"),
                RecordType::PTR,
                secure,
            );
            let label_answers = self.lookup(&label_step, resolver, trace).await?;
            let Some(first) = label_answers.first() else {
                continue;
            };
            let Some(DiscoveryRecord::Pointer(name_pointer)) = DiscoveryRecord::from_answer(first)
            else {
                continue;
            };
            if let Some(type_name) = service_type_name_from_rdata(name_pointer.rdata()) {
                types.insert(type_name);
            }
        }

        Ok(types)
    }

    /// One resolver's attempt at the three-stage instance walk,
    /// finishing with the SRV+TXT pairing.
    async fn instances_attempt(
        &self,
        domain: &Fqdn,
        service_type: &str,
        secure: bool,
        resolver: &ResolverHandle,
        trace: &mut ErrorTrace,
    ) -> Result<BTreeSet<ServiceInstance>, DiscoveryError> {
        let names = self
            .names_walk(domain, service_type, secure, resolver, trace)
            .await?;

        let mut instances = BTreeSet::new();
        for name in &names {
            let services = self
                .resolve_service_records(std::slice::from_ref(name), secure, resolver, trace)
                .await?;
            self.notify(&format::event(name, "SRV", services.iter()));
            let Some(service) = services.iter().next() else {
                continue;
            };

            let step = QueryStep::new(Fqdn::parse(name)?, "", RecordType::TXT, secure);
            let answers = self.lookup(&step, resolver, trace).await?;
            let mut container = RecordsContainer::new();
            self.parse_records(&answers, &mut container, "", Scrape::Other, trace);
            self.notify(&format::event(name, "TXT", container.texts().iter()));
            let Some(text) = container.texts().iter().next() else {
                continue;
            };

            instances.insert(ServiceInstance::new(
                service_type,
                service.clone(),
                text.clone(),
            ));
        }

        Ok(instances)
    }

    /// One resolver's attempt at the three-stage record walk.
    async fn records_attempt(
        &self,
        domain: &Fqdn,
        service_type: &str,
        secure: bool,
        resolver: &ResolverHandle,
        trace: &mut ErrorTrace,
    ) -> Result<BTreeSet<ServiceRecord>, DiscoveryError> {
        let names = self
            .names_walk(domain, service_type, secure, resolver, trace)
            .await?;
        let records = self
            .resolve_service_records(&names, secure, resolver, trace)
            .await?;
        self.notify(&format::event(
            &domain.fqdn_with_prefix(service_type),
            "SRV",
            records.iter(),
        ));
        Ok(records)
    }

    /// The shared label → zones → names stages of the indirection walk.
    async fn names_walk(
        &self,
        domain: &Fqdn,
        service_type: &str,
        secure: bool,
        resolver: &ResolverHandle,
        trace: &mut ErrorTrace,
    ) -> Result<Vec<String>, DiscoveryError> {
        let dns_label = self
            .resolve_dns_label(domain, service_type, secure, resolver, trace)
            .await?;
        self.notify(&format::event(
            &domain.fqdn_with_prefix(&format!("{service_type}{NAME_SUFFIX}")),
            "PTR",
            [domain.fqdn_with_prefix(&dns_label)],
        ));

        let zones = self
            .resolve_zones(domain, &dns_label, secure, resolver, trace)
            .await?;
        self.notify(&format::event(&domain.fqdn(), "PTR", zones.iter()));

        let names = self
            .resolve_names(&zones, &dns_label, secure, resolver, trace)
            .await?;
        self.notify(&format::event(&domain.fqdn(), "PTR", names.iter()));

        Ok(names)
    }

    /// Resolves the canonical DNS label for a service type via the
    /// `<type>._name` PTR indirection. A walk without a label is a
    /// server error: the indirection zone is expected to answer.
    async fn resolve_dns_label(
        &self,
        domain: &Fqdn,
        service_type: &str,
        secure: bool,
        resolver: &ResolverHandle,
        trace: &mut ErrorTrace,
    ) -> Result<String, DiscoveryError> {
        let step = QueryStep::new(
            domain.clone(),
            format!("{service_type}{NAME_SUFFIX}"),
            RecordType::PTR,
            secure,
        );
        let answers = self.lookup(&step, resolver, trace).await?;

        let mut dns_label = None;
        for answer in &answers {
            if let Some(DiscoveryRecord::Pointer(pointer)) = DiscoveryRecord::from_answer(answer) {
                dns_label = pointer.dns_label();
            }
        }

        dns_label.ok_or_else(|| {
            DiscoveryError::lookup_with_trace(
                StatusCode::ServerError,
                format!("Unable to retrieve DNS Label for [{}]", step.query_name()),
                trace,
            )
        })
    }

    /// Discovers the zones advertising `dns_label` under the browsing
    /// domain.
    async fn resolve_zones(
        &self,
        domain: &Fqdn,
        dns_label: &str,
        secure: bool,
        resolver: &ResolverHandle,
        trace: &mut ErrorTrace,
    ) -> Result<Vec<String>, DiscoveryError> {
        let step = QueryStep::new(domain.clone(), SERVICES_DNS_SD_UDP, RecordType::PTR, secure);
        let answers = self.lookup(&step, resolver, trace).await?;

        let mut container = RecordsContainer::new();
        self.parse_records(&answers, &mut container, dns_label, Scrape::Zones, trace);
        Ok(container.labels().to_vec())
    }

    /// Discovers the instance names carried by `<dns_label>.<zone>`
    /// across the advertised zones.
    async fn resolve_names(
        &self,
        zones: &[String],
        dns_label: &str,
        secure: bool,
        resolver: &ResolverHandle,
        trace: &mut ErrorTrace,
    ) -> Result<Vec<String>, DiscoveryError> {
        let mut container = RecordsContainer::new();
        for zone in zones {
            let step = QueryStep::new(Fqdn::parse(zone)?, dns_label, RecordType::PTR, secure);
            let answers = self.lookup(&step, resolver, trace).await?;
            self.parse_records(&answers, &mut container, dns_label, Scrape::Names, trace);
        }
        Ok(container.labels().to_vec())
    }

    /// Queries SRV records for each discovered instance name.
    async fn resolve_service_records(
        &self,
        names: &[String],
        secure: bool,
        resolver: &ResolverHandle,
        trace: &mut ErrorTrace,
    ) -> Result<BTreeSet<ServiceRecord>, DiscoveryError> {
        let mut container = RecordsContainer::new();
        for name in names {
            let step = QueryStep::new(Fqdn::parse(name)?, "", RecordType::SRV, secure);
            let answers = self.lookup(&step, resolver, trace).await?;
            self.parse_records(&answers, &mut container, "", Scrape::Other, trace);
        }
        Ok(container.records().clone())
    }

    // ------------------------------------------------------------------
    // Lookup plumbing
    // ------------------------------------------------------------------

    /// Runs one lookup stage: optional chain-of-trust check, cache
    /// consultation, the query round-trip, and outcome classification.
    ///
    /// Server and network failures abort the attempt; every other
    /// outcome (success included) is recorded into the trace and the
    /// answers — possibly none — are returned.
    async fn lookup(
        &self,
        step: &QueryStep,
        resolver: &ResolverHandle,
        trace: &mut ErrorTrace,
    ) -> Result<Vec<Record>, DiscoveryError> {
        if step.secure {
            check_chain(&step.name, resolver).await?;
        }

        let query_name = step.query_name();
        self.notify(&format::query(
            &step.name,
            &step.prefix,
            &step.rtype.to_string(),
        ));

        if let Some(answers) = self.cache.fetch(&query_name, step.rtype) {
            debug!(name = %query_name, rtype = %step.rtype, "answered from cache");
            trace.record(
                ErrorTrace::key(resolver.server(), &query_name, "Checking-Lookup-Status"),
                StatusCode::SuccessfulOperation,
            );
            return Ok(answers);
        }

        let (outcome, answers) = match resolver.query(&query_name, step.rtype).await {
            Ok(reply) => (classify_reply(&reply), reply.answers),
            Err(e) => {
                debug!(name = %query_name, server = resolver.server(), error = %e,
                       "query failed in transit");
                (StatusCode::NetworkError, Vec::new())
            }
        };

        if matches!(outcome, StatusCode::ServerError | StatusCode::NetworkError) {
            return Err(DiscoveryError::lookup_with_trace(
                outcome,
                format!("Unable to resolve [{query_name}]"),
                trace,
            ));
        }
        trace.record(
            ErrorTrace::key(resolver.server(), &query_name, "Checking-Lookup-Status"),
            outcome,
        );

        if outcome.is_success() {
            self.cache.store(&query_name, step.rtype, &answers);
        }
        Ok(answers)
    }

    /// Scrapes raw answers into the container according to the pass.
    ///
    /// Records outside the expectation of the pass are classified
    /// unexpected and recorded into the trace; they never abort the
    /// walk.
    fn parse_records(
        &self,
        answers: &[Record],
        container: &mut RecordsContainer,
        dns_label: &str,
        scrape: Scrape,
        trace: &mut ErrorTrace,
    ) {
        for answer in answers {
            match (DiscoveryRecord::from_answer(answer), scrape) {
                (Some(DiscoveryRecord::Pointer(pointer)), Scrape::Zones) => {
                    if let Some(zone) = pointer.service_zone(dns_label) {
                        container.add_label(zone);
                    }
                }
                (Some(DiscoveryRecord::Pointer(pointer)), Scrape::Names) => {
                    if let Some(name) = pointer.service_name(dns_label) {
                        container.add_label(name);
                    }
                }
                (Some(DiscoveryRecord::Pointer(pointer)), Scrape::Types) => {
                    if let Some(service_type) = pointer.service_type() {
                        container.add_label(service_type);
                    }
                }
                (Some(DiscoveryRecord::Service(service)), _) => {
                    container.records_mut().insert(service);
                }
                (Some(DiscoveryRecord::Text(text)), _) => {
                    container.texts_mut().insert(text);
                }
                _ => {
                    trace.record(
                        ErrorTrace::key(
                            &format!("{} {}", answer.name(), answer.record_type()),
                            dns_label,
                            "Parsing-Service-Records",
                        ),
                        StatusCode::ResourceUnexpected,
                    );
                }
            }
        }
    }

    /// Applies the per-attempt failure policy: network failures on the
    /// final resolver, server failures and insecure resources abandon
    /// the walk; anything else is recorded and the walk continues.
    fn route_failure(
        &self,
        error: DiscoveryError,
        last_resolver: bool,
        trace: &mut ErrorTrace,
        key: String,
    ) -> Result<(), DiscoveryError> {
        let status = error.status();
        if status == StatusCode::NetworkError && last_resolver {
            return Err(error);
        }
        if matches!(
            status,
            StatusCode::ServerError
                | StatusCode::ResourceInsecureError
                | StatusCode::ConfigurationError
        ) {
            return Err(error);
        }
        debug!(%status, key = %key, "attempt failed, trying next resolver");
        trace.record(key, status);
        Ok(())
    }

    /// Applies the empty-result postcondition: an empty set whose trace
    /// holds anything but negative answers is a masked failure.
    fn finish<T: Ord>(
        &self,
        result: BTreeSet<T>,
        trace: ErrorTrace,
        message: String,
    ) -> Result<BTreeSet<T>, DiscoveryError> {
        if result.is_empty() && !trace.only_name_resolution() {
            return Err(DiscoveryError::lookup_with_trace(
                StatusCode::ResourceLookupError,
                message,
                &trace,
            ));
        }
        Ok(result)
    }

    async fn resolvers(&self, secure: bool) -> Result<Vec<ResolverHandle>, DiscoveryError> {
        if let Some(fixed) = &self.fixed {
            return Ok(fixed.clone());
        }

        let cell = if secure {
            &self.validating_pool
        } else {
            &self.plain_pool
        };
        cell.get_or_try_init(|| {
            provision(
                secure,
                self.config.trust_anchor.as_deref(),
                self.config.dns_server,
                self.config.timeout(),
            )
        })
        .await
        .map(Clone::clone)
    }

    fn notify(&self, message: &str) {
        for observer in &self.observers {
            observer.status_change(message);
        }
    }
}

fn require_label(label: &str) -> Result<(), DiscoveryError> {
    if label.trim().is_empty() {
        return Err(DiscoveryError::configuration("null/blank label"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_step_name() {
        let domain = Fqdn::parse("example.com").unwrap();
        let step = QueryStep::new(domain, SERVICES_DNS_SD_UDP, RecordType::PTR, false);
        assert_eq!(step.query_name(), "_services._dns-sd._udp.example.com.");
    }

    #[test]
    fn test_require_label() {
        assert!(require_label("coap").is_ok());
        assert!(require_label("").is_err());
        assert!(require_label("   ").is_err());
    }

    #[test]
    fn test_with_resolvers_rejects_empty() {
        let result = ServiceDiscovery::with_resolvers(DiscoveryConfig::default(), Vec::new());
        assert!(result.is_err());
    }
}
