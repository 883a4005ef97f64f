//! Engine integration tests over a scripted DNS exchange.
//!
//! These drive the full tree walk — type enumeration, the three-stage
//! instance walk, direct TXT/TLSA lookups and the DNSSEC check —
//! against mock resolvers, verifying resolver fallback order, the
//! fatal-vs-traced error routing and the empty-result postcondition.

use async_trait::async_trait;
use hickory_proto::rr::rdata::tlsa::{CertUsage, Matching, Selector};
use hickory_proto::rr::rdata::{PTR, SRV, TLSA, TXT};
use hickory_proto::rr::{Name, RData, Record};
use parking_lot::{Mutex, RwLock};
use scout_discovery::{DiscoveryConfig, ServiceDiscovery};
use scout_proto::{Fqdn, StatusCode, TlsaPrefix};
use scout_resolver::{
    DnsExchange, ExchangeError, ExchangeReply, RecordType, ResolverHandle, ResponseCode,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// Test helpers
// ============================================================================

/// A scripted exchange: fixed answers per (name, type), overridable
/// response codes, optional whole-transport failure.
///
/// Unscripted names answer NXDOMAIN; unscripted A probes answer an
/// empty NOERROR so the chain check reflects the `authenticate` flag.
#[derive(Default)]
struct MockExchange {
    answers: RwLock<HashMap<(String, RecordType), Vec<Record>>>,
    codes: RwLock<HashMap<(String, RecordType), ResponseCode>>,
    authenticate: bool,
    fail_transport: bool,
    log: Mutex<Vec<(String, RecordType)>>,
}

impl MockExchange {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn authenticated() -> Arc<Self> {
        Arc::new(Self {
            authenticate: true,
            ..Self::default()
        })
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            fail_transport: true,
            ..Self::default()
        })
    }

    fn add(&self, name: &str, rtype: RecordType, record: Record) {
        self.answers
            .write()
            .entry((name.to_string(), rtype))
            .or_default()
            .push(record);
    }

    fn set_code(&self, name: &str, rtype: RecordType, code: ResponseCode) {
        self.codes.write().insert((name.to_string(), rtype), code);
    }

    fn queries_of(&self, rtype: RecordType) -> usize {
        self.log.lock().iter().filter(|(_, t)| *t == rtype).count()
    }

    fn query_count(&self) -> usize {
        self.log.lock().len()
    }
}

#[async_trait]
impl DnsExchange for MockExchange {
    async fn exchange(
        &self,
        name: &str,
        rtype: RecordType,
    ) -> Result<ExchangeReply, ExchangeError> {
        self.log.lock().push((name.to_string(), rtype));
        if self.fail_transport {
            return Err(ExchangeError::Timeout);
        }

        let key = (name.to_string(), rtype);
        if let Some(code) = self.codes.read().get(&key) {
            return Ok(ExchangeReply {
                code: *code,
                authenticated: self.authenticate,
                answers: Vec::new(),
                reason: None,
            });
        }
        if let Some(answers) = self.answers.read().get(&key) {
            return Ok(ExchangeReply {
                code: ResponseCode::NoError,
                authenticated: self.authenticate,
                answers: answers.clone(),
                reason: None,
            });
        }

        let code = if rtype == RecordType::A {
            ResponseCode::NoError
        } else {
            ResponseCode::NXDomain
        };
        Ok(ExchangeReply {
            code,
            authenticated: self.authenticate,
            answers: Vec::new(),
            reason: None,
        })
    }
}

fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

fn ptr(owner: &str, target: &str) -> Record {
    Record::from_rdata(name(owner), 300, RData::PTR(PTR(name(target))))
}

fn srv(owner: &str, priority: u16, weight: u16, port: u16, target: &str) -> Record {
    Record::from_rdata(
        name(owner),
        300,
        RData::SRV(SRV::new(priority, weight, port, name(target))),
    )
}

fn txt(owner: &str, texts: &[&str]) -> Record {
    Record::from_rdata(
        name(owner),
        300,
        RData::TXT(TXT::new(texts.iter().map(|s| s.to_string()).collect())),
    )
}

fn tlsa(owner: &str, data: &[u8]) -> Record {
    Record::from_rdata(
        name(owner),
        300,
        RData::TLSA(TLSA::new(
            CertUsage::from(3),
            Selector::from(1),
            Matching::from(1),
            data.to_vec(),
        )),
    )
}

/// Scripts the full coap discovery zone on a mock: type
/// advertisement, the `_label`/`_name` indirection, one zone and two
/// instance names, one of which publishes both SRV and TXT.
fn script_coap_zone(mock: &MockExchange) {
    // Type enumeration.
    mock.add(
        "_services._dns-sd._udp.example.com.",
        RecordType::PTR,
        ptr("_services._dns-sd._udp.example.com.", "_coap._tcp.example.com."),
    );
    mock.add(
        "_coap._tcp._label.example.com.",
        RecordType::PTR,
        ptr("_coap._tcp._label.example.com.", "coap._name.example.com."),
    );

    // Canonical label for the type.
    mock.add(
        "coap._name.example.com.",
        RecordType::PTR,
        ptr("coap._name.example.com.", "mycoap._label.example.com."),
    );
    // Zone advertisement carrying the label.
    mock.add(
        "_services._dns-sd._udp.example.com.",
        RecordType::PTR,
        ptr("_services._dns-sd._udp.example.com.", "mycoap.zone1.example.com."),
    );
    // Instance names under the zone.
    mock.add(
        "mycoap.zone1.example.com.",
        RecordType::PTR,
        ptr("mycoap.zone1.example.com.", "node-a.mycoap.zone1.example.com."),
    );
    mock.add(
        "mycoap.zone1.example.com.",
        RecordType::PTR,
        ptr("mycoap.zone1.example.com.", "node-b.mycoap.zone1.example.com."),
    );

    // node-a publishes both SRV and TXT; node-b only SRV.
    mock.add(
        "node-a.mycoap.zone1.example.com.",
        RecordType::SRV,
        srv("node-a.mycoap.zone1.example.com.", 1, 9, 5683, "host-a.example.com."),
    );
    mock.add(
        "node-a.mycoap.zone1.example.com.",
        RecordType::TXT,
        txt("node-a.mycoap.zone1.example.com.", &["id=42"]),
    );
    mock.add(
        "node-b.mycoap.zone1.example.com.",
        RecordType::SRV,
        srv("node-b.mycoap.zone1.example.com.", 2, 1, 5683, "host-b.example.com."),
    );
}

fn engine_over(resolvers: Vec<ResolverHandle>) -> ServiceDiscovery {
    ServiceDiscovery::with_resolvers(DiscoveryConfig::default(), resolvers).unwrap()
}

fn single(mock: Arc<MockExchange>) -> ServiceDiscovery {
    engine_over(vec![ResolverHandle::new("mock-1:53", mock)])
}

fn domain() -> Fqdn {
    Fqdn::parse("example.com").unwrap()
}

// ============================================================================
// Service type enumeration
// ============================================================================

#[tokio::test]
async fn lists_advertised_service_types() {
    let mock = MockExchange::new();
    script_coap_zone(&mock);
    let engine = single(mock);

    let types = engine.list_service_types(&domain(), false).await.unwrap();
    assert_eq!(types.into_iter().collect::<Vec<_>>(), vec!["coap"]);
}

#[tokio::test]
async fn type_without_label_indirection_is_skipped() {
    let mock = MockExchange::new();
    // Advertised target yields a label token, but the `_label` query
    // has no answer, so no type name can be derived.
    mock.add(
        "_services._dns-sd._udp.example.com.",
        RecordType::PTR,
        ptr("_services._dns-sd._udp.example.com.", "_mqtt._tcp.example.com."),
    );
    let engine = single(mock);

    let types = engine.list_service_types(&domain(), false).await.unwrap();
    assert!(types.is_empty());
}

#[tokio::test]
async fn falls_back_to_next_resolver_on_negative_answer() {
    let empty = MockExchange::new();
    let populated = MockExchange::new();
    script_coap_zone(&populated);

    let engine = engine_over(vec![
        ResolverHandle::new("empty:53", empty.clone()),
        ResolverHandle::new("populated:53", populated.clone()),
    ]);

    let types = engine.list_service_types(&domain(), false).await.unwrap();
    assert_eq!(types.len(), 1);
    assert!(empty.query_count() > 0);
    assert!(populated.query_count() > 0);
}

#[tokio::test]
async fn first_resolver_with_data_wins() {
    let first = MockExchange::new();
    script_coap_zone(&first);
    let second = MockExchange::new();
    script_coap_zone(&second);

    let engine = engine_over(vec![
        ResolverHandle::new("first:53", first),
        ResolverHandle::new("second:53", second.clone()),
    ]);

    let types = engine.list_service_types(&domain(), false).await.unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(second.query_count(), 0);
}

// ============================================================================
// Error routing
// ============================================================================

#[tokio::test]
async fn server_failure_aborts_remaining_resolvers() {
    let failing = MockExchange::new();
    failing.set_code(
        "_services._dns-sd._udp.example.com.",
        RecordType::PTR,
        ResponseCode::ServFail,
    );
    let never_reached = MockExchange::new();

    let engine = engine_over(vec![
        ResolverHandle::new("failing:53", failing),
        ResolverHandle::new("spare:53", never_reached.clone()),
    ]);

    let err = engine.list_service_types(&domain(), false).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::ServerError);
    assert_eq!(never_reached.query_count(), 0);
}

#[tokio::test]
async fn network_failure_is_fatal_only_on_last_resolver() {
    // Unreachable resolver followed by a populated one: the walk
    // continues.
    let populated = MockExchange::new();
    script_coap_zone(&populated);
    let engine = engine_over(vec![
        ResolverHandle::new("dead:53", MockExchange::unreachable()),
        ResolverHandle::new("alive:53", populated),
    ]);
    let types = engine.list_service_types(&domain(), false).await.unwrap();
    assert_eq!(types.len(), 1);

    // Unreachable resolver as the only candidate: the failure
    // propagates.
    let engine = single(MockExchange::unreachable());
    let err = engine.list_service_types(&domain(), false).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NetworkError);
}

#[tokio::test]
async fn empty_result_with_only_negative_answers_is_not_an_error() {
    // Every lookup answers NXDOMAIN.
    let engine = single(MockExchange::new());
    let types = engine.list_service_types(&domain(), false).await.unwrap();
    assert!(types.is_empty());
}

#[tokio::test]
async fn empty_result_with_unexplained_failure_raises() {
    let mock = MockExchange::new();
    // The TXT lookup answers with a PTR record: unexpected, traced,
    // and the aggregate result stays empty.
    mock.add(
        "mylabel.example.com.",
        RecordType::TXT,
        ptr("mylabel.example.com.", "somewhere.example.com."),
    );
    let engine = single(mock);

    let err = engine
        .list_text_records(&domain(), "mylabel", false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::ResourceLookupError);
}

#[tokio::test]
async fn missing_name_indirection_is_a_server_error() {
    // The records walk requires the `<type>._name` PTR to answer.
    let engine = single(MockExchange::new());
    let err = engine
        .list_service_records(&domain(), "coap", false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::ServerError);
}

#[tokio::test]
async fn blank_labels_are_rejected() {
    let engine = single(MockExchange::new());
    let err = engine
        .list_text_records(&domain(), "  ", false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::ConfigurationError);
}

// ============================================================================
// Instances and records
// ============================================================================

#[tokio::test]
async fn instances_require_both_srv_and_txt() {
    let mock = MockExchange::new();
    script_coap_zone(&mock);
    let engine = single(mock);

    let instances = engine
        .list_service_instances(&domain(), "coap", false)
        .await
        .unwrap();

    // node-b has no TXT record and must not be emitted.
    assert_eq!(instances.len(), 1);
    let instance = instances.iter().next().unwrap();
    assert_eq!(instance.service_type(), "coap");
    assert_eq!(instance.service().host(), "host-a.example.com.");
    assert_eq!(instance.service().port(), 5683);
    assert_eq!(instance.text().rdata(), "\"id=42\"");
}

#[tokio::test]
async fn records_walk_collects_all_instances() {
    let mock = MockExchange::new();
    script_coap_zone(&mock);
    let engine = single(mock);

    let records = engine
        .list_service_records(&domain(), "coap", false)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    // RFC 2782 order: priority 1 before priority 2.
    let hosts: Vec<&str> = records.iter().map(|r| r.host()).collect();
    assert_eq!(hosts, vec!["host-a.example.com.", "host-b.example.com."]);
}

// ============================================================================
// Direct TXT and TLSA lookups
// ============================================================================

#[tokio::test]
async fn text_records_come_back_verbatim() {
    let mock = MockExchange::new();
    mock.add(
        "mylabel.example.com.",
        RecordType::TXT,
        txt("mylabel.example.com.", &["a=1", "b=2"]),
    );
    let engine = single(mock);

    let texts = engine
        .list_text_records(&domain(), "mylabel", false)
        .await
        .unwrap();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts.iter().next().unwrap().rdata(), "\"a=1\" \"b=2\"");
}

#[tokio::test]
async fn label_without_txt_data_yields_empty_set() {
    let mock = MockExchange::new();
    mock.set_code("mylabel.example.com.", RecordType::TXT, ResponseCode::NoError);
    let engine = single(mock);

    let texts = engine
        .list_text_records(&domain(), "mylabel", false)
        .await
        .unwrap();
    assert!(texts.is_empty());
}

#[tokio::test]
async fn tlsa_records_are_fetched_under_the_prefix() {
    let mock = MockExchange::new();
    mock.add(
        "_443._tcp.example.com.",
        RecordType::TLSA,
        tlsa("_443._tcp.example.com.", &[0xde, 0xad, 0xbe, 0xef]),
    );
    let engine = single(mock);

    let prefix = TlsaPrefix::from_str("443:tcp").unwrap();
    let certs = engine
        .list_tlsa_records(&domain(), &prefix, false)
        .await
        .unwrap();

    assert_eq!(certs.len(), 1);
    let cert = certs.iter().next().unwrap();
    assert_eq!(cert.usage(), 3);
    assert_eq!(cert.selector(), 1);
    assert_eq!(cert.matching_type(), 1);
    assert_eq!(cert.rdata(), "DEADBEEF");
}

// ============================================================================
// DNSSEC-validated paths
// ============================================================================

#[tokio::test]
async fn secure_walk_passes_on_authenticated_chain() {
    let mock = MockExchange::authenticated();
    script_coap_zone(&mock);
    let engine = single(mock);

    let types = engine.list_service_types(&domain(), true).await.unwrap();
    assert_eq!(types.len(), 1);
}

#[tokio::test]
async fn secure_walk_aborts_on_unauthenticated_chain() {
    let mock = MockExchange::new();
    script_coap_zone(&mock);
    let engine = single(mock);

    let err = engine.list_service_types(&domain(), true).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::ResourceInsecureError);
}

#[tokio::test]
async fn dnssec_check_retries_past_transport_failures() {
    let engine = engine_over(vec![
        ResolverHandle::new("dead:53", MockExchange::unreachable()),
        ResolverHandle::new("validating:53", MockExchange::authenticated()),
    ]);

    let valid = engine
        .is_dnssec_valid(Some(&domain()))
        .await
        .unwrap();
    assert!(valid);
}

#[tokio::test]
async fn dnssec_check_reports_insecure_chain() {
    let engine = single(MockExchange::new());
    let err = engine.is_dnssec_valid(Some(&domain())).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::ResourceInsecureError);
}

#[tokio::test]
async fn dnssec_check_exhausting_resolvers_returns_false() {
    let engine = engine_over(vec![
        ResolverHandle::new("dead-1:53", MockExchange::unreachable()),
        ResolverHandle::new("dead-2:53", MockExchange::unreachable()),
    ]);

    let valid = engine.is_dnssec_valid(Some(&domain())).await.unwrap();
    assert!(!valid);
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn repeated_lookups_are_served_from_cache() {
    let mock = MockExchange::new();
    mock.add(
        "mylabel.example.com.",
        RecordType::TXT,
        txt("mylabel.example.com.", &["a=1"]),
    );
    let engine = single(mock.clone());

    let first = engine
        .list_text_records(&domain(), "mylabel", false)
        .await
        .unwrap();
    let second = engine
        .list_text_records(&domain(), "mylabel", false)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(mock.queries_of(RecordType::TXT), 1);
}
