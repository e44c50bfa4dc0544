//! Integration tests for `Aggregator`: validation, partial failure
//! isolation, ordering and idempotence, with `wiremock` as the relay.

use serde_json::json;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use getmeds_core::{CanonicalResult, RetailerConfig, SearchStrategy};
use getmeds_scraper::{Adapter, Aggregator, SearchError, SearchSession, Transport};

fn relay_transport(server: &MockServer) -> Transport {
    Transport::new(5, "getmeds-test/0.1", Some(&server.uri())).expect("failed to build transport")
}

fn adapter(name: &str, strategy: SearchStrategy, endpoint: Option<&str>) -> Adapter {
    let config = RetailerConfig {
        name: name.to_string(),
        enabled: true,
        strategy,
        endpoint: endpoint.map(str::to_string),
    };
    Adapter::from_config(&config, None).expect("valid retailer config")
}

fn sopharmacy() -> Adapter {
    adapter("Sopharmacy", SearchStrategy::HtmlScrape, None)
}

fn vmclub() -> Adapter {
    adapter("VMClub", SearchStrategy::StatefulSession, None)
}

fn remedium() -> Adapter {
    adapter(
        "Remedium",
        SearchStrategy::JsonEndpoint,
        Some("https://remedium.bg/api/search"),
    )
}

async fn mount_sopharmacy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("pharmacy", "sopharmacy"))
        .and(query_param(
            "url",
            "https://sopharmacy.bg/bg/sophSearch/?text=aspirin",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="products-item"><a href="/bg/product/1"><img src="/m/1.jpg"><h3>Аспирин</h3></a></div>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("pharmacy", "sopharmacy"))
        .and(query_param(
            "url",
            "https://sopharmacy.bg/bg/mapbox/1/pdpProductAvailability.json",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contact-map": { "features": [
                { "properties": { "name": "SOpharmacy Русе", "city": "Русе", "status": { "type": "warning" } } },
                { "properties": { "name": "SOpharmacy Бургас", "city": "Бургас", "status": { "type": "success" } } }
            ] }
        })))
        .mount(server)
        .await;
}

async fn mount_vmclub(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("pharmacy", "vmclub"))
        .and(query_param("q", "aspirin"))
        .respond_with(response)
        .mount(server)
        .await;
}

fn vmclub_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "query": "aspirin",
        "totalProducts": 1,
        "products": [{
            "name": "Аспирин Протект",
            "locations": [{ "name": "VMClub Лозенец", "city": "София", "status": 0 }]
        }]
    }))
}

fn retailers(results: &[CanonicalResult]) -> Vec<&str> {
    results.iter().map(|r| r.retailer.as_str()).collect()
}

#[tokio::test]
async fn short_query_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let aggregator = Aggregator::new(relay_transport(&server), vec![sopharmacy(), vmclub()], 2);
    let result = aggregator.search(" a ").await;

    assert!(
        matches!(
            result,
            Err(SearchError::Validation {
                min_length: 2,
                actual: 1
            })
        ),
        "expected Validation error, got: {result:?}"
    );
}

#[tokio::test]
async fn results_are_concatenated_in_adapter_order() {
    let server = MockServer::start().await;
    mount_sopharmacy(&server).await;
    mount_vmclub(&server, vmclub_ok()).await;

    let aggregator = Aggregator::new(relay_transport(&server), vec![vmclub(), sopharmacy()], 2);
    let results = aggregator.search("aspirin").await.expect("search should succeed");

    assert_eq!(
        retailers(&results),
        vec!["VMClub", "Sopharmacy", "Sopharmacy"]
    );
    let sopharmacy_cities: Vec<_> = results[1..]
        .iter()
        .map(|r| r.pharmacy.city.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(sopharmacy_cities, vec!["Бургас", "Русе"]);
}

#[tokio::test]
async fn failing_retailer_does_not_affect_others() {
    let server = MockServer::start().await;
    mount_sopharmacy(&server).await;
    mount_vmclub(&server, ResponseTemplate::new(502)).await;

    let aggregator = Aggregator::new(relay_transport(&server), vec![sopharmacy(), vmclub()], 2);
    let results = aggregator.search("aspirin").await.expect("partial failure is still Ok");
    assert_eq!(retailers(&results), vec!["Sopharmacy", "Sopharmacy"]);

    let outcomes = aggregator.search_outcomes("aspirin").await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].retailer, "Sopharmacy");
    assert!(outcomes[0].result.is_ok());
    assert_eq!(outcomes[1].retailer, "VMClub");
    assert!(matches!(
        outcomes[1].result,
        Err(SearchError::Upstream { .. })
    ));
}

#[tokio::test]
async fn empty_success_is_not_a_failure() {
    let server = MockServer::start().await;
    mount_vmclub(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "success": true, "products": [] })),
    )
    .await;

    let aggregator = Aggregator::new(relay_transport(&server), vec![sopharmacy(), vmclub()], 2);
    let results = aggregator.search("aspirin").await.expect("one retailer succeeded");
    assert!(results.is_empty());
}

#[tokio::test]
async fn all_retailers_failing_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let aggregator = Aggregator::new(relay_transport(&server), vec![sopharmacy(), vmclub()], 2);
    let result = aggregator.search("aspirin").await;

    match result {
        Err(SearchError::AllRetailersFailed { failures }) => {
            let names: Vec<_> = failures.iter().map(|f| f.retailer.as_str()).collect();
            assert_eq!(names, vec!["Sopharmacy", "VMClub"]);
        }
        other => panic!("expected AllRetailersFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn json_endpoint_goes_through_generic_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("url", "https://remedium.bg/api/search?q=aspirin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "title": "Аспирин 500", "price": 3.4 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let aggregator = Aggregator::new(relay_transport(&server), vec![remedium()], 2);
    let results = aggregator.search("aspirin").await.expect("search should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].medicine.name, "Аспирин 500");
    assert_eq!(results[0].price.to_string(), "3.40 BGN");
    assert!(!results[0].stock.in_stock());
}

#[tokio::test]
async fn repeated_searches_are_identical() {
    let server = MockServer::start().await;
    mount_sopharmacy(&server).await;
    mount_vmclub(&server, vmclub_ok()).await;

    let aggregator = Aggregator::new(relay_transport(&server), vec![sopharmacy(), vmclub()], 2);
    let first = aggregator.search("aspirin").await.unwrap();
    let second = aggregator.search("aspirin").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn every_adapter_list_is_in_stock_first() {
    let server = MockServer::start().await;
    mount_sopharmacy(&server).await;
    mount_vmclub(&server, vmclub_ok()).await;

    let aggregator = Aggregator::new(relay_transport(&server), vec![sopharmacy(), vmclub()], 2);
    for outcome in aggregator.search_outcomes("aspirin").await.unwrap() {
        let records = outcome.result.expect("retailer should succeed");
        for pair in records.windows(2) {
            assert!(pair[0].stock.in_stock() >= pair[1].stock.in_stock());
        }
    }
}

#[tokio::test]
async fn search_into_fills_session() {
    let server = MockServer::start().await;
    mount_vmclub(&server, vmclub_ok()).await;

    let aggregator = Aggregator::new(relay_transport(&server), vec![vmclub()], 2);
    let mut session = SearchSession::new();
    let count = aggregator
        .search_into(&mut session, "aspirin")
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(session.query(), Some("aspirin"));
    assert_eq!(session.results()[0].pharmacy.name, "VMClub Лозенец");
}
