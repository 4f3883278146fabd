//! Terminology clients against mocked services

use qedit_core::Coding;
use qedit_core::config::TerminologyConfig;
use qedit_terminology::{
    BioportalClient, CachedLookup, LookupError, LookupOptions, TerminologyLookup, UCUM_SYSTEM,
    UcumClient,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bioportal(server: &MockServer) -> BioportalClient {
    BioportalClient::new(server.uri(), Some("secret".into()), Duration::from_secs(5))
        .unwrap()
        .with_ontologies(vec!["SNOMEDCT".into()])
}

#[tokio::test]
async fn test_bioportal_text_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "asthma"))
        .and(query_param("apikey", "secret"))
        .and(query_param("ontologies", "SNOMEDCT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": [
                {
                    "notation": "195967001",
                    "prefLabel": "Asthma",
                    "links": {"ontology": "https://data.bioontology.org/ontologies/SNOMEDCT"}
                },
                {
                    "notation": "J45",
                    "prefLabel": "Asthma",
                    "links": {"ontology": "https://data.bioontology.org/ontologies/ICD10"}
                }
            ]
        })))
        .mount(&server)
        .await;

    let codings = bioportal(&server)
        .lookup("asthma", &LookupOptions::default().text())
        .await;
    assert_eq!(
        codings,
        vec![
            Coding::new("http://snomed.info/sct", "195967001", "Asthma").with_version("20220301"),
            Coding::new("http://hl7.org/fhir/sid/icd-10", "J45", "Asthma"),
        ]
    );
}

#[tokio::test]
async fn test_bioportal_concept_search_follows_descendants() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": [{
                "prefLabel": "Diabetes mellitus",
                "links": {
                    "ontology": "https://data.bioontology.org/ontologies/SNOMEDCT",
                    "descendants": format!("{}/ontologies/SNOMEDCT/classes/73211009/descendants", server.uri())
                }
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ontologies/SNOMEDCT/classes/73211009/descendants"))
        .and(query_param("apikey", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": [{
                "@id": "http://purl.bioontology.org/ontology/SNOMEDCT/44054006",
                "prefLabel": "Diabetes mellitus type 2",
                "links": {"ontology": "https://data.bioontology.org/ontologies/SNOMEDCT"}
            }]
        })))
        .mount(&server)
        .await;

    let codings = bioportal(&server)
        .search("diabetes", &LookupOptions::default())
        .await
        .unwrap();
    assert_eq!(codings.len(), 1);
    assert_eq!(codings[0].code.as_deref(), Some("44054006"));
    assert_eq!(codings[0].display.as_deref(), Some("Diabetes mellitus type 2"));
}

#[tokio::test]
async fn test_bioportal_snomed_concept_search_ignores_other_ontologies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("ontologies", "SNOMEDCT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"collection": []})))
        .expect(1)
        .mount(&server)
        .await;

    let codings = bioportal(&server)
        .search(
            "fever",
            &LookupOptions::default().ontologies(["LOINC", "SNOMEDCT"]),
        )
        .await
        .unwrap();
    assert!(codings.is_empty());
}

#[tokio::test]
async fn test_bioportal_text_search_sends_semantic_types() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("semantic_types", "T047,T184"))
        .and(query_param("require_exact_match", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": [{
                "notation": "386661006",
                "prefLabel": "Fever",
                "links": {"ontology": "https://data.bioontology.org/ontologies/SNOMEDCT"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = LookupOptions::default()
        .text()
        .semantic_types(["T047", "T184"])
        .exact();
    let codings = bioportal(&server).search("fever", &options).await.unwrap();
    assert_eq!(codings.len(), 1);
    assert_eq!(codings[0].code.as_deref(), Some("386661006"));
}

#[tokio::test]
async fn test_bioportal_without_key_degrades_to_empty() {
    let server = MockServer::start().await;
    let client = BioportalClient::new(server.uri(), None, Duration::from_secs(5)).unwrap();

    let err = client
        .search("asthma", &LookupOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::MissingApiKey));
    assert!(client.lookup("asthma", &LookupOptions::default()).await.is_empty());
}

#[tokio::test]
async fn test_server_error_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = UcumClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let err = client.search_units("mg").await.unwrap_err();
    assert!(matches!(err, LookupError::Status { status: 503, .. }));
    assert!(client.lookup("mg", &LookupOptions::default()).await.is_empty());
}

#[tokio::test]
async fn test_ucum_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("terms", "kilo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            2,
            ["kg", "km"],
            null,
            [["kg", "kilogram"], ["km", "kilometer"]]
        ])))
        .mount(&server)
        .await;

    let units = UcumClient::new(server.uri(), Duration::from_secs(5))
        .unwrap()
        .lookup("kilo", &LookupOptions::default())
        .await;
    assert_eq!(
        units,
        vec![
            Coding::new(UCUM_SYSTEM, "kg", "kilogram"),
            Coding::new(UCUM_SYSTEM, "km", "kilometer"),
        ]
    );
}

#[tokio::test]
async fn test_cached_lookup_hits_service_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([1, ["mg"], null, [["mg", "milligram"]]])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = TerminologyConfig {
        debounce_ms: 0,
        ..TerminologyConfig::default()
    };
    let client = UcumClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let cached = CachedLookup::from_config(client, &config);
    let options = LookupOptions::default();

    let first = cached.lookup("mg", &options).await;
    let second = cached.lookup("mg", &options).await;
    assert_eq!(first, second);
    assert_eq!(first.map(|c| c.len()), Some(1));
}
