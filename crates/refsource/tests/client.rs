// Integration tests for the reference client against a mock server.
// Run with: cargo test -p dexclean-refsource --test client

use std::collections::BTreeSet;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use dexclean_canon::registry::TABLES;
use dexclean_canon::{build_reference_sets, CleanOptions};
use dexclean_refsource::{ReferenceClient, SourceError};

fn client(server: &MockServer) -> ReferenceClient {
    ReferenceClient::new(&server.base_url(), Duration::from_secs(5)).unwrap()
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ── Listing ─────────────────────────────────────────────────────────

#[test]
fn single_page_listing() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/type/").query_param("limit", "10000");
        then.status(200).json_body(json!({
            "count": 3,
            "next": null,
            "results": [
                { "name": "fire", "url": "https://example/type/10/" },
                { "name": "water", "url": "https://example/type/11/" },
                { "name": "fire", "url": "https://example/type/10/" }
            ]
        }));
    });

    let listed = client(&server).list_names("type").unwrap();
    mock.assert();
    assert_eq!(listed, names(&["fire", "water"]));
}

#[test]
fn listing_follows_next() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET).path("/pokemon/").query_param("limit", "2");
        then.status(200).json_body(json!({
            "next": server.url("/pokemon/?offset=2&limit=3"),
            "results": [{ "name": "bulbasaur" }, { "name": "ivysaur" }]
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/pokemon/")
            .query_param("limit", "3")
            .query_param("offset", "2");
        then.status(200).json_body(json!({
            "next": null,
            "results": [{ "name": "venusaur" }, { "name": "charmander" }]
        }));
    });

    let listed = client(&server).with_page_size(2).list_names("pokemon").unwrap();
    first.assert();
    second.assert();
    assert_eq!(listed, names(&["bulbasaur", "charmander", "ivysaur", "venusaur"]));
}

#[test]
fn repeated_cursor_is_pagination_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/ability/");
        then.status(200).json_body(json!({
            "next": server.url("/ability/?limit=1&offset=1"),
            "results": [{ "name": "static" }]
        }));
    });

    let err = client(&server).with_page_size(1).list_names("ability").unwrap_err();
    assert!(matches!(err, SourceError::Pagination(_)), "{err}");
}

#[test]
fn empty_page_with_next_is_pagination_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/ability/");
        then.status(200).json_body(json!({
            "next": server.url("/ability/?limit=5&offset=5"),
            "results": []
        }));
    });

    let err = client(&server).list_names("ability").unwrap_err();
    assert!(matches!(err, SourceError::Pagination(_)), "{err}");
}

#[test]
fn server_error_is_http_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/type/");
        then.status(503).body("maintenance");
    });

    let err = client(&server).list_names("type").unwrap_err();
    match err {
        SourceError::Http(status, body) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected Http, got {other:?}"),
    }
}

#[test]
fn malformed_body_is_parse_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/type/");
        then.status(200).body("<html>not json</html>");
    });

    let err = client(&server).list_names("type").unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)), "{err}");
}

#[test]
fn unreachable_source_is_network_error() {
    // Port 9 (discard) on localhost is not listening.
    let client = ReferenceClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = client.list_names("type").unwrap_err();
    assert!(matches!(err, SourceError::Network(_)), "{err}");
}

// ── Reference sets ──────────────────────────────────────────────────

#[test]
fn failed_endpoint_degrades_only_that_table() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pokemon/");
        then.status(200).json_body(json!({
            "next": null,
            "results": [{ "name": "pikachu" }, { "name": "mr-mime" }]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/type/");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/ability/");
        then.status(200).json_body(json!({ "next": null, "results": [{ "name": "static" }] }));
    });

    let refs = build_reference_sets(&client(&server), TABLES, &CleanOptions::default());

    assert_eq!(refs.degraded_tables(), vec!["types"]);
    assert!(refs.get("pokemon").is_valid("Mr Mime"));
    assert!(refs.get("abilities").is_valid("Static"));
    assert!(refs.get("trainers").is_valid("Professor Oak"));
    assert!(refs.get("types").is_empty());
}

// ── Lookup ──────────────────────────────────────────────────────────

#[test]
fn lookup_returns_record_in_slot_order() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/pokemon/mr-mime");
        then.status(200).json_body(json!({
            "id": 122,
            "name": "mr-mime",
            "types": [
                { "slot": 2, "type": { "name": "fairy" } },
                { "slot": 1, "type": { "name": "psychic" } }
            ],
            "abilities": [
                { "slot": 1, "is_hidden": false, "ability": { "name": "soundproof" } },
                { "slot": 3, "is_hidden": true, "ability": { "name": "technician" } },
                { "slot": 2, "is_hidden": false, "ability": { "name": "filter" } }
            ]
        }));
    });

    let record = client(&server).lookup("Mr Mime").unwrap();
    mock.assert();
    assert_eq!(record.name, "mr-mime");
    assert_eq!(record.types, vec!["psychic", "fairy"]);
    assert_eq!(record.abilities, vec!["soundproof", "filter", "technician"]);
}

#[test]
fn lookup_404_is_not_found_with_requested_name() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pokemon/agumon");
        then.status(404).body("Not Found");
    });

    let err = client(&server).lookup("Agumon").unwrap_err();
    match err {
        SourceError::NotFound(name) => assert_eq!(name, "Agumon"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}
