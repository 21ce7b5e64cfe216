//! Rate Limiting & Concurrency Tests
//! Test File: concurrent_tests.rs
//!
//! Outbound geocoder calls must stay spaced by the minimum interval, even
//! when several imports share one gate.

mod helpers;

use casemap_import::services::{
    GeocodeResolver, ImportSource, LocationCandidates, MinIntervalGate, RequestGate,
};
use helpers::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const INTERVAL: Duration = Duration::from_millis(120);

fn assert_spaced(instants: &[tokio::time::Instant]) {
    let mut sorted = instants.to_vec();
    sorted.sort();
    for pair in sorted.windows(2) {
        let gap = pair[1] - pair[0];
        // Small allowance for timer granularity between release and call
        assert!(
            gap + Duration::from_millis(5) >= INTERVAL,
            "calls only {:?} apart",
            gap
        );
    }
}

/// TC-CONC-001: Consecutive tier queries are spaced by the gate
#[tokio::test]
async fn tc_conc_001_resolver_calls_are_spaced() {
    let geocoder = Arc::new(ScriptedGeocoder::new().hit("Armenia", "4.53", "-75.68"));
    let gate: Arc<dyn RequestGate> = Arc::new(MinIntervalGate::new(INTERVAL));
    let resolver = GeocodeResolver::new(geocoder.clone(), gate, test_resolver_settings());

    let candidates = LocationCandidates {
        cities: vec!["Armenia".to_string()],
        ..Default::default()
    };
    let resolution = resolver.resolve(&candidates).await;

    assert!(resolution.coordinate().is_some());
    let instants = geocoder.call_instants();
    assert_eq!(instants.len(), 3);
    assert_spaced(&instants);
}

/// TC-CONC-002: Concurrent imports share one gate
#[tokio::test]
async fn tc_conc_002_concurrent_imports_share_gate() {
    let pool = create_test_db().await;
    let geocoder = Arc::new(ScriptedGeocoder::new());
    let gate: Arc<dyn RequestGate> = Arc::new(MinIntervalGate::new(INTERVAL));

    let first = Arc::new(create_test_importer(&pool, geocoder.clone(), gate.clone()));
    let second = Arc::new(create_test_importer(&pool, geocoder.clone(), gate));

    let csv = "year,age,classification,city\n2024,30,Dengue grave,Salento\n";

    let a = {
        let importer = first.clone();
        tokio::spawn(async move {
            importer
                .import(
                    ImportSource::new("a.csv", csv),
                    Uuid::new_v4(),
                    &CancellationToken::new(),
                )
                .await
        })
    };
    let b = {
        let importer = second.clone();
        tokio::spawn(async move {
            importer
                .import(
                    ImportSource::new("b.csv", csv),
                    Uuid::new_v4(),
                    &CancellationToken::new(),
                )
                .await
        })
    };

    let outcome_a = a.await.unwrap().unwrap();
    let outcome_b = b.await.unwrap().unwrap();

    assert_eq!(outcome_a.successful_imports, 1);
    assert_eq!(outcome_b.successful_imports, 1);

    let instants = geocoder.call_instants();
    assert!(instants.len() >= 2);
    assert_spaced(&instants);
    assert_eq!(count_cases(&pool).await, 2);
}

/// TC-CONC-003: Cancellation mid-import stops before persisting
#[tokio::test]
async fn tc_conc_003_cancel_during_geocoding() {
    let pool = create_test_db().await;
    let geocoder = Arc::new(ScriptedGeocoder::new());
    let gate: Arc<dyn RequestGate> = Arc::new(MinIntervalGate::new(INTERVAL));
    let importer = Arc::new(create_test_importer(&pool, geocoder.clone(), gate));

    // Each row needs several spaced lookups, so this takes well over a second
    let mut csv = String::from("year,age,classification,city\n");
    for i in 0..5 {
        csv.push_str(&format!("2024,{},Dengue grave,Pueblo {}\n", 20 + i, i));
    }

    let token = CancellationToken::new();
    let handle = {
        let importer = importer.clone();
        let token = token.clone();
        tokio::spawn(async move {
            importer
                .import(ImportSource::new("casos.csv", csv), Uuid::new_v4(), &token)
                .await
        })
    };

    tokio::time::sleep(INTERVAL * 3).await;
    token.cancel();

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(casemap_import::ImportError::Cancelled)));
    assert_eq!(count_cases(&pool).await, 0);
    assert!(!geocoder.queries().is_empty());
}
