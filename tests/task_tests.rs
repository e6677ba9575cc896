//! Integration tests for server-side task monitoring.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use varda_client::clients::{HttpMethod, HttpResponse};
use varda_client::rest::resources::{NewAnnotation, NewVariation, ResourceKind};
use varda_client::rest::{ResourceError, ResourceRef, TaskedResource};

use common::{path, session, wrapped, MockTransport};

fn variation(task: Value) -> HttpResponse {
    wrapped(
        "variation",
        json!({
            "uri": "/variations/2",
            "task": task,
            "sample": {"uri": "/samples/1"},
            "data_source": {"uri": "/data_sources/4"}
        }),
    )
}

/// Serves `/variations/2` with the given task states in order, repeating the
/// last one.
fn variation_server(states: Vec<Value>) -> (Arc<MockTransport>, Arc<AtomicUsize>) {
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = polls.clone();
    let transport = MockTransport::new(move |request| match (request.http_method, path(request)) {
        (HttpMethod::Get, "/variations/2") => {
            let index = counter.fetch_add(1, Ordering::SeqCst).min(states.len() - 1);
            variation(states[index].clone())
        }
        (HttpMethod::Patch, "/variations/2") => HttpResponse::json(200, &json!({})),
        _ => HttpResponse::text(404, ""),
    });
    (transport, polls)
}

#[test]
fn test_monitor_reports_progress_until_success() {
    let (transport, polls) = variation_server(vec![
        json!({"waiting": true}),
        json!({"waiting": true}),
        json!({"running": true, "progress": 40}),
        json!({"success": true, "progress": 100}),
    ]);
    let session = session(&transport);
    let mut variation = session.get_variation("/variations/2").unwrap();
    assert!(variation.task().unwrap().waiting);

    let states: Vec<Option<u8>> = variation
        .wait_and_monitor()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(states, vec![None, None, Some(100)]);
    assert_eq!(polls.load(Ordering::SeqCst), 4);
    assert!(variation.task().unwrap().success);
}

#[test]
fn test_wait_returns_task_failure() {
    let (transport, _) = variation_server(vec![
        json!({"running": true}),
        json!({"failure": true, "error": {"code": "bad_vcf", "message": "Invalid VCF header"}}),
    ]);
    let session = session(&transport);
    let mut variation = session.get_variation("/variations/2").unwrap();

    match variation.wait().unwrap_err() {
        ResourceError::TaskFailed { code, message } => {
            assert_eq!(code, "bad_vcf");
            assert_eq!(message, "Invalid VCF header");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_failure_without_error_object_uses_defaults() {
    let (transport, _) = variation_server(vec![json!({"failure": true})]);
    let session = session(&transport);
    let mut variation = session.get_variation("/variations/2").unwrap();

    let results: Vec<_> = variation.wait_and_monitor().collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        &results[0],
        Err(ResourceError::TaskFailed { code, .. }) if code == "task_failed"
    ));
}

#[test]
fn test_monitor_can_be_abandoned() {
    let (transport, polls) = variation_server(vec![json!({"running": true})]);
    let session = session(&transport);
    let mut variation = session.get_variation("/variations/2").unwrap();

    let first_two: Vec<_> = variation.wait_and_monitor().take(2).collect();
    assert_eq!(first_two.len(), 2);
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_resubmit_patches_task_and_reloads() {
    let (transport, _) = variation_server(vec![
        json!({"failure": true}),
        json!({"waiting": true}),
    ]);
    let session = session(&transport);
    let mut variation = session.get_variation("/variations/2").unwrap();
    assert!(variation.task().unwrap().failure);

    variation.resubmit().unwrap();

    let requests = transport.requests();
    assert_eq!(requests[1].0, HttpMethod::Patch);
    assert_eq!(requests[1].2, Some(json!({"task": {}})));
    assert!(variation.task().unwrap().waiting);
}

#[test]
fn test_create_variation_sends_import_options() {
    let transport = MockTransport::new(|request| match request.http_method {
        HttpMethod::Post => HttpResponse::json(201, &json!({}))
            .with_header("Location", "http://varda.test/variations/2"),
        _ => variation(json!({"waiting": true})),
    });
    let session = session(&transport);

    session
        .create_variation(NewVariation::new(
            ResourceRef::new(ResourceKind::Sample, "/samples/1"),
            ResourceRef::new(ResourceKind::DataSource, "/data_sources/4"),
        ))
        .unwrap();

    assert_eq!(
        transport.requests()[0].2,
        Some(json!({
            "sample": "/samples/1",
            "data_source": "/data_sources/4",
            "skip_filtered": true,
            "use_genotypes": true,
            "prefer_genotype_likelihoods": false
        }))
    );
}

#[test]
fn test_create_annotation_sends_queries() {
    let transport = MockTransport::new(|request| match request.http_method {
        HttpMethod::Post => HttpResponse::json(201, &json!({}))
            .with_header("Location", "http://varda.test/annotations/6"),
        _ => wrapped(
            "annotation",
            json!({
                "uri": "/annotations/6",
                "task": {"waiting": true},
                "original_data_source": {"uri": "/data_sources/4"},
                "annotated_data_source": {"uri": "/data_sources/7"}
            }),
        ),
    });
    let session = session(&transport);

    let annotation = session
        .create_annotation(
            NewAnnotation::new(ResourceRef::new(ResourceKind::DataSource, "/data_sources/4"))
                .name("exome annotated")
                .query("GLOBAL", "*"),
        )
        .unwrap();

    assert_eq!(
        transport.requests()[0].2,
        Some(json!({
            "data_source": "/data_sources/4",
            "name": "exome annotated",
            "queries": [{"name": "GLOBAL", "expression": "*"}]
        }))
    );
    assert_eq!(
        annotation.annotated_data_source().unwrap(),
        Some(ResourceRef::new(ResourceKind::DataSource, "/data_sources/7"))
    );
    assert!(!annotation.task().unwrap().is_done());
}
