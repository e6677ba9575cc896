//! Integration tests for sessions: endpoint resolution, creation, error
//! mapping, and the authenticated user.

mod common;

use std::collections::BTreeMap;
use std::io::Read;

use serde_json::json;
use varda_client::clients::{ApiError, HttpMethod, HttpResponse, Upload};
use varda_client::rest::resources::{
    NewDataSource, NewGroup, NewSample, NewUser, NewVariant, ResourceKind, Role,
};
use varda_client::rest::{FieldError, ResourceError, ResourceRef, RestResource};
use varda_client::{ClientConfig, Session};

use common::{error_response, no_headers, path, sample_json, session, session_with, wrapped, MockTransport};

#[test]
fn test_build_resolves_endpoints() {
    let transport = MockTransport::new(|_| HttpResponse::text(404, ""));
    let session = session(&transport);

    assert_eq!(session.endpoint("sample_collection").unwrap(), "/samples/");
    assert_eq!(session.endpoint("genome").unwrap(), "/genome");
    assert!(!session.endpoints().contains_key("status"));
    assert!(matches!(
        session.endpoint("nonexistent"),
        Err(ResourceError::MissingEndpoint { .. })
    ));
}

#[test]
fn test_build_fails_on_malformed_root() {
    let transport = MockTransport::without_root(|_| HttpResponse::json(200, &json!({"status": "ok"})));
    let result = Session::builder().transport(transport).build();
    assert!(matches!(result, Err(ResourceError::InvalidResponse { .. })));
}

#[test]
fn test_build_fails_when_root_is_unreachable() {
    let transport = MockTransport::without_root(|_| error_response(503, "maintenance", "Down"));
    let result = Session::builder().transport(transport).build();
    assert!(matches!(
        result,
        Err(ResourceError::Api(ApiError::Other { status: 503, .. }))
    ));
}

#[test]
fn test_requests_carry_default_headers() {
    let transport = MockTransport::new(|request| {
        assert_eq!(request.header("authorization"), Some("Token test-token"));
        assert_eq!(
            request.header("accept-version"),
            Some(varda_client::clients::ACCEPT_VERSION)
        );
        wrapped("sample", sample_json(3, "exome batch"))
    });
    let session = session(&transport);
    session.get_sample("/samples/3").unwrap();
}

#[test]
fn test_create_sample_posts_values_and_fetches_location() {
    let transport = MockTransport::new(|request| match (request.http_method, path(request)) {
        (HttpMethod::Post, "/samples/") => HttpResponse::json(201, &json!({"sample": {"uri": "/samples/3"}}))
            .with_header("Location", "http://varda.test/samples/3"),
        (HttpMethod::Get, "/samples/3") => {
            let mut sample = sample_json(3, "test sample");
            sample["pool_size"] = json!(5);
            sample["public"] = json!(true);
            wrapped("sample", sample)
        }
        _ => HttpResponse::text(404, ""),
    });
    let session = session(&transport);

    let sample = session
        .create_sample(NewSample::new("test sample").pool_size(5).public(true))
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, HttpMethod::Post);
    assert_eq!(requests[0].1, "/samples/");
    assert_eq!(
        requests[0].2,
        Some(json!({
            "name": "test sample",
            "pool_size": 5,
            "coverage_profile": true,
            "public": true
        }))
    );
    assert_eq!(requests[1].0, HttpMethod::Get);
    assert_eq!(requests[1].1, "/samples/3");

    assert_eq!(sample.uri(), "/samples/3");
    assert_eq!(sample.pool_size().unwrap(), Some(5));
    assert!(!sample.is_dirty());
}

#[test]
fn test_create_user_sends_roles() {
    let transport = MockTransport::new(|request| match request.http_method {
        HttpMethod::Post => HttpResponse::json(201, &json!({}))
            .with_header("Location", "http://varda.test/users/2"),
        _ => wrapped(
            "user",
            json!({"uri": "/users/2", "login": "gerard", "name": "gerard", "roles": ["importer"]}),
        ),
    });
    let session = session(&transport);

    let user = session
        .create_user(NewUser::new("gerard", "secret").role(Role::Importer))
        .unwrap();

    assert_eq!(
        transport.requests()[0].2,
        Some(json!({
            "login": "gerard",
            "password": "secret",
            "name": "gerard",
            "roles": ["importer"]
        }))
    );
    assert_eq!(user.name().unwrap().as_deref(), Some("gerard"));
}

#[test]
fn test_create_without_location_is_an_invalid_response() {
    let transport = MockTransport::new(|_| HttpResponse::json(201, &json!({})));
    let session = session(&transport);

    let error = session.create_group(NewGroup::new("lab members")).unwrap_err();
    assert!(matches!(error, ResourceError::InvalidResponse { .. }));
}

#[test]
fn test_create_data_source_uploads_multipart() {
    let transport = MockTransport::new(|request| match request.http_method {
        HttpMethod::Post => HttpResponse::json(201, &json!({}))
            .with_header("Location", "http://varda.test/data_sources/4"),
        _ => wrapped(
            "data_source",
            json!({"uri": "/data_sources/4", "name": "exome", "filetype": "vcf", "gzipped": false}),
        ),
    });
    let session = session(&transport);

    let data_source = session
        .create_data_source(
            NewDataSource::new("exome", "vcf")
                .data(Upload::from_bytes("##fileformat=VCFv4.1\n").with_filename("exome.vcf")),
        )
        .unwrap();

    let (fields, files) = transport.last_multipart().unwrap();
    assert!(fields.contains(&("name".to_string(), "exome".to_string())));
    assert!(fields.contains(&("filetype".to_string(), "vcf".to_string())));
    assert!(fields.contains(&("gzipped".to_string(), "false".to_string())));
    assert_eq!(files, vec![("data".to_string(), "exome.vcf".to_string())]);
    assert_eq!(data_source.name().unwrap().as_deref(), Some("exome"));
}

#[test]
fn test_data_is_streamed_in_chunks() {
    let transport = MockTransport::new(|request| match path(request) {
        "/data_sources/4" => wrapped(
            "data_source",
            json!({"uri": "/data_sources/4", "data": {"uri": "/data_sources/4/data"}}),
        ),
        "/data_sources/4/data" => HttpResponse::text(200, "chr1\t10\t20\nchr2\t30\t40\n"),
        _ => HttpResponse::text(404, ""),
    });
    let session = session_with(&transport, ClientConfig::builder().data_buffer_size(8));

    let data_source = session.get_data_source("/data_sources/4").unwrap();
    let chunks: Vec<Vec<u8>> = data_source
        .data_chunks()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert!(chunks.iter().all(|chunk| chunk.len() <= 8));
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks.concat(), b"chr1\t10\t20\nchr2\t30\t40\n");
}

#[test]
fn test_error_statuses_map_to_variants() {
    let transport = MockTransport::new(|request| match path(request) {
        "/samples/404" => error_response(404, "not_found", "The requested entity could not be found"),
        "/samples/403" => error_response(403, "forbidden", "Not allowed to see this sample"),
        "/samples/400" => error_response(400, "bad_request", "Invalid sample"),
        _ => HttpResponse::text(500, "<html>Internal Server Error</html>"),
    });
    let session = session(&transport);

    match session.get_sample("/samples/404").unwrap_err() {
        ResourceError::Api(ApiError::NotFound { code, message }) => {
            assert_eq!(code, "not_found");
            assert_eq!(message, "The requested entity could not be found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        session.get_sample("/samples/403"),
        Err(ResourceError::Api(ApiError::Forbidden { .. }))
    ));
    assert!(matches!(
        session.get_sample("/samples/400"),
        Err(ResourceError::Api(ApiError::BadRequest { .. }))
    ));

    let error = session.get_sample("/samples/500").unwrap_err();
    let api = error.as_api().unwrap();
    assert_eq!(api.status(), 500);
    assert_eq!(api.code(), "Internal Server Error");
    assert_eq!(api.message(), "<html>Internal Server Error</html>");
}

#[test]
fn test_authenticated_user() {
    let transport = MockTransport::new(|request| match path(request) {
        "/authentication" => HttpResponse::json(
            200,
            &json!({"authentication": {"authenticated": true, "user": {"uri": "/users/1"}}}),
        ),
        "/users/1" => wrapped(
            "user",
            json!({"uri": "/users/1", "login": "admin", "roles": ["admin"]}),
        ),
        _ => HttpResponse::text(404, ""),
    });
    let session = session(&transport);

    let user = session.authenticated_user().unwrap().unwrap();
    assert_eq!(user.login().unwrap().as_deref(), Some("admin"));
    assert_eq!(user.roles().unwrap().into_iter().collect::<Vec<_>>(), vec![Role::Admin]);
}

#[test]
fn test_anonymous_session_has_no_user() {
    let transport = MockTransport::new(|_| {
        HttpResponse::json(
            200,
            &json!({"authentication": {"authenticated": false, "user": null}}),
        )
    });
    let session = session(&transport);
    assert!(session.authenticated_user().unwrap().is_none());
}

#[test]
fn test_variant_annotation() {
    let transport = MockTransport::new(|request| match (request.http_method, path(request)) {
        (HttpMethod::Post, "/variants/") => HttpResponse::json(201, &json!({}))
            .with_header("Location", "http://varda.test/variants/5"),
        (HttpMethod::Get, "/variants/5") => {
            let Some(body) = request.body.as_json() else {
                return wrapped(
                    "variant",
                    json!({"uri": "/variants/5", "chromosome": "1", "position": 100_000,
                           "reference": "A", "observed": "T"}),
                );
            };
            assert_eq!(body, &json!({"queries": [{"name": "GLOBAL", "expression": "*"}]}));
            wrapped(
                "variant",
                json!({
                    "uri": "/variants/5",
                    "annotations": {
                        "GLOBAL": {"coverage": 10, "frequency": 0.5,
                                   "frequency_het": 0.3, "frequency_hom": 0.2}
                    }
                }),
            )
        }
        _ => HttpResponse::text(404, ""),
    });
    let session = session(&transport);

    let variant = session
        .create_variant(NewVariant::new("1", 100_000).reference("A").observed("T"))
        .unwrap();
    assert_eq!(
        transport.requests()[0].2,
        Some(json!({"chromosome": "1", "position": 100_000, "reference": "A", "observed": "T"}))
    );
    assert_eq!(variant.position().unwrap(), Some(100_000));

    let queries = BTreeMap::from([("GLOBAL".to_string(), "*".to_string())]);
    let frequencies = variant.annotate(&queries).unwrap();
    let global = &frequencies["GLOBAL"];
    assert_eq!(global.coverage, 10);
    assert!((global.frequency - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_create_rejects_link_of_wrong_kind() {
    let transport = MockTransport::new(|_| HttpResponse::text(404, ""));
    let session = session(&transport);

    let error = session
        .create_sample(
            NewSample::new("x").group(ResourceRef::new(ResourceKind::User, "/users/1")),
        )
        .unwrap_err();
    assert!(matches!(
        error,
        ResourceError::Field(FieldError::WrongType { .. })
    ));
    assert!(transport.requests().is_empty());
}

#[test]
fn test_raw_requests_return_the_response() {
    let transport = MockTransport::new(|request| {
        HttpResponse::text(200, "A").with_header("X-Path", path(request).to_string())
    });
    let session = session(&transport);

    let response = session.get("/genome", None, no_headers()).unwrap();
    assert_eq!(response.header("x-path"), Some("/genome"));
    let mut body = String::new();
    response.into_body().read_to_string(&mut body).unwrap();
    assert_eq!(body, "A");
}
