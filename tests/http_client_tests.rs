//! End-to-end tests of the HTTP stack against a local mock server.
//!
//! The client is blocking, so every client call runs on a blocking task
//! while the mock server runs on the test runtime.

use serde_json::json;
use varda_client::clients::{ApiError, Upload};
use varda_client::rest::resources::{NewDataSource, SampleFilters};
use varda_client::rest::{ResourceError, RestResource};
use varda_client::{ApiRoot, ApiToken, ClientConfig, Session};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with_root() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "root": {
                "sample_collection": {"uri": "/samples/"},
                "data_source_collection": {"uri": "/data_sources/"},
                "authentication": {"uri": "/authentication"}
            }
        })))
        .mount(&server)
        .await;
    server
}

fn connect(uri: String) -> Result<Session, ResourceError> {
    let config = ClientConfig::builder()
        .api_root(ApiRoot::new(uri).unwrap())
        .token(ApiToken::new("wire-token").unwrap())
        .collection_cache_size(2)
        .build()
        .unwrap();
    Session::new(config)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_sample_over_the_wire() {
    let server = server_with_root().await;
    Mock::given(method("GET"))
        .and(path("/samples/1"))
        .and(header("Authorization", "Token wire-token"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sample": {"uri": "/samples/1", "name": "wire sample", "pool_size": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let name = tokio::task::spawn_blocking(move || {
        let session = connect(uri)?;
        let sample = session.get_sample("/samples/1")?;
        Ok::<_, ResourceError>(sample.name()?)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(name.as_deref(), Some("wire sample"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_collection_pages_use_range_headers() {
    let server = server_with_root().await;
    Mock::given(method("GET"))
        .and(path("/samples/"))
        .and(header("Range", "items=0-1"))
        .and(body_json(json!({"public": true})))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "items 0-1/3")
                .set_body_json(json!({"sample_collection": {"items": [
                    {"uri": "/samples/1"}, {"uri": "/samples/2"}
                ]}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/samples/"))
        .and(header("Range", "items=2-3"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "items 2-2/3")
                .set_body_json(json!({"sample_collection": {"items": [
                    {"uri": "/samples/3"}
                ]}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let uris = tokio::task::spawn_blocking(move || {
        let session = connect(uri)?;
        session
            .samples(SampleFilters::default().public(true))?
            .map(|sample| sample.map(|sample| sample.uri().to_string()))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(uris, vec!["/samples/1", "/samples/2", "/samples/3"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_body_is_parsed() {
    let server = server_with_root().await;
    Mock::given(method("GET"))
        .and(path("/samples/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "not_found", "message": "The requested entity could not be found"}
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let error = tokio::task::spawn_blocking(move || {
        let session = connect(uri).unwrap();
        session.get_sample("/samples/9").unwrap_err()
    })
    .await
    .unwrap();

    assert!(matches!(
        error,
        ResourceError::Api(ApiError::NotFound { ref code, .. }) if code == "not_found"
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_is_sent_as_multipart() {
    let server = server_with_root().await;
    Mock::given(method("POST"))
        .and(path("/data_sources/"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", format!("{}/data_sources/4", server.uri()).as_str())
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data_sources/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data_source": {"uri": "/data_sources/4", "name": "calls", "filetype": "vcf"}
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        let session = connect(uri)?;
        session.create_data_source(
            NewDataSource::new("calls", "vcf")
                .data(Upload::from_bytes("##fileformat=VCFv4.1\n").with_filename("calls.vcf")),
        )
    })
    .await
    .unwrap()
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|request| request.url.path() == "/data_sources/")
        .unwrap();
    let body = String::from_utf8_lossy(&upload.body);
    assert!(body.contains("name=\"name\""));
    assert!(body.contains("filename=\"calls.vcf\""));
    assert!(body.contains("##fileformat=VCFv4.1"));
}

#[test]
fn test_unreachable_server_is_a_transport_error() {
    let result = connect("http://127.0.0.1:1".to_string());
    assert!(matches!(result, Err(ResourceError::Transport(_))));
}
