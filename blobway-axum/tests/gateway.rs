use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use blobway_axum::{BlobGateway, CachePolicy, GatewayApp, GatewayConfig};
use blobway_core::{ErrorKind, Mode};
use blobway_store::{BlobConfig, BlobResult, MemoryBackend, Namespace, Sublevel, WriteReceipt};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

fn gateway(backend: Arc<MemoryBackend>, config: GatewayConfig) -> BlobGateway {
    BlobGateway::new(Sublevel::root(backend), config)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_if_none_match(uri: &str, tag: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::IF_NONE_MATCH, tag)
        .body(Body::empty())
        .unwrap()
}

async fn send(gateway: &BlobGateway, req: Request<Body>) -> Response {
    gateway.router().oneshot(req).await.unwrap()
}

async fn body_bytes(res: Response) -> Vec<u8> {
    res.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn json_body(res: Response) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

/// Root blob "42" whose seventh write leaves it at version 7
async fn store_with_blob_42() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    let blobs = gateway(backend.clone(), GatewayConfig::default()).writer();
    for round in 1..=7 {
        blobs.write("42", format!("answer v{round}").into_bytes()).await.unwrap();
    }
    backend
}

#[tokio::test]
async fn get_streams_blob_with_version_etag() {
    let gw = gateway(store_with_blob_42().await, GatewayConfig::default());

    let res = send(&gw, get("/files/42")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::ETAG], "7");
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(res.headers()[header::CONTENT_LENGTH], "9");
    assert_eq!(body_bytes(res).await, b"answer v7");
}

#[tokio::test]
async fn matching_etag_is_not_modified() {
    let gw = gateway(store_with_blob_42().await, GatewayConfig::default());

    let res = send(&gw, get_if_none_match("/files/42", "7")).await;
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(res.headers()[header::ETAG], "7");
    assert!(body_bytes(res).await.is_empty());
}

#[tokio::test]
async fn stale_etag_gets_full_body() {
    let gw = gateway(store_with_blob_42().await, GatewayConfig::default());

    let res = send(&gw, get_if_none_match("/files/42", "\"6\"")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::ETAG], "7");
    assert_eq!(body_bytes(res).await, b"answer v7");
}

#[tokio::test]
async fn rewrite_invalidates_client_copy() {
    let backend = store_with_blob_42().await;
    let gw = gateway(backend, GatewayConfig::default());
    gw.writer().write("42", "newer").await.unwrap();

    let res = send(&gw, get_if_none_match("/files/42", "7")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::ETAG], "8");
    assert_eq!(body_bytes(res).await, b"newer");
}

#[tokio::test]
async fn existence_only_policy_ignores_validators() {
    let config = GatewayConfig::default().with_policy(CachePolicy::ExistenceOnly);
    let gw = gateway(store_with_blob_42().await, config);

    let res = send(&gw, get_if_none_match("/files/42", "7")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::ETAG).is_none());
    assert_eq!(body_bytes(res).await, b"answer v7");
}

#[tokio::test]
async fn missing_blob_in_nested_namespace_is_404() {
    let gw = gateway(Arc::new(MemoryBackend::new()), GatewayConfig::default());

    let res = send(&gw, get("/files/a/b/42")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotFound");
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn nested_blob_is_served_from_its_partition() {
    let backend = Arc::new(MemoryBackend::new());
    let root = Sublevel::root(backend.clone());
    let music = root.sublevel("music").await.unwrap();
    let blobs = blobway_store::BlobAdapter::new(music, BlobConfig::default());
    blobs.write("song.mp3", b"ID3".to_vec()).await.unwrap();

    let gw = gateway(backend, GatewayConfig::default());

    let res = send(&gw, get(&blobs.url("song.mp3"))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(body_bytes(res).await, b"ID3");

    // Same id at the root is a different key
    let res = send(&gw, get("/files/song.mp3")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn percent_encoded_segments_are_decoded() {
    let backend = Arc::new(MemoryBackend::new());
    let root = Sublevel::root(backend.clone());
    let docs = root.sublevel("my docs").await.unwrap();
    blobway_store::BlobAdapter::new(docs, BlobConfig::default())
        .write("q1 report.txt", "numbers")
        .await
        .unwrap();

    let gw = gateway(backend, GatewayConfig::default());
    let res = send(&gw, get("/files/my%20docs/q1%20report.txt")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(body_bytes(res).await, b"numbers");
}

#[tokio::test]
async fn unknown_paths_are_404() {
    let gw = gateway(store_with_blob_42().await, GatewayConfig::default());

    for uri in ["/nonsense", "/", "/files", "/files/", "/file/42"] {
        let res = send(&gw, get(uri)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn unusable_namespace_chains_are_404() {
    let config = GatewayConfig::default()
        .with_store(BlobConfig::default().with_max_namespace_depth(2));
    let backend = Arc::new(MemoryBackend::new());
    let gw = gateway(backend.clone(), config);

    for uri in ["/files//42", "/files/../42", "/files/a/b/c/42"] {
        let res = send(&gw, get(uri)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    assert!(backend.is_empty());
}

#[tokio::test]
async fn not_found_requests_leave_no_partitions_behind() {
    let backend = Arc::new(MemoryBackend::new());
    let gw = gateway(backend.clone(), GatewayConfig::default());

    for i in 0..50 {
        let res = send(&gw, get(&format!("/files/junk{i}/x/42"))).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let junk = Namespace::root().child(&format!("junk{i}"));
        assert!(!backend.has_partition(&junk));
        assert!(!backend.has_partition(&junk.child("x")));
    }
    assert!(backend.is_empty());
}

#[tokio::test]
async fn dropped_response_releases_the_read_stream() {
    let backend = Arc::new(MemoryBackend::with_chunk_bytes(2));
    let gw = gateway(backend.clone(), GatewayConfig::default());
    gw.writer().write("big.bin", "abcdefgh").await.unwrap();

    let res = send(&gw, get("/files/big.bin")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(backend.live_streams(), 1);

    let mut body = res.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    assert_eq!(frame.into_data().unwrap(), "ab");
    assert_eq!(backend.live_streams(), 1);

    // Client goes away after the first chunk
    drop(body);
    assert_eq!(backend.live_streams(), 0);
}

#[tokio::test]
async fn favicon_is_empty_ok() {
    let gw = gateway(Arc::new(MemoryBackend::new()), GatewayConfig::default());

    let res = send(&gw, get("/favicon.ico")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_bytes(res).await.is_empty());
}

#[tokio::test]
async fn other_methods_are_rejected() {
    let gw = gateway(store_with_blob_42().await, GatewayConfig::default());

    for method in ["POST", "PUT", "DELETE", "HEAD"] {
        let req = Request::builder()
            .method(method)
            .uri("/files/42")
            .body(Body::empty())
            .unwrap();
        let res = send(&gw, req).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(res.headers()[header::ALLOW], "GET");
    }
}

#[tokio::test]
async fn store_failure_is_verbose_in_development() {
    let backend = store_with_blob_42().await;
    backend.set_unavailable(true);
    let gw = gateway(backend, GatewayConfig::default().with_mode(Mode::Development));

    let res = send(&gw, get("/files/42")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(res).await;
    assert_eq!(body["name"], "GeneralError");
    assert_eq!(body["message"], "Blob store failure");
    let detail = body["detail"].to_string();
    assert!(detail.contains("partition unreachable"), "{detail}");
}

#[tokio::test]
async fn store_failure_is_redacted_in_production() {
    let backend = store_with_blob_42().await;
    backend.set_unavailable(true);
    let gw = gateway(backend, GatewayConfig::default().with_mode(Mode::Production));

    let res = send(&gw, get("/files/42")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(res).await;
    assert_eq!(body["message"], "Internal Server Error");
    assert!(body.get("detail").is_none());
    assert!(!body.to_string().contains("unreachable"));
}

#[tokio::test]
async fn error_hook_receives_not_found_and_store_failures() {
    let backend = store_with_blob_42().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);

    let gw = gateway(backend.clone(), GatewayConfig::default()).with_error_hook(move |err| {
        seen.fetch_add(1, Ordering::SeqCst);
        let status = match err.kind {
            ErrorKind::NotFound => StatusCode::GONE,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, err.message).into_response()
    });

    let res = send(&gw, get("/files/nope")).await;
    assert_eq!(res.status(), StatusCode::GONE);

    let res = send(&gw, get("/nonsense")).await;
    assert_eq!(res.status(), StatusCode::GONE);

    backend.set_unavailable(true);
    let res = send(&gw, get("/files/42")).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn broken_stream_aborts_the_body() {
    let backend = Arc::new(MemoryBackend::with_chunk_bytes(2));
    let gw = gateway(backend.clone(), GatewayConfig::default());
    gw.writer().write("big.bin", "abcdef").await.unwrap();
    backend.set_broken_streams(true);

    let res = send(&gw, get("/files/big.bin")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.into_body().collect().await.is_err());
}

#[tokio::test]
async fn writer_callback_then_read_back() {
    let gw = gateway(Arc::new(MemoryBackend::new()), GatewayConfig::default());
    let (tx, rx) = tokio::sync::oneshot::channel();

    gw.writer().write_with(
        "hello.txt",
        "hi there",
        Some(Box::new(move |result: BlobResult<WriteReceipt>| {
            let _ = tx.send(result.map(|receipt| receipt.version));
        })),
    );
    let version = rx.await.unwrap().unwrap();

    let url = (gw.url_builder())("hello.txt");
    assert_eq!(url, "/files/hello.txt");

    let res = send(&gw, get(&url)).await;
    assert_eq!(res.headers()[header::ETAG], version.to_string().as_str());
    assert_eq!(body_bytes(res).await, b"hi there");
}

#[tokio::test]
async fn app_router_sets_request_id() {
    let gw = gateway(store_with_blob_42().await, GatewayConfig::default());
    let app = GatewayApp::new(gw);

    let res = app.router.clone().oneshot(get("/files/42")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let req = Request::builder()
        .uri("/files/42")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let res = app.router.oneshot(req).await.unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");
}
