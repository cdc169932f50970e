use std::collections::HashMap;

use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use partsync_catalog::{CatalogClient, ProductCatalog, RequestSigner};
use partsync_core::{Lookup, ProductId, SyncConfig};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let app = Router::new().route("/api/product", get(product));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn config(base_url: &str) -> SyncConfig {
    let env: HashMap<&str, &str> = [
        ("SYNC_API_BASE_URL", base_url),
        ("SYNC_API_ACRONYM", "ACME"),
        ("SYNC_API_PERSON", "jan"),
        ("SYNC_API_PASSWORD", "secret"),
        ("SYNC_API_KEY", "k3y"),
        ("SYNC_SUPPLIER", "Gaska"),
        ("SYNC_DB_HOST", "localhost"),
        ("SYNC_DB_NAME", "shop"),
        ("SYNC_DB_USER", "sync"),
        ("SYNC_DB_PASSWORD", ""),
        ("SYNC_TABLE_PRODUCTS", "products"),
        ("SYNC_TABLE_APPLICATIONS", "product_applications"),
        ("SYNC_TABLE_CROSS_NUMBERS", "product_cross_numbers"),
        ("SYNC_TABLE_PACKAGES", "product_packages"),
        ("SYNC_TABLE_PARAMETERS", "product_parameters"),
        ("SYNC_TABLE_IMAGES", "product_images"),
        ("SYNC_TABLE_FILES", "product_files"),
        ("SYNC_FETCH_INTERVAL_SECONDS", "0"),
    ]
    .into_iter()
    .collect();
    SyncConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap()
}

fn expected_headers() -> (String, String) {
    let signer = RequestSigner::new(&config("http://unused.invalid").api);
    (signer.authorization(), signer.signature())
}

fn json(body: &'static str) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn product(Query(query): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
    let (authorization, signature) = expected_headers();
    if headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        != Some(authorization.as_str())
        || headers.get("x-signature").and_then(|v| v.to_str().ok()) != Some(signature.as_str())
    {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if query.get("lng").map(String::as_str) != Some("pl") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match query.get("id").map(String::as_str) {
        Some("42") => json(
            r#"{"Product":{"id":42,"codeGaska":"X1","name":"Pump","supplier":"Wrong",
                "applications":[{"id":1,"name":"Pumps"}],
                "crossNumbers":[{"crossNumber":"AA-1, BB-2","crossManufacturer":"ACME"}]}}"#,
        ),
        Some("43") => json(r#"{"Product":{"id":43,"codeGaska":"X2","name":"Va\ud800lve"}}"#),
        Some("7") => json(r#"{"Product":null}"#),
        Some("13") => json("{oops"),
        Some("500") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => (StatusCode::NOT_FOUND, "no such product").into_response(),
    }
}

#[tokio::test]
async fn fetches_product_and_stamps_supplier() {
    let server = TestServer::spawn().await;
    let client = CatalogClient::new(&config(&server.base_url)).unwrap();

    let product = match client.fetch_product(ProductId::new(42)).await {
        Lookup::Found(product) => product,
        other => panic!("expected product, got {other:?}"),
    };

    assert_eq!(product.external_code, "X1");
    assert_eq!(product.supplier, "Gaska");
    assert_eq!(product.applications().len(), 1);
    assert_eq!(product.cross_numbers()[0].cross_number, "AA-1, BB-2");
    assert!(product.images.is_none());
}

#[tokio::test]
async fn unpaired_surrogate_does_not_lose_the_product() {
    let server = TestServer::spawn().await;
    let client = CatalogClient::new(&config(&server.base_url)).unwrap();

    let product = client.fetch_product(ProductId::new(43)).await.found().unwrap();
    assert_eq!(product.name, "Valve");
    assert_eq!(product.external_code, "X2");
}

#[tokio::test]
async fn missing_product_in_envelope_is_not_found() {
    let server = TestServer::spawn().await;
    let client = CatalogClient::new(&config(&server.base_url)).unwrap();

    assert_eq!(client.fetch_product(ProductId::new(7)).await, Lookup::NotFound);
}

#[tokio::test]
async fn failures_degrade_to_failed_lookup() {
    let server = TestServer::spawn().await;
    let client = CatalogClient::new(&config(&server.base_url)).unwrap();

    for id in [13, 500, 404] {
        match client.fetch_product(ProductId::new(id)).await {
            Lookup::Failed(reason) => assert!(!reason.is_empty()),
            other => panic!("expected failure for id {id}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn unreachable_catalog_degrades_to_failed_lookup() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = CatalogClient::new(&config(&format!("http://{addr}/api"))).unwrap();
    assert!(matches!(
        client.fetch_product(ProductId::new(42)).await,
        Lookup::Failed(_)
    ));
}
