use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use marketplace_search::{
    build_router, config::Config, search::memory::MemoryCatalog, state::State,
};
use serde_json::Value;
use tower::ServiceExt;

pub struct TestServer {
    pub router: Router,
    pub catalog: Arc<MemoryCatalog>,
}

pub fn setup_test_server(catalog: MemoryCatalog) -> TestServer {
    let catalog = Arc::new(catalog);
    let state = State::with_catalog(Config::default(), catalog.clone());

    TestServer {
        router: build_router(state),
        catalog,
    }
}

/// One vendor, one venture, one product, linked by owner.
pub fn maria_lopez() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();

    let maria = catalog.add_vendor("Maria", "Lopez", "maria.lopez@example.com");
    let panaderia = catalog.add_venture(maria, "Panaderia Maria", "Pan recién horneado", "Quito");
    catalog.add_product(panaderia, "Pan Integral", "Harina de trigo integral", 1.75, 30);

    catalog
}

pub async fn get_request(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed to respond");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body was not JSON")
    };

    (status, body)
}
