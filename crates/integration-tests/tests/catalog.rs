//! Catalog proxy and health endpoints.

#![allow(clippy::unwrap_used)]

use serde_json::Value;
use tienda_integration_tests::TestContext;

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;

    let resp = ctx.get(&ctx.client, "/health").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");

    // No database pool in tests, so readiness only reports the process.
    let resp = ctx.get(&ctx.client, "/health/ready").await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .get(ctx.url("/health"))
        .header("x-request-id", "req-abc123")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers().get("x-request-id").unwrap().to_str().unwrap(),
        "req-abc123"
    );

    let resp = ctx.get(&ctx.client, "/health").await;
    assert!(resp.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn test_list_products() {
    let ctx = TestContext::new().await;

    let resp = ctx.get(&ctx.client, "/api/products").await;
    assert_eq!(resp.status(), 200);
    let page: Value = resp.json().await.unwrap();

    assert_eq!(page["total"], 4);
    assert_eq!(page["pagina_actual"], 1);
    assert_eq!(page["productos"].as_array().unwrap().len(), 4);
    // String stock from the backend is normalized.
    assert_eq!(page["productos"][1]["stock"], 2);
}

#[tokio::test]
async fn test_search_and_category_filters_are_forwarded() {
    let ctx = TestContext::new().await;

    let page: Value = ctx
        .get(&ctx.client, "/api/products?buscar=galaxy")
        .await
        .json()
        .await
        .unwrap();
    let productos = page["productos"].as_array().unwrap();
    assert_eq!(productos.len(), 1);
    assert_eq!(productos[0]["nombre"], "Samsung Galaxy A15");

    let page: Value = ctx
        .get(&ctx.client, "/api/products?categoria=1&pagina=2")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["productos"].as_array().unwrap().len(), 2);
    assert_eq!(page["pagina_actual"], 2);
}

#[tokio::test]
async fn test_show_product() {
    let ctx = TestContext::new().await;

    let resp = ctx.get(&ctx.client, "/api/products/1").await;
    assert_eq!(resp.status(), 200);
    let product: Value = resp.json().await.unwrap();
    assert_eq!(product["id_producto"], 1);
    assert_eq!(product["precio"], 3299.0);
    assert_eq!(product["imagenes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let ctx = TestContext::new().await;

    let resp = ctx.get(&ctx.client, "/api/products/999").await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Producto no encontrado.");
}

#[tokio::test]
async fn test_categories_are_cached() {
    let ctx = TestContext::new().await;

    let first: Value = ctx
        .get(&ctx.client, "/api/categories")
        .await
        .json()
        .await
        .unwrap();
    let second: Value = ctx
        .get(&ctx.client, "/api/categories")
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0]["nombre"], "Celulares");
    assert_eq!(first[0]["subcategorias"][0]["nombre"], "Android");
    assert!(first[1]["subcategorias"].as_array().unwrap().is_empty());
    assert_eq!(ctx.catalog.category_hits(), 1);
}

#[tokio::test]
async fn test_banners_are_active_and_ordered() {
    let ctx = TestContext::new().await;

    let banners: Value = ctx
        .get(&ctx.client, "/api/banners")
        .await
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = banners
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id_banner"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 1]);
}

#[tokio::test]
async fn test_services() {
    let ctx = TestContext::new().await;

    let services: Value = ctx
        .get(&ctx.client, "/api/services")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(services[0]["nombre"], "Recargas");
}
