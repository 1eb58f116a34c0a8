//! HTTP API integration tests
//!
//! Drive the router end to end over an in-memory catalog.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use estimo_api::config::EstimoConfig;
use estimo_api::types::{HealthResponse, RunPipelineResponse, RunStatus};
use estimo_api::{AppState, create_app};
use estimo_core::{CatalogItem, InMemoryCatalog, PriceTier};
use estimo_types::ItemAttributes;
use serde_json::{Value, json};

fn test_catalog() -> Arc<InMemoryCatalog> {
    let catalog = InMemoryCatalog::new().with_tiers(vec![
        PriceTier { id: "retail".into(), title: "Retail".into(), base: true },
        PriceTier { id: "dealer".into(), title: "Dealer".into(), base: false },
    ]);
    catalog.insert_item(CatalogItem::new(
        "card",
        ItemAttributes { width: Some(90.0), length: Some(50.0), ..Default::default() },
    ));
    catalog.insert_item(CatalogItem::new("blank", ItemAttributes::default()));
    Arc::new(catalog)
}

fn create_test_server(catalog: Arc<InMemoryCatalog>) -> TestServer {
    let app = create_app(AppState::new(EstimoConfig::default(), catalog));
    TestServer::new(app).expect("Failed to create test server")
}

fn print_sequence() -> Value {
    json!([
        {"stageCode": "dimensions"},
        {"stageCode": "digital_print", "options": {
            "QUANTITY": "100", "PRICE_PER_SHEET": 25, "COLOR_MODE": "4+4"
        }},
        {"stageCode": "price_markup", "options": {
            "PRICE_MARKUPS": [{"priceTierId": "retail", "ranges": [{"from": 1, "value": 10}]}],
            "MARKETING_PRICE": "Y"
        }}
    ])
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server(test_catalog());

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.calculators, 4);
}

#[tokio::test]
async fn test_dry_run_prices_item() {
    let server = create_test_server(test_catalog());

    let response = server
        .post("/v1/pipeline/run")
        .json(&json!({"targetIds": ["card"], "sequence": print_sequence(), "mode": "dryRun"}))
        .await;

    response.assert_status_ok();
    let body: RunPipelineResponse = response.json();
    assert!(body.success);
    assert_eq!(body.status, RunStatus::Ok);

    let card = &body.results["card"];
    assert_eq!(card.total_cost, 200.0);
    assert!(!card.committed);
    let markup = card.price_components.last().unwrap();
    assert_eq!(markup.stage_code, "price_markup");
    // 200 * 1.1 = 220, charm -> 290
    let prices = markup.prices_by_type.as_ref().unwrap();
    assert_eq!(prices["retail"].ranges[0].price, 290.0);
}

#[tokio::test]
async fn test_partial_batch_and_commit() {
    let catalog = test_catalog();
    let server = create_test_server(catalog.clone());

    let response = server
        .post("/v1/pipeline/run")
        .json(&json!({
            "targetIds": ["card", "blank", "ghost"],
            "sequence": print_sequence(),
            "mode": "commit"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["status"], json!("partial"));
    assert_eq!(body["errors"]["ghost"][0]["message"], json!("target not found"));
    assert_eq!(body["errors"]["ghost"][0]["stageCode"], Value::Null);
    assert_eq!(body["errors"]["blank"][0]["stageCode"], json!("dimensions"));
    assert!(body["errors"].get("card").is_none());
    assert_eq!(body["results"]["card"]["committed"], json!(true));

    let stored = catalog.item("card").unwrap();
    assert_eq!(stored.prices.len(), 1);
    assert_eq!(stored.prices[0].price_tier_id, "retail");
    assert_eq!(stored.prices[0].price, 290.0);
    assert!(catalog.snapshot("blank").is_none());
}

#[tokio::test]
async fn test_ordering_error_is_per_item() {
    let server = create_test_server(test_catalog());

    let response = server
        .post("/v1/pipeline/run")
        .json(&json!({
            "targetIds": ["card"],
            "sequence": [{"stageCode": "price_markup"}]
        }))
        .await;

    response.assert_status_ok();
    let body: RunPipelineResponse = response.json();
    assert_eq!(body.status, RunStatus::Error);
    assert_eq!(body.errors["card"].len(), 1);
    assert!(body.results["card"].price_components.is_empty());
}

#[tokio::test]
async fn test_validation_errors() {
    let server = create_test_server(test_catalog());

    let response = server
        .post("/v1/pipeline/run")
        .json(&json!({"targetIds": [], "sequence": print_sequence()}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
    assert_eq!(body["details"]["field"], json!("targetIds"));

    let response = server.post("/v1/pipeline/run").json(&json!({"targetIds": ["card"]})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calculator_listing() {
    let server = create_test_server(test_catalog());

    let response = server.get("/v1/calculators").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let codes: Vec<&str> = body.as_array().unwrap().iter().map(|d| d["code"].as_str().unwrap()).collect();
    assert_eq!(codes[0], "dimensions");
    assert_eq!(codes.len(), 4);

    let response = server.get("/v1/calculators").add_query_param("includeSystem", true).await;
    response.assert_status_ok();

    let response = server.get("/v1/calculators/lamination").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["positionConstraints"]["requiresBefore"], json!(["dimensions"]));
    assert_eq!(body["group"]["id"], json!("finishing"));

    let response = server.get("/v1/calculators/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_groups_and_price_tiers() {
    let server = create_test_server(test_catalog());

    let response = server.get("/v1/groups").await;
    response.assert_status_ok();
    let groups: Value = response.json();
    assert_eq!(groups[0], json!({"id": "general", "title": "General"}));
    assert!(groups.as_array().unwrap().iter().any(|g| g["id"] == json!("printing")));

    let response = server.get("/v1/calculators/grouped").await;
    response.assert_status_ok();
    let grouped: Value = response.json();
    assert_eq!(grouped[0]["calculators"][0]["code"], json!("dimensions"));

    let response = server.get("/v1/price-tiers").await;
    response.assert_status_ok();
    let tiers: Vec<PriceTier> = response.json();
    assert_eq!(tiers.len(), 2);
    assert!(tiers[0].base);
}
