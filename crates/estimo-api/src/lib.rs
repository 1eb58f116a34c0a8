#![allow(missing_docs)]
//! Estimo HTTP API
//!
//! Exposes the calculator pipeline over HTTP: run a stage sequence for a
//! batch of catalog items (dry run or commit) and browse the calculators a
//! sequence can be built from.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use estimo_calculator::CalculatorRegistry;
use estimo_core::{InMemoryCatalog, PipelineExecutor, PriceTierDirectory};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

pub mod config;
pub mod error;
pub mod handlers;
pub mod service;
pub mod tracing_setup;
pub mod types;

use config::EstimoConfig;
use service::EstimateService;
use types::CatalogSeed;

/// Shared state of the HTTP service
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CalculatorRegistry>,
    pub service: EstimateService,
    pub tiers: Arc<dyn PriceTierDirectory>,
    pub config: Arc<EstimoConfig>,
    started_at: Instant,
}

impl AppState {
    /// State backed by an in-memory catalog.
    pub fn new(config: EstimoConfig, catalog: Arc<InMemoryCatalog>) -> Self {
        let registry = Arc::new(CalculatorRegistry::with_built_ins());
        let executor = PipelineExecutor::new(registry.clone());
        let service = EstimateService::new(executor, catalog.clone(), catalog.clone());
        Self {
            registry,
            service,
            tiers: catalog,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Build the in-memory catalog, seeded from `[catalog] seed_path` when set.
pub fn load_catalog(config: &EstimoConfig) -> anyhow::Result<InMemoryCatalog> {
    let Some(path) = config.catalog.seed_path.as_deref() else {
        return Ok(InMemoryCatalog::new());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog seed '{path}'"))?;
    let seed: CatalogSeed = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse catalog seed '{path}'"))?;

    info!(items = seed.items.len(), tiers = seed.price_tiers.len(), "Loaded catalog seed");
    let catalog = InMemoryCatalog::new().with_tiers(seed.price_tiers);
    for item in seed.items {
        catalog.insert_item(item);
    }
    Ok(catalog)
}

pub fn create_app(state: AppState) -> Router {
    let limits = &state.config.limits;
    let body_limit = limits.max_body_size_mb * 1024 * 1024;
    let timeout = Duration::from_secs(limits.request_timeout_seconds);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/pipeline/run", post(handlers::run_pipeline))
        .route("/v1/calculators", get(handlers::list_calculators))
        .route("/v1/calculators/grouped", get(handlers::list_grouped_calculators))
        .route("/v1/calculators/{code}", get(handlers::get_calculator))
        .route("/v1/groups", get(handlers::list_groups))
        .route("/v1/price-tiers", get(handlers::list_price_tiers))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit))
                .layer(TimeoutLayer::new(timeout)),
        )
        .with_state(state)
}
