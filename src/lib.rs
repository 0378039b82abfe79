//! Dynamic pricing engine for moving and item transport bookings.

pub mod cache;
pub mod config;
pub mod error;
pub mod pricing;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::pricing::PricingService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pricing: PricingService,
}

/// Build the HTTP application
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/pricing", pricing::router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
