//! Pricing route handlers

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cache::CacheStats;
use crate::error::Result;
use crate::AppState;

use super::requests::{CalendarQuery, PriceRequest};
use super::responses::{CalendarDay, PriceBreakdown};

/// Optional pricing day override, `?as_of=YYYY-MM-DD`
#[derive(Debug, Default, Deserialize)]
pub struct AsOf {
    pub as_of: Option<NaiveDate>,
}

/// Routes mounted under `/api/pricing`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calculate", post(calculate))
        .route("/booking", post(booking))
        .route("/calendar", post(calendar))
        .route("/cache/invalidate", post(invalidate_cache))
        .route("/cache/stats", get(cache_stats))
}

/// Quote a request
async fn calculate(
    State(state): State<AppState>,
    Query(params): Query<AsOf>,
    Json(request): Json<PriceRequest>,
) -> Result<Json<PriceBreakdown>> {
    let breakdown = state.pricing.calculate(&request, params.as_of).await?;
    Ok(Json(breakdown))
}

/// Price a booking being created; blocked dates are rejected with 409
async fn booking(
    State(state): State<AppState>,
    Query(params): Query<AsOf>,
    Json(request): Json<PriceRequest>,
) -> Result<Json<PriceBreakdown>> {
    let breakdown = state
        .pricing
        .calculate_for_booking(&request, params.as_of)
        .await?;
    Ok(Json(breakdown))
}

async fn calendar(
    State(state): State<AppState>,
    Json(query): Json<CalendarQuery>,
) -> Result<Json<Vec<CalendarDay>>> {
    let days = state.pricing.calendar_prices(&query).await?;
    Ok(Json(days))
}

async fn invalidate_cache(State(state): State<AppState>) -> Json<Value> {
    state.pricing.invalidate_caches();
    Json(json!({ "invalidated": true }))
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.pricing.cache().stats())
}
