//! Job site HTTP handlers.
//!
//! - GET /api/v1/sites - List known sites
//! - GET /api/v1/sites/resolve?lat=..&lon=.. - Resolve a point to a site

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    db::with_retry,
    error::AppError,
    models::{
        geo::{CoordinateInput, Coordinates},
        site::{ResolveSiteResponse, SiteResponse},
    },
    services::geofence_service,
    state::AppState,
};

/// Query string for the resolve endpoint. Values arrive as text.
#[derive(Debug, Deserialize)]
pub struct ResolveSiteQuery {
    pub lat: CoordinateInput,
    pub lon: CoordinateInput,
}

/// List all job sites in tie-break order.
pub async fn list_sites(State(state): State<AppState>) -> Result<Json<Vec<SiteResponse>>, AppError> {
    let pool = &state.pool;
    let sites = with_retry(state.retry, move || geofence_service::list_sites(pool)).await?;

    Ok(Json(sites.into_iter().map(Into::into).collect()))
}

/// Resolve coordinates to a job site.
///
/// # Response (200)
///
/// Always 200 for well-formed coordinates; `site` is `null` when the point is
/// outside every site.
///
/// ```json
/// { "lat": 40.005, "lon": -75.005, "site": { "name": "Alpha Yard", ... } }
/// ```
///
/// # Errors
///
/// - 400 `invalid_input`: `lat` or `lon` is blank, non-numeric or not finite
pub async fn resolve_site(
    State(state): State<AppState>,
    Query(query): Query<ResolveSiteQuery>,
) -> Result<Json<ResolveSiteResponse>, AppError> {
    let point = Coordinates::parse(&query.lat, &query.lon)?;

    let pool = &state.pool;
    let site = with_retry(state.retry, move || {
        geofence_service::resolve_site(pool, point.lat, point.lon)
    })
    .await?;

    Ok(Json(ResolveSiteResponse {
        lat: point.lat,
        lon: point.lon,
        site: site.map(Into::into),
    }))
}
