//! Geofence service - resolves GPS coordinates to a job site.
//!
//! The site table is small and provisioned by hand, so every lookup reads it
//! fresh and scans it linearly. Nothing is cached between requests.

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        geo::Coordinates,
        site::{Site, find_site},
    },
};

/// Resolve a point to the job site whose bounding box contains it.
///
/// # Process
///
/// 1. Reject non-finite coordinates (before touching storage)
/// 2. Load all sites in ascending id order
/// 3. Return the first site whose box contains the point
///
/// # Tie-break
///
/// When boxes overlap or share an edge, the site with the lowest id wins.
///
/// # Returns
///
/// `Ok(None)` when the point is outside every site.
///
/// # Errors
///
/// - `InvalidInput`: `lat` or `lon` is NaN or infinite
/// - `StorageUnavailable` / `Database`: the site table could not be read
pub async fn resolve_site(pool: &DbPool, lat: f64, lon: f64) -> Result<Option<Site>, AppError> {
    let point = Coordinates::new(lat, lon)?;

    let sites = list_sites(pool).await?;
    let site = find_site(&sites, point).cloned();

    match &site {
        Some(site) => tracing::debug!(lat, lon, site = %site.name, "Resolved site"),
        None => tracing::debug!(lat, lon, sites = sites.len(), "No site contains point"),
    }

    Ok(site)
}

/// List every site in tie-break order.
pub async fn list_sites(pool: &DbPool) -> Result<Vec<Site>, AppError> {
    let sites = sqlx::query_as::<_, Site>(
        r#"
        SELECT id, name, min_lat, max_lat, min_lon, max_lon, created_at
        FROM sites
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(sites)
}
