//! Job site model and bounding-box matching.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::geo::Coordinates;

/// Represents a job site record from the database.
///
/// # Database Table
///
/// Maps to the `sites` table. Sites are provisioned out-of-band and are
/// read-only to this service.
///
/// # Bounds
///
/// `min_lat <= max_lat` is enforced by a CHECK constraint. Longitude bounds
/// have been stored in both orders historically, so matching always uses the
/// smaller of the two as the lower edge.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Site {
    /// Provisioning order; the lowest id wins when boxes overlap.
    pub id: i64,

    /// Unique, human-readable site name recorded on time clock entries
    pub name: String,

    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,

    pub created_at: DateTime<Utc>,
}

impl Site {
    /// Whether the point lies inside this site's box. Edges are inclusive.
    pub fn contains(&self, point: Coordinates) -> bool {
        within(point.lat, self.min_lat, self.max_lat) && within(point.lon, self.min_lon, self.max_lon)
    }
}

fn within(value: f64, a: f64, b: f64) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    lo <= value && value <= hi
}

/// Linear scan for the first site containing `point`.
///
/// `sites` must already be in tie-break order (ascending id); on a shared
/// edge or overlap the earlier entry wins.
pub fn find_site(sites: &[Site], point: Coordinates) -> Option<&Site> {
    sites.iter().find(|site| site.contains(point))
}

/// Site as returned to API clients.
#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub name: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl From<Site> for SiteResponse {
    fn from(site: Site) -> Self {
        Self {
            name: site.name,
            min_lat: site.min_lat,
            max_lat: site.max_lat,
            min_lon: site.min_lon,
            max_lon: site.max_lon,
        }
    }
}

/// Response body for `GET /api/v1/sites/resolve`.
///
/// `site` is `null` when the point is outside every known site; that is a
/// normal answer, not an error.
///
/// ```json
/// { "lat": 40.005, "lon": -75.005, "site": { "name": "Alpha Yard", ... } }
/// ```
#[derive(Debug, Serialize)]
pub struct ResolveSiteResponse {
    pub lat: f64,
    pub lon: f64,
    pub site: Option<SiteResponse>,
}
