use geo::{Area, LineString, Polygon};

use super::projection::{ProjectionError, WebMercator};
use super::viewport::BoundingBox;
use crate::domain::Ring;

const SQUARE_METERS_PER_KM2: f64 = 1_000_000.0;

/// Planar area of a WGS84 ring in km², measured in Web Mercator
///
/// The ring is projected to EPSG:3857 and the absolute shoelace area taken.
/// Self-intersecting rings are measured as-is, without topology repair.
/// Web Mercator inflates area away from the equator; the figure is the
/// projected area, not a geodesic one.
pub fn area_km2(ring: &Ring) -> Result<f64, ProjectionError> {
    if ring.distinct_points(3) < 3 {
        return Err(ProjectionError::Degenerate("fewer than 3 distinct points"));
    }

    let projected = WebMercator.project_points(ring.points())?;
    let polygon = Polygon::new(LineString::from(projected), vec![]);
    let area = polygon.unsigned_area() / SQUARE_METERS_PER_KM2;

    if !area.is_finite() {
        return Err(ProjectionError::Degenerate("area is not finite"));
    }

    Ok(area)
}

/// Bounds of a WGS84 ring after projecting it to Web Mercator
pub fn projected_bounds(ring: &Ring) -> Result<BoundingBox, ProjectionError> {
    let projection = WebMercator;
    let projected = projection.project_points(ring.points())?;

    BoundingBox::from_points(&projected, projection.crs())
        .ok_or(ProjectionError::Degenerate("empty ring"))
}
