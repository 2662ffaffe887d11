use std::f64::consts::FRAC_PI_4;

use thiserror::Error;

/// WGS84 semi-major axis, the sphere radius Web Mercator uses
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude beyond which Web Mercator is undefined in practice
pub const MAX_LATITUDE: f64 = 85.051_128_78;

#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error("coordinate is not finite: ({lon}, {lat})")]
    NonFinite { lon: f64, lat: f64 },
    #[error("latitude {0} outside the Web Mercator range")]
    LatitudeOutOfRange(f64),
    #[error("degenerate geometry: {0}")]
    Degenerate(&'static str),
}

/// Coordinate reference system a set of coordinates is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// EPSG:4326, degrees
    Wgs84,
    /// EPSG:3857, meters
    WebMercator,
}

impl Crs {
    pub fn epsg(self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
        }
    }
}

/// Spherical Web Mercator projection from WGS84 degrees to meters
///
/// - x = R * lon
/// - y = R * ln(tan(pi/4 + lat/2))
///
/// Matches the EPSG:3857 coordinates map tile servers use, so projected
/// bounds line up with basemap tiles without further conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    pub fn crs(&self) -> Crs {
        Crs::WebMercator
    }

    /// Project a (lon, lat) point to (x, y) meters
    pub fn project(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(ProjectionError::NonFinite { lon, lat });
        }
        if lat.abs() > MAX_LATITUDE {
            return Err(ProjectionError::LatitudeOutOfRange(lat));
        }

        let x = EARTH_RADIUS_M * lon.to_radians();
        let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();

        Ok((x, y))
    }

    /// Project a slice of (lon, lat) points, failing on the first bad one
    pub fn project_points(&self, points: &[(f64, f64)]) -> Result<Vec<(f64, f64)>, ProjectionError> {
        points
            .iter()
            .map(|&(lon, lat)| self.project(lon, lat))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (x, y) = WebMercator.project(0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_known_point() {
        // Lisbon
        let (x, y) = WebMercator.project(-9.139337, 38.722252).unwrap();
        assert!((x - (-1_017_386.341)).abs() < 0.01);
        assert!((y - 4_681_964.284).abs() < 0.01);
    }

    #[test]
    fn test_antimeridian_extent() {
        let (x, _) = WebMercator.project(180.0, 0.0).unwrap();
        assert!((x - 20_037_508.342789244).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            WebMercator.project(0.0, 89.0),
            Err(ProjectionError::LatitudeOutOfRange(89.0))
        );
        assert!(matches!(
            WebMercator.project(f64::NAN, 0.0),
            Err(ProjectionError::NonFinite { .. })
        ));
        assert!(WebMercator.project_points(&[(0.0, 0.0), (0.0, f64::INFINITY)]).is_err());
    }

    #[test]
    fn test_crs_codes() {
        assert_eq!(WebMercator.crs().epsg(), 3857);
        assert_eq!(Crs::Wgs84.epsg(), 4326);
    }
}
