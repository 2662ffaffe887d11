use super::area::projected_bounds;
use super::projection::{Crs, ProjectionError};
use crate::domain::{Location, Ring};

/// Fraction of each axis span added on both sides of the geometry
pub const PADDING_RATIO: f64 = 0.15;

/// Padding in meters used when an axis has no extent (point geometry)
pub const MIN_PADDING_M: f64 = 2000.0;

/// Half-size in degrees of the square framed around a bare start point
pub const POINT_FALLBACK_DEG: f64 = 0.02;

/// Zoom breakpoints: (largest span in meters, zoom), inclusive upper bounds
const ZOOM_STEPS: [(f64, u8); 5] = [
    (5_000.0, 15),
    (20_000.0, 14),
    (80_000.0, 13),
    (300_000.0, 12),
    (800_000.0, 11),
];
const MIN_ZOOM: u8 = 10;

/// Axis-aligned bounding box, tagged with the CRS its coordinates are in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub crs: Crs,
}

impl BoundingBox {
    /// Create bounds from a set of points
    pub fn from_points(points: &[(f64, f64)], crs: Crs) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;

        for &(x, y) in points {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        Some(Self {
            min_x,
            min_y,
            max_x,
            max_y,
            crs,
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Inclusive on all edges
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Grow each axis by `ratio` of its span on both sides, or by `min_pad`
    /// when the span is zero
    pub fn padded(&self, ratio: f64, min_pad: f64) -> Self {
        let pad = |span: f64| if span > 0.0 { span * ratio } else { min_pad };
        let dx = pad(self.width());
        let dy = pad(self.height());

        Self {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
            crs: self.crs,
        }
    }
}

/// Padded frame and tile zoom level for rendering one incident
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bbox: BoundingBox,
    pub zoom: u8,
}

impl Viewport {
    /// Frame a WGS84 ring, projecting it to Web Mercator first
    pub fn from_ring(ring: &Ring) -> Result<Self, ProjectionError> {
        Ok(compute_viewport(&projected_bounds(ring)?))
    }

    /// Largest side of the padded frame
    pub fn span(&self) -> f64 {
        self.bbox.width().max(self.bbox.height())
    }
}

/// Pad projected bounds and pick the zoom level that frames them
pub fn compute_viewport(bbox: &BoundingBox) -> Viewport {
    let padded = bbox.padded(PADDING_RATIO, MIN_PADDING_M);
    let zoom = zoom_for_span(padded.width().max(padded.height()));

    Viewport { bbox: padded, zoom }
}

/// Map a span in meters to a tile zoom level; smaller spans zoom in further
pub fn zoom_for_span(span_m: f64) -> u8 {
    ZOOM_STEPS
        .iter()
        .find(|&&(limit, _)| span_m <= limit)
        .map(|&(_, zoom)| zoom)
        .unwrap_or(MIN_ZOOM)
}

/// Small square around a start point, for incidents with no usable polygon
pub fn point_fallback_ring(location: Location) -> Option<Ring> {
    let Location { lat, lon } = location;
    let d = POINT_FALLBACK_DEG;

    Ring::new(vec![
        (lon - d, lat - d),
        (lon - d, lat + d),
        (lon + d, lat + d),
        (lon + d, lat - d),
        (lon - d, lat - d),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
            crs: Crs::WebMercator,
        }
    }

    #[test]
    fn test_bounds_from_points() {
        let points = vec![(0.0, 0.0), (1000.0, 2000.0), (500.0, 1000.0)];
        let bounds = BoundingBox::from_points(&points, Crs::WebMercator).unwrap();

        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.max_x, 1000.0);
        assert_eq!(bounds.min_y, 0.0);
        assert_eq!(bounds.max_y, 2000.0);
        assert!(BoundingBox::from_points(&[], Crs::WebMercator).is_none());
    }

    #[test]
    fn test_zoom_breakpoints() {
        assert_eq!(zoom_for_span(4_000.0), 15);
        assert_eq!(zoom_for_span(5_000.0), 15);
        assert_eq!(zoom_for_span(5_000.1), 14);
        assert_eq!(zoom_for_span(20_000.0), 14);
        assert_eq!(zoom_for_span(80_000.0), 13);
        assert_eq!(zoom_for_span(300_000.0), 12);
        assert_eq!(zoom_for_span(800_000.0), 11);
        assert_eq!(zoom_for_span(1_000_000.0), 10);
    }

    #[test]
    fn test_zoom_non_increasing() {
        let mut previous = u8::MAX;
        for step in 0..=2000 {
            let zoom = zoom_for_span(step as f64 * 1000.0);
            assert!(zoom <= previous);
            previous = zoom;
        }
    }

    #[test]
    fn test_padding_fifteen_percent() {
        let viewport = compute_viewport(&bbox(0.0, 0.0, 10_000.0, 4_000.0));

        assert!((viewport.bbox.min_x - -1_500.0).abs() < 1e-9);
        assert!((viewport.bbox.max_x - 11_500.0).abs() < 1e-9);
        assert!((viewport.bbox.min_y - -600.0).abs() < 1e-9);
        assert!((viewport.bbox.max_y - 4_600.0).abs() < 1e-9);
        // 13 km padded width
        assert_eq!(viewport.zoom, 14);
    }

    #[test]
    fn test_degenerate_bounds_get_minimum_padding() {
        let viewport = compute_viewport(&bbox(100.0, 200.0, 100.0, 200.0));

        assert_eq!(viewport.bbox.width(), 4_000.0);
        assert_eq!(viewport.bbox.height(), 4_000.0);
        assert_eq!(viewport.zoom, 15);
    }

    #[test]
    fn test_single_degenerate_axis() {
        let viewport = compute_viewport(&bbox(0.0, 0.0, 100_000.0, 0.0));
        assert_eq!(viewport.bbox.height(), 4_000.0);
        assert!((viewport.span() - 130_000.0).abs() < 1e-6);
        assert_eq!(viewport.zoom, 12);
    }

    #[test]
    fn test_contains_inclusive() {
        let b = bbox(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains(0.0, 10.0));
        assert!(b.contains(5.0, 5.0));
        assert!(!b.contains(10.1, 5.0));
    }

    #[test]
    fn test_point_fallback_ring() {
        let ring = point_fallback_ring(Location {
            lat: 40.0,
            lon: -8.0,
        })
        .unwrap();
        assert_eq!(ring.len(), 5);
        assert!(ring.is_closed());
        let (lon, lat) = ring.points()[1];
        assert!((lon - -8.02).abs() < 1e-12);
        assert!((lat - 40.02).abs() < 1e-12);
    }

    #[test]
    fn test_viewport_from_ring() {
        let ring = Ring::new(vec![(-9.0, 38.0), (-9.0, 38.1), (-8.9, 38.1), (-8.9, 38.0)]).unwrap();
        let viewport = Viewport::from_ring(&ring).unwrap();

        assert_eq!(viewport.bbox.crs, Crs::WebMercator);
        // ~11 km wide, ~14 km tall before padding
        assert_eq!(viewport.zoom, 14);
    }
}
