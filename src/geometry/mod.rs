pub mod area;
pub mod places;
pub mod projection;
pub mod selection;
pub mod viewport;

pub use area::{area_km2, projected_bounds};
pub use projection::{Crs, ProjectionError, WebMercator};
pub use selection::{PolygonCandidate, choose_largest, choose_largest_candidate};
pub use viewport::{BoundingBox, Viewport, compute_viewport, point_fallback_ring, zoom_for_span};
