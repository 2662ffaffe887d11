use crate::domain::Ring;
use crate::geometry::{Viewport, choose_largest_candidate};
use crate::kml::extract_rings;

/// Everything a renderer needs to draw one incident's burned area
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentGeometry {
    pub ring: Ring,
    pub area_km2: f64,
    pub viewport: Viewport,
    /// How many rings the KML held before selection
    pub ring_count: usize,
}

/// Run KML text through extraction, selection and viewport sizing
///
/// Returns `None` when the document has no usable polygon. That is the
/// normal outcome for incidents without a perimeter, not an error.
pub fn analyze_kml(kml: &str) -> Option<IncidentGeometry> {
    let rings = extract_rings(kml);
    if rings.is_empty() {
        log::debug!("No coordinate rings found in KML");
        return None;
    }

    let candidate = choose_largest_candidate(&rings)?;
    let viewport = match Viewport::from_ring(&candidate.ring) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("Could not frame selected ring: {}", e);
            return None;
        }
    };

    Some(IncidentGeometry {
        ring: candidate.ring,
        area_km2: candidate.area_km2,
        viewport,
        ring_count: rings.len(),
    })
}
