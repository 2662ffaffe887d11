use super::area::area_km2;
use crate::domain::Ring;

/// A ring together with its Web Mercator area
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonCandidate {
    pub ring: Ring,
    pub area_km2: f64,
}

/// Pick the ring with the largest area, keeping the area alongside it
///
/// Rings whose area cannot be computed are skipped. Ties go to the ring
/// seen first. Only the single largest ring is kept: holes and the other
/// parts of a multi-ring perimeter are not added in.
pub fn choose_largest_candidate(rings: &[Ring]) -> Option<PolygonCandidate> {
    let mut best: Option<(usize, f64)> = None;

    for (index, ring) in rings.iter().enumerate() {
        let area = match area_km2(ring) {
            Ok(a) => a,
            Err(e) => {
                log::debug!("Skipping ring {} ({} points): {}", index, ring.len(), e);
                continue;
            }
        };

        if best.is_none_or(|(_, best_area)| area > best_area) {
            best = Some((index, area));
        }
    }

    best.map(|(index, area)| PolygonCandidate {
        ring: rings[index].clone(),
        area_km2: area,
    })
}

/// Pick the ring with the largest area, or `None` when no ring is usable
pub fn choose_largest(rings: &[Ring]) -> Option<Ring> {
    choose_largest_candidate(rings).map(|c| c.ring)
}
