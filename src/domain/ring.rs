/// A closed polygon boundary in WGS84 degrees
///
/// Points are stored as (lon, lat) pairs, the axis order KML uses. A ring
/// always has at least 3 points and its last point equals its first.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<(f64, f64)>,
}

impl Ring {
    /// Build a ring from (lon, lat) points, closing it if needed
    ///
    /// Returns `None` when fewer than 3 points are given.
    pub fn new(mut points: Vec<(f64, f64)>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let first = points[0];
        if points[points.len() - 1] != first {
            points.push(first);
        }

        Some(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.points.first() == self.points.last()
    }

    /// Number of distinct positions, counted up to `limit`
    pub fn distinct_points(&self, limit: usize) -> usize {
        let mut seen: Vec<(f64, f64)> = Vec::with_capacity(limit);
        for &p in &self.points {
            if seen.len() >= limit {
                break;
            }
            if !seen.contains(&p) {
                seen.push(p);
            }
        }
        seen.len()
    }
}
