use super::projection::{Crs, WebMercator};
use super::viewport::Viewport;

/// Mean earth radius used for great-circle distances
const HAVERSINE_RADIUS_KM: f64 = 6371.0;

/// Default search radius for towns around an incident
pub const DEFAULT_NEARBY_KM: f64 = 80.0;

/// A reference town used to orient readers on rendered maps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Place {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

/// District capitals and larger towns of mainland Portugal
pub const PLACES: [Place; 15] = [
    Place { name: "Lisboa", lat: 38.722252, lon: -9.139337 },
    Place { name: "Porto", lat: 41.157944, lon: -8.629105 },
    Place { name: "Braga", lat: 41.545448, lon: -8.426507 },
    Place { name: "Guimarães", lat: 41.444223, lon: -8.296016 },
    Place { name: "Viana do Castelo", lat: 41.693579, lon: -8.832419 },
    Place { name: "Aveiro", lat: 40.640505, lon: -8.653788 },
    Place { name: "Coimbra", lat: 40.203314, lon: -8.410257 },
    Place { name: "Leiria", lat: 39.743606, lon: -8.807052 },
    Place { name: "Viseu", lat: 40.661003, lon: -7.909712 },
    Place { name: "Castelo Branco", lat: 39.822659, lon: -7.494360 },
    Place { name: "Guarda", lat: 40.537478, lon: -7.265439 },
    Place { name: "Faro", lat: 37.019356, lon: -7.930440 },
    Place { name: "Évora", lat: 38.571, lon: -7.907 },
    Place { name: "Setúbal", lat: 38.524, lon: -8.892 },
    Place { name: "Santarém", lat: 39.236, lon: -8.685 },
];

/// Great-circle distance in km between two WGS84 points
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    HAVERSINE_RADIUS_KM * c
}

/// Towns within `max_km` of a point, nearest first
pub fn nearby_places(lat: f64, lon: f64, max_km: f64) -> Vec<(Place, f64)> {
    let mut found: Vec<(Place, f64)> = PLACES
        .iter()
        .map(|p| (*p, haversine_km(lat, lon, p.lat, p.lon)))
        .filter(|&(_, d)| d <= max_km)
        .collect();

    found.sort_by(|a, b| a.1.total_cmp(&b.1));
    found
}

/// Towns that fall inside a viewport, so labels never land off-map
pub fn places_in_viewport(viewport: &Viewport) -> Vec<Place> {
    let bbox = &viewport.bbox;

    PLACES
        .iter()
        .filter(|p| match bbox.crs {
            Crs::Wgs84 => bbox.contains(p.lon, p.lat),
            Crs::WebMercator => WebMercator
                .project(p.lon, p.lat)
                .is_ok_and(|(x, y)| bbox.contains(x, y)),
        })
        .copied()
        .collect()
}
