/// Where an incident started, in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Which upstream field carried the KML payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KmlField {
    /// Volunteer-curated perimeter, preferred when present
    KmlVost,
    Kml,
}

impl KmlField {
    pub fn key(self) -> &'static str {
        match self {
            KmlField::KmlVost => "kmlVost",
            KmlField::Kml => "kml",
        }
    }
}

/// Raw KML text or a URL pointing at it, as found on the incident
#[derive(Debug, Clone, PartialEq)]
pub struct KmlSource {
    pub field: KmlField,
    pub value: String,
}

/// Whether a KML field holds a link rather than the document itself
pub fn looks_like_url(value: &str) -> bool {
    let lower = value.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Canonical incident, built once per upstream item by the normalizer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncidentRecord {
    pub id: Option<String>,
    /// Display name: municipality or locality, never empty
    pub name: String,
    pub municipality: Option<String>,
    pub parish: Option<String>,
    pub district: Option<String>,
    pub status: String,
    pub personnel: u32,
    pub ground_units: u32,
    pub air_units: u32,
    pub location: Option<Location>,
    pub kml: Option<KmlSource>,
    /// Area already present on the record (persisted exports carry one)
    pub area_km2: Option<f64>,
    /// Display label for when the incident started
    pub timestamp: Option<String>,
    /// Structured start time in epoch seconds, if the feed provided one
    pub start_epoch: Option<i64>,
}

impl IncidentRecord {
    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or("unknown")
    }
}
