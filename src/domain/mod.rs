pub mod incident;
pub mod ring;

pub use incident::{IncidentRecord, KmlField, KmlSource, Location, looks_like_url};
pub use ring::Ring;
