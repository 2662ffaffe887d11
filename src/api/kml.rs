use super::KmlFetcher;
use crate::domain::looks_like_url;

/// Turn an incident's KML field into KML text
///
/// Links are downloaded; anything else is taken to be the document itself.
/// Download failures are logged and give an empty string, which downstream
/// code treats as "no geometry".
pub fn resolve_kml(fetcher: &impl KmlFetcher, raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        return String::new();
    }

    if !looks_like_url(value) {
        return value.to_string();
    }

    match fetcher.fetch_kml(value) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Failed to download KML from {}: {:#}", value, e);
            String::new()
        }
    }
}
