pub mod fogos;
pub mod kml;

use anyhow::Result;

pub use fogos::{FeedResponse, FogosClient};
pub use kml::resolve_kml;

/// Something that can download a KML document by URL
pub trait KmlFetcher {
    fn fetch_kml(&self, url: &str) -> Result<String>;
}
