//! firemap - Extract wildfire burned-area polygons from fogos.pt incidents and frame them for map rendering

pub mod api;
pub mod config;
pub mod domain;
pub mod export;
pub mod geometry;
pub mod kml;
pub mod normalize;
pub mod pipeline;
