pub mod parser;

pub use parser::{KmlError, extract_name, extract_rings, parse_rings};
