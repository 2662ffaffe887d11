use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use thiserror::Error;

use crate::domain::Ring;

/// OGC KML 2.2 namespace URI
pub const KML_NAMESPACE: &[u8] = b"http://www.opengis.net/kml/2.2";

#[derive(Debug, Error)]
pub enum KmlError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("unbound namespace prefix '{0}'")]
    UnknownPrefix(String),
    #[error("unbalanced document: {0}")]
    Unbalanced(&'static str),
}

/// Text content of every element with a given local name, split by namespace
#[derive(Debug, Default)]
struct ElementTexts {
    /// Elements bound to the KML 2.2 namespace
    kml: Vec<String>,
    /// Elements in no namespace or in some other one
    other: Vec<String>,
}

impl ElementTexts {
    /// KML-namespaced matches win; the rest are only consulted when there are none
    fn preferred(self) -> Vec<String> {
        if self.kml.is_empty() {
            self.other
        } else {
            self.kml
        }
    }
}

/// Parse every polygon ring out of a KML document
///
/// # Algorithm
/// 1. Collect the text of all `coordinates` elements, namespace-aware
/// 2. Use the KML 2.2 matches if any exist, otherwise every `coordinates`
///    element regardless of namespace (some feeds omit `xmlns`)
/// 3. Split each node on whitespace into `lon,lat[,alt]` tuples, dropping
///    tokens that do not parse
/// 4. Keep nodes with at least 3 points, closing them into rings
///
/// Blank input is not an error and yields no rings.
pub fn parse_rings(kml: &str) -> Result<Vec<Ring>, KmlError> {
    if kml.trim().is_empty() {
        return Ok(Vec::new());
    }

    let nodes = collect_element_texts(kml, b"coordinates")?.preferred();

    Ok(nodes
        .iter()
        .filter_map(|text| Ring::new(parse_coordinates(text)))
        .collect())
}

/// Like [`parse_rings`], but malformed documents simply have no geometry
pub fn extract_rings(kml: &str) -> Vec<Ring> {
    match parse_rings(kml) {
        Ok(rings) => rings,
        Err(e) => {
            log::debug!("Discarding unparsable KML: {}", e);
            Vec::new()
        }
    }
}

/// First non-blank `<name>` in the document, using the same namespace fallback
pub fn extract_name(kml: &str) -> Option<String> {
    if kml.trim().is_empty() {
        return None;
    }

    let texts = match collect_element_texts(kml, b"name") {
        Ok(t) => t,
        Err(e) => {
            log::debug!("Could not read KML name: {}", e);
            return None;
        }
    };

    [texts.kml.first(), texts.other.first()]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a whitespace-separated list of `lon,lat[,alt]` tuples
pub fn parse_coordinates(text: &str) -> Vec<(f64, f64)> {
    text.split_whitespace().filter_map(parse_position).collect()
}

fn parse_position(token: &str) -> Option<(f64, f64)> {
    let mut parts = token.split(',');
    let lon = parts.next()?.trim().parse::<f64>().ok()?;
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    Some((lon, lat))
}

fn in_kml_namespace(ns: &ResolveResult) -> Result<bool, KmlError> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => Ok(*uri == KML_NAMESPACE),
        ResolveResult::Unbound => Ok(false),
        ResolveResult::Unknown(prefix) => Err(KmlError::UnknownPrefix(
            String::from_utf8_lossy(prefix).into_owned(),
        )),
    }
}

/// Walk the whole document, validating structure and gathering matching text
///
/// The full walk is needed even once matches are found: a document that is
/// broken further down is rejected as a whole.
///
/// A matched element's text includes every text run directly inside it, also
/// runs that follow a nested child element.
fn collect_element_texts(kml: &str, local_name: &[u8]) -> Result<ElementTexts, KmlError> {
    let mut reader = NsReader::from_str(kml.trim());
    let mut texts = ElementTexts::default();

    // (in KML namespace, accumulated text, depth the element opened at)
    let mut current: Option<(bool, String, usize)> = None;
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(e) => {
                if depth == 0 && seen_root {
                    return Err(KmlError::Unbalanced("content after root element"));
                }
                seen_root = true;
                depth += 1;

                let in_kml = in_kml_namespace(&ns)?;
                if current.is_none() && e.local_name().as_ref() == local_name {
                    current = Some((in_kml, String::new(), depth));
                }
            }
            Event::Empty(_) => {
                if depth == 0 && seen_root {
                    return Err(KmlError::Unbalanced("content after root element"));
                }
                seen_root = true;
                in_kml_namespace(&ns)?;
            }
            Event::Text(t) => {
                if depth == 0 {
                    if !t.iter().all(u8::is_ascii_whitespace) {
                        return Err(KmlError::Unbalanced("text outside root element"));
                    }
                    continue;
                }
                if let Some((_, text, d)) = current.as_mut()
                    && *d == depth
                {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some((_, text, d)) = current.as_mut()
                    && *d == depth
                {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Err(KmlError::Unbalanced("unexpected closing tag"));
                }
                if matches!(current, Some((_, _, d)) if d == depth)
                    && let Some((in_kml, text, _)) = current.take()
                {
                    if in_kml {
                        texts.kml.push(text);
                    } else {
                        texts.other.push(text);
                    }
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(KmlError::Unbalanced("no root element"));
    }
    if depth != 0 {
        return Err(KmlError::Unbalanced("unclosed element"));
    }

    Ok(texts)
}
