use firemap::domain::looks_like_url;
use firemap::geometry::{area_km2, choose_largest, zoom_for_span};
use firemap::kml::extract_rings;
use firemap::normalize::normalize;
use firemap::pipeline::analyze_kml;
use serde_json::json;

const SQUARE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>Perimetro</name>
    <Placemark>
      <Polygon>
        <outerBoundaryIs>
          <LinearRing>
            <coordinates>
              -8.0,40.0,0 -8.0,40.05,0 -7.95,40.05,0 -7.95,40.0,0 -8.0,40.0,0
            </coordinates>
          </LinearRing>
        </outerBoundaryIs>
      </Polygon>
    </Placemark>
  </Document>
</kml>"#;

#[test]
fn square_perimeter_end_to_end() {
    let rings = extract_rings(SQUARE);
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].len(), 5);
    assert!(rings[0].is_closed());

    let largest = choose_largest(&rings).unwrap();
    let area = area_km2(&largest).unwrap();
    assert!(area > 0.0);

    let geometry = analyze_kml(SQUARE).unwrap();
    assert_eq!(geometry.area_km2, area);
    assert!(geometry.viewport.bbox.width() > 0.0);
    assert!(geometry.viewport.zoom >= 10 && geometry.viewport.zoom <= 15);
}

#[test]
fn document_without_coordinates_has_no_polygon() {
    let kml = r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document><name>Vazio</name></Document></kml>"#;

    let rings = extract_rings(kml);
    assert!(rings.is_empty());
    assert!(choose_largest(&rings).is_none());
    assert!(analyze_kml(kml).is_none());
}

#[test]
fn zoom_breakpoints() {
    assert_eq!(zoom_for_span(4000.0), 15);
    assert_eq!(zoom_for_span(5000.0), 15);
    assert_eq!(zoom_for_span(5000.1), 14);
    assert_eq!(zoom_for_span(100_000.0), 12);
    assert_eq!(zoom_for_span(1_000_000.0), 10);
}

#[test]
fn feed_item_to_record() {
    let record = normalize(&json!({
        "id": "2025080012345",
        "concelho": "",
        "local": "Vila Real",
        "man": "120",
        "terrain": 30.0,
        "aerial": "n/a",
        "kml": "  https://fogos.pt/kml/2025080012345  ",
    }));

    assert_eq!(record.name, "Vila Real");
    assert_eq!(record.personnel, 120);
    assert_eq!(record.ground_units, 30);
    assert_eq!(record.air_units, 0);
    assert!(looks_like_url(&record.kml.unwrap().value));
}
