//! Upstream incident JSON → [`IncidentRecord`]
//!
//! The fogos.pt feeds and the JSON files this crate writes name the same
//! fields differently (`man` vs `operacionais`, `lng` vs `longitude`, ...).
//! Every logical field is resolved from an ordered list of candidates: the
//! first candidate that is present and parses wins, and later candidates are
//! never looked at.

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use crate::domain::{IncidentRecord, KmlField, KmlSource, Location};

type Fields = Map<String, Value>;

/// A single way of deriving a field from a raw record
pub type Resolver<T> = fn(&Fields) -> Option<T>;

/// Display name used when a record has neither a place name nor an id
pub const NAME_PLACEHOLDER: &str = "Incêndio";

/// Format of start-time labels, e.g. `21-08-2025 14:05`
pub const DATE_FORMAT: &str = "%d-%m-%Y %H:%M";

const NAME_KEYS: &[&str] = &["concelho", "local", "nome", "location", "municipio"];
const MUNICIPALITY_KEYS: &[&str] = &["concelho", "municipio"];
const DISTRICT_KEYS: &[&str] = &["district", "distrito"];
const STATUS_KEYS: &[&str] = &["status", "estado"];

pub const PERSONNEL_KEYS: &[&str] = &["operacionais", "man", "oper"];
pub const GROUND_KEYS: &[&str] = &["terrestres", "terrain", "terrestre"];
pub const AIR_KEYS: &[&str] = &["aereos", "aerial", "aerials"];

const LAT_KEYS: &[&str] = &["lat", "latitude"];
const LON_KEYS: &[&str] = &["lng", "lon", "longitude"];
const AREA_KEYS: &[&str] = &["area_km2", "area", "area_ardida"];

const EPOCH_KEYS: &[&str] = &["started", "time", "timestamp"];
const DATE_TEXT_KEYS: &[&str] = &[
    "date",
    "data_inicio",
    "data",
    "datetime",
    "created_at",
    "start",
    "hour",
];

const NAME_RESOLVERS: &[Resolver<String>] = &[place_name, identifier];
const TIMESTAMP_RESOLVERS: &[Resolver<String>] = &[
    structured_epoch_label,
    numeric_epoch_label,
    text_date_label,
    identifier,
];

/// Build the canonical record for one upstream item
///
/// Never fails: anything missing or unparsable falls back to its default.
pub fn normalize(raw: &Value) -> IncidentRecord {
    let Some(fields) = raw.as_object() else {
        return IncidentRecord {
            name: NAME_PLACEHOLDER.to_string(),
            ..Default::default()
        };
    };

    IncidentRecord {
        id: identifier(fields),
        name: first_success(fields, NAME_RESOLVERS).unwrap_or_else(|| NAME_PLACEHOLDER.to_string()),
        municipality: first_field(fields, MUNICIPALITY_KEYS, present_text),
        parish: fields.get("freguesia").and_then(present_text),
        district: first_field(fields, DISTRICT_KEYS, present_text),
        status: first_field(fields, STATUS_KEYS, present_text).unwrap_or_default(),
        personnel: count_field(fields, PERSONNEL_KEYS),
        ground_units: count_field(fields, GROUND_KEYS),
        air_units: count_field(fields, AIR_KEYS),
        location: location(fields),
        kml: kml_source(fields),
        area_km2: first_field(fields, AREA_KEYS, parse_float),
        timestamp: first_success(fields, TIMESTAMP_RESOLVERS),
        start_epoch: structured_epoch(fields),
    }
}

/// Try each resolver in order and return the first value produced
pub fn first_success<T>(fields: &Fields, resolvers: &[Resolver<T>]) -> Option<T> {
    resolvers.iter().find_map(|resolve| resolve(fields))
}

/// Look up `keys` in order and return the first value `parse` accepts
pub fn first_field<T>(fields: &Fields, keys: &[&str], parse: impl Fn(&Value) -> Option<T>) -> Option<T> {
    keys.iter().filter_map(|k| fields.get(*k)).find_map(parse)
}

/// A non-negative count from the first key that parses, else 0
pub fn count_field(fields: &Fields, keys: &[&str]) -> u32 {
    first_field(fields, keys, parse_count).unwrap_or(0)
}

/// Whether a value counts as "present": not null, false, zero or empty
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Render a value for display; strings are taken verbatim
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn present_text(value: &Value) -> Option<String> {
    is_present(value).then(|| value_to_string(value))
}

/// Parse an integer-like or float-like value into a count
///
/// Integers are taken as-is, floats and float strings are truncated.
/// Negative or non-numeric values are rejected.
pub fn parse_count(value: &Value) -> Option<u32> {
    match value {
        Value::Bool(b) => Some(u32::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => u32::try_from(i).ok(),
            None => n.as_f64().and_then(truncate_count),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => u32::try_from(i).ok(),
                Err(_) => s.parse::<f64>().ok().and_then(truncate_count),
            }
        }
        _ => None,
    }
}

fn truncate_count(f: f64) -> Option<u32> {
    if !f.is_finite() {
        return None;
    }
    let t = f.trunc();
    if t < 0.0 || t > f64::from(u32::MAX) {
        return None;
    }
    Some(t as u32)
}

/// Parse a finite float from a number or numeric string
pub fn parse_float(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    f.is_finite().then_some(f)
}

fn location(fields: &Fields) -> Option<Location> {
    let lat = first_field(fields, LAT_KEYS, parse_float)?;
    let lon = first_field(fields, LON_KEYS, parse_float)?;
    Some(Location { lat, lon })
}

/// The curated `kmlVost` perimeter wins over the operational `kml` one
fn kml_source(fields: &Fields) -> Option<KmlSource> {
    [KmlField::KmlVost, KmlField::Kml]
        .into_iter()
        .find_map(|field| {
            let value = fields.get(field.key())?.as_str()?.trim();
            (!value.is_empty()).then(|| KmlSource {
                field,
                value: value.to_string(),
            })
        })
}

fn identifier(fields: &Fields) -> Option<String> {
    fields.get("id").and_then(present_text)
}

fn place_name(fields: &Fields) -> Option<String> {
    first_field(fields, NAME_KEYS, present_text)
}

fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        _ => None,
    }
}

/// Local-time label for an epoch, `None` when it is out of range
pub fn format_epoch(seconds: i64) -> Option<String> {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.with_timezone(&Local).format(DATE_FORMAT).to_string())
}

/// `dateTime: {sec}` (or `{seconds}`) as published by the fires feed
fn structured_epoch(fields: &Fields) -> Option<i64> {
    let date_time = fields.get("dateTime")?.as_object()?;
    let seconds = ["sec", "seconds"]
        .iter()
        .filter_map(|k| date_time.get(*k))
        .find(|v| is_present(v))?;

    epoch_seconds(seconds).filter(|s| *s > 0)
}

fn structured_epoch_label(fields: &Fields) -> Option<String> {
    structured_epoch(fields).and_then(format_epoch)
}

fn numeric_epoch_label(fields: &Fields) -> Option<String> {
    first_field(fields, EPOCH_KEYS, |v| epoch_seconds(v).and_then(format_epoch))
}

/// Free-text date fields; a separate `hour` is appended to `date`
fn text_date_label(fields: &Fields) -> Option<String> {
    DATE_TEXT_KEYS.iter().find_map(|&key| {
        let text = fields.get(key).and_then(present_text)?;
        if key == "date"
            && let Some(hour) = fields.get("hour").and_then(present_text)
        {
            return Some(format!("{} {}", text, hour));
        }
        Some(text)
    })
}

/// Locate the incident list in a JSON document
///
/// Accepts a bare array, an object with an `incendios` or `data` array, or
/// failing those the first array of objects found among the object's values.
pub fn incident_items(document: &Value) -> Option<&[Value]> {
    match document {
        Value::Array(items) => Some(items),
        Value::Object(map) => ["incendios", "data"]
            .iter()
            .find_map(|k| map.get(*k)?.as_array())
            .or_else(|| {
                map.values()
                    .filter_map(Value::as_array)
                    .find(|items| items.first().is_some_and(Value::is_object))
            })
            .map(Vec::as_slice),
        _ => None,
    }
}

/// Records with strictly more than `min_personnel` personnel, in feed order
pub fn above_personnel(mut records: Vec<IncidentRecord>, min_personnel: u32) -> Vec<IncidentRecord> {
    records.retain(|r| r.personnel > min_personnel);
    records
}

/// Records with strictly more than `min_personnel` personnel, most first
pub fn select_by_personnel(records: Vec<IncidentRecord>, min_personnel: u32) -> Vec<IncidentRecord> {
    let mut records = above_personnel(records, min_personnel);
    records.sort_by(|a, b| b.personnel.cmp(&a.personnel));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_first_listed_key_wins() {
        let record = normalize(&json!({"concelho": "A", "local": "B"}));
        assert_eq!(record.name, "A");

        let record = normalize(&json!({"concelho": "", "local": "B", "nome": "C"}));
        assert_eq!(record.name, "B");
    }

    #[test]
    fn test_name_falls_back_to_id_then_placeholder() {
        assert_eq!(normalize(&json!({"id": "2025080012345"})).name, "2025080012345");
        assert_eq!(normalize(&json!({"id": 42})).name, "42");
        assert_eq!(normalize(&json!({})).name, NAME_PLACEHOLDER);
        assert_eq!(normalize(&json!("not an object")).name, NAME_PLACEHOLDER);
    }

    #[test]
    fn test_counts() {
        let record = normalize(&json!({
            "man": "120",
            "terrain": 35.9,
            "aerial": "4.7"
        }));
        assert_eq!(record.personnel, 120);
        assert_eq!(record.ground_units, 35);
        assert_eq!(record.air_units, 4);
    }

    #[test]
    fn test_count_fallback_order() {
        let record = normalize(&json!({
            "operacionais": null,
            "man": "lots",
            "oper": 17,
            "terrestres": -3,
            "terrain": 8
        }));
        assert_eq!(record.personnel, 17);
        assert_eq!(record.ground_units, 8);
        assert_eq!(record.air_units, 0);

        // First parseable key wins even if a later one is larger
        let record = normalize(&json!({"operacionais": 5, "man": 500}));
        assert_eq!(record.personnel, 5);
    }

    #[test]
    fn test_parse_count_edge_cases() {
        assert_eq!(parse_count(&json!(" 12 ")), Some(12));
        assert_eq!(parse_count(&json!("1e2")), Some(100));
        assert_eq!(parse_count(&json!("nan")), None);
        assert_eq!(parse_count(&json!([])), None);
        assert_eq!(parse_count(&json!(true)), Some(1));
    }

    #[test]
    fn test_location_accepts_strings() {
        let record = normalize(&json!({"lat": "40.2", "lng": -8.41}));
        assert_eq!(record.location, Some(Location { lat: 40.2, lon: -8.41 }));

        let record = normalize(&json!({"latitude": 40.2}));
        assert_eq!(record.location, None);
    }

    #[test]
    fn test_kml_prefers_vost() {
        let record = normalize(&json!({"kmlVost": "https://a/vost.kml", "kml": "https://a/op.kml"}));
        let kml = record.kml.unwrap();
        assert_eq!(kml.field, KmlField::KmlVost);
        assert_eq!(kml.value, "https://a/vost.kml");

        let record = normalize(&json!({"kmlVost": "", "kml": "<kml/>"}));
        assert_eq!(record.kml.unwrap().field, KmlField::Kml);

        assert!(normalize(&json!({"kmlVost": null, "kml": "  "})).kml.is_none());
    }

    #[test]
    fn test_timestamp_structured_epoch() {
        let record = normalize(&json!({"id": "x", "dateTime": {"sec": 1_755_000_000}}));
        assert_eq!(record.start_epoch, Some(1_755_000_000));
        assert_eq!(record.timestamp, format_epoch(1_755_000_000));

        let record = normalize(&json!({"dateTime": {"sec": 0, "seconds": 1_700_000_000}}));
        assert_eq!(record.start_epoch, Some(1_700_000_000));
    }

    #[test]
    fn test_timestamp_numeric_then_text() {
        let record = normalize(&json!({"started": 1_600_000_000, "date": "01-01-2025"}));
        assert_eq!(record.timestamp, format_epoch(1_600_000_000));
        assert_eq!(record.start_epoch, None);

        let record = normalize(&json!({"timestamp": "yesterday", "data_inicio": "21-08-2025 14:05"}));
        assert_eq!(record.timestamp.as_deref(), Some("21-08-2025 14:05"));
    }

    #[test]
    fn test_timestamp_composes_date_and_hour() {
        let record = normalize(&json!({"date": "21-08-2025", "hour": "14:05"}));
        assert_eq!(record.timestamp.as_deref(), Some("21-08-2025 14:05"));

        let record = normalize(&json!({"hour": "14:05"}));
        assert_eq!(record.timestamp.as_deref(), Some("14:05"));
    }

    #[test]
    fn test_timestamp_falls_back_to_id() {
        let record = normalize(&json!({"id": "2025123"}));
        assert_eq!(record.timestamp.as_deref(), Some("2025123"));
        assert_eq!(normalize(&json!({})).timestamp, None);
    }

    #[test]
    fn test_first_success_stops_at_first_hit() {
        fn never(_: &Fields) -> Option<u8> {
            None
        }
        fn one(_: &Fields) -> Option<u8> {
            Some(1)
        }
        fn two(_: &Fields) -> Option<u8> {
            Some(2)
        }
        let fields = Fields::new();
        assert_eq!(first_success(&fields, &[never, one, two]), Some(1));
        assert_eq!(first_success::<u8>(&fields, &[never]), None);
    }

    #[test]
    fn test_incident_items() {
        let report = json!({"atualizado_em": "x", "incendios": [{"id": "1"}]});
        assert_eq!(incident_items(&report).unwrap().len(), 1);

        let feed = json!({"success": true, "data": [{"id": "1"}, {"id": "2"}]});
        assert_eq!(incident_items(&feed).unwrap().len(), 2);

        let other = json!({"meta": [1, 2], "rows": [{"id": "1"}]});
        assert_eq!(incident_items(&other).unwrap().len(), 1);

        assert_eq!(incident_items(&json!([])).unwrap().len(), 0);
        assert!(incident_items(&json!({"meta": 1})).is_none());
        assert!(incident_items(&json!(3)).is_none());
    }

    #[test]
    fn test_select_by_personnel() {
        let records = vec![
            normalize(&json!({"id": "a", "man": 95})),
            normalize(&json!({"id": "b", "man": 90})),
            normalize(&json!({"id": "c", "man": 300})),
            normalize(&json!({"id": "d", "man": 95})),
        ];
        let ids: Vec<String> = select_by_personnel(records, 90)
            .into_iter()
            .filter_map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "d"]);
    }

    #[test]
    fn test_above_personnel_keeps_feed_order() {
        let records = vec![
            normalize(&json!({"id": "a", "man": 95})),
            normalize(&json!({"id": "b", "man": 90})),
            normalize(&json!({"id": "c", "man": 300})),
        ];
        let ids: Vec<String> = above_personnel(records, 90)
            .into_iter()
            .filter_map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
