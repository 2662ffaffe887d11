//! JSON documents written for the rendering and video tools
//!
//! Field names here are read by other programs and must not change.

use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::domain::IncidentRecord;
use crate::kml::extract_name;
use crate::normalize::{count_field, first_field, format_epoch, incident_items, normalize};
use crate::pipeline::{IncidentGeometry, analyze_kml};

/// Written in place of a start date when the feed has none
pub const NULL_DATE: &str = "null";

const MAX_FILENAME_CHARS: usize = 200;

/// One incident as persisted in the export report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentExport {
    pub id: Option<String>,
    /// `dd-mm-YYYY HH:MM` local time, or the literal `"null"`
    pub data_inicio: String,
    pub concelho: Option<String>,
    pub freguesia: Option<String>,
    pub distrito: Option<String>,
    pub status: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub operacionais: u32,
    pub terrestres: u32,
    pub aereos: u32,
    /// km², rounded to 6 decimals; null when no polygon was found
    pub area_km2: Option<f64>,
    pub tem_kml: bool,
    pub kml_source: Option<String>,
    pub kml_file: Option<String>,
}

impl IncidentExport {
    /// `kml_resolved` says whether the KML field produced any text
    pub fn new(
        record: &IncidentRecord,
        area_km2: Option<f64>,
        kml_resolved: bool,
        kml_file: Option<&Path>,
    ) -> Self {
        Self {
            id: record.id.clone(),
            data_inicio: record
                .start_epoch
                .and_then(format_epoch)
                .unwrap_or_else(|| NULL_DATE.to_string()),
            concelho: record.municipality.clone(),
            freguesia: record.parish.clone(),
            distrito: record.district.clone(),
            status: (!record.status.is_empty()).then(|| record.status.clone()),
            latitude: record.location.map(|l| l.lat),
            longitude: record.location.map(|l| l.lon),
            operacionais: record.personnel,
            terrestres: record.ground_units,
            aereos: record.air_units,
            area_km2: area_km2.map(round_area),
            tem_kml: record.kml.is_some(),
            kml_source: record
                .kml
                .as_ref()
                .filter(|_| kml_resolved)
                .map(|k| k.field.key().to_string()),
            kml_file: kml_file.map(|p| p.display().to_string()),
        }
    }
}

/// The full export written by `firemap export`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    pub atualizado_em: String,
    pub criterio: String,
    pub total: usize,
    pub incendios: Vec<IncidentExport>,
}

impl ExportReport {
    pub fn new(min_personnel: u32, incendios: Vec<IncidentExport>) -> Self {
        Self {
            atualizado_em: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            criterio: format!("> {} operacionais", min_personnel),
            total: incendios.len(),
            incendios,
        }
    }
}

/// National totals written by `firemap summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryExport {
    pub man: u32,
    pub terrain: u32,
    pub aerial: u32,
    pub total_incendios: u32,
    pub ultima_atualizacao: String,
}

impl SummaryExport {
    /// Build from the most recent (last) entry of the summary feed
    pub fn from_latest(entries: &[Value]) -> Option<Self> {
        let latest = entries.last()?.as_object()?;

        Some(Self {
            man: count_field(latest, &["man"]),
            terrain: count_field(latest, &["terrain"]),
            aerial: count_field(latest, &["aerial"]),
            total_incendios: count_field(latest, &["total"]),
            ultima_atualizacao: first_field(latest, &["label"], |v| {
                v.as_str().map(str::to_string)
            })
            .unwrap_or_default(),
        })
    }
}

/// Result of running one incident through the export
#[derive(Debug, Clone)]
pub struct ExportedIncident {
    pub export: IncidentExport,
    pub geometry: Option<IncidentGeometry>,
}

/// Save the incident's KML (if any), measure its burned area and build its
/// export entry
///
/// `kml_text` is the already-resolved document; empty means none. A failed
/// KML write is logged and only leaves `kml_file` unset.
pub fn export_incident(record: &IncidentRecord, kml_text: &str, kml_dir: &Path) -> ExportedIncident {
    if kml_text.is_empty() {
        return ExportedIncident {
            export: IncidentExport::new(record, None, false, None),
            geometry: None,
        };
    }

    let file_name = kml_file_name(record.id_or_unknown(), extract_name(kml_text).as_deref());
    let path = kml_dir.join(file_name);
    let saved = match write_text(&path, kml_text) {
        Ok(()) => Some(path.as_path()),
        Err(e) => {
            log::warn!("{:#}", e);
            None
        }
    };

    let geometry = analyze_kml(kml_text);
    let area = geometry.as_ref().map(|g| g.area_km2);

    ExportedIncident {
        export: IncidentExport::new(record, area, true, saved),
        geometry,
    }
}

/// Round an area to the 6 decimals persisted downstream
pub fn round_area(area_km2: f64) -> f64 {
    (area_km2 * 1e6).round() / 1e6
}

/// Make a string safe to use as a file name component
///
/// Keeps letters, digits, `_`, `-` and `.`; whitespace becomes `_`;
/// everything else is dropped. At most 200 characters are kept.
pub fn safe_filename(s: &str) -> String {
    s.chars()
        .filter_map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.') {
                Some(ch)
            } else if ch.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .take(MAX_FILENAME_CHARS)
        .collect()
}

/// `{id}_{name}.kml` when the document is named, `{id}.kml` otherwise
pub fn kml_file_name(id: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("{}_{}.kml", id, safe_filename(name)),
        _ => format!("{}.kml", id),
    }
}

/// Write pretty-printed UTF-8 JSON, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    write_text(path, &json)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).context(format!("Failed to write {}", path.display()))
}

/// Load incidents from a JSON file written by this tool or fetched from the feed
pub fn read_incidents(path: &Path) -> Result<Vec<IncidentRecord>> {
    let contents =
        fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    let document: Value =
        serde_json::from_str(&contents).context(format!("Failed to parse {}", path.display()))?;

    let items = incident_items(&document).ok_or_else(|| {
        anyhow::anyhow!(
            "Unrecognized JSON layout in {}: expected 'incendios' or 'data' list",
            path.display()
        )
    })?;

    Ok(items.iter().map(normalize).collect())
}
