use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::path::{Path, PathBuf};
use std::time::Instant;

use firemap::api::{FogosClient, resolve_kml};
use firemap::config::{ApiConfig, ExportConfig, FileConfig};
use firemap::domain::IncidentRecord;
use firemap::export::{ExportReport, SummaryExport, export_incident, read_incidents, write_json};
use firemap::geometry::places::{DEFAULT_NEARBY_KM, nearby_places, places_in_viewport};
use firemap::geometry::{BoundingBox, Crs, Viewport, point_fallback_ring};
use firemap::kml::{extract_name, extract_rings};
use firemap::normalize::{above_personnel, normalize, select_by_personnel};
use firemap::pipeline::{IncidentGeometry, analyze_kml};

/// Extract wildfire burned-area polygons from fogos.pt and frame them for map rendering
///
/// Examples:
///   # Export incidents with more than 90 personnel, saving their KML perimeters
///   firemap export
///
///   # Lower the threshold and write somewhere else
///   firemap export -m 50 -o out/incendios.json --kml-dir out/kml
///
///   # National totals
///   firemap summary
///
///   # Measure and frame a perimeter already on disk
///   firemap inspect kml/2025090012345.kml
///
///   # Review a saved export
///   firemap list json/incendios_gt90.json
#[derive(Parser, Debug)]
#[command(name = "firemap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches firemap.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch active incidents and export those above a personnel threshold
    Export {
        /// Export incidents with strictly more personnel than this
        #[arg(short = 'm', long)]
        min_personnel: Option<u32>,

        /// Output JSON file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Directory for downloaded KML perimeters
        #[arg(long)]
        kml_dir: Option<PathBuf>,
    },

    /// Fetch and export the latest national totals
    Summary {
        /// Output JSON file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Report the largest polygon, its area and framing for a KML file
    Inspect {
        file: PathBuf,

        /// Radius in km for listing nearby towns
        #[arg(short = 'r', long, default_value_t = DEFAULT_NEARBY_KM)]
        radius: f64,
    },

    /// List incidents from a saved export or feed dump, most personnel first
    List {
        file: PathBuf,

        /// Only show incidents with strictly more personnel than this
        #[arg(short = 'm', long, default_value = "0")]
        min_personnel: u32,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let multi = init_logger(args.verbose);

    let file_config = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .context(format!("Failed to read config file: {:?}", config_path))?;
            Some(toml::from_str::<FileConfig>(&contents).context("Failed to parse config file")?)
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        FileConfig::load()
    };

    let verbose = args.verbose || file_config.as_ref().is_some_and(|c| c.verbose);
    let api_config = file_config
        .as_ref()
        .and_then(|c| c.api.clone())
        .unwrap_or_default();
    let mut export_config = file_config
        .as_ref()
        .and_then(|c| c.export.clone())
        .unwrap_or_default();

    match args.command {
        Command::Export {
            min_personnel,
            output,
            kml_dir,
        } => {
            if let Some(m) = min_personnel {
                export_config.min_personnel = m;
            }
            if let Some(o) = output {
                export_config.output = o;
            }
            if let Some(d) = kml_dir {
                export_config.kml_dir = d;
            }
            run_export(&multi, api_config, &export_config, verbose)
        }
        Command::Summary { output } => {
            let output = output.unwrap_or(export_config.summary_output);
            run_summary(&multi, api_config, &output)
        }
        Command::Inspect { file, radius } => run_inspect(&file, radius),
        Command::List {
            file,
            min_personnel,
        } => run_list(&file, min_personnel),
    }
}

/// Install the logger behind `indicatif-log-bridge` so log lines are
/// printed above progress bars instead of through them
///
/// Every bar must be added to the returned [`MultiProgress`].
fn init_logger(verbose: bool) -> MultiProgress {
    let multi = MultiProgress::new();
    let default_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(default_level)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    LogWrapper::new(multi.clone(), logger).try_init().ok();
    log::set_max_level(level);

    multi
}

fn run_export(
    multi: &MultiProgress,
    api_config: ApiConfig,
    config: &ExportConfig,
    verbose: bool,
) -> Result<()> {
    let total_start = Instant::now();

    println!("firemap - Wildfire Perimeter Export");
    println!("===================================");
    println!();

    if verbose {
        println!("Configuration:");
        println!("  Fires feed: {}", api_config.fires_url);
        println!("  Min personnel: > {}", config.min_personnel);
        println!("  Max retries: {}", api_config.max_retries);
        println!("  Output: {}", config.output.display());
        println!("  KML directory: {}", config.kml_dir.display());
        println!();
    }

    let client = FogosClient::new(api_config)?;

    let spinner = create_spinner(multi, "Fetching active incidents from fogos.pt...");
    let items = client.fetch_fires().context("Failed to fetch incidents")?;
    spinner.finish_with_message(format!("Fetched {} incidents", items.len()));

    let records: Vec<IncidentRecord> = items.iter().map(normalize).collect();
    let selected = above_personnel(records, config.min_personnel);
    println!(
        "  {} incidents with more than {} personnel",
        selected.len(),
        config.min_personnel
    );

    let progress = multi.add(ProgressBar::new(selected.len() as u64));
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );

    let mut exports = Vec::with_capacity(selected.len());
    let mut with_perimeter = 0;
    for record in &selected {
        progress.set_message(record.name.clone());

        let raw = record.kml.as_ref().map(|k| k.value.as_str()).unwrap_or("");
        let kml_text = resolve_kml(&client, raw);
        let exported = export_incident(record, &kml_text, &config.kml_dir);

        if exported.geometry.is_some() {
            with_perimeter += 1;
        }
        progress.println(describe_incident(record, exported.geometry.as_ref()));
        exports.push(exported.export);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let report = ExportReport::new(config.min_personnel, exports);
    write_json(&config.output, &report)?;

    println!();
    println!(
        "Exported {} incidents ({} with perimeter) in {:.1}s",
        report.total,
        with_perimeter,
        total_start.elapsed().as_secs_f64()
    );
    println!("Output: {}", config.output.display());
    Ok(())
}

fn describe_incident(record: &IncidentRecord, geometry: Option<&IncidentGeometry>) -> String {
    let framing = match geometry {
        Some(g) => format!("{:.2} km², zoom {}", g.area_km2, g.viewport.zoom),
        None => match record
            .location
            .and_then(point_fallback_ring)
            .and_then(|ring| Viewport::from_ring(&ring).ok())
        {
            Some(v) => format!("no perimeter, point view at zoom {}", v.zoom),
            None => "no perimeter".to_string(),
        },
    };

    format!(
        "  {} {} ({} personnel): {}",
        record.id_or_unknown(),
        record.name,
        record.personnel,
        framing
    )
}

fn run_summary(multi: &MultiProgress, api_config: ApiConfig, output: &Path) -> Result<()> {
    let client = FogosClient::new(api_config)?;

    let spinner = create_spinner(multi, "Fetching national totals...");
    let entries = client
        .fetch_summary()
        .context("Failed to fetch summary")?;
    let summary =
        SummaryExport::from_latest(&entries).context("Summary feed returned no entries")?;
    spinner.finish_with_message(format!("Latest update: {}", summary.ultima_atualizacao));

    write_json(output, &summary)?;

    println!("  Incidents: {}", summary.total_incendios);
    println!("  Personnel: {}", summary.man);
    println!("  Ground units: {}", summary.terrain);
    println!("  Air units: {}", summary.aerial);
    println!("Output: {}", output.display());
    Ok(())
}

fn run_inspect(file: &Path, radius_km: f64) -> Result<()> {
    let kml = std::fs::read_to_string(file).context(format!("Failed to read {:?}", file))?;

    if let Some(name) = extract_name(&kml) {
        println!("Name: {}", name);
    }
    println!("Rings: {}", extract_rings(&kml).len());

    let Some(geometry) = analyze_kml(&kml) else {
        println!("No usable polygon found");
        return Ok(());
    };

    let bbox = &geometry.viewport.bbox;
    println!("Largest polygon: {} points", geometry.ring.len());
    println!("Area: {:.6} km²", geometry.area_km2);
    println!(
        "Viewport (EPSG:{}): [{:.1}, {:.1}] - [{:.1}, {:.1}]",
        bbox.crs.epsg(),
        bbox.min_x,
        bbox.min_y,
        bbox.max_x,
        bbox.max_y
    );
    println!("Span: {:.0} m, zoom {}", geometry.viewport.span(), geometry.viewport.zoom);

    if let Some(extent) = BoundingBox::from_points(geometry.ring.points(), Crs::Wgs84) {
        let lat = (extent.min_y + extent.max_y) / 2.0;
        let lon = (extent.min_x + extent.max_x) / 2.0;

        let nearby = nearby_places(lat, lon, radius_km);
        if !nearby.is_empty() {
            println!("Nearby towns:");
            for (place, km) in nearby {
                println!("  {} ({:.1} km)", place.name, km);
            }
        }
    }

    let visible = places_in_viewport(&geometry.viewport);
    if !visible.is_empty() {
        let names: Vec<&str> = visible.iter().map(|p| p.name).collect();
        println!("Towns in view: {}", names.join(", "));
    }

    Ok(())
}

fn run_list(file: &Path, min_personnel: u32) -> Result<()> {
    let records = select_by_personnel(read_incidents(file)?, min_personnel);

    println!("{} incidents", records.len());
    for record in &records {
        let area = record
            .area_km2
            .map(|a| format!("{:.2} km²", a))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<24} {:>5} personnel {:>4} ground {:>3} air  {:>12}  {}",
            record.name,
            record.personnel,
            record.ground_units,
            record.air_units,
            area,
            record.timestamp.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn create_spinner(multi: &MultiProgress, message: &str) -> ProgressBar {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
