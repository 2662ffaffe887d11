use serde::Deserialize;
use std::path::PathBuf;

fn default_fires_url() -> String {
    "https://api-dev.fogos.pt/new/fires".to_string()
}
fn default_summary_url() -> String {
    "https://api-lb.fogos.pt/v1/now/data".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_secs() -> u64 {
    5
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139 Safari/537.36"
        .to_string()
}
fn default_min_personnel() -> u32 {
    90
}
fn default_output() -> PathBuf {
    PathBuf::from("json/incendios_gt90.json")
}
fn default_summary_output() -> PathBuf {
    PathBuf::from("json/resumo_total.json")
}
fn default_kml_dir() -> PathBuf {
    PathBuf::from("kml")
}
fn default_verbose() -> bool {
    false
}

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub api: Option<ApiConfig>,
    #[serde(default)]
    pub export: Option<ExportConfig>,
}

/// Upstream fogos.pt endpoints and HTTP behaviour
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_fires_url")]
    pub fires_url: String,
    #[serde(default = "default_summary_url")]
    pub summary_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base wait between retries, multiplied by the attempt number
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            fires_url: default_fires_url(),
            summary_url: default_summary_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_secs: default_backoff_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Where and what to export
#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// Only incidents with strictly more personnel than this are exported
    #[serde(default = "default_min_personnel")]
    pub min_personnel: u32,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_summary_output")]
    pub summary_output: PathBuf,
    #[serde(default = "default_kml_dir")]
    pub kml_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            min_personnel: default_min_personnel(),
            output: default_output(),
            summary_output: default_summary_output(),
            kml_dir: default_kml_dir(),
        }
    }
}

impl FileConfig {
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        log::warn!("Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("firemap.toml"));
    paths.push(PathBuf::from(".firemap.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("firemap").join("config.toml"));
        paths.push(config_dir.join("firemap.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".firemap.toml"));
        paths.push(home.join(".config").join("firemap").join("config.toml"));
    }

    paths
}
