use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::{PluginKind, PluginSlot, RotationPlan, SchedulerConfig};
use crate::forecast_cache::DEFAULT_RETRY_BACKOFF_SECS;
use crate::weather::Units;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// seconds between forecast refreshes
    pub update_freq: u64,
    /// seconds the info screen stays up
    pub info_pause: u32,
    /// seconds of plugin rotation before the info screen
    pub info_delay: u32,
    /// seconds to wait after a failed fetch
    pub retry_backoff: u64,
    pub fetch_timeout_ms: u64,
    /// main loop polls per second, ticks still happen once a second
    pub poll_hz: u32,
    pub weather: WeatherConfig,
    /// rotation order, first enabled entry is the default screen
    pub plugins: Vec<PluginConfig>,
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            update_freq: 300,
            info_pause: 300,
            info_delay: 900,
            retry_backoff: DEFAULT_RETRY_BACKOFF_SECS,
            fetch_timeout_ms: 10_000,
            poll_hz: 10,
            weather: WeatherConfig::default(),
            plugins: vec![
                PluginConfig::new(PluginKind::Daily, true),
                PluginConfig::new(PluginKind::Hourly, true),
                PluginConfig::new(PluginKind::Rss, false),
                PluginConfig::new(PluginKind::Speedtest, false),
            ],
            display: DisplayConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub units: Units,
    pub timezone: String,
    pub forecast_days: u8,
    pub hourly_slots: usize,
    /// override for the forecast endpoint
    pub api_url: Option<String>,
}

impl WeatherConfig {
    /// Both coordinates, None unless both are set
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            units: Units::Metric,
            timezone: "auto".to_string(),
            forecast_days: 4,
            hourly_slots: 4,
            api_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    pub name: PluginKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// seconds per view, weights the rotation period
    #[serde(default = "default_pause")]
    pub pause: u32,
    /// hand-off file for rss/speedtest, one item per line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

fn default_enabled() -> bool { true }
fn default_pause() -> u32 { 60 }

impl PluginConfig {
    pub fn new(name: PluginKind, enabled: bool) -> Self {
        Self { name, enabled, pause: default_pause(), source: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// clear the terminal before each frame
    pub clear_screen: bool,
    /// frame width in characters
    pub width: usize,
    /// where the `s` key writes screen captures
    pub screenshot_dir: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { clear_screen: true, width: 48, screenshot_dir: PathBuf::from(".") }
    }
}

impl Config {
    /// Enabled plugins in configured order
    pub fn rotation_plan(&self) -> Result<RotationPlan, ConfigError> {
        RotationPlan::new(
            self.plugins.iter()
                .filter(|p| p.enabled)
                .map(|p| PluginSlot { kind: p.name, pause: p.pause }),
        )
        .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            info_pause: self.info_pause,
            info_delay: self.info_delay,
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "piweatherrock", about = "PiWeatherRock weather display", version, disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub update_freq: Option<u64>,
    #[arg(long)]
    pub info_pause: Option<u32>,
    #[arg(long)]
    pub info_delay: Option<u32>,
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub longitude: Option<f64>,
    #[arg(long, value_parser = parse_units)]
    pub units: Option<Units>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

fn parse_units(s: &str) -> Result<Units, String> {
    match s.to_ascii_lowercase().as_str() {
        "metric" | "si" => Ok(Units::Metric),
        "imperial" | "us" => Ok(Units::Imperial),
        _ => Err(format!("unknown units '{}' (metric|imperial)", s)),
    }
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = resolve(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Layer defaults, YAML and CLI overrides, then validate.
pub fn resolve(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults come from serde(default), 2) YAML file (explicit path or search)
    let mut cfg = if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            read_yaml(p)?
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        read_yaml(&p)?
    } else {
        Config::default()
    };

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/piweatherrock/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/piweatherrock/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/piweatherrock.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["piweatherrock.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()   { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                 { cfg.log_level = Some("debug".to_string()); }
    if let Some(v) = cli.update_freq { cfg.update_freq = v; }
    if let Some(v) = cli.info_pause  { cfg.info_pause = v; }
    if let Some(v) = cli.info_delay  { cfg.info_delay = v; }
    if cli.latitude.is_some()    { cfg.weather.latitude = cli.latitude; }
    if cli.longitude.is_some()   { cfg.weather.longitude = cli.longitude; }
    if let Some(u) = cli.units   { cfg.weather.units = u; }
}

/// Reject anything the scheduler or fetcher cannot run with.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.update_freq == 0 {
        return Err(ConfigError::Validation("update_freq must be > 0".into()));
    }
    if cfg.fetch_timeout_ms == 0 {
        return Err(ConfigError::Validation("fetch_timeout_ms must be > 0".into()));
    }
    if cfg.poll_hz == 0 {
        return Err(ConfigError::Validation("poll_hz must be > 0".into()));
    }
    if let Some(p) = cfg.plugins.iter().find(|p| p.enabled && p.pause == 0) {
        return Err(ConfigError::Validation(format!("plugin '{}' pause must be > 0", p.name)));
    }
    // no enabled plugin or a duplicate entry
    cfg.rotation_plan()?;

    let w = &cfg.weather;
    match (w.latitude, w.longitude) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(ConfigError::Validation(format!("coordinates out of range: {}, {}", lat, lng)));
            }
        }
        _ => return Err(ConfigError::Validation("weather latitude and longitude are required".into())),
    }
    if w.forecast_days == 0 || w.forecast_days > 16 {
        return Err(ConfigError::Validation("weather forecast_days must be 1..=16".into()));
    }
    if cfg.display.width < 20 {
        return Err(ConfigError::Validation("display width must be >= 20".into()));
    }
    Ok(())
}
