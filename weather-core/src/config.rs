use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    client::RetryPolicy,
    model::{Coordinates, CurrentConditions, Language, Theme, Units},
};

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Location used until the user searches or picks a saved city (Istanbul).
pub const DEFAULT_LOCATION: Coordinates = Coordinates { lat: 41.0082, lon: 28.9784 };

/// A city the user bookmarked for quick re-selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCity {
    pub id: u64,
    pub name: String,
    pub country: String,
    /// Temperature at the time the city was saved, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    /// Units `temperature` was reported in.
    #[serde(default)]
    pub units: Units,
    pub coordinates: Coordinates,
}

impl SavedCity {
    /// Bookmark for `current`, which was requested in `units`.
    pub fn from_current(current: &CurrentConditions, units: Units) -> Self {
        Self {
            id: current.id,
            name: current.name.clone(),
            country: current.country.clone(),
            temperature: Some(current.temperature.current),
            units,
            coordinates: current.coordinates,
        }
    }
}

fn default_location() -> Coordinates {
    DEFAULT_LOCATION
}

fn default_retries() -> u32 {
    RetryPolicy::default().max_retries
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// units = "imperial"
/// language = "es"
/// theme = "dark"
/// retries = 2
///
/// [last_location]
/// lat = 41.0082
/// lon = 28.9784
///
/// [[saved_cities]]
/// id = 2643743
/// name = "London"
/// country = "GB"
/// temperature = 48
/// units = "imperial"
/// coordinates = { lat = 51.5085, lon = -0.1257 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub units: Units,

    #[serde(default)]
    pub language: Language,

    #[serde(default)]
    pub theme: Theme,

    /// Extra attempts for transient network failures.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_location")]
    pub last_location: Coordinates,

    #[serde(default)]
    pub saved_cities: Vec<SavedCity>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            units: Units::default(),
            language: Language::default(),
            theme: Theme::default(),
            retries: default_retries(),
            last_location: DEFAULT_LOCATION,
            saved_cities: Vec::new(),
        }
    }
}

impl Config {
    /// API key from the environment, falling back to the stored one.
    pub fn api_key(&self) -> Result<String> {
        resolve_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_retries(self.retries)
    }

    pub fn toggle_units(&mut self) -> Units {
        self.units = self.units.toggle();
        self.units
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggle();
        self.theme
    }

    /// Adds a city unless one with the same id is already saved.
    /// Returns whether the list changed.
    pub fn add_saved_city(&mut self, city: SavedCity) -> bool {
        if self.saved_cities.iter().any(|c| c.id == city.id) {
            return false;
        }
        self.saved_cities.push(city);
        true
    }

    /// Returns whether a city was removed.
    pub fn remove_saved_city(&mut self, id: u64) -> bool {
        let before = self.saved_cities.len();
        self.saved_cities.retain(|c| c.id != id);
        self.saved_cities.len() != before
    }

    pub fn saved_city(&self, id: u64) -> Option<&SavedCity> {
        self.saved_cities.iter().find(|c| c.id == id)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), cities = cfg.saved_cities.len(), "Loaded config");
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn resolve_api_key(from_env: Option<String>, stored: Option<&str>) -> Result<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| stored.map(str::to_owned))
        .ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `weather configure` or set {API_KEY_ENV}."
            )
        })
}
