use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use crate::text::DEFAULT_CONTEXT_RADIUS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".into(),
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSettings {
    pub window_days: u32,
    /// Offset of the timezone whose calendar days the daily series uses.
    pub utc_offset_minutes: i32,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            window_days: 7,
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_path: PathBuf,
    pub provider: ProviderSettings,
    pub context_radius: usize,
    pub stats: StatsSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("lectern.sqlite3"),
            provider: ProviderSettings::default(),
            context_radius: DEFAULT_CONTEXT_RADIUS,
            stats: StatsSettings::default(),
        }
    }
}

impl Settings {
    /// Read `path` if it exists (defaults otherwise), then apply environment
    /// overrides. A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?
        } else {
            Settings::default()
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("LECTERN_DB_PATH") {
            self.database_path = PathBuf::from(value);
        }
        if let Ok(value) = env::var("LECTERN_PROVIDER_URL") {
            self.provider.api_url = value;
        }
        if let Ok(value) = env::var("LECTERN_PROVIDER_MODEL") {
            self.provider.model = value;
        }
        if let Ok(value) = env::var("OPENAI_API_KEY") {
            self.provider.api_key = value;
        }
        if let Some(offset) = env::var("LECTERN_STATS_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.stats.utc_offset_minutes = offset;
        }
    }
}

/// Settings loaded from disk that can be changed and written back.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = Settings::load(&path)?;
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> Settings {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update_stats(&self, stats: StatsSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.stats = stats;
        self.persist(&guard)
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
