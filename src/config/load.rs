use std::{env, path::PathBuf};

use super::schema::{AnalyticsProvider, Settings};

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `SOMNA__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SOMNA")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("timer.presets_minutes")
                .with_list_parse_key("library.extensions")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.audio.crossfade_steps == 0 {
            return Err("audio.crossfade_steps must be >= 1".to_string());
        }
        if self.audio.initial_volume > 100 {
            return Err("audio.initial_volume must be within 0..=100".to_string());
        }
        if self.timer.presets_minutes.is_empty() {
            return Err("timer.presets_minutes must not be empty".to_string());
        }
        if self.timer.refresh_interval_ms == 0 {
            return Err("timer.refresh_interval_ms must be >= 1".to_string());
        }
        if self.controls.volume_step == 0 {
            return Err("controls.volume_step must be >= 1".to_string());
        }

        let analytics = &self.analytics;
        if analytics.enabled {
            if analytics.max_attempts == 0 {
                return Err("analytics.max_attempts must be >= 1".to_string());
            }
            match analytics.provider {
                AnalyticsProvider::Ga4 => {
                    if analytics.measurement_id.is_none() || analytics.api_secret.is_none() {
                        return Err(
                            "analytics: ga4 needs measurement_id and api_secret".to_string()
                        );
                    }
                }
                AnalyticsProvider::Amplitude => {
                    if analytics.api_key.is_none() {
                        return Err("analytics: amplitude needs api_key".to_string());
                    }
                }
            }
        }
        Ok(())
    }
}

/// Resolve the config path from `SOMNA_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SOMNA_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/somna/config.toml`
/// or `~/.config/somna/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("somna").join("config.toml"))
}

/// `$XDG_DATA_HOME/somna/user_data.json`, or `~/.local/share/somna/user_data.json`.
pub fn default_user_data_path() -> Option<PathBuf> {
    xdg_dir("XDG_DATA_HOME", ".local/share").map(|d| d.join("somna").join("user_data.json"))
}

/// `$XDG_STATE_HOME/somna/somna.log`, or `~/.local/state/somna/somna.log`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("somna").join("somna.log"))
}

fn xdg_dir(var: &str, home_relative: &str) -> Option<PathBuf> {
    if let Some(dir) = env::var_os(var).filter(|v| !v.is_empty()) {
        Some(PathBuf::from(dir))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_relative))
    }
}
