use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/somna/config.toml` or `~/.config/somna/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SOMNA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub timer: TimerSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub playback: PlaybackSettings,
    pub library: LibrarySettings,
    pub i18n: I18nSettings,
    pub user_data: UserDataSettings,
    pub analytics: AnalyticsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Crossfade duration when switching tracks (milliseconds).
    /// Set to 0 to disable crossfade.
    pub crossfade_ms: u64,
    /// Number of steps used to fade volumes (higher = smoother, more CPU).
    pub crossfade_steps: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Volume at startup, 0-100.
    pub initial_volume: u8,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            crossfade_ms: 250,
            crossfade_steps: 10,
            quit_fade_out_ms: 500,
            initial_volume: 70,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    /// Minute presets cycled by the timer key. `0` means "off".
    pub presets_minutes: Vec<u32>,
    /// How long the sleep timer fades the current track before stopping it.
    pub fade_out_ms: u64,
    /// Cadence of the remaining-time refresh.
    pub refresh_interval_ms: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            presets_minutes: vec![0, 15, 30, 45, 60, 90],
            fade_out_ms: 3000,
            refresh_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// How long toast notifications stay in the status box.
    pub notification_secs: u64,
    /// Open the now-playing overlay whenever playback starts.
    pub show_modal_on_play: bool,
    /// Whether the cursor starts in "follow playback" mode.
    pub follow_playback: bool,
    /// Color scheme used until the user picks one.
    pub theme: Theme,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ breathe in, breathe out ~ ".to_string(),
            notification_secs: 4,
            show_modal_on_play: true,
            follow_playback: true,
            theme: Theme::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Dusk,
    Forest,
    Ocean,
    Ember,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Dusk, Theme::Forest, Theme::Ocean, Theme::Ember];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Dusk => "dusk",
            Theme::Forest => "forest",
            Theme::Ocean => "ocean",
            Theme::Ember => "ember",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Volume change per `+` / `-` press.
    pub volume_step: u8,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 10,
            volume_step: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Default loop mode.
    pub loop_mode: LoopModeSetting,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            loop_mode: LoopModeSetting::LoopAll,
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopModeSetting {
    #[serde(alias = "no_loop", alias = "no-loop")]
    NoLoop,
    #[serde(
        alias = "loopall",
        alias = "loop_all",
        alias = "loop-all",
        alias = "loop-around"
    )]
    LoopAll,
    #[serde(
        alias = "loopone",
        alias = "loop_one",
        alias = "loop-one",
        alias = "repeat-one"
    )]
    LoopOne,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Library root; the first CLI argument wins over this.
    pub root: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Optional cap on recursion depth inside a category folder.
    pub max_depth: Option<usize>,
    /// Category assigned to files sitting directly in the library root.
    pub uncategorized_name: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: None,
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
                "m4a".into(),
            ],
            follow_links: true,
            include_hidden: false,
            max_depth: None,
            uncategorized_name: "uncategorized".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct I18nSettings {
    /// Locale used at startup unless the user picked another one earlier.
    pub locale: String,
    /// Locale consulted for keys the active locale lacks.
    pub fallback_locale: String,
    /// Directory holding `<locale>.json` / `<locale>.toml` dictionaries.
    pub locales_dir: Option<PathBuf>,
    /// Refuse to start when a locale misses UI keys.
    pub strict: bool,
}

impl Default for I18nSettings {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            fallback_locale: "en-US".to_string(),
            locales_dir: None,
            strict: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserDataSettings {
    /// Override for the user-data JSON file.
    pub path: Option<PathBuf>,
    pub max_favorites: usize,
    pub max_history: usize,
}

impl Default for UserDataSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_favorites: 200,
            max_history: 50,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyticsProvider {
    #[serde(alias = "ga", alias = "google-analytics")]
    Ga4,
    Amplitude,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    pub enabled: bool,
    pub provider: AnalyticsProvider,
    /// Overrides the provider's default collection URL.
    pub endpoint: Option<String>,
    /// GA4 measurement id (`G-XXXX`).
    pub measurement_id: Option<String>,
    /// GA4 Measurement Protocol secret.
    pub api_secret: Option<String>,
    /// Amplitude project API key.
    pub api_key: Option<String>,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: AnalyticsProvider::Ga4,
            endpoint: None,
            measurement_id: None,
            api_secret: None,
            api_key: None,
            max_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}
