//! Translation tables and the lookup used by the UI.
//!
//! Lookups go active locale, then the fallback locale, then the key itself,
//! so a partially translated locale still renders every string.

mod builtin;
mod dictionary;
mod loader;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::I18nSettings;

use dictionary::interpolate;
pub use loader::I18nLoader;

/// Keys every shipped locale is expected to provide.
pub const REQUIRED_KEYS: &[&str] = &[
    "app.title",
    "player.helper",
    "player.now_playing",
    "player.playing",
    "player.paused",
    "player.stopped",
    "player.volume",
    "player.category",
    "player.elapsed",
    "player.no_tracks",
    "player.tracks",
    "timer.label",
    "timer.off",
    "timer.set",
    "timer.disabled",
    "timer.stopped",
    "timer.remaining",
    "favorites.added",
    "favorites.removed",
    "favorites.full",
    "loop.label",
    "loop.no_loop",
    "loop.loop_all",
    "loop.loop_one",
    "filter.label",
    "modal.title",
    "modal.close_hint",
    "modal.nothing",
    "status.language",
    "status.favorite",
    "controls.title",
    "controls.move",
    "controls.top_bottom",
    "controls.play_selected",
    "controls.play_pause",
    "controls.prev_next",
    "controls.scrub",
    "controls.volume",
    "controls.category",
    "controls.filter",
    "controls.loop",
    "controls.favorite",
    "controls.timer",
    "controls.overlay",
    "controls.language",
    "controls.stop",
    "controls.quit",
    "controls.resume",
    "controls.seek",
    "controls.reload",
    "controls.theme",
    "controls.rate",
    "theme.changed",
    "rating.thanks",
    "rating.already",
    "errors.playback",
    "errors.locale",
    "errors.resume",
];

#[derive(Debug, Error)]
pub enum I18nError {
    #[error("no dictionary for locale {0}")]
    UnknownLocale(String),
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("locale {locale} is missing {} keys: {}", keys.len(), keys.join(", "))]
    MissingKeys { locale: String, keys: Vec<String> },
}

pub struct I18n {
    loader: I18nLoader,
    locale: String,
    fallback: String,
}

impl I18n {
    /// The fallback locale must load; an unavailable `locale` degrades to it.
    pub fn new(mut loader: I18nLoader, locale: &str, fallback: &str) -> Result<Self, I18nError> {
        loader.load_language(fallback)?;
        let locale = match loader.load_language(locale) {
            Ok(_) => locale,
            Err(e) => {
                warn!(error = %e, fallback, "locale unavailable, using fallback");
                fallback
            }
        };
        Ok(Self {
            loader,
            locale: locale.to_string(),
            fallback: fallback.to_string(),
        })
    }

    /// Build from settings. `preferred` (e.g. the persisted language) wins
    /// over `settings.locale`. In strict mode missing keys are an error.
    pub fn from_settings(settings: &I18nSettings, preferred: Option<&str>) -> Result<Self, I18nError> {
        let loader = I18nLoader::new(settings.locales_dir.clone());
        let locale = preferred.unwrap_or(&settings.locale);
        let i18n = Self::new(loader, locale, &settings.fallback_locale)?;
        match i18n.verify(REQUIRED_KEYS) {
            Ok(()) => {}
            Err(e) if settings.strict => return Err(e),
            Err(e) => warn!(error = %e, "untranslated strings fall back"),
        }
        Ok(i18n)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn set_locale(&mut self, code: &str) -> Result<(), I18nError> {
        self.loader.load_language(code)?;
        self.locale = code.to_string();
        info!(locale = code, "locale changed");
        Ok(())
    }

    /// Switch to the next available locale that loads, wrapping around.
    /// Broken dictionaries are skipped; the error of the last one tried is
    /// returned when no other locale loads.
    pub fn cycle_locale(&mut self) -> Result<&str, I18nError> {
        let available = self.loader.available_locales();
        let start = available
            .iter()
            .position(|c| *c == self.locale)
            .map_or(0, |pos| pos + 1);
        let mut last_err = None;
        let mut switched = false;
        for code in available.iter().cycle().skip(start).take(available.len()) {
            if *code == self.locale {
                continue;
            }
            match self.set_locale(code) {
                Ok(()) => {
                    switched = true;
                    break;
                }
                Err(e) => {
                    warn!(locale = %code, error = %e, "skipping locale");
                    last_err = Some(e);
                }
            }
        }
        match (switched, last_err) {
            (true, _) | (false, None) => Ok(&self.locale),
            (false, Some(e)) => Err(e),
        }
    }

    /// Read the active and fallback locales again. The current tables stay
    /// in use unless both load.
    pub fn reload(&mut self) -> Result<(), I18nError> {
        let mut fresh = self.loader.clone();
        fresh.clear_cache(None);
        for (code, res) in fresh.preload_languages(&[self.fallback.as_str(), self.locale.as_str()]) {
            if let Err(e) = res {
                warn!(locale = %code, error = %e, "reload failed, keeping loaded dictionaries");
                return Err(e);
            }
        }
        self.loader = fresh;
        let stats = self.loader.cache_stats();
        info!(loaded = stats.loaded, languages = ?stats.languages, "dictionaries reloaded");
        Ok(())
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        [&self.locale, &self.fallback]
            .into_iter()
            .filter_map(|code| self.loader.get(code))
            .find_map(|dict| dict.get(key))
            .map(String::as_str)
    }

    /// Translate `key`; the key itself is returned when no table has it.
    pub fn t(&self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }

    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        interpolate(&self.t(key), args)
    }

    /// Check that the active locale defines every key in `keys` itself,
    /// without falling back.
    pub fn verify(&self, keys: &[&str]) -> Result<(), I18nError> {
        let dict = self.loader.get(&self.locale);
        let missing: Vec<String> = keys
            .iter()
            .filter(|k| dict.is_none_or(|d| !d.contains_key(**k)))
            .map(|k| k.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(I18nError::MissingKeys {
                locale: self.locale.clone(),
                keys: missing,
            })
        }
    }
}
