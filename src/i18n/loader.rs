use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::I18nError;
use super::builtin::{self, BUILTIN_LOCALES};
use super::dictionary::{Dictionary, flatten_json, flatten_toml, merge};

/// Snapshot of what the loader currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub loaded: usize,
    pub languages: Vec<String>,
}

/// Loads and caches per-locale dictionaries.
///
/// A locale is read from `<dir>/<code>.json` or `<dir>/<code>.toml`, then any
/// files under `<dir>/<code>.d/` are merged over it in file-name order. When
/// no file exists, or it fails to parse, the built-in table is used. Each
/// locale is read at most once until `clear_cache`.
#[derive(Debug, Clone, Default)]
pub struct I18nLoader {
    locales_dir: Option<PathBuf>,
    loaded: HashMap<String, Dictionary>,
}

impl I18nLoader {
    pub fn new(locales_dir: Option<PathBuf>) -> Self {
        Self {
            locales_dir,
            loaded: HashMap::new(),
        }
    }

    pub fn load_language(&mut self, code: &str) -> Result<&Dictionary, I18nError> {
        if !self.loaded.contains_key(code) {
            let dict = self.fetch(code)?;
            debug!(locale = code, keys = dict.len(), "dictionary loaded");
            self.loaded.insert(code.to_string(), dict);
            for entries in self.read_extensions(code) {
                self.merge_extension(code, entries);
            }
        }
        self.loaded
            .get(code)
            .ok_or_else(|| I18nError::UnknownLocale(code.to_string()))
    }

    /// Load several locales; failures are returned per code, not fatal.
    pub fn preload_languages(&mut self, codes: &[&str]) -> Vec<(String, Result<(), I18nError>)> {
        codes
            .iter()
            .map(|code| {
                let res = self.load_language(code).map(|_| ());
                (code.to_string(), res)
            })
            .collect()
    }

    /// Merge extra entries into `code`, creating the table if needed.
    /// Later merges win over earlier ones.
    pub fn merge_extension<I>(&mut self, code: &str, entries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let dict = self.loaded.entry(code.to_string()).or_default();
        merge(dict, entries);
    }

    pub fn get(&self, code: &str) -> Option<&Dictionary> {
        self.loaded.get(code)
    }

    /// Drop one locale, or everything with `None`.
    pub fn clear_cache(&mut self, code: Option<&str>) {
        match code {
            Some(code) => {
                self.loaded.remove(code);
            }
            None => self.loaded.clear(),
        }
    }

    pub fn loaded_languages(&self) -> Vec<String> {
        let mut out: Vec<String> = self.loaded.keys().cloned().collect();
        out.sort();
        out
    }

    pub fn cache_stats(&self) -> CacheStats {
        let languages = self.loaded_languages();
        CacheStats {
            loaded: languages.len(),
            languages,
        }
    }

    /// Locales that can be loaded: the built-in ones plus every dictionary
    /// file in the locales directory. Sorted, no duplicates.
    pub fn available_locales(&self) -> Vec<String> {
        let mut out: Vec<String> = BUILTIN_LOCALES.iter().map(|s| s.to_string()).collect();
        let entries = self.locales_dir.as_ref().and_then(|d| fs::read_dir(d).ok());
        if let Some(entries) = entries {
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() || dictionary_format(&path).is_none() {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    out.push(stem.to_string());
                }
            }
        }
        out.sort();
        out.dedup();
        out
    }

    fn fetch(&self, code: &str) -> Result<Dictionary, I18nError> {
        match self.read_from_disk(code) {
            Ok(Some(dict)) => return Ok(dict),
            Ok(None) => {}
            Err(e) => warn!(locale = code, error = %e, "dictionary unreadable, trying built-in table"),
        }
        builtin::table(code).ok_or_else(|| I18nError::UnknownLocale(code.to_string()))
    }

    fn read_from_disk(&self, code: &str) -> Result<Option<Dictionary>, I18nError> {
        let Some(dir) = &self.locales_dir else {
            return Ok(None);
        };
        for ext in ["json", "toml"] {
            let path = dir.join(format!("{code}.{ext}"));
            if path.is_file() {
                return read_dictionary(&path).map(Some);
            }
        }
        Ok(None)
    }

    fn read_extensions(&self, code: &str) -> Vec<Dictionary> {
        let Some(dir) = &self.locales_dir else {
            return Vec::new();
        };
        let Ok(entries) = fs::read_dir(dir.join(format!("{code}.d"))) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && dictionary_format(p).is_some())
            .collect();
        paths.sort();

        paths
            .iter()
            .filter_map(|p| match read_dictionary(p) {
                Ok(dict) => Some(dict),
                Err(e) => {
                    warn!(error = %e, "skipping dictionary extension");
                    None
                }
            })
            .collect()
    }
}

#[derive(Clone, Copy)]
enum Format {
    Json,
    Toml,
}

fn dictionary_format(path: &Path) -> Option<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Some(Format::Json),
        Some("toml") => Some(Format::Toml),
        _ => None,
    }
}

fn read_dictionary(path: &Path) -> Result<Dictionary, I18nError> {
    let text = fs::read_to_string(path).map_err(|source| I18nError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |message: String| I18nError::Parse {
        path: path.to_path_buf(),
        message,
    };
    match dictionary_format(path) {
        Some(Format::Json) => serde_json::from_str::<serde_json::Value>(&text)
            .map(|v| flatten_json(&v))
            .map_err(|e| parse_err(e.to_string())),
        Some(Format::Toml) => toml::from_str::<toml::Table>(&text)
            .map(|t| flatten_toml(&t))
            .map_err(|e| parse_err(e.to_string())),
        None => Err(parse_err("unsupported dictionary format".to_string())),
    }
}
