//! Dictionaries compiled into the binary, used when no file on disk provides
//! a locale (or the file cannot be read).

use tracing::error;

use super::dictionary::{Dictionary, flatten_json};

const EN_US: &str = include_str!("../../locales/en-US.json");
const ZH_CN: &str = include_str!("../../locales/zh-CN.json");

pub const BUILTIN_LOCALES: &[&str] = &["en-US", "zh-CN"];

pub fn table(code: &str) -> Option<Dictionary> {
    let raw = match code {
        "en-US" => EN_US,
        "zh-CN" => ZH_CN,
        _ => return None,
    };
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => Some(flatten_json(&value)),
        Err(e) => {
            error!(locale = code, error = %e, "built-in dictionary is malformed");
            None
        }
    }
}
