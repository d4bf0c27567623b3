//! Flat key/value translation tables.
//!
//! Dictionaries are stored nested on disk (`{"player": {"helper": ".."}}`) and
//! flattened into dotted keys (`player.helper`) on load.

use std::collections::BTreeMap;

pub type Dictionary = BTreeMap<String, String>;

pub fn flatten_json(value: &serde_json::Value) -> Dictionary {
    let mut out = Dictionary::new();
    walk_json("", value, &mut out);
    out
}

fn walk_json(prefix: &str, value: &serde_json::Value, out: &mut Dictionary) {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                walk_json(&join(prefix, k), v, out);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                walk_json(&join(prefix, &i.to_string()), v, out);
            }
        }
        Value::Null => {}
        Value::String(s) => insert(out, prefix, s.clone()),
        other => insert(out, prefix, other.to_string()),
    }
}

pub fn flatten_toml(table: &toml::Table) -> Dictionary {
    let mut out = Dictionary::new();
    for (k, v) in table {
        walk_toml(k, v, &mut out);
    }
    out
}

fn walk_toml(prefix: &str, value: &toml::Value, out: &mut Dictionary) {
    use toml::Value;
    match value {
        Value::Table(map) => {
            for (k, v) in map {
                walk_toml(&join(prefix, k), v, out);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                walk_toml(&join(prefix, &i.to_string()), v, out);
            }
        }
        Value::String(s) => insert(out, prefix, s.clone()),
        other => insert(out, prefix, other.to_string()),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn insert(out: &mut Dictionary, key: &str, value: String) {
    // A scalar at the document root has no key to live under.
    if !key.is_empty() {
        out.insert(key.to_string(), value);
    }
}

/// Shallow merge: every entry of `extra` overwrites the same key in `base`.
pub fn merge<I>(base: &mut Dictionary, extra: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    base.extend(extra);
}

/// Replace each `{name}` placeholder with its value. Unknown placeholders
/// are left as they are.
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in args {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}
