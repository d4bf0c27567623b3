use tracing::{debug, warn};

use crate::config::Settings;

/// Settings from file and environment. A broken or invalid config is
/// logged and replaced by the defaults; it never stops startup.
pub fn load_settings() -> Settings {
    let loaded = Settings::load()
        .map_err(|e| e.to_string())
        .and_then(|s| s.validate().map(|()| s));
    match loaded {
        Ok(settings) => {
            debug!(analytics = settings.analytics.enabled, "settings loaded");
            settings
        }
        Err(msg) => {
            warn!(%msg, "config ignored, using defaults");
            Settings::default()
        }
    }
}
