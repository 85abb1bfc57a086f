use std::{env, path::PathBuf};

use crate::error::{Error, Result};
use crate::player::{MAX_RATE, MIN_RATE};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `SEGUE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SEGUE")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("playback.rate_presets")
                .with_list_parse_key("catalog.extensions")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if !(10..=1000).contains(&self.audio.tick_ms) {
            return invalid("audio.tick_ms must be between 10 and 1000");
        }
        let in_range = |r: f64| (MIN_RATE..=MAX_RATE).contains(&r);
        if !in_range(self.playback.default_rate) {
            return invalid("playback.default_rate must be between 0.25 and 4.0");
        }
        if self.playback.rate_presets.is_empty() {
            return invalid("playback.rate_presets must not be empty");
        }
        if !self.playback.rate_presets.iter().copied().all(in_range) {
            return invalid("playback.rate_presets must be between 0.25 and 4.0");
        }
        let step = self.playback.seek_step_secs;
        if !step.is_finite() || step <= 0.0 {
            return invalid("playback.seek_step_secs must be > 0");
        }
        Ok(())
    }
}

/// Resolve the config path from `SEGUE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SEGUE_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `$XDG_CONFIG_HOME/segue/config.toml`, or `~/.config/segue/config.toml` when
/// `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("segue").join("config.toml"))
}

/// `$XDG_STATE_HOME/segue/segue.log`, or under `~/.local/state`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("segue").join("segue.log"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
