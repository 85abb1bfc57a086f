use super::load::{default_config_path, default_log_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_segue_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("SEGUE_CONFIG_PATH", "/tmp/segue-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/segue-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("segue")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("segue")
            .join("config.toml")
    );
}

#[test]
fn default_log_path_uses_xdg_state_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_STATE_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        default_log_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/state/segue/segue.log")
    );

    let _g3 = EnvGuard::set("XDG_STATE_HOME", "/tmp/state");
    assert_eq!(
        default_log_path().unwrap(),
        std::path::PathBuf::from("/tmp/state/segue/segue.log")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
tick_ms = 100
quit_fade_out_ms = 0
fetch_timeout_secs = 3

[playback]
default_rate = 1.25
rate_presets = [1.0, 1.25, 0.5]
start_muted = true
seek_step_secs = 2.5

[ui]
follow_playback = false
header_text = "hello"
now_playing_track_fields = ["artist", "title"]
now_playing_track_separator = " • "
now_playing_time_fields = ["elapsed", "remaining"]
now_playing_time_separator = " | "

[catalog]
path = "/srv/previews/album.json"
extensions = ["mp3"]
recursive = false
include_hidden = true
max_depth = 2

[logging]
level = "segue=debug"
file = "/tmp/segue.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SEGUE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("SEGUE__AUDIO__TICK_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.tick_ms, 100);
    assert_eq!(s.audio.quit_fade_out_ms, 0);
    assert_eq!(s.audio.fetch_timeout_secs, 3);
    assert_eq!(s.playback.default_rate, 1.25);
    assert_eq!(s.playback.rate_presets, vec![1.0, 1.25, 0.5]);
    assert!(s.playback.start_muted);
    assert_eq!(s.playback.seek_step_secs, 2.5);
    assert!(!s.ui.follow_playback);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(
        s.ui.now_playing_track_fields,
        vec![TrackDisplayField::Artist, TrackDisplayField::Title]
    );
    assert_eq!(s.ui.now_playing_track_separator, " • ");
    assert_eq!(
        s.ui.now_playing_time_fields,
        vec![TimeField::Elapsed, TimeField::Remaining]
    );
    assert_eq!(s.ui.now_playing_time_separator, " | ");
    assert_eq!(
        s.catalog.path,
        Some(std::path::PathBuf::from("/srv/previews/album.json"))
    );
    assert_eq!(s.catalog.extensions, vec!["mp3".to_string()]);
    assert!(!s.catalog.recursive);
    assert!(s.catalog.include_hidden);
    assert_eq!(s.catalog.max_depth, Some(2));
    assert_eq!(s.logging.level, "segue=debug");
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
tick_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SEGUE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("SEGUE__AUDIO__TICK_MS", "50");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.tick_ms, 50);
}

#[test]
fn missing_config_file_yields_defaults() {
    let _lock = env_lock();
    let dir = tempfile::tempdir().unwrap();
    let _g1 = EnvGuard::set(
        "SEGUE_CONFIG_PATH",
        dir.path().join("absent.toml").to_str().unwrap(),
    );

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.tick_ms, AudioSettings::default().tick_ms);
    assert_eq!(s.playback.rate_presets, vec![1.0, 1.5, 2.0]);
    assert!(s.catalog.path.is_none());
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut s = Settings::default();
    s.audio.tick_ms = 5;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.default_rate = 8.0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.rate_presets.clear();
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.rate_presets.push(0.1);
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.seek_step_secs = 0.0;
    assert!(s.validate().is_err());
}
