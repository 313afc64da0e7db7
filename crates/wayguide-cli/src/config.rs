//! Configuration Vault – reads/writes `~/.wayguide/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use wayguide_perception::StabilizerConfig;
use wayguide_runtime::{FrameLoopConfig, NavigatorConfig, PresentationMode};

/// Host-session settings that do not belong to a single component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Presentation applied right after the coordinator is wired.
    pub initial_mode: PresentationMode,
    /// Upper bound on the per-frame elapsed time, in seconds.
    pub max_frame_delta: f32,
    /// Simulated frame rate used by `/run`.
    pub frame_rate: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_mode: PresentationMode::Autonomous,
            max_frame_delta: FrameLoopConfig::default().max_frame_delta,
            frame_rate: 60.0,
        }
    }
}

impl SessionConfig {
    pub fn frame_loop(&self) -> FrameLoopConfig {
        FrameLoopConfig {
            max_frame_delta: self.max_frame_delta,
        }
    }
}

/// Persisted user configuration stored in `~/.wayguide/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stabilizer: StabilizerConfig,

    #[serde(default)]
    pub navigator: NavigatorConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        self.stabilizer.validate().map_err(|e| e.to_string())?;
        self.navigator.validate().map_err(|e| e.to_string())?;
        if !self.session.max_frame_delta.is_finite() || self.session.max_frame_delta <= 0.0 {
            return Err(format!(
                "session.max_frame_delta must be positive, got {}",
                self.session.max_frame_delta
            ));
        }
        if !self.session.frame_rate.is_finite() || self.session.frame_rate <= 0.0 {
            return Err(format!(
                "session.frame_rate must be positive, got {}",
                self.session.frame_rate
            ));
        }
        Ok(())
    }
}

/// Return the path to `~/.wayguide/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".wayguide").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Apply `WAYGUIDE_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `WAYGUIDE_POSITION_SMOOTH` | `stabilizer.position_smooth_factor` |
/// | `WAYGUIDE_ROTATION_SMOOTH` | `stabilizer.rotation_smooth_factor` |
/// | `WAYGUIDE_ARRIVAL_DISTANCE` | `navigator.arrival_distance` |
/// | `WAYGUIDE_WAIT_TIME` | `navigator.wait_time_at_destination` |
/// | `WAYGUIDE_INITIAL_MODE` | `session.initial_mode` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary key lookup.
pub(crate) fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f32>().ok());

    if let Some(v) = number("WAYGUIDE_POSITION_SMOOTH") {
        cfg.stabilizer.position_smooth_factor = v;
    }
    if let Some(v) = number("WAYGUIDE_ROTATION_SMOOTH") {
        cfg.stabilizer.rotation_smooth_factor = v;
    }
    if let Some(v) = number("WAYGUIDE_ARRIVAL_DISTANCE") {
        cfg.navigator.arrival_distance = v;
    }
    if let Some(v) = number("WAYGUIDE_WAIT_TIME") {
        cfg.navigator.wait_time_at_destination = v;
    }
    if let Some(v) = lookup("WAYGUIDE_INITIAL_MODE")
        && let Ok(mode) = v.parse::<PresentationMode>() {
            cfg.session.initial_mode = mode;
        }
}

/// Save the config to disk, creating `~/.wayguide/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
