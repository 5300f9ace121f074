//! Configuration for the genie client.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (GENIE_SERVER_URL, GENIE_CONFIG)
//! 2. Config file (.genie/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - GENIE_CONFIG points straight at a file, if set
//! - Otherwise searches current directory and parents for .genie/config.yaml
//! - Finally falls back to the per-user config directory (genie/config.yaml)
//! - Relative paths in the file are relative to the project root (the
//!   directory holding .genie/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<GameSettings, String>> = OnceLock::new();

const DEFAULT_NARRATION_FALLBACK_SECS: f32 = 4.0;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub narration: NarrationConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    /// Asset catalog path
    pub assets: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordingConfig {
    pub max_seconds: Option<u32>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NarrationConfig {
    /// Wait used when a clip's length is unknown
    pub fallback_seconds: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionConfig {
    pub pickup_range: Option<f32>,
    pub door_range: Option<f32>,
}

/// Resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    /// Base URL of the genie service
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub recording_length_secs: u32,
    pub sample_rate: u32,
    pub channels: u16,
    pub narration_fallback_secs: f32,
    pub pickup_range: f32,
    pub door_range: f32,
    /// Absolute path to the asset catalog, if configured
    pub assets: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            recording_length_secs: 10,
            sample_rate: 44_100,
            channels: 1,
            narration_fallback_secs: DEFAULT_NARRATION_FALLBACK_SECS,
            pickup_range: 2.5,
            door_range: 3.0,
            assets: None,
            config_file: None,
        }
    }
}

impl GameSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Wait used when a clip's length is unknown. Out-of-range values fall
    /// back to the default.
    pub fn narration_fallback(&self) -> Duration {
        Duration::try_from_secs_f32(self.narration_fallback_secs)
            .unwrap_or_else(|_| Duration::from_secs_f32(DEFAULT_NARRATION_FALLBACK_SECS))
    }

    /// Overlay a parsed config file onto these settings
    fn apply_file(&mut self, file: ConfigFile, base_dir: &Path) -> Result<()> {
        let defaults = GameSettings::default();

        if let Some(secs) = file.narration.fallback_seconds {
            if Duration::try_from_secs_f32(secs).is_err() {
                anyhow::bail!(
                    "narration.fallback_seconds must be a finite, non-negative number (got {})",
                    secs
                );
            }
        }

        self.server_url = file.server.url.unwrap_or(defaults.server_url);
        self.request_timeout_secs = file
            .server
            .timeout_seconds
            .unwrap_or(defaults.request_timeout_secs);
        self.recording_length_secs = file
            .recording
            .max_seconds
            .unwrap_or(defaults.recording_length_secs);
        self.sample_rate = file.recording.sample_rate.unwrap_or(defaults.sample_rate);
        self.channels = file.recording.channels.unwrap_or(defaults.channels);
        self.narration_fallback_secs = file
            .narration
            .fallback_seconds
            .unwrap_or(defaults.narration_fallback_secs);
        self.pickup_range = file
            .interaction
            .pickup_range
            .unwrap_or(defaults.pickup_range);
        self.door_range = file.interaction.door_range.unwrap_or(defaults.door_range);
        self.assets = file.assets.map(|p| resolve_path(base_dir, &p));
        Ok(())
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("GENIE_CONFIG") {
        return Some(PathBuf::from(explicit));
    }

    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".genie").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    // Per-user config (~/.config/genie/config.yaml on Linux)
    dirs::config_dir()
        .map(|dir| dir.join("genie").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Project root for a config file: the parent of `.genie/`
fn project_root(config_path: &Path) -> PathBuf {
    let dir = config_path.parent().unwrap_or(Path::new("."));
    if dir.file_name().map(|n| n == ".genie").unwrap_or(false) {
        dir.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        dir.to_path_buf()
    }
}

/// Resolve settings from an optional config file plus environment
fn resolve(config_file: Option<PathBuf>) -> Result<GameSettings> {
    let mut settings = GameSettings::default();

    if let Some(ref path) = config_file {
        let file = load_config_file(path)?;
        settings
            .apply_file(file, &project_root(path))
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
    }

    if let Ok(url) = std::env::var("GENIE_SERVER_URL") {
        settings.server_url = url;
    }

    settings.config_file = config_file;
    Ok(settings)
}

/// Load configuration from all sources
fn load_config() -> Result<GameSettings> {
    resolve(find_config_file())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static GameSettings> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<GameSettings> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = GameSettings::default();
        assert_eq!(settings.server_url, "http://localhost:8000");
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.recording_length_secs, 10);
        assert_eq!(settings.sample_rate, 44_100);
        assert_eq!(settings.narration_fallback(), Duration::from_secs(4));
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let genie_dir = temp.path().join(".genie");
        std::fs::create_dir_all(&genie_dir).unwrap();

        let config_path = genie_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
server:
  url: http://10.30.136.183:8000
  timeout_seconds: 12
recording:
  max_seconds: 6
narration:
  fallback_seconds: 2.5
assets: config/assets.yaml
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.server.url.as_deref(), Some("http://10.30.136.183:8000"));
        assert_eq!(parsed.recording.max_seconds, Some(6));
        assert_eq!(parsed.recording.sample_rate, None);

        let mut settings = GameSettings::default();
        settings
            .apply_file(parsed, &project_root(&config_path))
            .unwrap();

        assert_eq!(settings.request_timeout_secs, 12);
        assert_eq!(settings.recording_length_secs, 6);
        assert_eq!(settings.sample_rate, 44_100);
        assert_eq!(settings.narration_fallback(), Duration::from_millis(2500));
        assert_eq!(
            settings.assets,
            Some(temp.path().join("config/assets.yaml"))
        );
    }

    #[test]
    fn test_empty_file_keeps_defaults() {
        let parsed: ConfigFile = serde_yaml::from_str("{}").unwrap();
        let mut settings = GameSettings::default();
        settings.apply_file(parsed, Path::new("/tmp")).unwrap();
        assert_eq!(settings, GameSettings::default());
    }

    #[test]
    fn test_unusable_fallback_uses_default() {
        for secs in [f32::INFINITY, f32::NAN, -1.0, 1e30] {
            let settings = GameSettings {
                narration_fallback_secs: secs,
                ..Default::default()
            };
            assert_eq!(settings.narration_fallback(), Duration::from_secs(4));
        }
    }

    #[test]
    fn test_infinite_fallback_in_file_is_rejected() {
        let parsed: ConfigFile =
            serde_yaml::from_str("narration:\n  fallback_seconds: .inf\n").unwrap();
        assert_eq!(parsed.narration.fallback_seconds, Some(f32::INFINITY));

        let mut settings = GameSettings::default();
        let err = settings
            .apply_file(parsed, Path::new("/tmp"))
            .unwrap_err();
        assert!(err.to_string().contains("fallback_seconds"));
    }

    #[test]
    fn test_resolve_reports_bad_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "narration:\n  fallback_seconds: -2\n").unwrap();

        let err = resolve(Some(path)).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid config file"));
    }

    #[test]
    fn test_project_root() {
        assert_eq!(
            project_root(Path::new("/home/user/game/.genie/config.yaml")),
            PathBuf::from("/home/user/game")
        );
        assert_eq!(
            project_root(Path::new("/etc/genie.yaml")),
            PathBuf::from("/etc")
        );
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "assets.yaml"),
            PathBuf::from("/home/user/project/assets.yaml")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
