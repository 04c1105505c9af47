//! `config.toml` loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::transport::VisualizationMode;
use crate::worker::WorkerSettings;

pub const APP_NAME: &str = "wavedeck";

/// `~/.config/wavedeck` (platform equivalent), falling back to the cwd.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory the browser opens in.
    pub start_dir: Option<PathBuf>,
    pub seek_step_secs: i64,
    /// Minimum redraw cadence while a track is active.
    pub refresh_interval_ms: u64,
    pub input_poll_ms: u64,
    pub waveform_width: usize,
    pub spectrum_window: usize,
    pub visualization: VisualizationMode,
    pub theme: String,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            start_dir: None,
            seek_step_secs: 5,
            refresh_interval_ms: 50,
            input_poll_ms: 10,
            waveform_width: 1024,
            spectrum_window: 1024,
            visualization: VisualizationMode::Waveform,
            theme: "Default".into(),
            log_level: "info".into(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load from the default location; a missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_dir().join("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spectrum_window < 2 || !self.spectrum_window.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "spectrum_window must be a power of two >= 2, got {}",
                self.spectrum_window
            )));
        }
        if self.waveform_width == 0 {
            return Err(ConfigError::Invalid("waveform_width must be > 0".into()));
        }
        if self.seek_step_secs <= 0 {
            return Err(ConfigError::Invalid("seek_step_secs must be > 0".into()));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid("refresh_interval_ms must be > 0".into()));
        }
        // The UI loop waits this long per pass; zero would spin it.
        if self.input_poll_ms == 0 {
            return Err(ConfigError::Invalid("input_poll_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            waveform_width: self.waveform_width,
            spectrum_window: self.spectrum_window,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }

    /// Configured start directory, else `$HOME`, else the cwd.
    pub fn start_dir(&self) -> PathBuf {
        self.start_dir
            .clone()
            .or_else(dirs::home_dir)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.refresh_interval(), Duration::from_millis(50));
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "seek_step_secs = 10\nvisualization = \"spectrum\"\nstart_dir = \"/music\"\n",
        )
        .unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.seek_step_secs, 10);
        assert_eq!(cfg.visualization, VisualizationMode::Spectrum);
        assert_eq!(cfg.start_dir(), PathBuf::from("/music"));
        assert_eq!(cfg.spectrum_window, 1024);
    }

    #[test]
    fn rejects_non_power_of_two_window() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "spectrum_window = 1000\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_zero_input_poll() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "input_poll_ms = 0\n").unwrap();
        match Config::load_from(&path) {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("input_poll_ms")),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "seek_step_secs = \"fast\"\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
