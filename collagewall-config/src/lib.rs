use collagewall_common::compose::parse_color;
use collagewall_common::{
    ApplyOptions, CollageError, CollageSettings, ConfiguredMonitors, FitMode, MonitorRect,
    SelectionMode, SelectionState,
};
use collagewall_common::error::ConfigError;
use collagewall_common::setter::CommandSetter;
use collagewall_common::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub setter: SetterConfig,
    #[serde(default)]
    pub monitors: Vec<MonitorEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
    #[serde(default = "default_selection")]
    pub selection: SelectionMode,
    #[serde(default = "default_collage_count")]
    pub collage_count: usize,
    #[serde(default)]
    pub collage_same_for_all: bool,
    #[serde(default)]
    pub fade_in: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_fit_mode")]
    pub fit_mode: FitMode,
    #[serde(default = "default_background")]
    pub background: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PathsConfig {
    pub wallpapers: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub state: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SetterConfig {
    #[serde(default = "default_setter_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorEntry {
    pub id: Option<String>,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

// Default values
fn default_interval() -> Duration {
    Duration::from_secs(300) // 5 minutes
}

fn default_selection() -> SelectionMode {
    SelectionMode::Random
}

fn default_collage_count() -> usize {
    4
}

fn default_fit_mode() -> FitMode {
    FitMode::Fill
}

fn default_background() -> String {
    "000000".to_string()
}

fn default_setter_command() -> String {
    "feh".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            selection: default_selection(),
            collage_count: default_collage_count(),
            collage_same_for_all: false,
            fade_in: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fit_mode: default_fit_mode(),
            background: default_background(),
        }
    }
}

impl Default for SetterConfig {
    fn default() -> Self {
        Self {
            command: default_setter_command(),
            args: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            display: DisplayConfig::default(),
            paths: PathsConfig::default(),
            setter: SetterConfig::default(),
            monitors: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config file at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CollageError::Config(ConfigError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            CollageError::Config(ConfigError::TomlParse {
                message: e.to_string(),
            })
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(CollageError::Config(ConfigError::NoConfigDir))?
            .join("collagewall");

        Ok(config_dir.join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=8).contains(&self.general.collage_count) {
            return Err(CollageError::Config(ConfigError::InvalidValue {
                field: "general.collage_count".to_string(),
                value: self.general.collage_count.to_string(),
            }));
        }

        if self.general.interval < Duration::from_secs(1) {
            return Err(CollageError::Config(ConfigError::InvalidValue {
                field: "general.interval".to_string(),
                value: format!("{:?}", self.general.interval),
            }));
        }

        if parse_color(&self.display.background).is_none() {
            return Err(CollageError::Config(ConfigError::InvalidValue {
                field: "display.background".to_string(),
                value: self.display.background.clone(),
            }));
        }

        if self.setter.command.is_empty() {
            return Err(CollageError::Config(ConfigError::MissingField {
                field: "setter.command".to_string(),
            }));
        }

        for (i, monitor) in self.monitors.iter().enumerate() {
            if monitor.width == 0 || monitor.height == 0 {
                return Err(CollageError::Config(ConfigError::Validation {
                    message: format!(
                        "Monitor {} has invalid geometry {}x{}",
                        i, monitor.width, monitor.height
                    ),
                }));
            }
        }

        Ok(())
    }

    pub fn wallpapers_folder(&self) -> Result<PathBuf> {
        if let Some(path) = &self.paths.wallpapers {
            return Ok(path.clone());
        }
        dirs::picture_dir()
            .map(|d| d.join("wallpapers"))
            .ok_or_else(|| {
                CollageError::Config(ConfigError::MissingField {
                    field: "paths.wallpapers".to_string(),
                })
            })
    }

    pub fn output_folder(&self) -> PathBuf {
        if let Some(path) = &self.paths.output {
            return path.clone();
        }
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("collagewall")
    }

    pub fn state_file(&self) -> PathBuf {
        self.paths
            .state
            .clone()
            .unwrap_or_else(SelectionState::default_state_file)
    }

    /// Monitors from the config, or a single full-HD display when no
    /// [[monitors]] entries are given.
    pub fn monitor_source(&self) -> ConfiguredMonitors {
        if self.monitors.is_empty() {
            log::warn!("No [[monitors]] configured, assuming a single 1920x1080 display");
            return ConfiguredMonitors::single_default();
        }

        let rects = self
            .monitors
            .iter()
            .enumerate()
            .map(|(i, m)| MonitorRect {
                id: m.id.clone().unwrap_or_else(|| i.to_string()),
                x: m.x,
                y: m.y,
                width: m.width,
                height: m.height,
            })
            .collect();
        ConfiguredMonitors::new(rects)
    }

    pub fn collage_settings(&self) -> Result<CollageSettings> {
        let background = parse_color(&self.display.background).ok_or_else(|| {
            CollageError::Config(ConfigError::InvalidValue {
                field: "display.background".to_string(),
                value: self.display.background.clone(),
            })
        })?;

        CollageSettings::new(
            self.general.collage_count,
            self.general.collage_same_for_all,
            self.display.fit_mode,
            background,
        )
    }

    pub fn command_setter(&self) -> CommandSetter {
        CommandSetter::new(self.setter.command.clone(), self.setter.args.clone())
    }

    pub fn apply_options(&self) -> Result<ApplyOptions> {
        Ok(ApplyOptions {
            selection: self.general.selection,
            collage: self.collage_settings()?,
            wallpapers_folder: self.wallpapers_folder()?,
            output_folder: self.output_folder(),
            state_file: self.state_file(),
            fade_in: self.general.fade_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collagewall_common::MonitorSource;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.general.interval, Duration::from_secs(300));
        assert_eq!(config.general.selection, SelectionMode::Random);
        assert_eq!(config.general.collage_count, 4);
        assert!(!config.general.collage_same_for_all);
        assert!(!config.general.fade_in);
        assert_eq!(config.display.fit_mode, FitMode::Fill);
        assert_eq!(config.display.background, "000000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_full_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config_content = r##"
            [general]
            interval = "3m"
            selection = "sequential"
            collage_count = 6
            collage_same_for_all = true
            fade_in = true

            [display]
            fit_mode = "fit"
            background = "#1e1e2e"

            [paths]
            wallpapers = "/data/wallpapers"
            output = "/data/out"

            [setter]
            command = "swaybg"
            args = ["-m", "fill", "-i"]

            [[monitors]]
            id = "DP-1"
            x = 0
            y = 0
            width = 2560
            height = 1440

            [[monitors]]
            id = "HDMI-A-1"
            x = 2560
            y = 200
            width = 1920
            height = 1080
        "##;

        fs::write(&config_path, config_content).unwrap();
        let config = Config::load_from_path(&config_path).unwrap();

        assert_eq!(config.general.interval, Duration::from_secs(180));
        assert_eq!(config.general.selection, SelectionMode::Sequential);
        assert_eq!(config.general.collage_count, 6);
        assert!(config.general.collage_same_for_all);
        assert!(config.general.fade_in);
        assert_eq!(config.display.fit_mode, FitMode::Fit);
        assert_eq!(config.display.background, "#1e1e2e");
        assert_eq!(
            config.wallpapers_folder().unwrap(),
            PathBuf::from("/data/wallpapers")
        );
        assert_eq!(config.output_folder(), PathBuf::from("/data/out"));
        assert_eq!(config.setter.command, "swaybg");

        let monitors = config.monitor_source().resolve().unwrap();
        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors[0].id, "DP-1");
        assert_eq!(monitors[1].x, 2560);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = Config::load_from_path(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.general.collage_count, 4);
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        fs::write(&config_path, "[general\ninterval = ").unwrap();

        let result = Config::load_from_path(&config_path);
        assert!(matches!(
            result.unwrap_err(),
            CollageError::Config(ConfigError::TomlParse { .. })
        ));
    }

    #[test]
    fn test_validate_collage_count_bounds() {
        let mut config = Config::default();

        config.general.collage_count = 0;
        assert!(config.validate().is_err());

        config.general.collage_count = 9;
        assert!(config.validate().is_err());

        config.general.collage_count = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_interval_minimum() {
        let mut config = Config::default();
        config.general.interval = Duration::from_millis(500);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_background_color() {
        let mut config = Config::default();
        config.display.background = "not-a-color".to_string();
        assert!(config.validate().is_err());

        config.display.background = "#ffffff".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_monitor_geometry() {
        let mut config = Config::default();
        config.monitors.push(MonitorEntry {
            id: None,
            x: 0,
            y: 0,
            width: 0,
            height: 1080,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monitor_source_defaults_to_single_display() {
        let config = Config::default();
        let monitors = config.monitor_source().resolve().unwrap();

        assert_eq!(monitors.len(), 1);
        assert_eq!(monitors[0].width, 1920);
        assert_eq!(monitors[0].height, 1080);
    }

    #[test]
    fn test_monitor_entry_id_falls_back_to_index() {
        let mut config = Config::default();
        config.monitors.push(MonitorEntry {
            id: None,
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        });

        let monitors = config.monitor_source().resolve().unwrap();
        assert_eq!(monitors[0].id, "0");
    }

    #[test]
    fn test_collage_settings_from_config() {
        let mut config = Config::default();
        config.display.background = "#ff8000".to_string();

        let settings = config.collage_settings().unwrap();
        assert_eq!(settings.count, 4);
        assert_eq!(settings.background, image::Rgb([255, 128, 0]));
    }
}
