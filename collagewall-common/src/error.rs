use std::path::PathBuf;
use thiserror::Error;

/// Main error type for collagewall operations
#[derive(Error, Debug)]
pub enum CollageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Image pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Composition error: {0}")]
    Compose(#[from] ComposeError),

    #[error("State persistence error: {0}")]
    State(#[from] StateError),

    #[error("Wallpaper setter error: {0}")]
    Setter(#[from] SetterError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path:?}")]
    FileRead { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse TOML configuration: {message}")]
    TomlParse { message: String },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },

    #[error("Missing required configuration: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Image pool discovery errors
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to read wallpapers folder: {path:?}")]
    DirectoryRead { path: PathBuf, source: std::io::Error },

    #[error("No images found in folder: {path:?}")]
    NoImagesFound { path: PathBuf },

    #[error("Failed to access image file: {path:?}")]
    FileAccess { path: PathBuf, source: std::io::Error },

    #[error("Unsupported image format: {path:?}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Image file is corrupted or invalid: {path:?}")]
    CorruptedImage { path: PathBuf },
}

/// Image selection errors
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Cannot select from an empty image pool")]
    EmptyPool,
}

/// Monitor geometry errors
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("No displays detected")]
    NoDisplays,

    #[error("Invalid geometry for monitor '{id}': {width}x{height}")]
    InvalidGeometry { id: String, width: u32, height: u32 },
}

/// Collage composition errors
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Invalid collage count: {count} (must be 1-8)")]
    InvalidCollageCount { count: usize },

    #[error("Failed to load image: {path:?}")]
    ImageLoad { path: PathBuf, source: image::ImageError },

    #[error("Failed to write composed image: {path:?}")]
    Encode { path: PathBuf, source: image::ImageError },

    #[error("Failed to create output folder: {path:?}")]
    OutputDir { path: PathBuf, source: std::io::Error },

    #[error("Composition failed for all {failed} targets")]
    AllTargetsFailed { failed: usize },
}

/// State persistence errors
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to write state file: {path:?}")]
    FileWrite { path: PathBuf, source: std::io::Error },

    #[error("Failed to serialize state")]
    Serialization,

    #[error("Failed to create state directory: {path:?}")]
    DirectoryCreation { path: PathBuf, source: std::io::Error },
}

/// Wallpaper setter errors
#[derive(Error, Debug)]
pub enum SetterError {
    #[error("Wallpaper command not found: {command}")]
    CommandNotFound { command: String },

    #[error("Failed to run wallpaper command: {command}")]
    Execution { command: String, source: std::io::Error },

    #[error("Wallpaper command returned non-zero exit code: {code}")]
    NonZeroExit { code: i32, stderr: String },
}

// Convenience type alias
pub type Result<T> = std::result::Result<T, CollageError>;

// Error conversion implementations
impl From<serde_json::Error> for CollageError {
    fn from(_err: serde_json::Error) -> Self {
        CollageError::State(StateError::Serialization)
    }
}

impl From<toml::de::Error> for CollageError {
    fn from(err: toml::de::Error) -> Self {
        CollageError::Config(ConfigError::TomlParse {
            message: err.to_string(),
        })
    }
}

// Error reporting utilities
pub trait ErrorReporting {
    fn log_error(&self, context: &str);
    fn user_friendly_message(&self) -> String;
}

impl ErrorReporting for CollageError {
    fn log_error(&self, context: &str) {
        log::error!("{}: {:?}", context, self);
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CollageError::Config(ConfigError::FileRead { path, .. }) => {
                format!("Configuration file not found: {:?}", path)
            }
            CollageError::Config(ConfigError::TomlParse { message }) => {
                format!("Invalid configuration format: {}", message)
            }
            CollageError::Pool(PoolError::NoImagesFound { path }) => {
                format!("No images found in folder: {:?}", path)
            }
            CollageError::Monitor(MonitorError::NoDisplays) => {
                "No displays detected. Check the [[monitors]] entries in the config.".to_string()
            }
            CollageError::Compose(ComposeError::InvalidCollageCount { count }) => {
                format!("collage_count must be between 1 and 8 (got {})", count)
            }
            CollageError::Setter(SetterError::CommandNotFound { command }) => {
                format!("Wallpaper command '{}' not found in PATH", command)
            }
            _ => self.to_string(),
        }
    }
}
