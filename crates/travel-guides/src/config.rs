use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
///
/// The guides directory must be provided; Redis and the photo provider are
/// optional and the server degrades gracefully without them.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one subdirectory per destination, each with a
    /// markdown guide file.
    pub guides_dir: String,
    /// JSON file mapping city slugs to named place coordinates. `None`
    /// disables the map data tools (they return empty results).
    pub locations_file: Option<String>,
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` disables caching.
    pub redis_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `TRAVEL_GUIDES_DIR`: path to the guides content directory
    ///
    /// Optional:
    /// - `TRAVEL_LOCATIONS_FILE`: path to the locations JSON file
    /// - `REDIS_URL`: Redis connection string (omit to disable caching)
    pub fn from_env() -> Result<Self, AppError> {
        let guides_dir = std::env::var("TRAVEL_GUIDES_DIR").map_err(|_| {
            AppError::Config("TRAVEL_GUIDES_DIR environment variable is required".to_string())
        })?;

        if !std::path::Path::new(&guides_dir).is_dir() {
            return Err(AppError::Config(format!(
                "guides directory not found at {guides_dir}"
            )));
        }

        let locations_file = std::env::var("TRAVEL_LOCATIONS_FILE").ok();
        if let Some(path) = &locations_file {
            if !std::path::Path::new(path).is_file() {
                return Err(AppError::Config(format!(
                    "locations file not found at {path}"
                )));
            }
        }

        let redis_url = std::env::var("REDIS_URL").ok();

        Ok(Self {
            guides_dir,
            locations_file,
            redis_url,
        })
    }

    pub fn guides_dir_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.guides_dir)
    }
}
