use photo_gallery::StoreError;
use std::fmt;

/// Central error types for the portfolio gallery app
#[derive(Debug)]
pub enum AppError {
    /// Unreadable or invalid configuration file
    Config(String),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Preference database error
    Database(StoreError),
    /// General error
    #[allow(dead_code)]
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Conversions from other error types
impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Database(e)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

/// User-friendly error messages for the UI
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(_) => {
                "The gallery configuration could not be read. Using the defaults.".to_string()
            }
            AppError::Filesystem(_) => {
                "Error accessing files. Please check app permissions.".to_string()
            }
            AppError::Database(_) => {
                "Preferences could not be saved. Changes last until the app is closed.".to_string()
            }
            AppError::Other(msg) => msg.clone(),
        }
    }
}
