//! Error types for wallfetch.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("HTTP {status} for URL: {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const CONFIG_ERROR: u8 = 2;
    pub const RUN_ERROR: u8 = 3;
}
