use std::time::Duration;

use pixci_codec::messages::EncodeOptions;
use pixci_core::error::CoreError;
use pixci_core::validation::{
    validate_block_size, validate_scale, DEFAULT_BLOCK_SIZE, DEFAULT_SCALE,
};

/// Default base URL of the conversion service.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Default base URL of the AI edit route.
pub const DEFAULT_AI_EDIT_URL: &str = "http://localhost:3000/api";

/// Default HTTP timeout for every service call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Editor configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Conversion service base URL (encode / decode / health).
    pub api_url: String,
    /// AI edit route base URL.
    pub ai_edit_url: String,
    /// Timeout applied to each HTTP request; an expired request fails the
    /// operation like any other service error.
    pub request_timeout_secs: u64,
    /// Scale factor used when rendering previews.
    pub decode_scale: u32,
    /// Encoder hints applied to uploaded images.
    pub encode: EncodeOptions,
}

/// Errors from loading an [`EditorConfig`] or building its HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Invalid configuration: {0}")]
    OutOfRange(#[from] CoreError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ai_edit_url: DEFAULT_AI_EDIT_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            decode_scale: DEFAULT_SCALE,
            encode: EncodeOptions::default(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                        |
    /// |------------------------------|--------------------------------|
    /// | `PIXCI_API_URL`              | `http://localhost:8000/api/v1` |
    /// | `PIXCI_AI_EDIT_URL`          | `http://localhost:3000/api`    |
    /// | `PIXCI_REQUEST_TIMEOUT_SECS` | `30`                           |
    /// | `PIXCI_DECODE_SCALE`         | `10`                           |
    /// | `PIXCI_BLOCK_SIZE`           | `1`                            |
    /// | `PIXCI_AUTO_DETECT`          | `false`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load a `.env` file from the working directory (if any), then
    /// [`from_env`](Self::from_env).
    pub fn from_dotenv() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("PIXCI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let ai_edit_url = lookup("PIXCI_AI_EDIT_URL").unwrap_or_else(|| DEFAULT_AI_EDIT_URL.into());

        let request_timeout_secs = parse_var(
            &lookup,
            "PIXCI_REQUEST_TIMEOUT_SECS",
            "u64",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let decode_scale = parse_var(&lookup, "PIXCI_DECODE_SCALE", "u32", DEFAULT_SCALE)?;
        let block_size = parse_var(&lookup, "PIXCI_BLOCK_SIZE", "u32", DEFAULT_BLOCK_SIZE)?;
        let auto_detect = parse_var(&lookup, "PIXCI_AUTO_DETECT", "bool", false)?;

        // A zero timeout would fail every request immediately.
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "PIXCI_REQUEST_TIMEOUT_SECS",
                expected: "positive integer",
                value: request_timeout_secs.to_string(),
            });
        }
        validate_scale(decode_scale)?;
        validate_block_size(block_size)?;

        Ok(Self {
            api_url,
            ai_edit_url,
            request_timeout_secs,
            decode_scale,
            encode: EncodeOptions {
                block_size,
                auto_detect,
            },
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the shared HTTP client used by both service clients.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        Ok(reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()?)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
