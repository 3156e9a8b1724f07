use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://atomm-57b7d9183bae.herokuapp.com/api";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Validated connection settings for the content service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiSettings {
    base_url: String,
    timeout_secs: u64,
}

#[derive(Clone, Debug, Default)]
pub struct ApiSettingsDraft {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiSettingsError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("timeout must be positive")]
    InvalidTimeout,
}

impl ApiSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft; missing values take defaults.
    ///
    /// # Errors
    ///
    /// Returns `ApiSettingsError` if the base URL is not an http(s) URL or the
    /// timeout is zero.
    pub fn validate(self) -> Result<ApiSettings, ApiSettingsError> {
        let base_url = normalize_optional(self.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let parsed =
            Url::parse(&base_url).map_err(|_| ApiSettingsError::InvalidBaseUrl(base_url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiSettingsError::InvalidBaseUrl(base_url));
        }

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_API_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ApiSettingsError::InvalidTimeout);
        }

        Ok(ApiSettings {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }
}

impl ApiSettings {
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Absolute URL for an endpoint path relative to the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
