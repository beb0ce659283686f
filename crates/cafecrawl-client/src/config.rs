use std::time::Duration;

use cafecrawl_core::error::AppError;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://dapi.kakao.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the Kakao Local API.
#[derive(Debug, Clone)]
pub struct KakaoConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl KakaoConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build from `KAKAO_API_KEY`, `KAKAO_API_BASE_URL` and `KAKAO_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = std::env::var("KAKAO_API_KEY")
            .map_err(|_| AppError::ConfigError("KAKAO_API_KEY not set".into()))?;
        let base_url =
            std::env::var("KAKAO_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout = match std::env::var("KAKAO_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        Self::new(api_key)
            .with_base_url(base_url)
            .with_timeout(timeout)
            .validated()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the key is present and the base URL is an absolute http(s) URL.
    pub fn validated(mut self) -> Result<Self, AppError> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::ConfigError("Kakao API key is empty".into()));
        }

        let parsed = Url::parse(&self.base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid Kakao base URL: {e}")))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::ConfigError(format!(
                    "Kakao base URL scheme '{scheme}' is not allowed (only http/https)"
                )));
            }
        }

        if self.timeout.is_zero() {
            return Err(AppError::ConfigError("Kakao timeout must be positive".into()));
        }

        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, AppError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| AppError::ConfigError(format!("KAKAO_TIMEOUT_SECS must be an integer: {raw}")))
}
