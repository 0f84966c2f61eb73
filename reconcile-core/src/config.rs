//! Typed, environment-sourced settings, loaded once at process startup
//! and treated as read-only thereafter.

use rust_decimal::Decimal;

/// Process-wide configuration. Constructed once in `main` and shared
/// behind an `Arc` — nothing here changes after startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mock_provider_url: String,
    pub mock_provider_api_key: String,
    pub webhook_secret: String,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub fee_tolerance_percent: Decimal,
    pub webhook_rate_limit_per_minute: u32,
}

/// Error produced while reading settings from the environment.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} is not a valid value: {1}")]
    Invalid(&'static str, String),
}

impl Settings {
    /// Reads settings from the process environment. `WEBHOOK_SECRET` is
    /// mandatory — the service must not start without it, since an empty
    /// secret would make signature verification meaningless.
    pub fn from_env() -> Result<Self, SettingsError> {
        let webhook_secret = std::env::var("WEBHOOK_SECRET").unwrap_or_default();
        if webhook_secret.is_empty() {
            return Err(SettingsError::Missing("WEBHOOK_SECRET"));
        }

        let port = parse_env_or("PORT", 8000, "PORT")?;
        let fee_tolerance_percent = std::env::var("FEE_TOLERANCE_PERCENT")
            .ok()
            .map(|v| {
                v.parse::<Decimal>()
                    .map_err(|e| SettingsError::Invalid("FEE_TOLERANCE_PERCENT", e.to_string()))
            })
            .transpose()?
            .unwrap_or(Decimal::ZERO);
        let webhook_rate_limit_per_minute = parse_env_or("WEBHOOK_RATE_LIMIT", 60, "WEBHOOK_RATE_LIMIT")?;

        Ok(Self {
            mock_provider_url: std::env::var("MOCK_PROVIDER_URL")
                .unwrap_or_else(|_| "https://mock-api.advancehq.com".to_string()),
            mock_provider_api_key: std::env::var("MOCK_PROVIDER_API_KEY").unwrap_or_default(),
            webhook_secret,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            debug: std::env::var("DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            fee_tolerance_percent,
            webhook_rate_limit_per_minute,
        })
    }
}

fn parse_env_or<T: std::str::FromStr>(
    var: &str,
    default: T,
    label: &'static str,
) -> Result<T, SettingsError> {
    match std::env::var(var) {
        Ok(v) => v
            .parse()
            .map_err(|_| SettingsError::Invalid(label, v)),
        Err(_) => Ok(default),
    }
}
