use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "portal.toml";
pub const ENV_PREFIX: &str = "PORTAL_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub api_timeout_ms: u64,
    pub otp_cooldown_seconds: u32,
    pub otp_close_delay_ms: u64,
    pub sla_warning_minutes: i64,
    pub log_level: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8083/api".to_string(),
            api_timeout_ms: 30_000,
            otp_cooldown_seconds: 60,
            otp_close_delay_ms: 2_000,
            sla_warning_minutes: 120,
            log_level: "info".to_string(),
        }
    }
}

impl PortalConfig {
    /// Defaults, then `portal.toml` if present, then `PORTAL_*` variables.
    /// A `.env` file in the working directory is loaded first.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(Self::figment(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Self::from_figment(Self::figment(path))
    }

    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(PortalConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: PortalConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::ConfigError("api_base_url must not be empty".to_string()));
        }
        url::Url::parse(&self.api_base_url).map_err(|e| {
            AppError::ConfigError(format!("Invalid api_base_url '{}': {}", self.api_base_url, e))
        })?;
        if self.api_timeout_ms == 0 {
            return Err(AppError::ConfigError("api_timeout_ms must be positive".to_string()));
        }
        if self.otp_cooldown_seconds == 0 {
            return Err(AppError::ConfigError(
                "otp_cooldown_seconds must be positive".to_string(),
            ));
        }
        if self.sla_warning_minutes < 0 {
            return Err(AppError::ConfigError(
                "sla_warning_minutes must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    pub fn otp_close_delay(&self) -> Duration {
        Duration::from_millis(self.otp_close_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PortalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_timeout(), Duration::from_secs(30));
        assert_eq!(config.otp_cooldown_seconds, 60);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(PortalConfig::default())).merge(
            Toml::string(
                r#"
                api_base_url = "https://portal.example.gov/api"
                otp_cooldown_seconds = 30
                "#,
            ),
        );
        let config = PortalConfig::from_figment(figment).unwrap();
        assert_eq!(config.api_base_url, "https://portal.example.gov/api");
        assert_eq!(config.otp_cooldown_seconds, 30);
        assert_eq!(config.api_timeout_ms, 30_000);
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "portal.toml",
                r#"
                api_base_url = "https://file.example.gov/api"
                sla_warning_minutes = 90
                "#,
            )?;
            jail.set_env("PORTAL_API_BASE_URL", "https://env.example.gov/api");

            let config = PortalConfig::from_figment(PortalConfig::figment("portal.toml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.api_base_url, "https://env.example.gov/api");
            assert_eq!(config.sla_warning_minutes, 90);
            Ok(())
        });
    }

    #[test]
    fn test_validation_errors() {
        let bad_url = PortalConfig {
            api_base_url: "not a url".to_string(),
            ..PortalConfig::default()
        };
        assert!(matches!(bad_url.validate(), Err(AppError::ConfigError(_))));

        let zero_cooldown = PortalConfig {
            otp_cooldown_seconds: 0,
            ..PortalConfig::default()
        };
        assert!(matches!(zero_cooldown.validate(), Err(AppError::ConfigError(_))));

        let zero_timeout = PortalConfig {
            api_timeout_ms: 0,
            ..PortalConfig::default()
        };
        assert!(matches!(zero_timeout.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = PortalConfig::load_from("/nonexistent/portal.toml").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
