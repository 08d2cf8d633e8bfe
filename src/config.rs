// Service configuration loaded from the environment (.env supported)

use std::time::Duration;

use crate::agents::errors::AgentError;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-key";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Absent: in-memory repositories
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Absent: scripted echo completion, for local runs only
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub model: String,
    /// Absent: quantum metrics disabled
    pub quantum_gateway_url: Option<String>,
    pub agent_timeout: Duration,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            anthropic_api_key: None,
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            quantum_gateway_url: None,
            agent_timeout: Duration::from_secs(120),
            port: 3000,
        }
    }
}

impl AppConfig {
    /// Reads the process environment
    pub fn from_env() -> Result<Self, AgentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let agent_timeout = match get("AURA_AGENT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number(&raw, "AURA_AGENT_TIMEOUT_SECS")?),
            None => defaults.agent_timeout,
        };
        let port = match get("PORT") {
            Some(raw) => parse_number(&raw, "PORT")?,
            None => defaults.port,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            anthropic_base_url: get("ANTHROPIC_BASE_URL").unwrap_or(defaults.anthropic_base_url),
            model: get("AURA_DEFAULT_MODEL").unwrap_or(defaults.model),
            quantum_gateway_url: get("QUANTUM_GATEWAY_URL"),
            agent_timeout,
            port,
        })
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T, AgentError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AgentError::ConfigError(format!("{key}={raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, AgentError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(config.agent_timeout, Duration::from_secs(120));
        assert!(config.database_url.is_none());
        assert!(config.quantum_gateway_url.is_none());
    }

    #[test]
    fn values_are_read_and_blank_is_unset() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("AURA_AGENT_TIMEOUT_SECS", "30"),
            ("QUANTUM_GATEWAY_URL", "http://gateway:9000"),
            ("DATABASE_URL", "  "),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.agent_timeout, Duration::from_secs(30));
        assert_eq!(config.quantum_gateway_url.as_deref(), Some("http://gateway:9000"));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(_)));
    }
}
