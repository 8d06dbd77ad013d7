use serde::Deserialize;
use url::Url;

/// Single process-wide configuration, loaded from the environment once in
/// `main` and passed explicitly to everything that needs it. No call site
/// reads environment variables on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: Option<u32>,
    pub database_min_connections: Option<u32>,
    pub database_connect_timeout_secs: Option<u64>,
    pub database_acquire_timeout_secs: Option<u64>,
    pub database_idle_timeout_secs: Option<u64>,
    pub database_sql_log: Option<bool>,
    /// Base URL of the Evolution messaging API (the `/api/evo` upstream).
    pub evolution_api_url: Option<String>,
    /// Base URL of the Agno agent API (the `/api/agno` upstream).
    pub agno_api_url: Option<String>,
    /// Port the Agno proxy falls back to when no `x-agno-port` header is sent.
    pub agno_default_port: Option<u16>,
    /// Base URL of the identity service used for bearer-token resolution.
    pub identity_api_url: Option<String>,
    pub max_body_bytes: Option<usize>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        let config: Config = cfg.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if !self
            .host
            .chars()
            .all(|c| c.is_alphanumeric() || ".:-_".contains(c))
        {
            return Err(config::ConfigError::Message(
                "Invalid host format".to_string(),
            ));
        }

        if self.port < 1024 {
            return Err(config::ConfigError::Message(
                "Port must be 1024 or higher for security reasons".to_string(),
            ));
        }

        for (name, value) in [
            ("EVOLUTION_API_URL", &self.evolution_api_url),
            ("AGNO_API_URL", &self.agno_api_url),
            ("IDENTITY_API_URL", &self.identity_api_url),
        ] {
            if let Some(raw) = value {
                if Url::parse(raw).is_err() {
                    return Err(config::ConfigError::Message(format!(
                        "{} is not a valid URL: {}",
                        name, raw
                    )));
                }
            }
        }

        if let Some(limit) = self.max_body_bytes {
            let min = 1024 * 1024; // 1MB
            let max = 500 * 1024 * 1024; // 500MB
            if limit < min || limit > max {
                return Err(config::ConfigError::Message(format!(
                    "max_body_bytes must be between {} and {} bytes",
                    min, max
                )));
            }
        }

        Ok(())
    }

    pub fn effective_max_body_bytes(&self) -> usize {
        self.max_body_bytes.unwrap_or(100 * 1024 * 1024)
    }

    pub fn database_settings(&self) -> DatabaseSettings {
        DatabaseSettings {
            url: self.database_url.clone(),
            max_connections: self.database_max_connections,
            min_connections: self.database_min_connections,
            connect_timeout_secs: self.database_connect_timeout_secs,
            acquire_timeout_secs: self.database_acquire_timeout_secs,
            idle_timeout_secs: self.database_idle_timeout_secs,
            sql_log: self.database_sql_log,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub sql_log: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "postgres://localhost/craftychat".to_string(),
            database_max_connections: None,
            database_min_connections: None,
            database_connect_timeout_secs: None,
            database_acquire_timeout_secs: None,
            database_idle_timeout_secs: None,
            database_sql_log: None,
            evolution_api_url: None,
            agno_api_url: None,
            agno_default_port: None,
            identity_api_url: None,
            max_body_bytes: None,
        }
    }

    #[test]
    fn rejects_privileged_port() {
        let mut cfg = base_config();
        cfg.port = 80;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_malformed_upstream_url() {
        let mut cfg = base_config();
        cfg.evolution_api_url = Some("not a url".to_string());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_valid_upstreams() {
        let mut cfg = base_config();
        cfg.evolution_api_url = Some("http://evo:8080".to_string());
        cfg.agno_api_url = Some("http://agno:7777".to_string());
        assert!(cfg.validate().is_ok());
    }
}
