//! Server configuration loaded via OrthoConfig and validated into settings.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;

use backoffice::outbound::firebase::{DEFAULT_FIREBASE_JWKS_URL, FirebaseVerifierConfig};
use backoffice::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_CLOCK_SKEW_SECS: u64 = 60;
const JWKS_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw configuration from CLI arguments, `BACKOFFICE_*` environment variables
/// and the optional configuration file.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BACKOFFICE")]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    pub db_max_connections: Option<u32>,
    /// Firebase project whose ID tokens are accepted.
    pub firebase_project_id: Option<String>,
    /// Override for the Firebase signing key endpoint.
    pub firebase_jwks_url: Option<String>,
    pub jwks_cache_ttl_secs: Option<u64>,
    /// Leeway for token timestamps.
    pub clock_skew_secs: Option<u64>,
    /// Apply pending migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
}

/// Reasons a loaded [`AppConfig`] cannot start the server.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {name}")]
    Missing { name: &'static str },
    #[error("{name} is invalid: {message}")]
    Invalid { name: &'static str, message: String },
}

impl ConfigError {
    fn invalid(name: &'static str, message: impl ToString) -> Self {
        Self::Invalid {
            name,
            message: message.to_string(),
        }
    }
}

/// Validated settings consumed by the bootstrap.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
    pub pool: PoolConfig,
    pub verifier: FirebaseVerifierConfig,
    pub run_migrations: bool,
}

fn required(value: Option<&str>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or(ConfigError::Missing { name })
}

impl AppConfig {
    /// Check required settings and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required setting is absent or a value
    /// does not parse.
    pub fn validate(&self) -> Result<ServerSettings, ConfigError> {
        let bind_addr = self
            .bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::invalid("bind_addr", err))?;

        let database_url = required(self.database_url.as_deref(), "database_url")?;
        let max_connections = self
            .db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(ConfigError::invalid(
                "db_max_connections",
                "must be at least 1",
            ));
        }

        let project_id = required(self.firebase_project_id.as_deref(), "firebase_project_id")?;
        let jwks_url = Url::parse(
            self.firebase_jwks_url
                .as_deref()
                .unwrap_or(DEFAULT_FIREBASE_JWKS_URL),
        )
        .map_err(|err| ConfigError::invalid("firebase_jwks_url", err))?;

        Ok(ServerSettings {
            bind_addr,
            pool: PoolConfig::new(database_url).with_max_size(max_connections),
            verifier: FirebaseVerifierConfig {
                project_id,
                jwks_url,
                jwks_ttl: Duration::from_secs(
                    self.jwks_cache_ttl_secs
                        .unwrap_or(DEFAULT_JWKS_CACHE_TTL_SECS),
                ),
                clock_skew: Duration::from_secs(
                    self.clock_skew_secs.unwrap_or(DEFAULT_CLOCK_SKEW_SECS),
                ),
                request_timeout: JWKS_REQUEST_TIMEOUT,
            },
            run_migrations: self.run_migrations,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Configuration loading and validation.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "BACKOFFICE_BIND_ADDR",
        "BACKOFFICE_DATABASE_URL",
        "BACKOFFICE_DB_MAX_CONNECTIONS",
        "BACKOFFICE_FIREBASE_PROJECT_ID",
        "BACKOFFICE_FIREBASE_JWKS_URL",
        "BACKOFFICE_JWKS_CACHE_TTL_SECS",
        "BACKOFFICE_CLOCK_SKEW_SECS",
        "BACKOFFICE_RUN_MIGRATIONS",
    ];

    fn env_with(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load() -> AppConfig {
        AppConfig::load_from_iter([OsString::from("backoffice")]).expect("config should load")
    }

    fn minimal() -> Vec<(&'static str, Option<String>)> {
        env_with(&[
            ("BACKOFFICE_DATABASE_URL", "postgres://localhost/backoffice"),
            ("BACKOFFICE_FIREBASE_PROJECT_ID", "delivery-demo"),
        ])
    }

    #[rstest]
    fn defaults_apply_when_only_required_settings_are_present() {
        let _guard = lock_env(minimal());

        let settings = load().validate().expect("valid settings");
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR.parse().expect("addr"));
        assert_eq!(settings.pool.database_url(), "postgres://localhost/backoffice");
        assert_eq!(settings.verifier.project_id, "delivery-demo");
        assert_eq!(settings.verifier.jwks_url.as_str(), DEFAULT_FIREBASE_JWKS_URL);
        assert_eq!(settings.verifier.jwks_ttl, Duration::from_secs(3600));
        assert_eq!(settings.verifier.clock_skew, Duration::from_secs(60));
        assert!(settings.run_migrations);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("BACKOFFICE_BIND_ADDR", "127.0.0.1:9000"),
            ("BACKOFFICE_DATABASE_URL", "postgres://db/orders"),
            ("BACKOFFICE_FIREBASE_PROJECT_ID", "delivery-prod"),
            ("BACKOFFICE_JWKS_CACHE_TTL_SECS", "120"),
            ("BACKOFFICE_CLOCK_SKEW_SECS", "5"),
            ("BACKOFFICE_RUN_MIGRATIONS", "false"),
        ]));

        let settings = load().validate().expect("valid settings");
        assert_eq!(settings.bind_addr.port(), 9000);
        assert_eq!(settings.verifier.jwks_ttl, Duration::from_secs(120));
        assert_eq!(settings.verifier.clock_skew, Duration::from_secs(5));
        assert!(!settings.run_migrations);
    }

    #[rstest]
    #[case::database("BACKOFFICE_DATABASE_URL", "database_url")]
    #[case::project("BACKOFFICE_FIREBASE_PROJECT_ID", "firebase_project_id")]
    fn required_settings_are_reported(#[case] unset: &str, #[case] name: &str) {
        let vars = minimal()
            .into_iter()
            .map(|(key, value)| if key == unset { (key, None) } else { (key, value) })
            .collect::<Vec<_>>();
        let _guard = lock_env(vars);

        let err = load().validate().expect_err("missing setting");
        assert_eq!(err.to_string(), format!("missing required setting {name}"));
    }

    #[rstest]
    #[case::bind_addr(("BACKOFFICE_BIND_ADDR", "nowhere"), "bind_addr")]
    #[case::jwks_url(("BACKOFFICE_FIREBASE_JWKS_URL", "not a url"), "firebase_jwks_url")]
    #[case::pool_size(("BACKOFFICE_DB_MAX_CONNECTIONS", "0"), "db_max_connections")]
    fn malformed_values_are_rejected(#[case] var: (&'static str, &str), #[case] name: &str) {
        let mut vars = minimal();
        if let Some(slot) = vars.iter_mut().find(|(key, _)| *key == var.0) {
            slot.1 = Some(var.1.to_owned());
        }
        let _guard = lock_env(vars);

        let err = load().validate().expect_err("invalid setting");
        assert!(
            matches!(err, ConfigError::Invalid { name: found, .. } if found == name),
            "unexpected error: {err}"
        );
    }
}
