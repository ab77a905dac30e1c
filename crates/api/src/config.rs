use lgl_pool::config::ConfigError;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `600`). Must cover a queued
    /// layout job plus the worker's own run time.
    pub request_timeout_secs: u64,
    /// Skip the layout self-test after the pool starts (default: `false`).
    pub skip_self_test: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default   |
    /// |------------------------|-----------|
    /// | `HOST`                 | `0.0.0.0` |
    /// | `PORT`                 | `3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `600`     |
    /// | `LGL_SKIP_SELF_TEST`   | `false`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                expected: "a valid port number",
                value: raw,
            })?,
            None => 3000,
        };

        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS",
                expected: "a number of seconds",
                value: raw,
            })?,
            None => 600,
        };

        let skip_self_test = match lookup("LGL_SKIP_SELF_TEST") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "LGL_SKIP_SELF_TEST",
                        expected: "true or false",
                        value: raw,
                    })
                }
            },
            None => false,
        };

        Ok(Self {
            host,
            port,
            request_timeout_secs,
            skip_self_test,
        })
    }
}
