use costguard_cloud::gce::DEFAULT_COMPUTE_API_BASE_URL;
use costguard_cloud::token::DEFAULT_METADATA_TOKEN_URL;
use costguard_core::target::TargetConfig;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line, for log agents.
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Function configuration loaded from environment variables.
///
/// The stop target is allowed to be incomplete: the service still starts
/// and reports every exceeded budget as a configuration fault.
#[derive(Debug, Clone)]
pub struct FunctionConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    pub target: TargetConfig,
    /// Control plane root (default: `https://compute.googleapis.com`).
    pub compute_api_base_url: String,
    /// Static bearer token. When unset, tokens come from the metadata server.
    pub access_token: Option<String>,
    pub metadata_token_url: String,
    /// Deadline for each outbound control-plane request (default: `30`).
    pub compute_request_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl FunctionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                          |
    /// |--------------------------------|----------------------------------|
    /// | `PROJECT_ID`                   | --                               |
    /// | `ZONE`                         | --                               |
    /// | `INSTANCE_NAME`                | --                               |
    /// | `HOST`                         | `0.0.0.0`                        |
    /// | `PORT`                         | `8080`                           |
    /// | `COMPUTE_API_BASE_URL`         | `https://compute.googleapis.com` |
    /// | `GOOGLE_ACCESS_TOKEN`          | --                               |
    /// | `METADATA_TOKEN_URL`           | metadata server token endpoint   |
    /// | `COMPUTE_REQUEST_TIMEOUT_SECS` | `30`                             |
    /// | `LOG_FORMAT`                   | `text`                           |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = read("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse(&read, "PORT", "a valid port number", 8080)?;
        let compute_request_timeout_secs = parse(
            &read,
            "COMPUTE_REQUEST_TIMEOUT_SECS",
            "a whole number of seconds",
            30,
        )?;

        let log_format = match read("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    expected: "'text' or 'json'",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            host,
            port,
            target: TargetConfig::from_lookup(&lookup),
            compute_api_base_url: read("COMPUTE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COMPUTE_API_BASE_URL.into()),
            access_token: read("GOOGLE_ACCESS_TOKEN"),
            metadata_token_url: read("METADATA_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_METADATA_TOKEN_URL.into()),
            compute_request_timeout_secs,
            log_format,
        })
    }
}

fn parse<T, R>(read: &R, name: &'static str, expected: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    R: Fn(&str) -> Option<String>,
{
    match read(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
