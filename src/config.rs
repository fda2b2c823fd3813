use crate::errors::AppError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://finstat.sk/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Level of detail requested from Finstat; also the last path segment of
/// the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Detail,
    Extended,
    Ultimate,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Detail => "detail",
            RequestType::Extended => "extended",
            RequestType::Ultimate => "ultimate",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "detail" => Ok(RequestType::Detail),
            "extended" => Ok(RequestType::Extended),
            "ultimate" => Ok(RequestType::Ultimate),
            other => Err(AppError::ConfigError(format!(
                "API request type '{}' is not available, choose from the list : detail, extended, ultimate",
                other
            ))),
        }
    }
}

/// What happens to identifiers the API could not serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Write them to a separate `unavailable_ico` table.
    #[default]
    Segregate,
    /// Log them and write nothing.
    Drop,
}

impl FromStr for FailurePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "segregate" => Ok(FailurePolicy::Segregate),
            "drop" => Ok(FailurePolicy::Drop),
            other => Err(AppError::ConfigError(format!(
                "failed_ico_policy must be 'segregate' or 'drop', got '{}'",
                other
            ))),
        }
    }
}

/// Raw, unvalidated parameters as found in the host configuration file and
/// the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Parameters {
    #[serde(rename = "#api_key")]
    pub api_key: Option<String>,
    #[serde(rename = "#private_key")]
    pub private_key: Option<String>,
    pub request_type: Option<String>,
    pub debug: Option<bool>,
    pub failed_ico_policy: Option<String>,
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HostConfig {
    #[serde(default)]
    parameters: Parameters,
}

impl Parameters {
    /// Reads `<data_dir>/config.json`. A missing file yields empty parameters.
    pub fn from_data_dir(data_dir: &Path) -> Result<Self, AppError> {
        let path = data_dir.join("config.json");
        if !path.exists() {
            tracing::debug!("No configuration file at {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let host: HostConfig = serde_json::from_str(&content).map_err(|e| {
            AppError::ConfigError(format!("Invalid configuration file {}: {}", path.display(), e))
        })?;
        Ok(host.parameters)
    }

    /// Overrides parameters with `FINSTAT_*` variables returned by `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("FINSTAT_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(key) = var("FINSTAT_PRIVATE_KEY") {
            self.private_key = Some(key);
        }
        if let Some(request_type) = var("FINSTAT_REQUEST_TYPE") {
            self.request_type = Some(request_type);
        }
        if let Some(url) = var("FINSTAT_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(policy) = var("FINSTAT_FAILED_ICO_POLICY") {
            self.failed_ico_policy = Some(policy);
        }
        if let Some(secs) = var("FINSTAT_TIMEOUT_SECS") {
            let secs = secs.trim().parse().map_err(|_| {
                AppError::ConfigError(
                    "FINSTAT_TIMEOUT_SECS must be a whole number of seconds".to_string(),
                )
            })?;
            self.timeout_secs = Some(secs);
        }
        if let Some(debug) = var("FINSTAT_DEBUG") {
            self.debug = Some(matches!(
                debug.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            ));
        }

        Ok(self)
    }

    /// Loads `.env`, the host configuration file and the environment.
    pub fn load(data_dir: &Path) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_data_dir(data_dir)?.with_env_overrides(|name| std::env::var(name).ok())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub private_key: String,
    pub request_type: RequestType,
    pub base_url: String,
    pub request_timeout: Duration,
    pub failure_policy: FailurePolicy,
    pub data_dir: PathBuf,
    pub input_path: Option<PathBuf>,
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(AppError::ConfigError(format!("{} cannot be empty", name))),
        None => Err(AppError::ConfigError(format!("{} parameter required", name))),
    }
}

impl Config {
    /// Validates raw parameters into a configuration.
    pub fn from_parameters(params: Parameters, data_dir: PathBuf) -> Result<Self, AppError> {
        let api_key = required(params.api_key, "#api_key")?;
        let private_key = required(params.private_key, "#private_key")?;
        let request_type: RequestType = required(params.request_type, "request_type")?.parse()?;

        let base_url = params
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid base_url {}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(AppError::ConfigError(format!(
                "base_url must be an http:// or https:// URL with a host, got {}",
                base_url
            )));
        }

        let timeout_secs = params.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        let failure_policy: FailurePolicy = match params.failed_ico_policy {
            Some(policy) => policy.parse()?,
            None => FailurePolicy::default(),
        };

        Ok(Self {
            api_key,
            private_key,
            request_type,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
            failure_policy,
            data_dir,
            input_path: None,
        })
    }

    /// Directory the host environment places input tables in.
    pub fn input_tables_dir(&self) -> PathBuf {
        self.data_dir.join("in").join("tables")
    }

    /// Directory output tables and their manifests are written to.
    pub fn output_tables_dir(&self) -> PathBuf {
        self.data_dir.join("out").join("tables")
    }

    /// Logs the configuration without secret values.
    pub fn log_summary(&self) {
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Finstat base URL: {}", self.base_url);
        tracing::debug!("Request type: {}", self.request_type);
        tracing::debug!("Request timeout: {:?}", self.request_timeout);
        tracing::debug!("Failed ICO policy: {:?}", self.failure_policy);
        tracing::debug!("Data directory: {}", self.data_dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn params() -> Parameters {
        Parameters {
            api_key: Some("key1".to_string()),
            private_key: Some("priv1".to_string()),
            request_type: Some("detail".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_parameters(params(), PathBuf::from("data")).unwrap();

        assert_eq!(config.request_type, RequestType::Detail);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.failure_policy, FailurePolicy::Segregate);
        assert_eq!(config.input_tables_dir(), PathBuf::from("data/in/tables"));
        assert_eq!(config.output_tables_dir(), PathBuf::from("data/out/tables"));
    }

    #[test]
    fn test_missing_mandatory_parameters() {
        for strip in ["api", "private", "type"] {
            let mut p = params();
            match strip {
                "api" => p.api_key = None,
                "private" => p.private_key = Some("  ".to_string()),
                _ => p.request_type = None,
            }
            let err = Config::from_parameters(p, PathBuf::from("data")).unwrap_err();
            assert!(matches!(err, AppError::ConfigError(_)), "{}", strip);
        }
    }

    #[test]
    fn test_invalid_request_type() {
        let mut p = params();
        p.request_type = Some("premium".to_string());

        let err = Config::from_parameters(p, PathBuf::from("data")).unwrap_err();
        assert!(err.to_string().contains("detail, extended, ultimate"));
    }

    #[test]
    fn test_invalid_base_url_and_timeout() {
        let mut p = params();
        p.base_url = Some("finstat.sk/api".to_string());
        assert!(Config::from_parameters(p, PathBuf::from("data")).is_err());

        let mut p = params();
        p.timeout_secs = Some(0);
        assert!(Config::from_parameters(p, PathBuf::from("data")).is_err());
    }

    #[test]
    fn test_base_url_without_host_rejected() {
        for url in ["https://", "http://", "ftp://finstat.sk/api", "not a url"] {
            let mut p = params();
            p.base_url = Some(url.to_string());
            let err = Config::from_parameters(p, PathBuf::from("data")).unwrap_err();
            assert!(matches!(err, AppError::ConfigError(_)), "{}", url);
        }
    }

    #[test]
    fn test_env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FINSTAT_REQUEST_TYPE", "ultimate"),
            ("FINSTAT_TIMEOUT_SECS", "5"),
            ("FINSTAT_FAILED_ICO_POLICY", "drop"),
            ("FINSTAT_BASE_URL", "http://localhost:9000/api/"),
            ("FINSTAT_DEBUG", "true"),
            ("FINSTAT_API_KEY", ""),
        ]);
        let p = params()
            .with_env_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(p.debug, Some(true));
        let config = Config::from_parameters(p, PathBuf::from("data")).unwrap();

        assert_eq!(config.api_key, "key1");
        assert_eq!(config.request_type, RequestType::Ultimate);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.failure_policy, FailurePolicy::Drop);
        assert_eq!(config.base_url, "http://localhost:9000/api");
    }

    #[test]
    fn test_invalid_timeout_env() {
        let result = params().with_env_overrides(|name| {
            (name == "FINSTAT_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_reads_host_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r##"{"parameters": {"#api_key": "k", "#private_key": "p", "request_type": "extended", "debug": true}}"##,
        )
        .unwrap();

        let p = Parameters::from_data_dir(dir.path()).unwrap();
        assert_eq!(p.debug, Some(true));
        let config = Config::from_parameters(p, dir.path().to_path_buf()).unwrap();

        assert_eq!(config.api_key, "k");
        assert_eq!(config.request_type, RequestType::Extended);
    }

    #[test]
    fn test_missing_host_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = Parameters::from_data_dir(dir.path()).unwrap();
        assert!(p.api_key.is_none());

        std::fs::write(dir.path().join("config.json"), "{broken").unwrap();
        assert!(Parameters::from_data_dir(dir.path()).is_err());
    }
}
