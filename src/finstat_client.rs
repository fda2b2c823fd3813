use crate::config::{Config, RequestType};
use crate::errors::AppError;
use crate::hasher::compute_token;
use crate::value::Fields;
use crate::xml::extract_detail_result;
use reqwest::StatusCode;

/// Client for the Finstat company detail API.
///
/// Every request is signed with a per-identifier hash built from the
/// account's key pair.
#[derive(Clone)]
pub struct FinstatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    private_key: String,
    request_type: RequestType,
}

impl FinstatClient {
    /// Creates a new `FinstatClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the key pair, request type, base URL and timeout.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                AppError::ConfigError(format!("Failed to create Finstat client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            private_key: config.private_key.clone(),
            request_type: config.request_type,
        })
    }

    /// Endpoint for the configured request type.
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.request_type)
    }

    /// Fetches the `DetailResult` of one company.
    ///
    /// # Arguments
    ///
    /// * `ico` - The company identifier to look up.
    ///
    /// # Returns
    ///
    /// * `Result<Fields, AppError>` - The decoded response tree. Non-200
    ///   answers are `ExternalApiError`, network failures `TransportError`
    ///   and undecodable bodies `ResponseFormatError`.
    pub async fn fetch_detail(&self, ico: &str) -> Result<Fields, AppError> {
        let hash = compute_token(&self.api_key, &self.private_key, ico);

        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(
            &self.endpoint(),
            &[
                ("ico", ico),
                ("apiKey", self.api_key.as_str()),
                ("Hash", hash.as_str()),
            ],
        )
        .map_err(|e| AppError::ConfigError(format!("Failed to build URL: {}", e)))?;

        // Redact the key from logs
        tracing::debug!(
            "Finstat URL: {}?ico={}&apiKey=[REDACTED]&Hash={}",
            self.endpoint(),
            ico,
            hash
        );

        let response = self.client.get(url).send().await.map_err(|e| {
            let err = AppError::from(e);
            tracing::debug!("Finstat request for ico {} failed: {}", ico, err);
            err
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::ExternalApiError(format!(
                "ico {} is not a valid ico in the Finstat database (status {})",
                ico, status
            )));
        }

        let body = response.text().await?;
        extract_detail_result(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Parameters;
    use std::path::PathBuf;

    fn config(request_type: &str) -> Config {
        let params = Parameters {
            api_key: Some("key1".to_string()),
            private_key: Some("priv1".to_string()),
            request_type: Some(request_type.to_string()),
            base_url: Some("https://finstat.example/api/".to_string()),
            ..Default::default()
        };
        Config::from_parameters(params, PathBuf::from("data")).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = FinstatClient::new(&config("detail"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_endpoint_follows_request_type() {
        let client = FinstatClient::new(&config("ultimate")).unwrap();
        assert_eq!(client.endpoint(), "https://finstat.example/api/ultimate");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let params = Parameters {
            api_key: Some("key1".to_string()),
            private_key: Some("priv1".to_string()),
            request_type: Some("detail".to_string()),
            base_url: Some("http://127.0.0.1:1/api".to_string()),
            timeout_secs: Some(2),
            ..Default::default()
        };
        let config = Config::from_parameters(params, PathBuf::from("data")).unwrap();
        let client = FinstatClient::new(&config).unwrap();

        let err = client.fetch_detail("12345678").await.unwrap_err();
        assert!(matches!(err, AppError::TransportError(_)));
        assert!(err.is_per_identifier());
    }
}
