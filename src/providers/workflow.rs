use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::ApiConfig;
use crate::errors::ProviderError;
use crate::providers::Translator;

/// Client for the hosted translation workflow API
///
/// One blocking-mode workflow run per call; the translated text comes back
/// under `data.outputs.text`.
#[derive(Debug, Clone)]
pub struct WorkflowTranslator {
    /// HTTP client for API requests
    client: Client,
    /// Bearer token
    api_key: String,
    /// Workflow run URL
    endpoint: String,
    /// User tag sent with every request
    user: String,
    /// Client-level request timeout
    timeout: Duration,
}

/// Workflow run request
#[derive(Debug, Serialize)]
pub struct WorkflowRequest<'a> {
    /// Workflow inputs
    pub inputs: WorkflowInputs<'a>,
    /// Always "blocking": the response carries the outputs directly
    pub response_mode: &'static str,
    /// Caller tag
    pub user: &'a str,
}

/// Inputs of the translation workflow
#[derive(Debug, Serialize)]
pub struct WorkflowInputs<'a> {
    pub source_lang: &'a str,
    pub target_lang: &'a str,
    pub query: &'a str,
}

/// Workflow run response; every level is optional
#[derive(Debug, Default, Deserialize)]
pub struct WorkflowResponse {
    #[serde(default)]
    pub data: Option<WorkflowData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkflowData {
    #[serde(default)]
    pub outputs: Option<WorkflowOutputs>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkflowOutputs {
    #[serde(default)]
    pub text: Option<String>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
struct WorkflowErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl WorkflowResponse {
    /// Extract `data.outputs.text`, empty when any level is missing
    pub fn into_text(self) -> String {
        self.data
            .and_then(|data| data.outputs)
            .and_then(|outputs| outputs.text)
            .unwrap_or_default()
    }
}

impl WorkflowTranslator {
    /// Create a new client with the given request timeout
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        user: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            user: user.into(),
            timeout,
        }
    }

    /// Create a client from the API section of the configuration
    pub fn from_config(config: &ApiConfig, timeout: Duration) -> Self {
        Self::new(&config.endpoint, &config.api_key, &config.user, timeout)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else if error.is_connect() {
            ProviderError::ConnectionError(error.to_string())
        } else {
            ProviderError::RequestFailed(error.to_string())
        }
    }
}

#[async_trait]
impl Translator for WorkflowTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let request = WorkflowRequest {
            inputs: WorkflowInputs {
                source_lang: source_language,
                target_lang: target_language,
                query: text,
            },
            response_mode: "blocking",
            user: &self.user,
        };

        debug!("Workflow request {} -> {}", source_language, target_language);

        let response = self.client.post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.json::<WorkflowErrorBody>().await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "unknown error".to_string());
            error!("Translation API error ({}): {}", status, message);

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ProviderError::AuthenticationError(message));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body = response.json::<WorkflowResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(body.into_text())
    }
}
