use reqwest::Client;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::errors::{CompletionError, CompletionResult};
use crate::types::{GenerateContentRequest, GenerateContentResponse, ModelHandle};

/// Client for interacting with the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    model: ModelHandle,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(config: &GatewayConfig) -> CompletionResult<Self> {
        Self::with_http_client(Client::new(), config)
    }

    /// Create a client over a preconfigured HTTP client.
    ///
    /// The gateway imposes no timeout of its own; callers that want one set
    /// it on the `reqwest::Client` they pass here.
    pub fn with_http_client(client: Client, config: &GatewayConfig) -> CompletionResult<Self> {
        if !config.has_usable_api_key() {
            return Err(CompletionError::Configuration(
                "A usable API key is required to initialize the Gemini client".to_string(),
            ));
        }

        let api_key = config.api_key.clone().ok_or_else(|| {
            CompletionError::Configuration(
                "An API key is required to initialize the Gemini client".to_string(),
            )
        })?;

        let model = ModelHandle::new(api_key, config.model_name.clone());

        Ok(Self { client, model })
    }

    /// Get the base API URL
    fn get_base_url(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model.model_name, self.model.api_key
        )
    }

    /// Generate content using the Gemini API
    pub async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> CompletionResult<GenerateContentResponse> {
        let url = self.get_base_url();

        debug!(model = %self.model.model_name, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                CompletionError::Transport(format!("Failed to read error response: {}", e))
            })?;

            return Err(CompletionError::Http {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", error_body),
            });
        }

        let response_body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| CompletionError::Protocol(format!("Failed to parse response: {}", e)))?;

        Ok(response_body)
    }

    /// Helper method to extract text from a response
    pub fn extract_text_from_response(
        &self,
        response: &GenerateContentResponse,
    ) -> CompletionResult<String> {
        extract_text(response)
    }
}

/// Walk candidates -> content -> parts -> text; every missing level is a
/// protocol error.
pub(crate) fn extract_text(response: &GenerateContentResponse) -> CompletionResult<String> {
    if response.candidates.is_empty() {
        return Err(CompletionError::Protocol(
            "No candidates in response".to_string(),
        ));
    }

    let candidate = &response.candidates[0];
    let content = candidate
        .content
        .as_ref()
        .ok_or_else(|| CompletionError::Protocol("No content in candidate".to_string()))?;

    if content.parts.is_empty() {
        return Err(CompletionError::Protocol("No parts in content".to_string()));
    }

    let part = &content.parts[0];
    let text = part
        .text
        .as_ref()
        .ok_or_else(|| CompletionError::Protocol("No text in part".to_string()))?;

    Ok(text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use crate::types::{Candidate, ContentData, PartResponse};

    fn response_with_text(text: &str) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(ContentData {
                    parts: vec![PartResponse {
                        text: Some(text.to_string()),
                    }],
                    role: Some("model".to_string()),
                }),
            }],
        }
    }

    #[test]
    fn test_client_rejects_missing_or_placeholder_key() {
        let config = GatewayConfig::default();
        assert!(GeminiClient::new(&config).is_err());

        let config = GatewayConfig {
            api_key: Some(crate::config::API_KEY_PLACEHOLDER.to_string()),
            ..GatewayConfig::default()
        };
        let err = GeminiClient::new(&config).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Configuration);
    }

    #[test]
    fn test_extract_text_from_well_formed_response() {
        let response = response_with_text("Paris is the capital of France.");
        assert_eq!(
            extract_text(&response).unwrap(),
            "Paris is the capital of France."
        );
    }

    #[test]
    fn test_extract_text_classifies_malformed_shapes_as_protocol() {
        let empty = GenerateContentResponse { candidates: vec![] };
        assert_eq!(
            extract_text(&empty).unwrap_err().kind(),
            FailureKind::Protocol
        );

        let no_content = GenerateContentResponse {
            candidates: vec![Candidate { content: None }],
        };
        assert_eq!(
            extract_text(&no_content).unwrap_err().kind(),
            FailureKind::Protocol
        );

        let no_text = GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(ContentData {
                    parts: vec![PartResponse { text: None }],
                    role: None,
                }),
            }],
        };
        assert_eq!(
            extract_text(&no_text).unwrap_err().kind(),
            FailureKind::Protocol
        );
    }
}
