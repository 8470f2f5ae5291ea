//! OpenAI text provider implementation.
//!
//! Talks to the Responses API (`POST {base_url}/responses`). Temperature is
//! sent as an optional top-level field and omitted entirely when `None`;
//! the live API accepts it at the top level, some models reject it, which
//! this provider surfaces as [`ProviderError::ParameterUnsupported`].

use super::{GenerationParams, ProviderError, ProviderReply, TextProvider};
use crate::config::OpenAiConfig;
use crate::prompt::PromptDocument;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// OpenAI text provider.
pub struct OpenAiTextProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiTextProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), method)
    }
}

#[async_trait]
impl TextProvider for OpenAiTextProvider {
    async fn generate(
        &self,
        model: &str,
        prompt: &PromptDocument,
        params: &GenerationParams,
    ) -> Result<ProviderReply, ProviderError> {
        let api_key = self.config.api_key.expose_secret();
        if api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "OpenAI API key not configured".to_string(),
            ));
        }

        let request = ResponsesRequest {
            model,
            input: vec![
                InputMessage {
                    role: "system",
                    content: prompt.system,
                },
                InputMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: params.temperature,
        };

        tracing::debug!(
            model = %model,
            prompt_len = prompt.user.len(),
            temperature = ?params.temperature,
            "Sending request to OpenAI Responses API"
        );

        let response = self
            .client
            .post(self.api_url("responses"))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let api_response: ResponsesReply = response
            .json()
            .await
            .map_err(|e| ProviderError::Api {
                status: 200,
                message: format!("Failed to parse response: {}", e),
            })?;

        // A response without text is an empty result, not an error.
        Ok(ProviderReply {
            text: api_response.text().unwrap_or_default(),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let api_key = self.config.api_key.expose_secret();
        if api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "OpenAI API key not configured".to_string(),
            ));
        }

        let response = self
            .client
            .get(self.api_url("models"))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::Api {
                status: response.status().as_u16(),
                message: format!("Health check failed: {}", response.status()),
            })
        }
    }
}

/// Classify an upstream error response into a typed variant.
///
/// A 400 whose `param` or message points at an unsupported parameter (the
/// temperature case) becomes `ParameterUnsupported`, which is the only
/// variant that triggers the fallback retry.
fn classify_error(status: u16, body: &str) -> ProviderError {
    let detail: Option<ApiErrorDetail> = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error);
    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| body.to_string());

    match status {
        401 => ProviderError::Unauthorized(message),
        429 => ProviderError::RateLimited(message),
        400 => {
            let param_is_temperature = detail
                .as_ref()
                .and_then(|d| d.param.as_deref())
                .is_some_and(|p| p.eq_ignore_ascii_case("temperature"));
            let lowered = message.to_lowercase();
            if param_is_temperature
                || lowered.contains("unsupported")
                || lowered.contains("parameter")
                || lowered.contains("temperature")
            {
                ProviderError::ParameterUnsupported(message)
            } else {
                ProviderError::InvalidRequest(message)
            }
        }
        _ => ProviderError::Api { status, message },
    }
}

// ============================================================================
// OpenAI API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

impl ResponsesReply {
    /// Prefer the convenience `output_text` field; otherwise stitch together
    /// the text parts of the first output item.
    fn text(self) -> Option<String> {
        if let Some(text) = self.output_text {
            return Some(text);
        }
        let parts: Vec<String> = self
            .output
            .into_iter()
            .flat_map(|item| item.content)
            .filter_map(|c| c.text)
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(""))
        }
    }
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    param: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_classified() {
        let body = r#"{"error":{"message":"Incorrect API key provided"}}"#;
        assert!(matches!(
            classify_error(401, body),
            ProviderError::Unauthorized(_)
        ));
    }

    #[test]
    fn forbidden_keeps_its_own_status() {
        let body = r#"{"error":{"message":"Country, region, or territory not supported"}}"#;
        match classify_error(403, body) {
            ProviderError::Api { status, .. } => assert_eq!(status, 403),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn rate_limit_is_classified() {
        let body = r#"{"error":{"message":"You exceeded your current quota"}}"#;
        assert!(matches!(
            classify_error(429, body),
            ProviderError::RateLimited(_)
        ));
    }

    #[test]
    fn unsupported_temperature_is_classified_by_param() {
        let body = r#"{"error":{"message":"This value is not allowed","param":"temperature"}}"#;
        assert!(matches!(
            classify_error(400, body),
            ProviderError::ParameterUnsupported(_)
        ));
    }

    #[test]
    fn unsupported_temperature_is_classified_by_message() {
        let body =
            r#"{"error":{"message":"Unsupported parameter: 'temperature' is not supported"}}"#;
        assert!(matches!(
            classify_error(400, body),
            ProviderError::ParameterUnsupported(_)
        ));
    }

    #[test]
    fn other_bad_requests_are_invalid_request() {
        let body = r#"{"error":{"message":"Invalid model name"}}"#;
        assert!(matches!(
            classify_error(400, body),
            ProviderError::InvalidRequest(_)
        ));
    }

    #[test]
    fn unknown_statuses_keep_status_and_message() {
        let body = r#"{"error":{"message":"The server had an error"}}"#;
        match classify_error(503, body) {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "The server had an error");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn non_json_error_bodies_fall_back_to_raw_text() {
        match classify_error(502, "upstream gateway exploded") {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream gateway exploded");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn reply_text_prefers_output_text() {
        let reply: ResponsesReply = serde_json::from_str(
            r#"{"output_text":"hello","output":[{"content":[{"text":"ignored"}]}]}"#,
        )
        .unwrap();
        assert_eq!(reply.text().as_deref(), Some("hello"));
    }

    #[test]
    fn reply_text_stitches_output_parts() {
        let reply: ResponsesReply = serde_json::from_str(
            r#"{"output":[{"content":[{"text":"a"},{"text":"b"}]}]}"#,
        )
        .unwrap();
        assert_eq!(reply.text().as_deref(), Some("ab"));
    }

    #[test]
    fn reply_without_text_is_none() {
        let reply: ResponsesReply = serde_json::from_str(r#"{"output":[]}"#).unwrap();
        assert_eq!(reply.text(), None);
    }

    #[test]
    fn temperature_is_omitted_from_payload_when_none() {
        let request = ResponsesRequest {
            model: "gpt-5",
            input: vec![],
            temperature: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
    }
}
