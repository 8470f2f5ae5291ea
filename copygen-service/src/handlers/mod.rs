//! HTTP handlers for the copy-generation endpoint.

use crate::prompt::build_prompt;
use crate::services::generate_with_fallback;
use crate::services::providers::{GenerationParams, ProviderError};
use crate::startup::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `POST /api/generate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub model: Option<String>,
    /// Accepted as any JSON value and coerced; non-numeric input falls back
    /// to the default rather than failing the request.
    #[serde(default)]
    pub temperature: Option<Value>,
    #[serde(default)]
    pub product_info: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub extra_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub text: String,
}

/// Request-level errors with the exact response bodies the endpoint promises.
#[derive(Debug)]
pub enum ApiError {
    MissingApiKey,
    MissingFields(Vec<&'static str>),
    Provider(ProviderError),
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        // A provider that reports itself unconfigured means the server is
        // missing its credential, not that the client did anything wrong.
        match err {
            ProviderError::NotConfigured(_) => ApiError::MissingApiKey,
            other => ApiError::Provider(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
        }

        match self {
            ApiError::MissingApiKey => {
                tracing::error!("Generation request rejected: API key not configured");
                (StatusCode::INTERNAL_SERVER_ERROR, "Missing API key on server").into_response()
            }
            ApiError::MissingFields(fields) => {
                tracing::warn!(fields = ?fields, "Generation request missing required fields");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody {
                        error: format!("Missing required field(s): {}", fields.join(", ")),
                    }),
                )
                    .into_response()
            }
            ApiError::Provider(err) => {
                let (status, message) = match err {
                    ProviderError::Unauthorized(msg) => {
                        tracing::error!(status = 401, error = %msg, "Upstream rejected credentials");
                        (
                            StatusCode::UNAUTHORIZED,
                            "The generation service rejected the server's API key. \
                             Check that OPENAI_API_KEY is set to a valid key."
                                .to_string(),
                        )
                    }
                    ProviderError::RateLimited(msg) => {
                        tracing::error!(status = 429, error = %msg, "Upstream rate/quota limit hit");
                        (
                            StatusCode::TOO_MANY_REQUESTS,
                            "The generation service reports a rate or quota limit. \
                             Check the account's billing and retry shortly."
                                .to_string(),
                        )
                    }
                    ProviderError::InvalidRequest(msg) => {
                        tracing::error!(status = 400, error = %msg, "Upstream rejected the request");
                        (
                            StatusCode::BAD_REQUEST,
                            format!(
                                "The generation service rejected the request; \
                                 a field such as the model name may be invalid: {}",
                                msg
                            ),
                        )
                    }
                    ProviderError::Api { status, message } => {
                        tracing::error!(status = status, error = %message, "Upstream call failed");
                        (
                            StatusCode::from_u16(status)
                                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                            message,
                        )
                    }
                    // Reaches a response when the temperature-free retry is
                    // itself classified as a parameter error.
                    ProviderError::ParameterUnsupported(msg) => {
                        tracing::error!(status = 400, error = %msg, "Upstream rejected a request parameter");
                        (
                            StatusCode::BAD_REQUEST,
                            format!(
                                "The generation service rejected a request parameter; \
                                 a field such as the model name may be invalid: {}",
                                msg
                            ),
                        )
                    }
                    ProviderError::Network(msg) => {
                        tracing::error!(error = %msg, "Network failure calling upstream");
                        (StatusCode::BAD_GATEWAY, msg)
                    }
                    // Only NotConfigured remains, and From maps that to
                    // MissingApiKey before it can get here.
                    other => {
                        tracing::error!(error = %other, "Unexpected provider error");
                        (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
                    }
                };
                (status, Json(ErrorBody { error: message })).into_response()
            }
        }
    }
}

/// `POST /api/generate` — build the prompt and forward it to the provider.
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.api_key_configured {
        return Err(ApiError::MissingApiKey);
    }

    let (template, product_info) = validate_required_fields(&req)?;

    let model = req
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(&state.config.generation.default_model)
        .to_string();
    let temperature = normalize_temperature(
        req.temperature.as_ref(),
        state.config.generation.default_temperature,
    );

    let prompt = build_prompt(template, product_info, req.extra_prompt.as_deref());
    let params = GenerationParams {
        temperature: Some(temperature),
    };

    tracing::info!(
        model = %model,
        temperature = temperature,
        template_len = template.len(),
        product_info_len = product_info.len(),
        "Generating product copy"
    );

    let reply = generate_with_fallback(state.provider.as_ref(), &model, &prompt, &params).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        Json(GenerateResponse { text: reply.text }),
    ))
}

/// Fallback for every other method on the generate route.
pub async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Both `template` and `productInfo` must be present and non-blank; the
/// error names every field that is missing.
fn validate_required_fields(req: &GenerateRequest) -> Result<(&str, &str), ApiError> {
    let template = req.template.as_deref().unwrap_or("");
    let product_info = req.product_info.as_deref().unwrap_or("");

    let mut missing = Vec::new();
    if template.trim().is_empty() {
        missing.push("template");
    }
    if product_info.trim().is_empty() {
        missing.push("productInfo");
    }

    if missing.is_empty() {
        Ok((template, product_info))
    } else {
        Err(ApiError::MissingFields(missing))
    }
}

/// Coerce the raw temperature value to a finite number clamped into `[0, 2]`;
/// anything else yields the default.
fn normalize_temperature(raw: Option<&Value>, default: f64) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(t) if t.is_finite() => t.clamp(0.0, 2.0),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TEMPERATURE;
    use serde_json::json;

    fn request(body: Value) -> GenerateRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn temperature_is_clamped_into_range() {
        assert_eq!(normalize_temperature(Some(&json!(5)), 0.5), 2.0);
        assert_eq!(normalize_temperature(Some(&json!(-1.5)), 0.5), 0.0);
        assert_eq!(normalize_temperature(Some(&json!(1.3)), 0.5), 1.3);
        assert_eq!(normalize_temperature(Some(&json!(0)), 0.5), 0.0);
        assert_eq!(normalize_temperature(Some(&json!(2)), 0.5), 2.0);
    }

    #[test]
    fn non_numeric_temperature_defaults() {
        assert_eq!(normalize_temperature(None, 0.5), 0.5);
        assert_eq!(normalize_temperature(Some(&json!(null)), 0.5), 0.5);
        assert_eq!(normalize_temperature(Some(&json!("warm")), 0.5), 0.5);
        assert_eq!(normalize_temperature(Some(&json!([1.0])), 0.5), 0.5);
        assert_eq!(normalize_temperature(Some(&json!({"v": 1})), 0.5), 0.5);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        assert_eq!(normalize_temperature(Some(&json!("1.2")), 0.5), 1.2);
        assert_eq!(normalize_temperature(Some(&json!(" 3 ")), 0.5), 2.0);
        assert_eq!(normalize_temperature(Some(&json!("inf")), 0.5), 0.5);
        assert_eq!(normalize_temperature(Some(&json!("NaN")), 0.5), 0.5);
    }

    #[test]
    fn default_temperature_constant_matches_contract() {
        assert_eq!(DEFAULT_TEMPERATURE, 0.5);
    }

    #[test]
    fn blank_fields_are_reported_as_missing() {
        let req = request(json!({ "template": "  ", "productInfo": "" }));
        match validate_required_fields(&req) {
            Err(ApiError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["template", "productInfo"]);
            }
            other => panic!("expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn absent_template_is_reported_alone() {
        let req = request(json!({ "productInfo": "x" }));
        match validate_required_fields(&req) {
            Err(ApiError::MissingFields(fields)) => assert_eq!(fields, vec!["template"]),
            other => panic!("expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn present_fields_pass_validation() {
        let req = request(json!({ "template": "# {title}", "productInfo": "Name: chair" }));
        let (template, product_info) = validate_required_fields(&req).unwrap();
        assert_eq!(template, "# {title}");
        assert_eq!(product_info, "Name: chair");
    }

    #[test]
    fn camel_case_fields_deserialize() {
        let req = request(json!({
            "model": "gpt-5-mini",
            "temperature": 0.7,
            "productInfo": "p",
            "template": "t",
            "extraPrompt": "e"
        }));
        assert_eq!(req.model.as_deref(), Some("gpt-5-mini"));
        assert_eq!(req.product_info.as_deref(), Some("p"));
        assert_eq!(req.extra_prompt.as_deref(), Some("e"));
    }

    #[test]
    fn provider_not_configured_maps_to_missing_api_key() {
        let err: ApiError = ProviderError::NotConfigured("no key".to_string()).into();
        assert!(matches!(err, ApiError::MissingApiKey));
    }
}
