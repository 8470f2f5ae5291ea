//! Text-generation provider abstraction and implementations.
//!
//! Upstream failures are classified once, at this boundary, into typed
//! variants so callers never have to sniff prose in error messages. In
//! particular `ParameterUnsupported` is what drives the temperature
//! fallback retry in the generation service.

pub mod mock;
pub mod openai;

use crate::prompt::PromptDocument;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// The upstream API rejected a request parameter it does not support
    /// (typically `temperature` on models that ignore sampling knobs).
    #[error("Unsupported parameter: {0}")]
    ParameterUnsupported(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

/// Generation parameters for provider requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature in `[0, 2]`. `None` omits the parameter from the
    /// upstream payload entirely.
    pub temperature: Option<f64>,
}

/// Result of a successful generation call.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    /// Generated text; an empty string when the upstream response carried no
    /// text field.
    pub text: String,
}

/// Trait for text generation providers.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate text for the given prompt.
    async fn generate(
        &self,
        model: &str,
        prompt: &PromptDocument,
        params: &GenerationParams,
    ) -> Result<ProviderReply, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
