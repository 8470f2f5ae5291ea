//! Generation call protocol: one primary attempt, one temperature-free
//! fallback attempt when the provider rejects the temperature parameter.

use crate::prompt::PromptDocument;
use crate::services::providers::{GenerationParams, ProviderError, ProviderReply, TextProvider};

/// Call the provider, retrying exactly once without temperature when the
/// first attempt fails with [`ProviderError::ParameterUnsupported`].
///
/// Any other error propagates unchanged, as does `ParameterUnsupported`
/// when no temperature was sent in the first place.
pub async fn generate_with_fallback(
    provider: &dyn TextProvider,
    model: &str,
    prompt: &PromptDocument,
    params: &GenerationParams,
) -> Result<ProviderReply, ProviderError> {
    match provider.generate(model, prompt, params).await {
        Err(ProviderError::ParameterUnsupported(msg)) if params.temperature.is_some() => {
            tracing::warn!(
                model = %model,
                error = %msg,
                "Provider rejected temperature parameter; retrying without it"
            );
            provider
                .generate(model, prompt, &GenerationParams { temperature: None })
                .await
        }
        other => other,
    }
}
