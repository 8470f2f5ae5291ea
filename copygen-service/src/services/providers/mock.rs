//! Mock provider implementation for testing.

use super::{GenerationParams, ProviderError, ProviderReply, TextProvider};
use crate::prompt::PromptDocument;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock text provider.
///
/// Without a script it echoes the prompt back; with a script it replays the
/// queued results in order, which is how the fallback protocol is tested.
/// Every call is counted and its parameters recorded.
#[derive(Default)]
pub struct MockTextProvider {
    script: Mutex<VecDeque<Result<ProviderReply, ProviderError>>>,
    calls: AtomicUsize,
    seen_params: Mutex<Vec<GenerationParams>>,
}

impl MockTextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue results to be returned by successive `generate` calls.
    pub fn with_script(
        script: impl IntoIterator<Item = Result<ProviderReply, ProviderError>>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Parameters seen by each `generate` call, in order.
    pub fn seen_params(&self) -> Vec<GenerationParams> {
        self.seen_params.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        _model: &str,
        prompt: &PromptDocument,
        params: &GenerationParams,
    ) -> Result<ProviderReply, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_params.lock().unwrap().push(params.clone());

        if let Some(result) = self.script.lock().unwrap().pop_front() {
            return result;
        }

        Ok(ProviderReply {
            text: format!("Mock copy for: {}", prompt.user),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
