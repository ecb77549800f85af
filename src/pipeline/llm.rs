//! Hosted-model interaction: one completion per agent task.
//!
//! All comparison semantics live in the hosted model, which makes it the one
//! non-deterministic dependency in the pipeline. [`CompletionModel`] is the
//! injected capability the crew calls; [`ProviderModel`] adapts an
//! `edgequake-llm` provider to it, tests substitute a stub returning fixed
//! text.
//!
//! ## Retry Strategy
//!
//! Retries are off by default (`max_retries = 0`). When enabled, the wait
//! doubles after each attempt: `retry_backoff_ms * 2^(attempt-1)`, capped at
//! [`MAX_RETRY_BACKOFF_MS`].

use crate::config::ComparisonConfig;
use crate::error::ModelError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Model used when neither the config nor the secrets store names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Upper bound on a single retry wait.
pub const MAX_RETRY_BACKOFF_MS: u64 = 60_000;

/// A single chat completion request: agent framing plus task prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// The model's answer with token accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// The injected completion capability.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, ModelError>;
}

/// [`CompletionModel`] backed by an `edgequake-llm` provider.
#[derive(Clone)]
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CompletionModel for ProviderModel {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        let messages = vec![
            ChatMessage::system(request.system.as_str()),
            ChatMessage::user(request.user.as_str()),
        ];
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ModelError::Api {
                message: e.to_string(),
            })?;

        Ok(ModelReply {
            content: response.content,
            prompt_tokens: response.prompt_tokens as usize,
            completion_tokens: response.completion_tokens as usize,
        })
    }
}

/// The model identifier to use: config first, then the secrets store's
/// `OPENAI_MODEL_NAME`, then [`DEFAULT_MODEL`].
pub fn resolve_model_name(config: &ComparisonConfig, secrets_model: Option<&str>) -> String {
    config
        .model
        .as_deref()
        .or(secrets_model)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(DEFAULT_MODEL)
        .to_string()
}

/// Create the production model from the configured provider name.
///
/// The provider reads its API key from the environment the binary prepared
/// at startup (`OPENAI_API_KEY` for "openai").
pub fn resolve_provider(
    config: &ComparisonConfig,
    model: &str,
) -> Result<ProviderModel, ModelError> {
    let provider = ProviderFactory::create_llm_provider(&config.provider_name, model).map_err(
        |e| ModelError::ProviderNotConfigured {
            provider: config.provider_name.clone(),
            hint: format!(
                "Set OPENAI_API_KEY in the secrets file or environment.\nError: {}",
                e
            ),
        },
    )?;
    Ok(ProviderModel::new(provider))
}

/// Wait before retry `attempt` (1-based). Saturates instead of overflowing.
pub fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    base_ms.saturating_mul(factor).min(MAX_RETRY_BACKOFF_MS)
}

/// Call the model, retrying failed or empty answers with exponential backoff.
///
/// Returns the reply and the number of retries it took.
pub async fn complete_with_retry(
    model: &dyn CompletionModel,
    request: &ModelRequest,
    max_retries: u32,
    retry_backoff_ms: u64,
) -> Result<(ModelReply, u32), ModelError> {
    let start = Instant::now();
    let mut last_err = ModelError::EmptyResponse;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let backoff = backoff_delay_ms(retry_backoff_ms, attempt);
            warn!("retry {}/{} after {}ms", attempt, max_retries, backoff);
            sleep(Duration::from_millis(backoff)).await;
        }

        match model.complete(request).await {
            Ok(reply) if reply.content.trim().is_empty() => {
                warn!("attempt {} returned an empty answer", attempt + 1);
                last_err = ModelError::EmptyResponse;
            }
            Ok(reply) => {
                debug!(
                    "{} input tokens, {} output tokens, {:?}",
                    reply.prompt_tokens,
                    reply.completion_tokens,
                    start.elapsed()
                );
                return Ok((reply, attempt));
            }
            Err(e) => {
                warn!("attempt {} failed: {}", attempt + 1, e);
                last_err = e;
            }
        }
    }

    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        fail_first: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionModel for Flaky {
        async fn complete(&self, _request: &ModelRequest) -> Result<ModelReply, ModelError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(ModelError::Api {
                    message: format!("boom {n}"),
                })
            } else {
                Ok(ModelReply {
                    content: "ok".into(),
                    ..Default::default()
                })
            }
        }
    }

    fn request() -> ModelRequest {
        ModelRequest {
            system: "s".into(),
            user: "u".into(),
            temperature: 0.1,
            max_tokens: 16,
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay_ms(500, 1), 500);
        assert_eq!(backoff_delay_ms(500, 3), 2000);
        assert_eq!(backoff_delay_ms(500, 80), MAX_RETRY_BACKOFF_MS);
        assert_eq!(backoff_delay_ms(u64::MAX, 2), MAX_RETRY_BACKOFF_MS);
    }

    #[tokio::test]
    async fn no_retry_by_default() {
        let model = Flaky {
            fail_first: 1,
            calls: AtomicUsize::new(0),
        };
        let err = complete_with_retry(&model, &request(), 0, 1).await.unwrap_err();
        assert!(matches!(err, ModelError::Api { .. }));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let model = Flaky {
            fail_first: 2,
            calls: AtomicUsize::new(0),
        };
        let (reply, retries) = complete_with_retry(&model, &request(), 3, 1).await.unwrap();
        assert_eq!(reply.content, "ok");
        assert_eq!(retries, 2);
    }

    #[test]
    fn model_name_precedence() {
        let cfg = ComparisonConfig::default();
        assert_eq!(resolve_model_name(&cfg, None), DEFAULT_MODEL);
        assert_eq!(resolve_model_name(&cfg, Some("gpt-4o")), "gpt-4o");

        let cfg = ComparisonConfig::builder().model("gpt-4.1").build().unwrap();
        assert_eq!(resolve_model_name(&cfg, Some("gpt-4o")), "gpt-4.1");
    }
}
