//! Explainer collaborator trait, its configuration, and the templated fallback.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::explanation::KeyFactor;
use crate::prompts::{format_explanation_input, render_template};

/// Result type for collaborator calls
pub type AgentResult<T> = Result<T, AgentError>;

/// Explainer error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error("Text generation error: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Rate limit exceeded")]
    RateLimit,
}

impl From<AgentError> for harmony_core::Error {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Timeout(ms) => harmony_core::Error::Timeout { duration_ms: ms },
            other => harmony_core::Error::ExternalService(other.to_string()),
        }
    }
}

/// How much the explanation should cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationDepth {
    /// Top three factors, shown with each presentation
    Brief,
    /// Every key factor, for "tell me more"
    Detailed,
}

/// Everything an explainer may use to describe a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub user_name: String,
    pub candidate_name: String,
    pub overall_percent: u8,
    pub factors: Vec<KeyFactor>,
    pub depth: ExplanationDepth,
}

impl ExplanationRequest {
    pub fn validate(&self) -> AgentResult<()> {
        if self.factors.is_empty() {
            Err(AgentError::InvalidInput("no factors to explain".to_string()))
        } else {
            Ok(())
        }
    }

    /// Prompt text for generative explainers
    pub fn prompt(&self) -> String {
        format_explanation_input(self)
    }
}

/// Natural-language explanation generator.
///
/// Implementations may be slow or unavailable; callers wrap them with
/// [`explain_with_fallback`].
#[async_trait]
pub trait Explainer: Send + Sync {
    fn name(&self) -> &str;

    async fn explain(&self, request: &ExplanationRequest) -> AgentResult<String>;
}

/// Explainer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model identifier passed through to the generator
    pub model: String,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Retries after the first failed attempt
    pub max_retries: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "template".to_string(),
            timeout_ms: 2_000,
            max_retries: 1,
        }
    }
}

/// Deterministic explainer built from fixed sentence templates
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExplainer;

impl TemplateExplainer {
    pub fn render(&self, request: &ExplanationRequest) -> String {
        render_template(request)
    }
}

#[async_trait]
impl Explainer for TemplateExplainer {
    fn name(&self) -> &str {
        "template"
    }

    async fn explain(&self, request: &ExplanationRequest) -> AgentResult<String> {
        Ok(self.render(request))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationSource {
    Generated,
    Template,
}

/// Explanation text and where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationText {
    pub text: String,
    pub source: ExplanationSource,
}

/// Ask `explainer` with a bounded timeout and retries, falling back to the
/// template on timeout, error or empty output.
pub async fn explain_with_fallback(
    explainer: &dyn Explainer,
    request: &ExplanationRequest,
    config: &AgentConfig,
) -> ExplanationText {
    let timeout = Duration::from_millis(config.timeout_ms);
    let attempts = config.max_retries + 1;

    if request.validate().is_ok() {
        for attempt in 1..=attempts {
            let outcome = match tokio::time::timeout(timeout, explainer.explain(request)).await {
                Ok(result) => result,
                Err(_) => Err(AgentError::Timeout(config.timeout_ms)),
            };

            match outcome {
                Ok(text) if !text.trim().is_empty() => {
                    return ExplanationText {
                        text,
                        source: ExplanationSource::Generated,
                    };
                }
                Ok(_) => tracing::warn!(
                    explainer = explainer.name(),
                    attempt,
                    "explainer returned empty text"
                ),
                Err(e) => tracing::warn!(
                    explainer = explainer.name(),
                    attempt,
                    error = %e,
                    "explainer call failed"
                ),
            }
        }
        tracing::warn!(explainer = explainer.name(), "falling back to templated explanation");
    }

    ExplanationText {
        text: TemplateExplainer.render(request),
        source: ExplanationSource::Template,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explanation::FactorKind;
    use harmony_scoring::CompatibilityDimension;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request() -> ExplanationRequest {
        ExplanationRequest {
            user_name: "Avery".to_string(),
            candidate_name: "Blake".to_string(),
            overall_percent: 82,
            factors: vec![KeyFactor {
                dimension: CompatibilityDimension::Attachment,
                kind: FactorKind::Strength,
                score: 0.95,
                contribution: 0.2375,
                description: "Both secure".to_string(),
            }],
            depth: ExplanationDepth::Brief,
        }
    }

    struct SlowExplainer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Explainer for SlowExplainer {
        fn name(&self) -> &str {
            "slow"
        }

        async fn explain(&self, _request: &ExplanationRequest) -> AgentResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    struct FlakyExplainer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Explainer for FlakyExplainer {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn explain(&self, _request: &ExplanationRequest) -> AgentResult<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AgentError::RateLimit)
            } else {
                Ok("You two share a calm, secure foundation.".to_string())
            }
        }
    }

    #[test]
    fn test_agent_config_default() {
        let config = AgentConfig::default();
        assert_eq!(config.timeout_ms, 2_000);
        assert_eq!(config.max_retries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_retries_once_then_templates() {
        let slow = SlowExplainer {
            calls: AtomicUsize::new(0),
        };
        let text = explain_with_fallback(&slow, &request(), &AgentConfig::default()).await;
        assert_eq!(text.source, ExplanationSource::Template);
        assert!(text.text.contains("Blake"));
        assert_eq!(slow.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let flaky = FlakyExplainer {
            calls: AtomicUsize::new(0),
        };
        let text = explain_with_fallback(&flaky, &request(), &AgentConfig::default()).await;
        assert_eq!(text.source, ExplanationSource::Generated);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_request_skips_explainer() {
        let flaky = FlakyExplainer {
            calls: AtomicUsize::new(1),
        };
        let mut req = request();
        req.factors.clear();
        let text = explain_with_fallback(&flaky, &req, &AgentConfig::default()).await;
        assert_eq!(text.source, ExplanationSource::Template);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_agent_error_maps_to_core_kind() {
        let e: harmony_core::Error = AgentError::Timeout(2_000).into();
        assert_eq!(e.kind(), harmony_core::ErrorKind::ExternalServiceError);
    }
}
