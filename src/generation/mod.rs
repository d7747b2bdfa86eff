//! AI text generation.
//!
//! Every provider call yields a lazy stream of text increments. Callers that
//! need the whole answer drain it with [`generate_to_string`]; the interactive
//! endpoint forwards increments to the client as they arrive. Dropping the
//! stream cancels the upstream request.

pub mod openai;
pub mod output;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use thiserror::Error;

pub use openai::OpenAiGenerator;
pub use output::{parse_structured, strip_code_fences, StructuredOutput};

pub type TextStream = BoxStream<'static, Result<String, GenerationError>>;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("AI provider not configured: {0}")]
    NotConfigured(String),

    #[error("AI provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI provider sent an unreadable event: {0}")]
    Decode(String),

    #[error("AI provider reported an error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Ask the provider to ground the answer with web search when it can.
    pub web_search: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            web_search: false,
        }
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<TextStream, GenerationError>;
}

/// Drains a generation to completion. Any failure discards what was received.
pub async fn generate_to_string(
    generator: &dyn TextGenerator,
    request: GenerationRequest,
) -> Result<String, GenerationError> {
    let mut stream = generator.generate(request).await?;
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk?);
    }
    Ok(text)
}


#[cfg(test)]
mod tests {
    use super::fake::ScriptedGenerator;
    use super::*;

    #[tokio::test]
    async fn drain_concatenates_increments_in_order() {
        let generator = ScriptedGenerator::replying(&["{\"a\":", " 1", "}"]);
        let text = generate_to_string(&generator, GenerationRequest::new("p")).await.unwrap();
        assert_eq!(text, "{\"a\": 1}");
    }

    #[tokio::test]
    async fn drain_fails_when_stream_fails_midway() {
        let generator = ScriptedGenerator::failing(&["partial"]);
        let err = generate_to_string(&generator, GenerationRequest::new("p")).await.unwrap_err();
        assert!(matches!(err, GenerationError::Provider(_)));
    }
}
