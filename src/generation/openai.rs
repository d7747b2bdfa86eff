// OpenAI-compatible chat completions client (streaming)
use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};

use super::{GenerationError, GenerationRequest, TextGenerator, TextStream};
use crate::config::AiConfig;

const CHAT_PATH: &str = "/v1/chat/completions";

pub struct OpenAiGenerator {
    client: reqwest::Client,
    endpoint: url::Url,
    api_key: Option<String>,
    model: String,
    web_search_enabled: bool,
}

impl OpenAiGenerator {
    pub fn from_config(ai: &AiConfig) -> Result<Self, GenerationError> {
        let base = url::Url::parse(&ai.base_url)
            .map_err(|e| GenerationError::NotConfigured(format!("invalid AI base URL: {}", e)))?;
        let endpoint = base
            .join(CHAT_PATH)
            .map_err(|e| GenerationError::NotConfigured(format!("invalid AI base URL: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ai.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: ai.api_key.clone().filter(|k| !k.is_empty()),
            model: ai.model.clone(),
            web_search_enabled: ai.enable_web_search,
        })
    }

    fn request_body(&self, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "stream": true,
            "messages": [{ "role": "user", "content": request.prompt }],
        });
        if request.web_search && self.web_search_enabled {
            body["web_search_options"] = json!({});
        }
        body
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<TextStream, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::NotConfigured("OPENAI_API_KEY is not set".into()))?;

        tracing::debug!(
            model = %self.model,
            web_search = request.web_search,
            prompt_len = request.prompt.len(),
            "Requesting completion"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&self.request_body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let state = (response.bytes_stream().boxed(), SseDecoder::default(), VecDeque::new());
        let stream = futures::stream::unfold(state, |(mut bytes, mut decoder, mut pending)| async move {
            loop {
                if let Some(text) = pending.pop_front() {
                    return Some((Ok(text), (bytes, decoder, pending)));
                }
                if decoder.is_done() {
                    return None;
                }
                let decoded = match bytes.next().await {
                    Some(Ok(chunk)) => decoder.push(&chunk),
                    Some(Err(e)) => {
                        decoder.close();
                        Err(GenerationError::Transport(e))
                    }
                    None => decoder.finish(),
                };
                match decoded {
                    Ok(texts) => pending.extend(texts),
                    Err(e) => {
                        decoder.close();
                        return Some((Err(e), (bytes, decoder, pending)));
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}

/// Incremental decoder for the server-sent event stream of a chat completion.
///
/// Network chunks split lines (and UTF-8 sequences) arbitrarily, so bytes are
/// buffered until a full line is available.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Feeds bytes and returns the content increments completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, GenerationError> {
        self.buffer.extend_from_slice(bytes);
        let mut texts = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if self.done {
                continue;
            }
            if let Some(text) = self.decode_line(&line)? {
                texts.push(text);
            }
        }
        Ok(texts)
    }

    /// Flushes a trailing line without newline and ends the stream.
    pub fn finish(&mut self) -> Result<Vec<String>, GenerationError> {
        let rest = std::mem::take(&mut self.buffer);
        let mut texts = Vec::new();
        if !self.done && !rest.is_empty() {
            if let Some(text) = self.decode_line(&rest)? {
                texts.push(text);
            }
        }
        self.done = true;
        Ok(texts)
    }

    pub fn close(&mut self) {
        self.done = true;
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn decode_line(&mut self, raw: &[u8]) -> Result<Option<String>, GenerationError> {
        let line = std::str::from_utf8(raw)
            .map_err(|e| GenerationError::Decode(e.to_string()))?
            .trim_end_matches(['\n', '\r']);

        // Comments, blank separators and non-data fields (event:, id:) carry no content
        let Some(payload) = line.strip_prefix("data:") else {
            return Ok(None);
        };
        let payload = payload.trim();
        if payload == "[DONE]" {
            self.done = true;
            return Ok(None);
        }

        let event: Value =
            serde_json::from_str(payload).map_err(|e| GenerationError::Decode(e.to_string()))?;

        if let Some(error) = event.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(GenerationError::Provider(message));
        }

        Ok(event
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }
}
