// src/services/gemini.rs
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::assistant::{ModelProvider, ProviderError, ReplyStream};
use crate::config::Config;

/// Client for Gemini's `streamGenerateContent` API (`alt=sse`).
pub struct GeminiModel {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    system_instruction: String,
}

impl GeminiModel {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            system_instruction: config.system_instruction.clone(),
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiModel {
    async fn stream_reply(&self, message: &str) -> Result<ReplyStream, ProviderError> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: message.to_string(),
                }],
            }],
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: self.system_instruction.clone(),
                }],
            }),
        };

        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        Ok(text_chunks(response))
    }
}

/// Turns the raw SSE body into a stream of text fragments, in arrival order.
fn text_chunks(response: reqwest::Response) -> ReplyStream {
    Box::pin(try_stream! {
        let mut bytes = response.bytes_stream();
        let mut frames = SseFrameBuffer::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            for payload in frames.push(&chunk) {
                let frame: StreamFrame = serde_json::from_str(&payload)
                    .map_err(|e| ProviderError::Decode(e.to_string()))?;
                for text in frame.texts() {
                    yield text;
                }
            }
        }
    })
}

/// Reassembles `data:` payloads from SSE bytes that may split anywhere,
/// including mid-line. Blank keep-alive lines and `[DONE]` are dropped.
struct SseFrameBuffer {
    buffer: String,
}

impl SseFrameBuffer {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut payloads = Vec::new();
        while let Some(line_end) = self.buffer.find('\n') {
            let line = self.buffer[..line_end].trim().to_string();
            self.buffer.drain(..=line_end);

            if line.is_empty() || line == "data: [DONE]" {
                continue;
            }
            if let Some(payload) = line.strip_prefix("data: ") {
                payloads.push(payload.to_string());
            }
        }
        payloads
    }
}

// Wire types. Gemini expects `contents` plus an optional `systemInstruction`,
// and streams back candidate deltas under the same shape as generateContent.

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct StreamFrame {
    candidates: Option<Vec<StreamCandidate>>,
}

#[derive(Deserialize)]
struct StreamCandidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl StreamFrame {
    fn texts(self) -> Vec<String> {
        let mut out = Vec::new();
        for candidate in self.candidates.into_iter().flatten() {
            let parts = candidate.content.and_then(|c| c.parts);
            for part in parts.into_iter().flatten() {
                if let Some(text) = part.text {
                    if !text.is_empty() {
                        out.push(text);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> String {
        format!(
            r#"data: {{"candidates":[{{"content":{{"parts":[{{"text":"{text}"}}]}}}}]}}"#
        )
    }

    #[test]
    fn reassembles_payload_split_across_chunks() {
        let mut buf = SseFrameBuffer::new();
        let line = format!("{}\n\n", frame("Hel"));
        let (head, tail) = line.split_at(line.len() / 2);

        assert!(buf.push(head.as_bytes()).is_empty());
        let payloads = buf.push(tail.as_bytes());
        assert_eq!(payloads.len(), 1);

        let parsed: StreamFrame = serde_json::from_str(&payloads[0]).unwrap();
        assert_eq!(parsed.texts(), vec!["Hel".to_string()]);
    }

    #[test]
    fn skips_blank_lines_and_done_marker() {
        let mut buf = SseFrameBuffer::new();
        let input = format!("\n\n{}\n\ndata: [DONE]\n\n", frame("world"));
        let payloads = buf.push(input.as_bytes());
        assert_eq!(payloads.len(), 1);
    }

    #[test]
    fn multiple_frames_stay_ordered() {
        let mut buf = SseFrameBuffer::new();
        let input = format!("{}\n{}\n{}\n", frame("a"), frame("b"), frame("c"));
        let texts: Vec<String> = buf
            .push(input.as_bytes())
            .into_iter()
            .map(|p| serde_json::from_str::<StreamFrame>(&p).unwrap().texts())
            .flatten()
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn frame_without_text_parts_yields_nothing() {
        let parsed: StreamFrame =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#).unwrap();
        assert!(parsed.texts().is_empty());
    }
}
