// src/client/mod.rs
pub mod decode;

use futures::StreamExt;
use thiserror::Error;

use crate::message::ChatRequest;
use decode::Utf8StreamDecoder;

pub const STATUS_THINKING: &str = "Assistant is thinking...";
pub const STATUS_READY: &str = "Ready for your next question.";
pub const APOLOGY: &str =
    "I could not reach the assistant endpoint. Please try again in a moment.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One rendered transcript entry. Lives only for the widget's lifetime and
/// is never sent back to the server.
#[derive(Clone, Debug)]
pub struct ConversationTurn {
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty input; nothing appended, no network call.
    Ignored,
    Completed,
    Failed,
}

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat endpoint unavailable.")]
    Endpoint,
}

/// Everything a front-end needs to render: the transcript, the status
/// line, and the thinking indicator.
#[derive(Debug, Default)]
pub struct WidgetState {
    pub transcript: Vec<ConversationTurn>,
    pub status: String,
    pub thinking: bool,
}

/// Client-side controller for one chat widget. Submits a message, reads
/// the streamed reply and updates the newest bot turn in place as text
/// arrives. One exchange at a time; the exclusive borrow on `submit`
/// makes a second submission wait for the first to finish.
pub struct ChatWidget {
    endpoint: String,
    http: reqwest::Client,
    state: WidgetState,
}

impl ChatWidget {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
            state: WidgetState::default(),
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    /// Runs one exchange. `on_update` is the render hook: it receives the
    /// newly decoded fragment and the full widget state after every
    /// applied chunk.
    pub async fn submit<F>(&mut self, raw: &str, mut on_update: F) -> SubmitOutcome
    where
        F: FnMut(&str, &WidgetState),
    {
        let message = raw.trim().to_string();
        if message.is_empty() {
            return SubmitOutcome::Ignored;
        }

        self.push_turn(Sender::User, &message);
        let placeholder = self.push_turn(Sender::Bot, "");
        self.state.status = STATUS_THINKING.to_string();
        self.state.thinking = true;

        let result = self
            .stream_reply(&message, placeholder, &mut on_update)
            .await;

        // Cleared on every exit path, success or not.
        self.state.thinking = false;

        match result {
            Ok(()) => {
                self.state.status = STATUS_READY.to_string();
                SubmitOutcome::Completed
            }
            Err(err) => {
                self.state.transcript[placeholder].text = APOLOGY.to_string();
                self.state.status = err.to_string();
                SubmitOutcome::Failed
            }
        }
    }

    async fn stream_reply<F>(
        &mut self,
        message: &str,
        placeholder: usize,
        on_update: &mut F,
    ) -> Result<(), WidgetError>
    where
        F: FnMut(&str, &WidgetState),
    {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WidgetError::Endpoint);
        }

        let mut chunks = response.bytes_stream();
        let mut decoder = Utf8StreamDecoder::new();
        let mut accumulated = String::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            let fragment = decoder.decode(&chunk);
            if fragment.is_empty() {
                continue;
            }
            accumulated.push_str(&fragment);
            self.state.transcript[placeholder].text = accumulated.clone();
            on_update(&fragment, &self.state);
        }

        let tail = decoder.flush();
        if !tail.is_empty() {
            accumulated.push_str(&tail);
            self.state.transcript[placeholder].text = accumulated;
            on_update(&tail, &self.state);
        }

        Ok(())
    }

    fn push_turn(&mut self, sender: Sender, text: &str) -> usize {
        self.state.transcript.push(ConversationTurn {
            sender,
            text: text.to_string(),
        });
        self.state.transcript.len() - 1
    }
}
