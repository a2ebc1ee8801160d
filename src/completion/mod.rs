//! Text completion backends.
//!
//! A [`TextCompletion`] turns a fully rendered prompt into generated text.
//! The kernel holds backends as `Arc<dyn TextCompletion>` keyed by service id,
//! so tests and alternative providers plug in at this seam.

mod openai;

pub use openai::{OpenAiTextCompletion, OpenAiTextCompletionBuilder};

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling settings sent with every completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteRequestSettings {
    pub temperature: f64,
    pub top_p: f64,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

impl Default for CompleteRequestSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            max_tokens: 256,
            stop_sequences: Vec::new(),
        }
    }
}

impl CompleteRequestSettings {
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn stop_sequence(mut self, stop: impl Into<String>) -> Self {
        self.stop_sequences.push(stop.into());
        self
    }
}

#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Complete `prompt` and return the generated text.
    async fn complete(&self, prompt: &str, settings: &CompleteRequestSettings) -> Result<String>;
}
