//! Response generation seam.
//!
//! One trait, one hosted implementation. The engine only ever sees
//! `Responder`, so tests can swap in a deterministic fake.

pub mod gemini;

pub use gemini::GeminiResponder;

use async_trait::async_trait;

use crate::config::DudilConfig;
use crate::error::DudilError;

/// Sampling parameters forwarded to the generative API.
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 1024,
        }
    }
}

impl GenerationOptions {
    pub fn from_config(config: &DudilConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Unified trait for reply-generating backends.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce free text for a composed prompt. Single attempt; callers
    /// decide whether to layer retries on top.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, DudilError>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}
