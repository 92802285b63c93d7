//! Emotion classification adapter over the Hugging Face Inference API.
//!
//! The model is an external collaborator: this wrapper sends the text,
//! validates the typed score list, and returns the best-scoring label.
//! Callers must be prepared for `DudilError::Classification` and degrade to
//! the neutral profile rather than block the conversation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::config::DudilConfig;
use crate::emotion::{ClassificationResult, EmotionLabel};
use crate::error::DudilError;

const HF_INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Classifier inputs are clipped to this many characters before the call,
/// matching the model's usable sequence length.
const MAX_INPUT_CHARS: usize = 512;

/// Seam for the emotion classifier so the engine can run against fakes.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, DudilError>;

    /// Model identifier for logging.
    fn model_id(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct HfRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct HfScore {
    label: String,
    score: f32,
}

/// Hosted text-classification adapter.
pub struct HfEmotionClassifier {
    client: HttpClient,
    model: String,
    api_token: Option<String>,
}

impl HfEmotionClassifier {
    pub fn new(model: String, api_token: Option<String>) -> Self {
        Self {
            client: HttpClient::new(),
            model,
            api_token,
        }
    }

    pub fn from_config(config: &DudilConfig) -> Self {
        Self::new(config.emotion_model.clone(), config.hf_api_token.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", HF_INFERENCE_BASE_URL, self.model)
    }
}

#[async_trait]
impl EmotionClassifier for HfEmotionClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, DudilError> {
        // Blank input carries no signal; skip the network round-trip.
        if text.trim().is_empty() {
            return Ok(ClassificationResult::neutral(0.5));
        }

        let clipped: String = text.chars().take(MAX_INPUT_CHARS).collect();

        let mut request = self
            .client
            .post(self.endpoint())
            .json(&HfRequest { inputs: &clipped })
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DudilError::Classification(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DudilError::Classification(format!(
                "model endpoint returned {}: {}",
                status, body
            )));
        }

        // The API returns one score list per input; with return_all_scores
        // semantics that is [[{label, score}, ...]].
        let score_lists: Vec<Vec<HfScore>> = response
            .json()
            .await
            .map_err(|e| DudilError::Classification(format!("malformed response: {}", e)))?;

        let scores = score_lists
            .into_iter()
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DudilError::Classification("empty score list".into()))?;

        let best = scores
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| DudilError::Classification("empty score list".into()))?;

        Ok(ClassificationResult {
            label: EmotionLabel::from_raw(&best.label),
            confidence: best.score.clamp(0.0, 1.0),
        })
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
