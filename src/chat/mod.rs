//! Conversation engine.
//!
//! One turn of the data flow: classify the user text, look up the emotion
//! profile, compose the prompt against stored history, call the responder,
//! and append both sides of the exchange. Classification failure degrades
//! to the neutral profile; generation failure propagates without appending
//! anything, so a failed turn leaves no trace in the log.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DudilConfig;
use crate::emotion::classifier::{EmotionClassifier, HfEmotionClassifier};
use crate::emotion::{profile_for, ClassificationResult, EmotionLabel};
use crate::error::DudilError;
use crate::llm::{GeminiResponder, GenerationOptions, Responder};
use crate::prompt::PromptComposer;
use crate::store::{ConversationStore, Turn};

/// Shown to the user when the responder fails; the turn is not recorded.
pub const GENERATION_APOLOGY: &str =
    "I'm having trouble responding right now. Please try again.";

/// What the presentation layer renders after a successful turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub conversation_id: String,
    pub reply: String,
    pub emotion: EmotionLabel,
    pub confidence: f32,
    pub intensity: u8,
}

pub struct ChatEngine {
    classifier: Arc<dyn EmotionClassifier>,
    responder: Arc<dyn Responder>,
    composer: PromptComposer,
    options: GenerationOptions,
}

impl ChatEngine {
    pub fn new(
        classifier: Arc<dyn EmotionClassifier>,
        responder: Arc<dyn Responder>,
        composer: PromptComposer,
        options: GenerationOptions,
    ) -> Self {
        Self {
            classifier,
            responder,
            composer,
            options,
        }
    }

    /// Wire up the production collaborators from config.
    pub fn from_config(config: &DudilConfig) -> Self {
        Self::new(
            Arc::new(HfEmotionClassifier::from_config(config)),
            Arc::new(GeminiResponder::from_config(config)),
            PromptComposer::with_defaults(
                config.max_history_turns,
                config.low_confidence_threshold,
            ),
            GenerationOptions::from_config(config),
        )
    }

    /// Run one full turn against an existing conversation.
    ///
    /// On success the store gains exactly two turns (user + assistant). On
    /// `Generation` failure nothing is appended and the error propagates for
    /// the boundary to render an apology.
    pub async fn respond(
        &self,
        store: &mut ConversationStore,
        conversation_id: &str,
        user_text: &str,
    ) -> Result<ChatOutcome, DudilError> {
        let history = store
            .get(conversation_id)
            .ok_or_else(|| DudilError::NotFound(conversation_id.to_string()))?
            .turns
            .clone();

        let classification = self.classify_degraded(user_text).await;
        let profile = profile_for(classification.label);

        let prompt = self
            .composer
            .compose(user_text, &classification, profile, &history);
        debug!(
            emotion = %classification.label,
            confidence = classification.confidence,
            prompt_chars = prompt.len(),
            "composed prompt"
        );

        let reply = self.responder.generate(&prompt, &self.options).await?;

        store.append(conversation_id, Turn::user(user_text, classification))?;
        store.append(conversation_id, Turn::assistant(reply.clone()))?;

        Ok(ChatOutcome {
            conversation_id: conversation_id.to_string(),
            reply,
            emotion: classification.label,
            confidence: classification.confidence,
            intensity: profile.intensity,
        })
    }

    /// Classify, degrading to the neutral profile when the model is
    /// unavailable. The conversation proceeds either way.
    async fn classify_degraded(&self, user_text: &str) -> ClassificationResult {
        match self.classifier.classify(user_text).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    model = self.classifier.model_id(),
                    error = %e,
                    "emotion classification failed; continuing with neutral profile"
                );
                ClassificationResult::neutral(0.0)
            }
        }
    }
}
