//! Prompt composition.
//!
//! Turns one classified user message plus recent history into the single
//! prompt string sent to the responder. Pure: identical inputs always
//! produce byte-identical output, so prompts are reproducible from the
//! persisted conversation log.

pub mod persona;

pub use persona::{DEFAULT_PERSONA_PROMPT, LOW_CONFIDENCE_DIRECTIVE};

use crate::emotion::{ClassificationResult, EmotionProfile};
use crate::store::{Speaker, Turn};

/// History turns are clipped to this many characters inside the prompt to
/// bound prompt size independently of the turn window.
const HISTORY_TURN_CLIP_CHARS: usize = 150;

/// Deterministic prompt builder. Construct once from config and reuse.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    persona: String,
    max_history_turns: usize,
    low_confidence_threshold: f32,
}

impl PromptComposer {
    pub fn new(persona: impl Into<String>, max_history_turns: usize, low_confidence_threshold: f32) -> Self {
        Self {
            persona: persona.into(),
            max_history_turns,
            low_confidence_threshold,
        }
    }

    pub fn with_defaults(max_history_turns: usize, low_confidence_threshold: f32) -> Self {
        Self::new(DEFAULT_PERSONA_PROMPT, max_history_turns, low_confidence_threshold)
    }

    pub fn max_history_turns(&self) -> usize {
        self.max_history_turns
    }

    /// Build the full prompt for one turn.
    ///
    /// Sections, in order: persona, emotion analysis block (label, intensity,
    /// confidence as a percentage), optional low-confidence hedge, the last
    /// `max_history_turns` history turns oldest-first, then the new user text.
    pub fn compose(
        &self,
        user_text: &str,
        classification: &ClassificationResult,
        profile: &EmotionProfile,
        history: &[Turn],
    ) -> String {
        let mut prompt = String::with_capacity(1024);

        prompt.push_str(&self.persona);
        prompt.push_str("\n\nEmotion analysis of the user's current message:\n");
        prompt.push_str(&format!("- Detected emotion: {}\n", classification.label));
        prompt.push_str(&format!("- Intensity: {}/5\n", profile.intensity));
        prompt.push_str(&format!(
            "- Confidence: {:.1}%\n",
            classification.confidence * 100.0
        ));
        prompt.push_str(&format!("- Suggested tone: {}\n", profile.tone_directive));

        if classification.confidence < self.low_confidence_threshold {
            prompt.push('\n');
            prompt.push_str(LOW_CONFIDENCE_DIRECTIVE);
            prompt.push('\n');
        }

        let window = self.window(history);
        if !window.is_empty() {
            prompt.push_str("\nRecent conversation context:\n");
            for turn in window {
                let speaker = match turn.speaker {
                    Speaker::User => "User",
                    Speaker::Assistant => "Assistant",
                };
                prompt.push_str(&format!("{}: {}\n", speaker, clip(&turn.text)));
            }
        }

        prompt.push_str(&format!("\nUser's current message: {}\n\nYour response:", user_text));
        prompt
    }

    /// Last `max_history_turns` turns, oldest first.
    fn window<'a>(&self, history: &'a [Turn]) -> &'a [Turn] {
        let start = history.len().saturating_sub(self.max_history_turns);
        &history[start..]
    }
}

fn clip(text: &str) -> String {
    if text.chars().count() > HISTORY_TURN_CLIP_CHARS {
        let clipped: String = text.chars().take(HISTORY_TURN_CLIP_CHARS).collect();
        format!("{}...", clipped)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{profile_for, EmotionLabel};
    use chrono::Utc;

    fn turn(speaker: Speaker, text: &str) -> Turn {
        Turn {
            speaker,
            text: text.to_string(),
            emotion: None,
            timestamp: Utc::now(),
        }
    }

    fn joyful(confidence: f32) -> ClassificationResult {
        ClassificationResult {
            label: EmotionLabel::Joy,
            confidence,
        }
    }

    #[test]
    fn history_window_keeps_exactly_the_most_recent_turns() {
        let composer = PromptComposer::with_defaults(3, 0.4);
        let history: Vec<Turn> = (0..8)
            .map(|i| turn(Speaker::User, &format!("message-{i}")))
            .collect();

        let prompt = composer.compose(
            "hello",
            &joyful(0.9),
            profile_for(EmotionLabel::Joy),
            &history,
        );

        for i in 5..8 {
            assert!(prompt.contains(&format!("message-{i}")), "missing turn {i}");
        }
        for i in 0..5 {
            assert!(!prompt.contains(&format!("message-{i}")), "stale turn {i} leaked in");
        }
        // Oldest of the window comes first.
        let pos5 = prompt.find("message-5").unwrap();
        let pos7 = prompt.find("message-7").unwrap();
        assert!(pos5 < pos7);
    }

    #[test]
    fn composition_is_pure() {
        let composer = PromptComposer::with_defaults(6, 0.4);
        let history = vec![
            turn(Speaker::User, "hi"),
            turn(Speaker::Assistant, "hello there"),
        ];
        let classification = joyful(0.62);
        let profile = profile_for(EmotionLabel::Joy);

        let a = composer.compose("how are you?", &classification, profile, &history);
        let b = composer.compose("how are you?", &classification, profile, &history);
        assert_eq!(a, b);
    }

    #[test]
    fn prompt_embeds_label_intensity_and_percent_confidence() {
        let composer = PromptComposer::with_defaults(6, 0.4);
        let prompt = composer.compose(
            "I just got promoted!",
            &joyful(0.62),
            profile_for(EmotionLabel::Joy),
            &[],
        );
        assert!(prompt.contains("joy"));
        assert!(prompt.contains("5/5"));
        assert!(prompt.contains("62.0%"));
        assert!(prompt.contains("I just got promoted!"));
        assert!(!prompt.contains("LOW CONFIDENCE"));
    }

    #[test]
    fn low_confidence_appends_hedging_directive() {
        let composer = PromptComposer::with_defaults(6, 0.4);
        let prompt = composer.compose(
            "fine.",
            &joyful(0.2),
            profile_for(EmotionLabel::Joy),
            &[],
        );
        assert!(prompt.contains("LOW CONFIDENCE"));
    }

    #[test]
    fn long_history_turns_are_clipped() {
        let composer = PromptComposer::with_defaults(6, 0.4);
        let long_text = "x".repeat(400);
        let history = vec![turn(Speaker::User, &long_text)];
        let prompt = composer.compose("ok", &joyful(0.9), profile_for(EmotionLabel::Joy), &history);
        assert!(prompt.contains(&format!("{}...", "x".repeat(150))));
        assert!(!prompt.contains(&"x".repeat(200)));
    }
}
