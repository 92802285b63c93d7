// src/emotion/mod.rs
// Emotion label set and the static profile table.
// The label set is fixed by the classifier's output space; profiles are
// loaded once and read-only after that.

pub mod classifier;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::DudilError;

/// Categorical output space of the emotion classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Joy,
    Love,
    Surprise,
    Anger,
    Fear,
    Sadness,
    Neutral,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Joy,
        EmotionLabel::Love,
        EmotionLabel::Surprise,
        EmotionLabel::Anger,
        EmotionLabel::Fear,
        EmotionLabel::Sadness,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Joy => "joy",
            EmotionLabel::Love => "love",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Anger => "anger",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Sadness => "sadness",
            EmotionLabel::Neutral => "neutral",
        }
    }

    /// Lenient parse for raw classifier output: a label outside the table
    /// degrades to `Neutral` instead of failing the turn.
    pub fn from_raw(raw: &str) -> EmotionLabel {
        raw.parse::<EmotionLabel>().unwrap_or_else(|_| {
            tracing::warn!(
                label = raw,
                "classifier returned an unknown emotion label; treating as neutral"
            );
            EmotionLabel::Neutral
        })
    }

    /// Emoji shown next to the label in terminal output.
    pub fn emoji(&self) -> &'static str {
        match self {
            EmotionLabel::Joy => "😊",
            EmotionLabel::Love => "😍",
            EmotionLabel::Surprise => "😮",
            EmotionLabel::Anger => "😠",
            EmotionLabel::Fear => "😨",
            EmotionLabel::Sadness => "😢",
            EmotionLabel::Neutral => "😐",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EmotionLabel {
    type Err = DudilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "joy" => Ok(EmotionLabel::Joy),
            "love" => Ok(EmotionLabel::Love),
            "surprise" => Ok(EmotionLabel::Surprise),
            "anger" => Ok(EmotionLabel::Anger),
            "fear" => Ok(EmotionLabel::Fear),
            "sadness" => Ok(EmotionLabel::Sadness),
            "neutral" => Ok(EmotionLabel::Neutral),
            other => Err(DudilError::UnknownEmotion(other.to_string())),
        }
    }
}

/// One classifier verdict for one user message.
///
/// Persisted only as the annotation on the user turn it describes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: EmotionLabel,
    /// Classifier score in [0, 1].
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn neutral(confidence: f32) -> Self {
        Self {
            label: EmotionLabel::Neutral,
            confidence,
        }
    }
}

/// Static per-label profile: how strongly the emotion reads and how the
/// responder should meet it.
#[derive(Debug, Clone, Serialize)]
pub struct EmotionProfile {
    pub label: EmotionLabel,
    /// Strength rating, 1 (muted) to 5 (overwhelming).
    pub intensity: u8,
    pub description: &'static str,
    pub tone_directive: &'static str,
}

static PROFILES: Lazy<Vec<EmotionProfile>> = Lazy::new(|| {
    vec![
        EmotionProfile {
            label: EmotionLabel::Joy,
            intensity: 5,
            description: "delight, excitement, or contentment",
            tone_directive: "Be enthusiastic and share their positive feelings",
        },
        EmotionProfile {
            label: EmotionLabel::Love,
            intensity: 5,
            description: "affection, warmth, or deep attachment",
            tone_directive: "Be warm and supportive of their affection",
        },
        EmotionProfile {
            label: EmotionLabel::Surprise,
            intensity: 4,
            description: "astonishment at something unexpected",
            tone_directive: "Be engaging and explore their reaction",
        },
        EmotionProfile {
            label: EmotionLabel::Anger,
            intensity: 2,
            description: "frustration, irritation, or outrage",
            tone_directive: "Be calm, understanding, and help them process feelings",
        },
        EmotionProfile {
            label: EmotionLabel::Fear,
            intensity: 2,
            description: "worry, anxiety, or dread",
            tone_directive: "Be reassuring and help alleviate concerns",
        },
        EmotionProfile {
            label: EmotionLabel::Sadness,
            intensity: 1,
            description: "grief, disappointment, or low mood",
            tone_directive: "Be empathetic, comforting, and supportive",
        },
        EmotionProfile {
            label: EmotionLabel::Neutral,
            intensity: 3,
            description: "no strong emotional signal",
            tone_directive: "Be balanced, attentive, and conversational",
        },
    ]
});

/// Profile lookup, total over the enum.
pub fn profile_for(label: EmotionLabel) -> &'static EmotionProfile {
    PROFILES
        .iter()
        .find(|p| p.label == label)
        .unwrap_or_else(|| &PROFILES[PROFILES.len() - 1])
}
