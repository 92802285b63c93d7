//! Error taxonomy for the chat engine.
//!
//! Only `Config` is allowed to terminate the process, and only at startup.
//! Everything else is caught at the boundary nearest its cause and converted
//! into a degraded-but-functional outcome: classification failures fall back
//! to the neutral profile, generation failures surface an apology without
//! appending the turn, and a corrupt store is quarantined and restarted empty.

/// Error types for the dudil engine
#[derive(Debug, thiserror::Error)]
pub enum DudilError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Emotion classification failed: {0}")]
    Classification(String),

    #[error("Response generation failed: {0}")]
    Generation(String),

    #[error("Conversation history is corrupt: {0}")]
    StorageCorruption(String),

    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Unknown emotion label: {0}")]
    UnknownEmotion(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DudilError {
    /// True for errors the engine is expected to absorb mid-turn rather
    /// than propagate to the process boundary.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DudilError::Config(_))
    }
}
