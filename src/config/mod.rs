// src/config/mod.rs
// All tunables load from the environment (.env supported); the API key is the
// only required value and its absence fails startup.

use std::str::FromStr;

use crate::error::DudilError;

#[derive(Debug, Clone)]
pub struct DudilConfig {
    // ── Gemini Configuration
    pub gemini_api_key: String,
    pub gemini_model: String,

    // ── Emotion Model Configuration
    pub emotion_model: String,
    pub hf_api_token: Option<String>,

    // ── Feature Toggles (accepted and carried; no-ops in this core)
    pub enable_voice_input: bool,
    pub enable_crisis_detection: bool,
    pub enable_mood_prediction: bool,

    // ── Storage Configuration
    pub history_file: String,
    pub upload_dir: String,
    pub export_dir: String,

    // ── Session Configuration
    pub session_timeout_secs: u64,
    pub max_sessions: usize,

    // ── Prompt Composition
    pub max_history_turns: usize,
    pub low_confidence_threshold: f32,

    // ── Generation Parameters
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,

    // ── Server Configuration
    pub host: String,
    pub port: u16,

    // ── Logging Configuration
    pub log_level: String,
}

/// Parse an environment variable, falling back to a default.
/// Values may carry trailing comments and whitespace in .env files.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            clean_val.parse::<T>().unwrap_or(default)
        }
        Err(_) => default,
    }
}

fn env_var_required(key: &str) -> Result<String, DudilError> {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(DudilError::Config(format!(
            "{} not set - it is required to reach the generative API",
            key
        ))),
    }
}

impl DudilConfig {
    /// Load configuration from the environment, reading .env first if present.
    ///
    /// Fails with `DudilError::Config` when `GEMINI_API_KEY` is missing;
    /// every other setting has a usable default.
    pub fn from_env() -> Result<Self, DudilError> {
        if dotenvy::dotenv().is_err() {
            tracing::debug!(".env file not found; using process environment only");
        }

        Ok(Self {
            gemini_api_key: env_var_required("GEMINI_API_KEY")?,
            gemini_model: env_var_or("GEMINI_MODEL", "gemini-2.0-flash".to_string()),
            emotion_model: env_var_or(
                "DISTILBERT_MODEL",
                "bhadresh-savani/distilbert-base-uncased-emotion".to_string(),
            ),
            hf_api_token: std::env::var("HF_API_TOKEN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            enable_voice_input: env_var_or("DUDIL_ENABLE_VOICE_INPUT", false),
            enable_crisis_detection: env_var_or("DUDIL_ENABLE_CRISIS_DETECTION", false),
            enable_mood_prediction: env_var_or("DUDIL_ENABLE_MOOD_PREDICTION", false),
            history_file: env_var_or("DUDIL_HISTORY_FILE", "chat_history.json".to_string()),
            upload_dir: env_var_or("DUDIL_UPLOAD_DIR", "data/uploads".to_string()),
            export_dir: env_var_or("DUDIL_EXPORT_DIR", "data/exports".to_string()),
            session_timeout_secs: env_var_or("DUDIL_SESSION_TIMEOUT_SECS", 3600),
            max_sessions: env_var_or("DUDIL_MAX_SESSIONS", 100),
            max_history_turns: env_var_or("DUDIL_MAX_HISTORY_TURNS", 6),
            low_confidence_threshold: env_var_or("DUDIL_LOW_CONFIDENCE_THRESHOLD", 0.4),
            temperature: env_var_or("DUDIL_TEMPERATURE", 0.7),
            top_p: env_var_or("DUDIL_TOP_P", 0.8),
            top_k: env_var_or("DUDIL_TOP_K", 40),
            max_output_tokens: env_var_or("DUDIL_MAX_OUTPUT_TOKENS", 1024),
            host: env_var_or("DUDIL_HOST", "127.0.0.1".to_string()),
            port: env_var_or("DUDIL_PORT", 8600),
            log_level: env_var_or("DUDIL_LOG_LEVEL", "info".to_string()),
        })
    }
}
