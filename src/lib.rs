// src/lib.rs

pub mod chat;
pub mod config;
pub mod emotion;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod server;
pub mod store;

pub use chat::{ChatEngine, ChatOutcome};
pub use config::DudilConfig;
pub use error::DudilError;
