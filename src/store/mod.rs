//! Durable conversation log.
//!
//! The whole index lives in one human-inspectable JSON document mapping
//! conversation id to conversation record. It is loaded wholesale at startup
//! and rewritten through an atomic temp-file-and-rename on every mutation,
//! so a crash mid-write never leaves a half-written index behind. If the
//! file on disk fails to parse anyway (external edits, partial copies), it
//! is quarantined to a timestamped backup and the store restarts empty —
//! losing history beats refusing to start.
//!
//! Not safe for concurrent multi-process mutation; in-process callers
//! serialize writes through a `Mutex` at the presentation layer.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::emotion::ClassificationResult;
use crate::error::DudilError;

/// Conversation titles are clipped from the first user message to this
/// many characters.
const TITLE_CLIP_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One message in a conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    /// Present on user turns only; the classifier verdict for this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<ClassificationResult>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>, emotion: ClassificationResult) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            emotion: Some(emotion),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            emotion: None,
            timestamp: Utc::now(),
        }
    }
}

/// One conversation thread. Mutated only by appending turns; never edited
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    #[serde(default)]
    pub turns: Vec<Turn>,
}

/// Listing row for the sidebar: everything needed to render a thread entry
/// without loading its turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub turn_count: usize,
}

/// File-backed conversation index.
pub struct ConversationStore {
    path: PathBuf,
    index: HashMap<String, Conversation>,
}

impl ConversationStore {
    /// Load the persisted index, or start empty when the file is absent.
    ///
    /// A file that exists but fails to parse is renamed to a timestamped
    /// `.corrupt-…` sibling so nothing is silently destroyed, and the store
    /// starts empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DudilError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Ok(Self {
                path,
                index: HashMap::new(),
            });
        }

        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str::<HashMap<String, Conversation>>(&raw) {
            Ok(index) => {
                info!(conversations = index.len(), path = %path.display(), "loaded conversation history");
                Ok(Self { path, index })
            }
            Err(parse_err) => {
                let backup = Self::quarantine(&path, &parse_err)?;
                warn!(
                    error = %parse_err,
                    backup = %backup.display(),
                    "conversation history was corrupt; backed it up and starting empty"
                );
                Ok(Self {
                    path,
                    index: HashMap::new(),
                })
            }
        }
    }

    fn quarantine(path: &Path, parse_err: &serde_json::Error) -> Result<PathBuf, DudilError> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let backup = path.with_extension(format!("corrupt-{}.json", stamp));
        fs::rename(path, &backup).map_err(|rename_err| {
            DudilError::StorageCorruption(format!(
                "history failed to parse ({}) and could not be quarantined: {}",
                parse_err, rename_err
            ))
        })?;
        Ok(backup)
    }

    /// Create a fresh, empty conversation and persist it.
    pub fn create(&mut self) -> Result<String, DudilError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.index.insert(
            id.clone(),
            Conversation {
                id: id.clone(),
                title: "New Chat".to_string(),
                created_at: now,
                last_active_at: now,
                turns: Vec::new(),
            },
        );
        self.persist()?;
        Ok(id)
    }

    /// Append one turn and persist before returning.
    ///
    /// Turn timestamps within a conversation are kept monotonic: a turn
    /// stamped earlier than its predecessor is clamped up to the
    /// predecessor's timestamp.
    pub fn append(&mut self, id: &str, mut turn: Turn) -> Result<(), DudilError> {
        let conversation = self
            .index
            .get_mut(id)
            .ok_or_else(|| DudilError::NotFound(id.to_string()))?;

        if let Some(last) = conversation.turns.last() {
            if turn.timestamp < last.timestamp {
                turn.timestamp = last.timestamp;
            }
        }

        if conversation.turns.is_empty() && turn.speaker == Speaker::User {
            conversation.title = clip_title(&turn.text);
        }

        conversation.last_active_at = turn.timestamp.max(Utc::now());
        conversation.turns.push(turn);
        self.persist()
    }

    /// All conversations, most recently active first.
    pub fn list(&self) -> Vec<ConversationSummary> {
        let mut summaries: Vec<ConversationSummary> = self
            .index
            .values()
            .map(|c| ConversationSummary {
                id: c.id.clone(),
                title: c.title.clone(),
                created_at: c.created_at,
                last_active_at: c.last_active_at,
                turn_count: c.turns.len(),
            })
            .collect();
        summaries.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        summaries
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.index.get(id)
    }

    /// Delete a conversation. Idempotent: an unknown id is a no-op, matching
    /// delete-button semantics in the UI.
    pub fn delete(&mut self, id: &str) -> Result<(), DudilError> {
        if self.index.remove(id).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Rewrite the whole index atomically: write a temp file in the same
    /// directory, then rename it over the live file.
    fn persist(&self) -> Result<(), DudilError> {
        let json = serde_json::to_string_pretty(&self.index)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn clip_title(text: &str) -> String {
    if text.chars().count() > TITLE_CLIP_CHARS {
        let clipped: String = text.chars().take(TITLE_CLIP_CHARS).collect();
        format!("{}...", clipped)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionLabel;

    fn joy(confidence: f32) -> ClassificationResult {
        ClassificationResult {
            label: EmotionLabel::Joy,
            confidence,
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> ConversationStore {
        ConversationStore::load(dir.path().join("chat_history.json")).unwrap()
    }

    #[test]
    fn append_then_reload_round_trips_the_turn_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_history.json");

        let mut store = ConversationStore::load(&path).unwrap();
        let id = store.create().unwrap();
        store.append(&id, Turn::user("I just got promoted!", joy(0.91))).unwrap();
        store.append(&id, Turn::assistant("Congratulations!")).unwrap();
        drop(store);

        // Simulated restart.
        let reloaded = ConversationStore::load(&path).unwrap();
        let conversation = reloaded.get(&id).unwrap();
        assert_eq!(conversation.turns.len(), 2);
        assert_eq!(conversation.turns[0].speaker, Speaker::User);
        assert_eq!(conversation.turns[0].text, "I just got promoted!");
        assert_eq!(conversation.turns[0].emotion.unwrap().label, EmotionLabel::Joy);
        assert_eq!(conversation.turns[1].speaker, Speaker::Assistant);
        assert!(conversation.turns[0].timestamp <= conversation.turns[1].timestamp);
    }

    #[test]
    fn append_to_missing_conversation_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let err = store
            .append("no-such-id", Turn::assistant("hello"))
            .unwrap_err();
        assert!(matches!(err, DudilError::NotFound(_)));
    }

    #[test]
    fn delete_unknown_id_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let id = store.create().unwrap();

        store.delete("no-such-id").unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(&id).is_some());

        store.delete(&id).unwrap();
        store.delete(&id).unwrap(); // second delete is fine too
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_is_quarantined_and_store_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_history.json");
        fs::write(&path, "{ this is not json").unwrap();

        let store = ConversationStore::load(&path).unwrap();
        assert!(store.is_empty());

        // Original bytes survive under a backup name.
        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("corrupt"))
            .collect();
        assert_eq!(backups.len(), 1);
        let saved = fs::read_to_string(backups[0].path()).unwrap();
        assert_eq!(saved, "{ this is not json");

        // And the store is immediately usable.
        let mut store = store;
        let id = store.create().unwrap();
        store.append(&id, Turn::user("hi", joy(0.5))).unwrap();
    }

    #[test]
    fn list_orders_by_last_active_descending() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let first = store.create().unwrap();
        let second = store.create().unwrap();
        store.append(&first, Turn::user("older thread", joy(0.8))).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.append(&second, Turn::user("newer thread", joy(0.8))).unwrap();

        let summaries = store.list();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, second);
        assert_eq!(summaries[1].id, first);
        assert_eq!(summaries[0].turn_count, 1);
    }

    #[test]
    fn title_comes_from_first_user_turn_clipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let id = store.create().unwrap();
        store
            .append(&id, Turn::user("a".repeat(60), joy(0.7)))
            .unwrap();
        let title = &store.get(&id).unwrap().title;
        assert_eq!(title, &format!("{}...", "a".repeat(30)));
    }

    #[test]
    fn unknown_fields_in_persisted_state_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_history.json");
        let json = r#"{
            "abc": {
                "id": "abc",
                "title": "hello",
                "created_at": "2025-01-01T00:00:00Z",
                "last_active_at": "2025-01-01T00:00:00Z",
                "turns": [
                    {
                        "speaker": "user",
                        "text": "hello",
                        "emotion": {"label": "joy", "confidence": 0.9},
                        "timestamp": "2025-01-01T00:00:00Z",
                        "some_future_field": 42
                    }
                ],
                "another_future_field": "ignored"
            }
        }"#;
        fs::write(&path, json).unwrap();

        let store = ConversationStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("abc").unwrap().turns.len(), 1);
    }

    #[test]
    fn out_of_order_timestamp_is_clamped_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let id = store.create().unwrap();

        store.append(&id, Turn::user("first", joy(0.9))).unwrap();
        let mut stale = Turn::assistant("second");
        stale.timestamp = Utc::now() - chrono::Duration::hours(1);
        store.append(&id, stale).unwrap();

        let turns = &store.get(&id).unwrap().turns;
        assert!(turns[1].timestamp >= turns[0].timestamp);
    }
}
