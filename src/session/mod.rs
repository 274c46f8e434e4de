//! In-memory conversation state, keyed by session id.
//!
//! Sessions live for the process lifetime only; durable content goes through
//! the content store instead. All mutation happens under one `RwLock`, so
//! concurrent writers to the same session are serialized and whole-value
//! updates are last-write-wins.

use crate::agents::AgentContext;
use crate::error::{Result, SessionError};
use crate::router::ContentType;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One piece of generated output kept with the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContent {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything known about one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub context: AgentContext,
    #[serde(default)]
    pub generated_content: HashMap<ContentType, Vec<StoredContent>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    fn new(session_id: String) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            messages: Vec::new(),
            context: AgentContext::default(),
            generated_content: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Thread-safe in-memory session registry.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, ConversationState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a session snapshot, creating the session when absent. Passing
    /// `None` generates a fresh id.
    pub fn get_or_create(&self, session_id: Option<&str>) -> ConversationState {
        let id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut sessions = self.write();
        sessions
            .entry(id.clone())
            .or_insert_with(|| ConversationState::new(id))
            .clone()
    }

    pub fn get(&self, session_id: &str) -> Option<ConversationState> {
        self.read().get(session_id).cloned()
    }

    pub fn append_message(&self, session_id: &str, role: Role, content: &str) {
        let mut sessions = self.write();
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationState::new(session_id.to_string()));
        state.messages.push(Message::new(role, content));
        state.updated_at = Utc::now();
    }

    /// Last `limit` messages, most recent first. All messages when `limit`
    /// is None. Callers that need reading order use the chronological
    /// `messages` field of a session snapshot instead.
    pub fn history(&self, session_id: &str, limit: Option<usize>) -> Vec<Message> {
        self.read()
            .get(session_id)
            .map(|state| {
                let count = limit.unwrap_or(state.messages.len());
                state.messages.iter().rev().take(count).cloned().collect()
            })
            .unwrap_or_default()
    }

    pub fn store_content(&self, session_id: &str, content_type: ContentType, content: &str) {
        let mut sessions = self.write();
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationState::new(session_id.to_string()));
        state
            .generated_content
            .entry(content_type)
            .or_default()
            .push(StoredContent {
                content: content.to_string(),
                timestamp: Utc::now(),
            });
        state.updated_at = Utc::now();
    }

    pub fn latest_content(&self, session_id: &str, content_type: ContentType) -> Option<String> {
        self.read()
            .get(session_id)
            .and_then(|state| state.generated_content.get(&content_type))
            .and_then(|items| items.last())
            .map(|item| item.content.clone())
    }

    /// Replace the session's shared context. Racing callers are serialized by
    /// the lock; the last one wins.
    pub fn update_context(&self, session_id: &str, context: AgentContext) {
        let mut sessions = self.write();
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationState::new(session_id.to_string()));
        state.context = context;
        state.updated_at = Utc::now();
    }

    pub fn context(&self, session_id: &str) -> Option<AgentContext> {
        self.read().get(session_id).map(|state| state.context.clone())
    }

    pub fn delete(&self, session_id: &str) -> bool {
        self.write().remove(session_id).is_some()
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    /// Drop sessions idle for longer than `max_age`. Returns how many were
    /// removed.
    pub fn cleanup_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, state| state.updated_at >= cutoff);
        before - sessions.len()
    }

    /// Snapshot a session for export.
    pub fn export(&self, session_id: &str) -> Result<ConversationState> {
        self.get(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()).into())
    }

    /// Install an exported session, replacing any existing one with that id.
    /// Returns the session id.
    pub fn import(&self, state: ConversationState) -> String {
        let id = state.session_id.clone();
        self.write().insert(id.clone(), state);
        id
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ConversationState>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ConversationState>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}
