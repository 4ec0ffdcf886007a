//! Session state shared between the story processor and its collaborators.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Role of a conversation message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role/content record in the language model context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicked writer cannot leave a Vec half-pushed, so the data is still usable.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Conversation messages, owned by the context collaborators.
///
/// The story processor holds a handle but never writes to it.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Arc<Mutex<Vec<ChatMessage>>>,
}

impl Conversation {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages: Arc::new(Mutex::new(messages)),
        }
    }

    pub fn push(&self, message: ChatMessage) {
        lock(&self.messages).push(message);
    }

    /// Copy of the current messages.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        lock(&self.messages).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.messages).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Append-only list of story pages.
///
/// Clones share the same pages. Only the story processor appends, and it does so
/// before pushing the matching page frame.
#[derive(Debug, Clone, Default)]
pub struct Story {
    pages: Arc<Mutex<Vec<String>>>,
}

impl Story {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, page: String) {
        lock(&self.pages).push(page);
    }

    /// Copy of the pages written so far.
    pub fn pages(&self) -> Vec<String> {
        lock(&self.pages).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.pages).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pages joined into one text, separated by blank lines.
    pub fn text(&self) -> String {
        lock(&self.pages).join("\n\n")
    }
}
