//! Persisted data model
//!
//! `Post`, `Emotion` and the whole-store document `StoreState`. Field names
//! are camelCase both on disk and on the wire.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fixed set of mood labels a post can carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprised,
    #[default]
    Neutral,
}

impl Emotion {
    pub const ALL: [Self; 5] = [
        Self::Happy,
        Self::Sad,
        Self::Angry,
        Self::Surprised,
        Self::Neutral,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Surprised => "surprised",
            Self::Neutral => "neutral",
        }
    }

    /// Exact, case-sensitive match against the label set
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == label)
    }

    /// Anything that is not a known label becomes `Neutral`
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        value
            .and_then(serde_json::Value::as_str)
            .and_then(Self::parse)
            .unwrap_or_default()
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored labels outside the set load as `Neutral` instead of failing the
/// whole document.
impl<'de> Deserialize<'de> for Emotion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_json(Some(&value)))
    }
}

/// A single user-submitted entry
///
/// Only `id` is mandatory when decoding; other missing fields take their
/// zero value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub emotion: Emotion,
    #[serde(default)]
    pub likes: u64,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub created_at: i64,
}

/// The whole persisted document: `{ "posts": [...], "nextId": n }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default = "first_id")]
    pub next_id: u64,
}

const fn first_id() -> u64 {
    1
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            next_id: first_id(),
        }
    }
}

impl StoreState {
    /// Hand out the next id. Ids are never reused, even after deletion.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Restore `next_id > max(id)` for documents edited outside the service.
    /// Returns true when a repair was needed.
    pub fn repair_next_id(&mut self) -> bool {
        let floor = self
            .posts
            .iter()
            .map(|p| p.id)
            .max()
            .map_or(first_id(), |max| max + 1);
        if self.next_id < floor {
            self.next_id = floor;
            true
        } else {
            false
        }
    }

    pub fn find_mut(&mut self, id: u64) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == id)
    }

    pub fn remove(&mut self, id: u64) -> Option<Post> {
        let idx = self.posts.iter().position(|p| p.id == id)?;
        Some(self.posts.remove(idx))
    }
}
