//! Post operations
//!
//! Every mutating operation is a full load, mutate, persist cycle against the
//! store, built on `load_for_update` so a degraded read is never written
//! back. There is no lock across the cycle, so two overlapping cycles can
//! lose an update: the later `persist` overwrites the earlier one.

use serde_json::Value;

use super::error::ApiError;
use super::types::EmotionStats;
use crate::store::{Emotion, Post, PostStore};

/// Upper bound on stored text, counted in characters
pub const MAX_TEXT_CHARS: usize = 280;

/// Validated input of a create operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub text: String,
    pub emotion: Emotion,
}

impl NewPost {
    /// Validate a decoded request body.
    ///
    /// `text` must be a string with at least one non-whitespace character.
    /// `emotion` falls back to `neutral` when absent or unknown.
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let raw = body
            .get("text")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ApiError::TextRequired)?;

        let text = sanitize_text(raw);
        if text.is_empty() {
            return Err(ApiError::TextTooShort);
        }

        Ok(Self {
            text,
            emotion: Emotion::from_json(body.get("emotion")),
        })
    }
}

/// Trim, then cut to `MAX_TEXT_CHARS` characters.
///
/// The cut can land right after inner whitespace, so the tail is trimmed again.
pub fn sanitize_text(raw: &str) -> String {
    let truncated: String = raw.trim().chars().take(MAX_TEXT_CHARS).collect();
    truncated.trim_end().to_string()
}

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Path segment to post id. Anything unparsable matches no post.
pub fn parse_id(segment: &str) -> Option<u64> {
    segment.parse().ok()
}

/// All posts, newest first. Ties keep store order.
pub async fn list_posts(store: &dyn PostStore) -> Result<Vec<Post>, ApiError> {
    let mut posts = store.load().await?.posts;
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(posts)
}

pub async fn create_post(store: &dyn PostStore, input: NewPost) -> Result<Post, ApiError> {
    let mut state = store.load_for_update().await?;
    let post = Post {
        id: state.allocate_id(),
        text: input.text,
        emotion: input.emotion,
        likes: 0,
        created_at: now_millis(),
    };
    state.posts.push(post.clone());
    store.persist(&state).await?;
    Ok(post)
}

/// Increment `likes` by one. A missing post is reported without persisting.
pub async fn like_post(store: &dyn PostStore, id: u64) -> Result<Post, ApiError> {
    let mut state = store.load_for_update().await?;
    let post = state.find_mut(id).ok_or(ApiError::PostNotFound)?;
    post.likes += 1;
    let updated = post.clone();
    store.persist(&state).await?;
    Ok(updated)
}

pub async fn delete_post(store: &dyn PostStore, id: u64) -> Result<Post, ApiError> {
    let mut state = store.load_for_update().await?;
    let removed = state.remove(id).ok_or(ApiError::PostNotFound)?;
    store.persist(&state).await?;
    Ok(removed)
}

/// Count posts per emotion. Emotions without posts are left out.
pub async fn emotion_stats(store: &dyn PostStore) -> Result<EmotionStats, ApiError> {
    let state = store.load().await?;
    let mut stats = EmotionStats::new();
    for post in &state.posts {
        *stats.entry(post.emotion).or_insert(0) += 1;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JsonFileStore, MemoryStore, StoreError, StoreState};
    use serde_json::json;

    fn post(id: u64, created_at: i64, emotion: Emotion) -> Post {
        Post {
            id,
            text: format!("post {id}"),
            emotion,
            likes: 0,
            created_at,
        }
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  hello  "), "hello");
        assert_eq!(sanitize_text(&"a".repeat(300)).chars().count(), MAX_TEXT_CHARS);

        // Multi-byte characters count as one each
        let long = "é".repeat(300);
        assert_eq!(sanitize_text(&long).chars().count(), MAX_TEXT_CHARS);

        // Whitespace at the cut point is not kept
        let padded = format!("{} tail", "x".repeat(MAX_TEXT_CHARS - 1));
        assert_eq!(sanitize_text(&padded), "x".repeat(MAX_TEXT_CHARS - 1));
    }

    #[test]
    fn test_new_post_validation() {
        assert!(matches!(
            NewPost::from_json(&json!({})),
            Err(ApiError::TextRequired)
        ));
        assert!(matches!(
            NewPost::from_json(&json!({"text": 42})),
            Err(ApiError::TextRequired)
        ));
        assert!(matches!(
            NewPost::from_json(&json!({"text": "   \n\t"})),
            Err(ApiError::TextRequired)
        ));
        assert!(matches!(
            NewPost::from_json(&json!(["text"])),
            Err(ApiError::TextRequired)
        ));

        let ok = NewPost::from_json(&json!({"text": " hi ", "emotion": "sad"})).unwrap();
        assert_eq!(ok.text, "hi");
        assert_eq!(ok.emotion, Emotion::Sad);

        let fallback = NewPost::from_json(&json!({"text": "hi", "emotion": "Ecstatic"})).unwrap();
        assert_eq!(fallback.emotion, Emotion::Neutral);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("7"), Some(7));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id(""), None);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryStore::with_state(StoreState {
            posts: vec![
                post(1, 100, Emotion::Happy),
                post(2, 300, Emotion::Sad),
                post(3, 200, Emotion::Happy),
            ],
            next_id: 4,
        });

        let ids: Vec<u64> = list_posts(&store).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_like_counts_and_missing_post() {
        let store = MemoryStore::new();
        let created = create_post(
            &store,
            NewPost {
                text: "hello".to_string(),
                emotion: Emotion::Happy,
            },
        )
        .await
        .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.likes, 0);

        for _ in 0..3 {
            like_post(&store, created.id).await.unwrap();
        }
        assert_eq!(store.load().await.unwrap().posts[0].likes, 3);

        assert!(matches!(
            like_post(&store, 99).await,
            Err(ApiError::PostNotFound)
        ));
        assert_eq!(store.load().await.unwrap().posts.len(), 1);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = MemoryStore::new();
        let input = NewPost {
            text: "x".to_string(),
            emotion: Emotion::Neutral,
        };

        let first = create_post(&store, input.clone()).await.unwrap();
        let second = create_post(&store, input.clone()).await.unwrap();
        delete_post(&store, second.id).await.unwrap();
        let third = create_post(&store, input).await.unwrap();

        assert_eq!((first.id, second.id, third.id), (1, 2, 3));
        assert!(matches!(
            delete_post(&store, second.id).await,
            Err(ApiError::PostNotFound)
        ));
    }

    #[tokio::test]
    async fn test_emotion_stats_omit_empty_labels() {
        let store = MemoryStore::with_state(StoreState {
            posts: vec![
                post(1, 1, Emotion::Happy),
                post(2, 2, Emotion::Sad),
                post(3, 3, Emotion::Happy),
            ],
            next_id: 4,
        });

        let stats = emotion_stats(&store).await.unwrap();
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({"happy": 2, "sad": 1})
        );
    }

    fn note(text: &str, emotion: Emotion) -> NewPost {
        NewPost {
            text: text.to_string(),
            emotion,
        }
    }

    #[tokio::test]
    async fn test_mutations_refuse_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        create_post(&store, note("one", Emotion::Happy)).await.unwrap();
        create_post(&store, note("two", Emotion::Sad)).await.unwrap();

        let truncated = r#"{"posts":[{"id":1,"#;
        std::fs::write(&path, truncated).unwrap();

        for result in [
            create_post(&store, note("three", Emotion::Angry)).await,
            like_post(&store, 1).await,
            delete_post(&store, 2).await,
        ] {
            assert!(matches!(
                result,
                Err(ApiError::Storage(StoreError::Decode { .. }))
            ));
        }
        // The document was not overwritten with an empty store
        assert_eq!(std::fs::read_to_string(&path).unwrap(), truncated);
    }

    #[tokio::test]
    async fn test_unknown_stored_label_keeps_ids_unique() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        create_post(&store, note("one", Emotion::Happy)).await.unwrap();
        create_post(&store, note("two", Emotion::Happy)).await.unwrap();

        let edited = std::fs::read_to_string(&path)
            .unwrap()
            .replacen("\"happy\"", "\"joy\"", 1);
        std::fs::write(&path, edited).unwrap();

        let third = create_post(&store, note("three", Emotion::Sad)).await.unwrap();
        assert_eq!(third.id, 3);

        let ids: Vec<u64> = store.load().await.unwrap().posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
