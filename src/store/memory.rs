// In-process backend, never fails

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::Result;
use super::model::StoreState;
use super::PostStore;

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn load(&self) -> Result<StoreState> {
        Ok(self.state.read().await.clone())
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        *self.state.write().await = state.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
