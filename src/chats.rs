//! Per-chat serialization of state updates.
//!
//! Message handlers and the delayed feedback step both change a chat's
//! dialogue. Each change reads the stored state, applies one event and writes
//! the result back while holding that chat's lock, so a step scheduled earlier
//! always sees what the user did in the meantime.

use std::collections::HashMap;
use std::sync::Arc;

use teloxide::dispatching::dialogue::{Dialogue, ErasedStorage};
use teloxide::types::ChatId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::quiz::session::{Event, Outcome, State};

type StoreError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Default)]
pub struct ChatLocks {
    chats: Arc<Mutex<HashMap<ChatId, Arc<Mutex<()>>>>>,
}

/// Result of one event. The chat stays locked until this is dropped, so
/// whatever is sent to the user for it goes out before the next update.
pub struct Applied {
    pub state: State,
    pub outcome: Outcome,
    _guard: OwnedMutexGuard<()>,
}

impl ChatLocks {
    async fn lock(&self, chat_id: ChatId) -> OwnedMutexGuard<()> {
        let chat = self.chats.lock().await.entry(chat_id).or_default().clone();
        chat.lock_owned().await
    }

    pub async fn apply(
        &self,
        dialogue: &Dialogue<State, ErasedStorage<State>>,
        event: Event,
    ) -> Result<Applied, StoreError> {
        let guard = self.lock(dialogue.chat_id()).await;

        let current = dialogue.get_or_default().await?;
        let (state, outcome) = step(current, event);
        // Nothing changed, and writing back could only clobber a newer state
        if outcome != Outcome::Ignored {
            dialogue.update(state.clone()).await?;
        }

        Ok(Applied {
            state,
            outcome,
            _guard: guard,
        })
    }
}

// Kept out of the async functions so the thread-local rng never crosses an await
fn step(state: State, event: Event) -> (State, Outcome) {
    state.apply(event, &mut rand::thread_rng())
}
