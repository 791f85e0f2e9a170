use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::action::ProposedAction;
use crate::domain::message::{Message, ThreadId};
use crate::domain::plan::Plan;
use crate::gate::GateState;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown thread `{thread_id}`")]
    UnknownThread { thread_id: String },
    #[error("thread `{thread_id}` already has a pending action awaiting a decision")]
    ActionAlreadyPending { thread_id: String },
}

/// Everything a thread needs to survive a suspend/resume cycle: the
/// message history, the pending-action snapshot, and the gate position.
#[derive(Clone, Debug)]
pub struct ThreadState {
    pub thread_id: ThreadId,
    pub messages: Vec<Message>,
    pub pending_action: Option<ProposedAction>,
    pub gate: GateState,
    pub plan: Option<Plan>,
}

impl ThreadState {
    fn new(thread_id: ThreadId) -> Self {
        Self {
            thread_id,
            messages: Vec::new(),
            pending_action: None,
            gate: GateState::AwaitingProposal,
            plan: None,
        }
    }

    /// At most one action may await a decision per thread.
    pub fn set_pending(&mut self, action: ProposedAction) -> Result<(), StoreError> {
        if self.pending_action.is_some() {
            return Err(StoreError::ActionAlreadyPending {
                thread_id: self.thread_id.0.clone(),
            });
        }
        self.pending_action = Some(action);
        Ok(())
    }

    pub fn take_pending(&mut self) -> Option<ProposedAction> {
        self.pending_action.take()
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.pending_action = None;
        self.gate = GateState::AwaitingProposal;
        self.plan = None;
    }
}

/// Conversation state keyed by thread id, process-lifetime only. Each
/// thread sits behind its own mutex so two threads can run concurrently
/// while a single thread never has more than one in-flight resume.
#[derive(Default)]
pub struct InMemoryThreadStore {
    threads: RwLock<HashMap<String, Arc<Mutex<ThreadState>>>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the thread for the duration of a turn, creating it on first
    /// use. The returned guard is the per-thread serialization point.
    pub async fn checkout_or_create(&self, thread_id: &ThreadId) -> OwnedMutexGuard<ThreadState> {
        let entry = {
            let mut threads = self.threads.write().await;
            threads
                .entry(thread_id.0.clone())
                .or_insert_with(|| Arc::new(Mutex::new(ThreadState::new(thread_id.clone()))))
                .clone()
        };
        entry.lock_owned().await
    }

    /// Like `checkout_or_create` but fails on unknown threads; resuming a
    /// conversation that was never started is an error.
    pub async fn checkout(
        &self,
        thread_id: &ThreadId,
    ) -> Result<OwnedMutexGuard<ThreadState>, StoreError> {
        let entry = {
            let threads = self.threads.read().await;
            threads
                .get(&thread_id.0)
                .cloned()
                .ok_or_else(|| StoreError::UnknownThread { thread_id: thread_id.0.clone() })?
        };
        Ok(entry.lock_owned().await)
    }

    pub async fn create(&self, thread_id: &ThreadId) -> bool {
        let mut threads = self.threads.write().await;
        if threads.contains_key(&thread_id.0) {
            return false;
        }
        threads.insert(
            thread_id.0.clone(),
            Arc::new(Mutex::new(ThreadState::new(thread_id.clone()))),
        );
        true
    }

    pub async fn history(&self, thread_id: &ThreadId) -> Result<Vec<Message>, StoreError> {
        let state = self.checkout(thread_id).await?;
        Ok(state.messages.clone())
    }

    pub async fn append(&self, thread_id: &ThreadId, message: Message) -> Result<(), StoreError> {
        let mut state = self.checkout(thread_id).await?;
        state.messages.push(message);
        Ok(())
    }

    pub async fn set_pending_action(
        &self,
        thread_id: &ThreadId,
        action: ProposedAction,
    ) -> Result<(), StoreError> {
        let mut state = self.checkout(thread_id).await?;
        state.set_pending(action)
    }

    pub async fn pending_action(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<ProposedAction>, StoreError> {
        let state = self.checkout(thread_id).await?;
        Ok(state.pending_action.clone())
    }

    pub async fn clear_pending_action(&self, thread_id: &ThreadId) -> Result<(), StoreError> {
        let mut state = self.checkout(thread_id).await?;
        state.pending_action = None;
        Ok(())
    }

    pub async fn gate_state(&self, thread_id: &ThreadId) -> Result<GateState, StoreError> {
        let state = self.checkout(thread_id).await?;
        Ok(state.gate)
    }

    pub async fn reset(&self, thread_id: &ThreadId) -> Result<(), StoreError> {
        let mut state = self.checkout(thread_id).await?;
        state.reset();
        Ok(())
    }
}
