//! Per-session bounded turn history.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use super::models::{
    slots_for, validate_memory_len, MemoryConfig, Message, TrimPolicy, Turn, SLOTS_PER_TURN,
};
use crate::error::Result;

#[derive(Debug, Default)]
struct SessionState {
    turns: VecDeque<Turn>,
}

impl SessionState {
    /// Drop the oldest turns until the history fits in `slots` messages.
    /// Returns how many turns were evicted.
    fn trim_to(&mut self, slots: usize) -> usize {
        let mut evicted = 0;
        while self.turns.len().saturating_mul(SLOTS_PER_TURN) > slots {
            self.turns.pop_front();
            evicted += 1;
        }
        evicted
    }
}

type SharedSession = Arc<Mutex<SessionState>>;

fn lock_session(session: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    // A panic while holding the lock cannot leave the deque half-written,
    // so the state behind a poisoned lock is still valid.
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read handle to one session's history.
///
/// Handles stay valid across `clear` and `clear_all`; they observe the
/// emptied history rather than a stale copy.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    key: Arc<str>,
    state: SharedSession,
}

impl SessionHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of retained turns.
    pub fn len(&self) -> usize {
        lock_session(&self.state).turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the retained turns, oldest first.
    pub fn history(&self) -> Vec<Turn> {
        lock_session(&self.state).turns.iter().cloned().collect()
    }
}

/// Owns the conversational memory of every session.
///
/// The session map lock is only held to look up or insert a session;
/// appends and reads then lock that session alone, so different keys
/// never contend with each other.
#[derive(Debug)]
pub struct SessionMemoryManager {
    sessions: RwLock<HashMap<Arc<str>, SharedSession>>,
    memory_len: AtomicUsize,
    trim_policy: TrimPolicy,
}

impl SessionMemoryManager {
    pub fn new(config: MemoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            memory_len: AtomicUsize::new(config.memory_len),
            trim_policy: config.trim_policy,
        })
    }

    /// Current capacity in exchanges.
    pub fn capacity(&self) -> usize {
        self.memory_len.load(Ordering::Acquire)
    }

    pub fn trim_policy(&self) -> TrimPolicy {
        self.trim_policy
    }

    /// Return the session for `session_key`, creating an empty one if needed.
    pub fn get_or_create(&self, session_key: &str) -> SessionHandle {
        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((key, state)) = sessions.get_key_value(session_key) {
                return SessionHandle {
                    key: Arc::clone(key),
                    state: Arc::clone(state),
                };
            }
        }

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another writer may have created the session between the two locks.
        if let Some((key, state)) = sessions.get_key_value(session_key) {
            return SessionHandle {
                key: Arc::clone(key),
                state: Arc::clone(state),
            };
        }

        let key: Arc<str> = Arc::from(session_key);
        let state = SharedSession::default();
        sessions.insert(Arc::clone(&key), Arc::clone(&state));
        tracing::debug!(session = session_key, "Created session");

        SessionHandle { key, state }
    }

    fn existing(&self, session_key: &str) -> Option<SharedSession> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_key)
            .cloned()
    }

    /// Whether `state` is still the session registered under `session_key`.
    fn is_registered(&self, session_key: &str, state: &SharedSession) -> bool {
        self.existing(session_key)
            .is_some_and(|current| Arc::ptr_eq(&current, state))
    }

    /// Append one exchange and evict the oldest turns beyond the cap.
    ///
    /// Returns the number of turns retained after trimming.
    pub fn append_turn(
        &self,
        session_key: &str,
        human_text: impl Into<String>,
        agent_text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> usize {
        let turn = Turn::new(human_text, agent_text, timestamp);

        let (retained, evicted) = loop {
            let handle = self.get_or_create(session_key);
            let mut state = lock_session(&handle.state);

            // `clear_all` may have detached this state after the lookup;
            // writing into it would lose the turn.
            if !self.is_registered(session_key, &handle.state) {
                continue;
            }

            // Read under the session lock so an eager `set_capacity` either
            // sees this turn when it retrims or is seen here.
            let slots = slots_for(self.capacity());
            state.turns.push_back(turn);
            let evicted = state.trim_to(slots);
            break (state.turns.len(), evicted);
        };

        tracing::debug!(
            session = session_key,
            retained = retained,
            evicted = evicted,
            "Appended turn"
        );
        retained
    }

    /// Snapshot of the session's turns, oldest first.
    pub fn history_view(&self, session_key: &str) -> Vec<Turn> {
        self.get_or_create(session_key).history()
    }

    /// History flattened into alternating human and agent messages.
    pub fn messages_view(&self, session_key: &str) -> Vec<Message> {
        self.history_view(session_key)
            .iter()
            .flat_map(Turn::messages)
            .collect()
    }

    /// Remove the history of one session. Other sessions are untouched.
    pub fn clear(&self, session_key: &str) {
        if let Some(state) = self.existing(session_key) {
            let removed = {
                let mut state = lock_session(&state);
                let removed = state.turns.len();
                state.turns.clear();
                removed
            };
            tracing::info!(session = session_key, removed = removed, "Cleared session");
        }
    }

    /// Remove every session.
    pub fn clear_all(&self) {
        let drained: Vec<SharedSession> = {
            let mut sessions = self
                .sessions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            sessions.drain().map(|(_, state)| state).collect()
        };

        // Outstanding handles keep their state alive; empty it so they do
        // not keep showing history that was deleted.
        for state in &drained {
            lock_session(state).turns.clear();
        }
        tracing::info!(sessions = drained.len(), "Cleared all sessions");
    }

    /// Change the capacity, in exchanges.
    ///
    /// Under [`TrimPolicy::Lazy`] longer sessions keep their turns until
    /// their next append; under [`TrimPolicy::Eager`] they are trimmed now.
    pub fn set_capacity(&self, memory_len: usize) -> Result<()> {
        if let Err(err) = validate_memory_len(memory_len) {
            tracing::warn!(memory_len = memory_len, "Rejected memory capacity");
            return Err(err);
        }

        let previous = self.memory_len.swap(memory_len, Ordering::AcqRel);
        tracing::info!(
            previous = previous,
            memory_len = memory_len,
            policy = %self.trim_policy,
            "Memory capacity changed"
        );

        if self.trim_policy == TrimPolicy::Eager && memory_len < previous {
            let sessions: Vec<SharedSession> = self
                .sessions
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .values()
                .cloned()
                .collect();

            let slots = slots_for(memory_len);
            let evicted: usize = sessions
                .iter()
                .map(|state| lock_session(state).trim_to(slots))
                .sum();
            tracing::debug!(evicted = evicted, "Eagerly retrimmed sessions");
        }

        Ok(())
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Keys of all known sessions, sorted.
    pub fn session_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .map(|key| key.to_string())
            .collect();
        keys.sort();
        keys
    }
}

impl Default for SessionMemoryManager {
    fn default() -> Self {
        let config = MemoryConfig::default();
        Self {
            sessions: RwLock::new(HashMap::new()),
            memory_len: AtomicUsize::new(config.memory_len),
            trim_policy: config.trim_policy,
        }
    }
}
