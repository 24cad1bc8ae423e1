//! Explicitly owned chat sessions keyed by a session ID.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::{ChatMessage, SessionStore};

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("Session {0} already has a response in progress")]
    TurnInProgress(String),
}

/// Handed out when a turn starts and given back when it finishes.
/// Remembers the reset epoch the turn started in.
#[derive(Debug)]
pub struct TurnTicket {
    epoch: u64,
}

#[derive(Debug)]
pub struct Session {
    id: String,
    history: SessionStore,
    // Incremented on every reset
    epoch: u64,
    pending: bool,
}

impl Session {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            history: SessionStore::new(),
            epoch: 0,
            pending: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Direct access to the history for callers that run one turn at
    /// a time, like the terminal chat.
    pub fn history_mut(&mut self) -> &mut SessionStore {
        &mut self.history
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.history.all()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Marks the start of a turn. Only one turn can be in flight per
    /// session.
    pub fn begin_turn(&mut self) -> Result<TurnTicket, SessionError> {
        if self.pending {
            return Err(SessionError::TurnInProgress(self.id.clone()));
        }
        self.pending = true;
        Ok(TurnTicket { epoch: self.epoch })
    }

    /// Finishes the turn started with `ticket`. A successful exchange
    /// is recorded unless the session was reset while the turn was
    /// running. Returns whether the exchange was recorded.
    pub fn finish_turn(&mut self, ticket: TurnTicket, exchange: Option<(&str, &str)>) -> bool {
        self.pending = false;

        let Some((user_text, reply)) = exchange else {
            return false;
        };
        if ticket.epoch != self.epoch {
            tracing::debug!(
                "Session {} was reset during the turn, dropping the exchange",
                self.id
            );
            return false;
        }

        self.history.record_turn(user_text, reply);
        true
    }

    pub fn reset(&mut self) {
        self.history.reset();
        self.epoch += 1;
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub message_count: usize,
    pub pending: bool,
}

/// All of the live sessions. Sessions only exist in memory and are
/// gone when the process exits.
#[derive(Default, Debug)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, id: &str) -> &mut Session {
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id))
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Clears the history of a session. Returns false if there is no
    /// session with that ID.
    pub fn reset(&mut self, id: &str) -> bool {
        match self.sessions.get_mut(id) {
            Some(session) => {
                session.reset();
                true
            }
            None => false,
        }
    }

    /// Summaries of every session sorted by ID.
    pub fn summaries(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .values()
            .map(|s| SessionSummary {
                id: s.id.clone(),
                message_count: s.history.len(),
                pending: s.pending,
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}
