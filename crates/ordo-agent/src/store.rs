//! In-memory session store

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::conversation::ConversationGraph;
use crate::session::{ConversationSession, SessionConfig};

/// Maps session ids to sessions, creating them lazily.
///
/// A missing id is never an error. The map lock makes creation of distinct
/// sessions safe across threads; each session sits behind its own async
/// mutex so one session's turns are strictly sequential while different
/// sessions run fully in parallel.
pub struct SessionStore {
    graph: Arc<ConversationGraph>,
    config: SessionConfig,
    sessions: Mutex<HashMap<String, Arc<tokio::sync::Mutex<ConversationSession>>>>,
}

impl SessionStore {
    /// Create a store whose sessions share one graph and configuration
    pub fn new(graph: Arc<ConversationGraph>, config: SessionConfig) -> Self {
        Self {
            graph,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the session for `id`, creating it if absent
    pub fn get_or_create(&self, id: &str) -> Arc<tokio::sync::Mutex<ConversationSession>> {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session = id, "creating session");
                Arc::new(tokio::sync::Mutex::new(ConversationSession::new(
                    Arc::clone(&self.graph),
                    self.config.clone(),
                )))
            })
            .clone()
    }

    /// Create a session under a generated id
    pub fn create(&self) -> (String, Arc<tokio::sync::Mutex<ConversationSession>>) {
        let id = uuid::Uuid::new_v4().to_string();
        let session = self.get_or_create(&id);
        (id, session)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether the store holds no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
