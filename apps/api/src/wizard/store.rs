//! In-memory session registry.
//!
//! Sessions live for one interaction and are never shared across
//! interactions. Each session sits behind its own async mutex so a step runs
//! to completion before the next submission for that session is accepted,
//! while other sessions proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::wizard::session::WizardSession;

pub type SharedSession = Arc<AsyncMutex<WizardSession>>;

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, SharedSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: WizardSession) -> Uuid {
        let id = session.id;
        self.inner
            .lock()
            .unwrap()
            .insert(id, Arc::new(AsyncMutex::new(session)));
        id
    }

    pub fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.inner.lock().unwrap().get(&id).cloned()
    }

    /// Destroys a session's state. Returns false if it was already gone.
    pub fn remove(&self, id: Uuid) -> bool {
        self.inner.lock().unwrap().remove(&id).is_some()
    }
}
