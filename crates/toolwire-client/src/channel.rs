//! Per-channel state shared by the stream reader and callers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};

use toolwire_core::types::{ChannelName, Session, SessionId};

use crate::reader::ReaderHandle;
use crate::router::ResponseRouter;

/// Lifecycle of a channel's event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    /// No reader has been started yet.
    Idle,
    /// A reader is running but no session has been announced.
    Connecting,
    /// The stream announced a session and is usable.
    Live(Session),
    /// The last reader exited; the reason is kept for diagnostics.
    Closed(String),
}

pub struct Channel {
    pub name: ChannelName,
    pub router: ResponseRouter,
    state: watch::Sender<StreamState>,
    /// Bumped on every reader start; a reader only updates state while its
    /// generation is current.
    generation: AtomicU64,
    pub(crate) reader: Mutex<Option<ReaderHandle>>,
}

impl Channel {
    #[must_use]
    pub fn new(name: ChannelName, stale_response_grace: Duration) -> Self {
        let (state, _) = watch::channel(StreamState::Idle);
        Self {
            router: ResponseRouter::new(name.clone(), stale_response_grace),
            name,
            state,
            generation: AtomicU64::new(0),
            reader: Mutex::new(None),
        }
    }

    pub fn state(&self) -> StreamState {
        self.state.borrow().clone()
    }

    /// The live session, if any.
    pub fn session(&self) -> Option<Session> {
        match &*self.state.borrow() {
            StreamState::Live(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Start a new stream generation, discarding any previous session.
    pub(crate) fn begin_generation(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.send_replace(StreamState::Connecting);
        generation
    }

    /// Record the session announced by the reader of `generation`.
    ///
    /// Only the first announcement of a stream is taken; returns whether it
    /// was.
    pub(crate) fn announce(&self, generation: u64, session_id: SessionId) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        let channel = self.name.clone();
        self.state.send_if_modified(|state| {
            if *state != StreamState::Connecting {
                return false;
            }
            *state = StreamState::Live(Session {
                channel,
                session_id,
                established_at: Utc::now(),
            });
            true
        })
    }

    /// Mark the stream of `generation` as gone.
    pub(crate) fn close(&self, generation: u64, reason: String) {
        if self.is_current(generation) {
            self.state.send_replace(StreamState::Closed(reason));
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }
}
