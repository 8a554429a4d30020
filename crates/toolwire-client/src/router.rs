//! Per-channel response inbox.
//!
//! The stream reader pushes every tagged response here; callers wait for the
//! one carrying their request id. A response is only ever removed by the
//! waiter whose id it matches, so frames for other in-flight requests stay
//! queued until their owner picks them up or they age out.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time::Instant;

use toolwire_core::types::{ChannelName, PendingRequest, RequestId};

struct QueuedResponse {
    id: RequestId,
    payload: Value,
    received_at: Instant,
}

pub struct ResponseRouter {
    channel: ChannelName,
    /// Unclaimed responses older than this are discarded on the next push.
    grace: Duration,
    queue: Mutex<VecDeque<QueuedResponse>>,
    in_flight: Mutex<HashMap<RequestId, PendingRequest>>,
    arrived: Notify,
}

impl ResponseRouter {
    #[must_use]
    pub fn new(channel: ChannelName, grace: Duration) -> Self {
        Self {
            channel,
            grace,
            queue: Mutex::new(VecDeque::new()),
            in_flight: Mutex::new(HashMap::new()),
            arrived: Notify::new(),
        }
    }

    /// Queue a response and wake every waiter. Never blocks on waiters.
    pub fn push(&self, id: RequestId, payload: Value) {
        let now = Instant::now();
        {
            let mut queue = lock(&self.queue);
            let before = queue.len();
            queue.retain(|queued| now.duration_since(queued.received_at) < self.grace);
            let purged = before - queue.len();
            if purged > 0 {
                tracing::debug!(
                    channel = %self.channel,
                    purged,
                    "discarded unclaimed responses past grace period"
                );
            }
            queue.push_back(QueuedResponse {
                id,
                payload,
                received_at: now,
            });
        }
        self.arrived.notify_waiters();
    }

    /// Record that a request with `id` is about to be posted.
    pub fn register(&self, id: &RequestId) -> PendingRequest {
        let pending = PendingRequest {
            id: id.clone(),
            channel: self.channel.clone(),
            issued_at: Utc::now(),
        };
        let mut in_flight = lock(&self.in_flight);
        if in_flight.contains_key(id) {
            tracing::warn!(
                "Request id '{id}' is already in flight on channel '{}'; concurrent identical calls may receive each other's response",
                self.channel
            );
        } else {
            in_flight.insert(id.clone(), pending.clone());
        }
        pending
    }

    /// Drop the in-flight record of a request that will never be answered.
    pub fn forget(&self, id: &RequestId) {
        lock(&self.in_flight).remove(id);
    }

    /// Wait up to `timeout` for the response tagged `id`.
    ///
    /// Returns `None` if it did not arrive in time. Either way the request
    /// is no longer in flight afterwards.
    pub async fn await_match(&self, id: &RequestId, timeout: Duration) -> Option<Value> {
        let deadline = Instant::now() + timeout;
        let outcome = loop {
            // Register interest before looking, so a push between the look
            // and the wait still wakes us.
            let notified = self.arrived.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(payload) = self.take(id) {
                break Some(payload);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                break self.take(id);
            }
        };
        self.forget(id);
        outcome
    }

    /// Requests currently waiting for a response.
    pub fn pending(&self) -> Vec<PendingRequest> {
        lock(&self.in_flight).values().cloned().collect()
    }

    /// Number of queued, unclaimed responses.
    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, id: &RequestId) -> Option<Value> {
        let mut queue = lock(&self.queue);
        let pos = queue.iter().position(|queued| &queued.id == id)?;
        queue.remove(pos).map(|queued| queued.payload)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
