//! Per-job subscription bus.
//!
//! [`SubscriberSet`] maps a job id to the observers waiting on it. It lives
//! inside the job store's lock, so [`SubscriberSet::notify`] runs in the
//! same critical section as the field mutation it reports. Notification is
//! a non-blocking unbounded send, which keeps the critical section short
//! and preserves per-job ordering for every subscriber.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use avstudio_core::job::Job;
use avstudio_core::types::JobId;
use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::store::StoreState;

/// Identifies one observer within a job's subscriber set.
pub type SubscriberId = u64;

struct Subscriber {
    id: SubscriberId,
    sender: mpsc::UnboundedSender<Job>,
}

// ---------------------------------------------------------------------------
// SubscriberSet
// ---------------------------------------------------------------------------

/// Observers grouped by job id.
#[derive(Default)]
pub struct SubscriberSet {
    next_id: SubscriberId,
    by_job: HashMap<JobId, Vec<Subscriber>>,
}

impl SubscriberSet {
    /// Register a new observer for `job_id`.
    pub fn register(&mut self, job_id: &str) -> (SubscriberId, mpsc::UnboundedReceiver<Job>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.next_id += 1;
        let id = self.next_id;
        self.by_job
            .entry(job_id.to_string())
            .or_default()
            .push(Subscriber { id, sender });
        (id, receiver)
    }

    /// Remove one observer. Returns `false` if it was already gone.
    pub fn remove(&mut self, job_id: &str, id: SubscriberId) -> bool {
        let Some(subscribers) = self.by_job.get_mut(job_id) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            self.by_job.remove(job_id);
        }
        removed
    }

    /// Deliver a snapshot of `job` to every observer of that job.
    ///
    /// Observers whose receiver was dropped are pruned. After a terminal
    /// snapshot the whole set for that job is released, which ends every
    /// subscription once the terminal record has been read.
    ///
    /// Returns the number of observers the snapshot was delivered to.
    pub fn notify(&mut self, job: &Job) -> usize {
        let Some(subscribers) = self.by_job.get_mut(&job.id) else {
            return 0;
        };
        subscribers.retain(|s| s.sender.send(job.clone()).is_ok());
        let delivered = subscribers.len();
        if job.is_terminal() || subscribers.is_empty() {
            self.by_job.remove(&job.id);
        }
        delivered
    }

    /// Number of live observers for `job_id`.
    pub fn count(&self, job_id: &str) -> usize {
        self.by_job.get(job_id).map_or(0, Vec::len)
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Handle to the notifications for a single job.
///
/// Yields one [`Job`] snapshot per applied update, ending after the
/// terminal one. Dropping the handle unsubscribes.
pub struct Subscription {
    job_id: JobId,
    id: Option<SubscriberId>,
    receiver: mpsc::UnboundedReceiver<Job>,
    registry: Weak<Mutex<StoreState>>,
}

impl Subscription {
    pub(crate) fn registered(
        job_id: &str,
        id: SubscriberId,
        receiver: mpsc::UnboundedReceiver<Job>,
        registry: Weak<Mutex<StoreState>>,
    ) -> Self {
        Self {
            job_id: job_id.to_string(),
            id: Some(id),
            receiver,
            registry,
        }
    }

    /// A subscription that is not registered anywhere and only yields what
    /// was already buffered in `receiver`.
    pub(crate) fn detached(job_id: &str, receiver: mpsc::UnboundedReceiver<Job>) -> Self {
        Self {
            job_id: job_id.to_string(),
            id: None,
            receiver,
            registry: Weak::new(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Wait for the next snapshot. `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<Job> {
        self.receiver.recv().await
    }

    /// Take a snapshot that is already buffered, without waiting.
    pub fn try_recv(&mut self) -> Option<Job> {
        self.receiver.try_recv().ok()
    }

    /// Stop receiving notifications. Safe to call more than once.
    ///
    /// Snapshots buffered but not yet read are discarded.
    pub fn unsubscribe(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(registry) = self.registry.upgrade() {
                registry.lock().subscribers.remove(&self.job_id, id);
            }
        }
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Stream for Subscription {
    type Item = Job;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Job>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use avstudio_core::job::{JobPatch, JobType};
    use serde_json::json;

    fn job() -> Job {
        Job::new(JobType::Audio, json!({}))
    }

    #[test]
    fn notify_reaches_every_registered_observer() {
        let mut set = SubscriberSet::default();
        let job = job();
        let (_, mut rx1) = set.register(&job.id);
        let (_, mut rx2) = set.register(&job.id);

        assert_eq!(set.notify(&job), 2);
        assert_eq!(rx1.try_recv().unwrap().id, job.id);
        assert_eq!(rx2.try_recv().unwrap().id, job.id);
    }

    #[test]
    fn notify_skips_other_jobs() {
        let mut set = SubscriberSet::default();
        let a = job();
        let b = job();
        let (_, mut rx) = set.register(&a.id);

        assert_eq!(set.notify(&b), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut set = SubscriberSet::default();
        let job = job();
        let (_, rx) = set.register(&job.id);
        drop(rx);

        assert_eq!(set.notify(&job), 0);
        assert_eq!(set.count(&job.id), 0);
    }

    #[test]
    fn terminal_notification_releases_the_job() {
        let mut set = SubscriberSet::default();
        let mut job = job();
        let (_, mut rx) = set.register(&job.id);

        job.apply(JobPatch::failed("boom"), chrono::Utc::now());
        set.notify(&job);

        assert_eq!(set.count(&job.id), 0);
        assert!(rx.try_recv().unwrap().is_terminal());
        // Sender side is gone, so the channel reports disconnection.
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut set = SubscriberSet::default();
        let job = job();
        let (id, _rx) = set.register(&job.id);

        assert!(set.remove(&job.id, id));
        assert!(!set.remove(&job.id, id));
        assert!(!set.remove("job_unknown", id));
    }
}
