//! Time-ordered queue of pending job-record deletions.
//!
//! Terminal jobs are pushed with a deadline; one sweeper drains due entries
//! periodically instead of arming a timer per job.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Mutex, PoisonError};

use tokio::time::Instant;

use crate::store::JobId;

/// Min-heap of (deadline, job id).
#[derive(Debug, Default)]
pub struct ExpiryQueue {
    heap: Mutex<BinaryHeap<Reverse<(Instant, JobId)>>>,
}

impl ExpiryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, id: JobId, deadline: Instant) {
        self.heap
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Reverse((deadline, id)));
    }

    /// Remove and return every entry whose deadline is at or before `now`, earliest first.
    pub fn drain_due(&self, now: Instant) -> Vec<JobId> {
        let mut heap = self.heap.lock().unwrap_or_else(PoisonError::into_inner);
        let mut due = Vec::new();
        while let Some(Reverse((deadline, _))) = heap.peek() {
            if *deadline > now {
                break;
            }
            if let Some(Reverse((_, id))) = heap.pop() {
                due.push(id);
            }
        }
        due
    }

    /// Deadline of the earliest pending entry.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .peek()
            .map(|Reverse((deadline, _))| *deadline)
    }

    pub fn len(&self) -> usize {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn drains_in_deadline_order() {
        let q = ExpiryQueue::new();
        let now = Instant::now();
        q.schedule(JobId::from("late"), now + Duration::from_secs(30));
        q.schedule(JobId::from("early"), now + Duration::from_secs(10));
        q.schedule(JobId::from("mid"), now + Duration::from_secs(20));
        assert_eq!(q.next_deadline(), Some(now + Duration::from_secs(10)));

        assert!(q.drain_due(now).is_empty());
        let due = q.drain_due(now + Duration::from_secs(20));
        assert_eq!(due, vec![JobId::from("early"), JobId::from("mid")]);
        assert_eq!(q.len(), 1);

        let due = q.drain_due(now + Duration::from_secs(60));
        assert_eq!(due, vec![JobId::from("late")]);
        assert!(q.is_empty());
        assert!(q.next_deadline().is_none());
    }
}
