//! Owner of every live recurring alert.
//!
//! The registry is the single place where alert jobs are created, replaced
//! and cancelled. All of that happens under one mutex, and a job's task is
//! always aborted before its key leaves the map, so there is never more than
//! one timer per key and no timer outlives its entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::info;

use super::alert_job::{self, JobContext};
use crate::models::{AlertInterval, AlertKey, Destination};

/// Caller's view of an installed job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    pub id: u64,
    pub key: AlertKey,
    pub interval: AlertInterval,
    pub started_at: DateTime<Utc>,
    /// Interval of the job this one replaced, if any.
    pub replaced: Option<AlertInterval>,
}

struct AlertRecord {
    id: u64,
    interval: AlertInterval,
    started_at: DateTime<Utc>,
    task: JoinHandle<()>,
}

/// Aborts the job for `key`, then drops it from the map.
fn take(jobs: &mut HashMap<AlertKey, AlertRecord>, key: &AlertKey) -> Option<AlertRecord> {
    jobs.get(key)?.task.abort();
    jobs.remove(key)
}

fn abort_all(jobs: &mut HashMap<AlertKey, AlertRecord>) -> usize {
    let count = jobs.len();
    for record in jobs.values() {
        record.task.abort();
    }
    jobs.clear();
    count
}

pub struct AlertRegistry {
    ctx: JobContext,
    jobs: Mutex<HashMap<AlertKey, AlertRecord>>,
    next_id: AtomicU64,
}

impl AlertRegistry {
    pub fn new(ctx: JobContext) -> Self {
        Self {
            ctx,
            jobs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<AlertKey, AlertRecord>> {
        // a panic elsewhere must not wedge cancellation
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs a job for `key`, replacing (and stopping) any existing one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(&self, key: AlertKey, interval: AlertInterval) -> JobHandle {
        let mut jobs = self.jobs();

        let replaced = take(&mut jobs, &key).map(|old| old.interval);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let started_at = Utc::now();
        let task = alert_job::spawn(self.ctx.clone(), key.clone(), interval);
        jobs.insert(
            key.clone(),
            AlertRecord {
                id,
                interval,
                started_at,
                task,
            },
        );
        drop(jobs);

        match replaced {
            Some(old) => info!(
                chat_id = %key.destination,
                token = %key.token,
                from = %old,
                to = %interval,
                job_id = id,
                "alert replaced"
            ),
            None => info!(
                chat_id = %key.destination,
                token = %key.token,
                interval = %interval,
                job_id = id,
                "alert created"
            ),
        }

        JobHandle {
            id,
            key,
            interval,
            started_at,
            replaced,
        }
    }

    /// Stops the job for `key`. Returns false when there was none.
    pub fn cancel_one(&self, key: &AlertKey) -> bool {
        let mut jobs = self.jobs();
        let Some(record) = take(&mut jobs, key) else {
            return false;
        };
        drop(jobs);

        info!(chat_id = %key.destination, token = %key.token, job_id = record.id, "alert cancelled");
        true
    }

    /// Stops every job and returns how many were running.
    pub fn cancel_all(&self) -> usize {
        let count = abort_all(&mut self.jobs());

        if count > 0 {
            info!(count, "all alerts cancelled");
        }
        count
    }

    /// Live subscriptions for one chat, sorted by token.
    pub fn list(&self, destination: Destination) -> Vec<(String, AlertInterval)> {
        let mut out: Vec<(String, AlertInterval)> = self
            .jobs()
            .iter()
            .filter(|(key, _)| key.destination == destination)
            .map(|(key, record)| (key.token.clone(), record.interval))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn get(&self, key: &AlertKey) -> Option<JobHandle> {
        self.jobs().get(key).map(|record| JobHandle {
            id: record.id,
            key: key.clone(),
            interval: record.interval,
            started_at: record.started_at,
            replaced: None,
        })
    }

    pub fn interval_of(&self, key: &AlertKey) -> Option<AlertInterval> {
        self.jobs().get(key).map(|record| record.interval)
    }

    pub fn contains(&self, key: &AlertKey) -> bool {
        self.jobs().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs().is_empty()
    }
}

impl Drop for AlertRegistry {
    fn drop(&mut self) {
        abort_all(self.jobs.get_mut().unwrap_or_else(PoisonError::into_inner));
    }
}
