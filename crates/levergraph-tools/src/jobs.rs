// ABOUTME: Job tracking for tool invocations behind an injectable store
// ABOUTME: In-memory default keeps jobs in creation order under a parking_lot lock

use chrono::{DateTime, Utc};
use levergraph_core::{LeverageError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn can_advance_to(self, next: JobStatus) -> bool {
        match self {
            JobStatus::Pending => next != JobStatus::Pending,
            JobStatus::Running => next.is_terminal(),
            JobStatus::Completed | JobStatus::Failed => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub tool: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub trait JobStore: Send + Sync {
    fn create(&self, tool: &str) -> Job;

    /// Move a job forward: pending -> running -> completed | failed.
    fn advance(&self, id: Uuid, status: JobStatus, message: Option<String>) -> Result<Job>;

    fn get(&self, id: Uuid) -> Option<Job>;

    /// All jobs in creation order.
    fn list(&self) -> Vec<Job>;

    /// Drop completed and failed jobs; returns how many were removed.
    fn prune_finished(&self) -> usize;
}

/// Jobs retained by [`InMemoryJobStore::new`].
pub const DEFAULT_MAX_JOBS: usize = 1024;

#[derive(Default)]
struct JobTable {
    jobs: HashMap<Uuid, Job>,
    order: Vec<Uuid>,
}

impl JobTable {
    /// Evict the oldest finished jobs until at most `max_jobs` remain.
    /// Pending and running jobs are never evicted.
    fn evict_over(&mut self, max_jobs: usize) -> usize {
        let mut excess = self.order.len().saturating_sub(max_jobs);
        if excess == 0 {
            return 0;
        }
        let jobs = &mut self.jobs;
        let before = self.order.len();
        self.order.retain(|id| {
            let finished = jobs.get(id).map_or(true, |job| job.status.is_terminal());
            if excess > 0 && finished {
                jobs.remove(id);
                excess -= 1;
                false
            } else {
                true
            }
        });
        before - self.order.len()
    }
}

/// Job store bounded to a fixed number of jobs; finished jobs are evicted
/// oldest first once the bound is exceeded.
pub struct InMemoryJobStore {
    table: RwLock<JobTable>,
    max_jobs: usize,
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_JOBS)
    }
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_jobs: usize) -> Self {
        Self {
            table: RwLock::new(JobTable::default()),
            max_jobs: max_jobs.max(1),
        }
    }

    pub fn max_jobs(&self) -> usize {
        self.max_jobs
    }
}

impl JobStore for InMemoryJobStore {
    fn create(&self, tool: &str) -> Job {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            tool: tool.to_string(),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            message: None,
        };
        let mut table = self.table.write();
        table.order.push(job.id);
        table.jobs.insert(job.id, job.clone());
        let evicted = table.evict_over(self.max_jobs);
        if evicted > 0 {
            debug!("Evicted {} finished jobs", evicted);
        }
        debug!("Created job {} for {}", job.id, tool);
        job
    }

    fn advance(&self, id: Uuid, status: JobStatus, message: Option<String>) -> Result<Job> {
        let mut table = self.table.write();
        let job = table
            .jobs
            .get_mut(&id)
            .ok_or_else(|| LeverageError::InvalidInput(format!("unknown job {}", id)))?;
        if !job.status.can_advance_to(status) {
            return Err(LeverageError::InvalidInput(format!(
                "job {} cannot move from {:?} to {:?}",
                id, job.status, status
            )));
        }
        job.status = status;
        job.updated_at = Utc::now();
        if message.is_some() {
            job.message = message;
        }
        Ok(job.clone())
    }

    fn get(&self, id: Uuid) -> Option<Job> {
        self.table.read().jobs.get(&id).cloned()
    }

    fn list(&self) -> Vec<Job> {
        let table = self.table.read();
        table
            .order
            .iter()
            .filter_map(|id| table.jobs.get(id).cloned())
            .collect()
    }

    fn prune_finished(&self) -> usize {
        let mut table = self.table.write();
        table.evict_over(0)
    }
}
