//! Background jobs: one coach job and one player job, each with its own state.
//!
//! A [`JobHandle`] owns the state of one job category. The worker task is the
//! only writer while a job runs; callers read consistent copies through
//! [`JobHandle::snapshot`]. Starting is a check-and-set under the same lock,
//! so a second start while a job runs is rejected and changes nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::model::{CoachRow, PlayerRow, SkippedItem};
use crate::pipeline::{Harvest, Progress, Reporter, Scope, ScrapeError, Scout};
use crate::scraper::Fetch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Coaches,
    Players,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Coaches => write!(f, "coaches"),
            JobKind::Players => write!(f, "players"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("a {0} job is already running")]
    AlreadyRunning(JobKind),
    #[error("no {0} job is running")]
    NotRunning(JobKind),
    #[error("the {0} job cannot be reset while it is running")]
    Busy(JobKind),
}

pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_STOPPED: &str = "stopped";
pub const STATUS_STOPPING: &str = "stopping";

/// Point-in-time copy of a job's state.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot<R> {
    pub running: bool,
    pub progress: Progress,
    pub results: Vec<R>,
    pub skipped: Vec<SkippedItem>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl<R> Default for JobSnapshot<R> {
    fn default() -> Self {
        Self {
            running: false,
            progress: Progress::default(),
            results: Vec::new(),
            skipped: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }
}

impl<R> JobSnapshot<R> {
    fn finish(&mut self, outcome: Result<Result<Harvest<R>, ScrapeError>, JoinError>) {
        match outcome {
            Ok(Ok(harvest)) => {
                self.progress.status = match (harvest.stopped, harvest.nothing_found) {
                    (true, _) => STATUS_STOPPED.to_string(),
                    (false, Some(status)) => status,
                    (false, None) => STATUS_COMPLETED.to_string(),
                };
                if !harvest.stopped {
                    self.progress.current = self.progress.total;
                }
                self.results = harvest.rows;
                self.skipped = harvest.skipped;
            }
            Ok(Err(e)) => self.progress.status = format!("error: {e}"),
            Err(e) => self.progress.status = format!("error: {}", panic_message(e)),
        }
        self.running = false;
        self.finished_at = Some(Utc::now());
    }
}

fn panic_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

type SharedState<R> = Arc<RwLock<JobSnapshot<R>>>;

// A panicking worker never holds the lock across user code, so a poisoned
// lock still holds consistent data.
fn read<R>(state: &RwLock<JobSnapshot<R>>) -> RwLockReadGuard<'_, JobSnapshot<R>> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<R>(state: &RwLock<JobSnapshot<R>>) -> RwLockWriteGuard<'_, JobSnapshot<R>> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

/// Writes progress reports into the job state.
struct StateReporter<R> {
    state: SharedState<R>,
}

impl<R: Send + Sync> Reporter for StateReporter<R> {
    fn report(&self, progress: Progress) {
        let mut state = write(&self.state);
        // A stop request keeps its status until the worker reaches a checkpoint.
        if state.progress.status == STATUS_STOPPING && progress.status != STATUS_STOPPED {
            state.progress = Progress {
                status: STATUS_STOPPING.to_string(),
                ..progress
            };
        } else {
            state.progress = progress;
        }
    }
}

/// State and control of one job category.
pub struct JobHandle<R> {
    kind: JobKind,
    state: SharedState<R>,
    cancel: Mutex<Option<CancellationToken>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<R> JobHandle<R>
where
    R: Clone + Send + Sync + 'static,
{
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            state: Arc::new(RwLock::new(JobSnapshot::default())),
            cancel: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn snapshot(&self) -> JobSnapshot<R> {
        read(&self.state).clone()
    }

    pub fn is_running(&self) -> bool {
        read(&self.state).running
    }

    /// Request a cooperative stop; the worker honours it before the next club.
    pub fn stop(&self) -> Result<(), JobError> {
        let mut state = write(&self.state);
        if !state.running {
            return Err(JobError::NotRunning(self.kind));
        }
        state.progress.status = STATUS_STOPPING.to_string();
        if let Some(token) = self.cancel.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            token.cancel();
        }
        drop(state);
        tracing::info!(job = %self.kind, "stop requested");
        Ok(())
    }

    /// Discard the results of a finished job.
    pub fn reset(&self) -> Result<(), JobError> {
        let mut state = write(&self.state);
        if state.running {
            return Err(JobError::Busy(self.kind));
        }
        *state = JobSnapshot::default();
        Ok(())
    }

    /// Wait for the current worker, if any, and return the final state.
    pub async fn wait(&self) -> JobSnapshot<R> {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!(job = %self.kind, error = %e, "job supervisor failed");
            }
        }
        self.snapshot()
    }

    /// Spawn `work` on the runtime unless a job of this kind is running.
    fn launch<W, Fut>(&self, work: W) -> Result<(), JobError>
    where
        W: FnOnce(CancellationToken, StateReporter<R>) -> Fut,
        Fut: Future<Output = Result<Harvest<R>, ScrapeError>> + Send + 'static,
    {
        // A stop that sees `running` must find this job's token.
        let token = CancellationToken::new();
        {
            let mut state = write(&self.state);
            if state.running {
                return Err(JobError::AlreadyRunning(self.kind));
            }
            *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
            *state = JobSnapshot {
                running: true,
                progress: Progress::new(0, 0, "", "starting"),
                started_at: Some(Utc::now()),
                ..JobSnapshot::default()
            };
        }

        let reporter = StateReporter {
            state: Arc::clone(&self.state),
        };
        let task = tokio::spawn(work(token, reporter));

        let state = Arc::clone(&self.state);
        let kind = self.kind;
        let supervisor = tokio::spawn(async move {
            let outcome = task.await;
            let mut state = write(&state);
            state.finish(outcome);
            tracing::info!(job = %kind, status = %state.progress.status, rows = state.results.len(), "job finished");
        });
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(supervisor);

        tracing::info!(job = %self.kind, "job started");
        Ok(())
    }
}

/// Owns the scout and one handle per job category.
///
/// Starting a job spawns onto the current tokio runtime.
pub struct JobManager<F> {
    scout: Arc<Scout<F>>,
    coaches: JobHandle<CoachRow>,
    players: JobHandle<PlayerRow>,
}

impl<F: Fetch + 'static> JobManager<F> {
    pub fn new(scout: Scout<F>) -> Self {
        Self {
            scout: Arc::new(scout),
            coaches: JobHandle::new(JobKind::Coaches),
            players: JobHandle::new(JobKind::Players),
        }
    }

    pub fn coaches(&self) -> &JobHandle<CoachRow> {
        &self.coaches
    }

    pub fn players(&self) -> &JobHandle<PlayerRow> {
        &self.players
    }

    pub fn start_coaches(&self, scope: Scope) -> Result<(), JobError> {
        let scout = Arc::clone(&self.scout);
        self.coaches.launch(move |token, reporter| async move {
            scout.run_coaches(&scope, &token, &reporter).await
        })
    }

    pub fn start_players(&self, scope: Scope) -> Result<(), JobError> {
        let scout = Arc::clone(&self.scout);
        self.players.launch(move |token, reporter| async move {
            scout.run_players(&scope, &token, &reporter).await
        })
    }
}
