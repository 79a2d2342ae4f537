mod common;

use std::sync::Arc;
use tokio::sync::Semaphore;

use common::*;
use touchline::{JobError, JobKind, JobManager, LeagueRef, Scope};

fn league() -> Scope {
    Scope::League(LeagueRef {
        url: LEAGUE_URL.to_string(),
        name: None,
    })
}

#[tokio::test]
async fn stop_before_first_club_ends_stopped() {
    let gate = Arc::new(Semaphore::new(0));
    let jobs = JobManager::new(scout(StaticPages::new(&premier_league()).gated(Arc::clone(&gate))));

    jobs.start_coaches(league()).unwrap();
    assert!(jobs.coaches().is_running());

    jobs.coaches().stop().unwrap();
    assert_eq!(jobs.coaches().snapshot().progress.status, "stopping");

    gate.add_permits(1);
    let snapshot = jobs.coaches().wait().await;

    assert!(!snapshot.running);
    assert_eq!(snapshot.progress.status, "stopped");
    assert_eq!(snapshot.progress.total, 2);
    assert!(snapshot.results.is_empty());
    assert!(snapshot.finished_at.is_some());
    assert!(snapshot.skipped.is_empty());
}

#[tokio::test]
async fn second_start_is_rejected_without_side_effects() {
    let gate = Arc::new(Semaphore::new(0));
    let jobs = JobManager::new(scout(StaticPages::new(&premier_league()).gated(Arc::clone(&gate))));

    jobs.start_coaches(league()).unwrap();
    let before = jobs.coaches().snapshot();

    let err = jobs.start_coaches(Scope::ClubId("11".into())).unwrap_err();
    assert_eq!(err, JobError::AlreadyRunning(JobKind::Coaches));

    let after = jobs.coaches().snapshot();
    assert_eq!(after.started_at, before.started_at);
    assert_eq!(after.progress, before.progress);
    assert!(after.running);

    gate.add_permits(1);
    let snapshot = jobs.coaches().wait().await;
    assert_eq!(snapshot.progress.status, "completed");
    assert_eq!(snapshot.results.len(), 1);
}

#[tokio::test]
async fn coach_and_player_jobs_run_side_by_side() {
    let jobs = JobManager::new(scout(StaticPages::new(&premier_league())));

    jobs.start_coaches(league()).unwrap();
    jobs.start_players(league()).unwrap();
    assert!(jobs.coaches().is_running());
    assert!(jobs.players().is_running());

    let coaches = jobs.coaches().wait().await;
    let players = jobs.players().wait().await;

    assert_eq!(coaches.progress.status, "completed");
    assert_eq!(coaches.results[0].manager, "Mikel Arteta");
    assert_eq!(coaches.skipped.len(), 1);
    assert_eq!(players.progress.status, "completed");
    assert_eq!(players.results[0].player_name, "Bukayo Saka");
    assert_eq!(players.progress.current, players.progress.total);
}

#[tokio::test]
async fn failed_lookup_is_reported_as_status() {
    let jobs = JobManager::new(scout(StaticPages::new(&premier_league())));

    jobs.start_players(Scope::Player("999".into())).unwrap();
    let snapshot = jobs.players().wait().await;

    assert!(!snapshot.running);
    assert!(snapshot.progress.status.starts_with("error: "));
    assert!(snapshot.results.is_empty());

    jobs.players().reset().unwrap();
    assert_eq!(jobs.players().snapshot().progress.status, "");
}
