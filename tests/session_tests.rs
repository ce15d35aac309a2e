// Timer-driven session tests
//
// These run the real tokio timer with a short interval on a large grid, so the
// episode cannot end during the test.

use std::time::Duration;
use tokio::time::{sleep, timeout};

use hamiltonian_snake::config::Config;
use hamiltonian_snake::debug_logger::DebugLogger;
use hamiltonian_snake::driver::Session;
use hamiltonian_snake::types::Phase;

fn test_config(start_running: bool) -> Config {
    let mut config = Config::default_hardcoded();
    config.game.grid_size = 20;
    config.game.seed = Some(42);
    config.game.start_running = start_running;
    config.timing.tick_interval_ms = 5;
    config
}

fn session(start_running: bool) -> Session {
    Session::new(test_config(start_running), DebugLogger::disabled())
        .expect("test config is valid")
}

#[tokio::test]
async fn test_running_session_advances() {
    let session = session(true);
    session.start();
    assert!(session.is_scheduled());

    sleep(Duration::from_millis(80)).await;

    let snapshot = session.snapshot();
    assert!(snapshot.tick > 0);
    assert!(snapshot.running);
    assert!(!snapshot.game_over);
}

#[tokio::test]
async fn test_paused_session_does_not_advance() {
    let session = session(true);
    session.start();
    sleep(Duration::from_millis(40)).await;

    let paused = session.set_running(false);
    assert!(!paused.running);
    assert!(!session.is_scheduled());

    sleep(Duration::from_millis(60)).await;
    let later = session.snapshot();
    assert_eq!(later.tick, paused.tick);
    assert_eq!(later.body, paused.body);

    // Resuming continues from the exact paused state
    let resumed = session.toggle_pause();
    assert!(resumed.running);
    assert_eq!(resumed.tick, paused.tick);

    sleep(Duration::from_millis(60)).await;
    assert!(session.snapshot().tick > paused.tick);
}

#[tokio::test]
async fn test_stopped_session_never_schedules() {
    let session = session(false);
    session.start();
    assert!(!session.is_scheduled());

    sleep(Duration::from_millis(40)).await;
    assert_eq!(session.snapshot().tick, 0);
}

#[tokio::test]
async fn test_reset_restores_initial_state_and_stops_old_ticks() {
    let session = session(true);
    session.start();
    sleep(Duration::from_millis(60)).await;
    assert!(session.snapshot().tick > 0);

    let reset = session.reset(false);
    assert_eq!(reset.tick, 0);
    assert_eq!(reset.score, 0);
    assert_eq!(reset.body.len(), 1);
    assert_eq!(reset.phase, Phase::Free);
    assert!(!reset.running);

    // No tick scheduled before the reset may land afterwards
    sleep(Duration::from_millis(60)).await;
    assert_eq!(session.snapshot(), reset);
}

#[tokio::test]
async fn test_grid_change_validates_size() {
    let session = session(true);
    session.start();

    assert!(session.set_grid_size(7).is_err());
    assert!(session.set_grid_size(50_000).is_err());
    assert_eq!(session.snapshot().grid_size, 20);

    let changed = session.set_grid_size(12).expect("even size is accepted");
    assert_eq!(changed.grid_size, 12);
    assert_eq!(changed.tick, 0);
    assert!(changed.running);
    assert!(session.is_scheduled());
}

#[tokio::test]
async fn test_subscribers_receive_committed_ticks() {
    let session = session(true);
    let mut updates = session.subscribe();
    session.start();

    timeout(Duration::from_secs(2), updates.changed())
        .await
        .expect("a tick within two seconds")
        .expect("sender alive");

    let published = updates.borrow_and_update().clone();
    assert!(published.tick > 0);
}
