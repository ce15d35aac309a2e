// Tick driver and session
//
// The session is the single writer of episode state. A fixed-interval tokio task
// calls `Controller::step` once per tick and publishes a snapshot after each
// commit. Every change that affects stepping (running flag, reset, grid size)
// bumps the episode generation and reschedules the timer, so a tick scheduled
// against superseded state exits without stepping.

use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::{validate_grid_size, Config};
use crate::controller::{controller_from_config, AutoController};
use crate::debug_logger::DebugLogger;
use crate::types::Snapshot;

/// Owns at most one live timer task
pub struct TickDriver {
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    pub fn new() -> Self {
        TickDriver { handle: None }
    }

    /// Cancels any existing timer, then runs `tick` every `interval`
    ///
    /// The task stops on its own once `tick` returns false.
    /// Must be called from within a tokio runtime.
    pub fn reschedule<F>(&mut self, interval: Duration, mut tick: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        self.cancel();

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !tick() {
                    break;
                }
            }
        }));
    }

    /// Aborts the live timer, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Default for TickDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct Episode {
    controller: AutoController,
    /// Bumped whenever a scheduled tick must no longer act on this state
    generation: u64,
    /// Bumped on reset and grid change; tags debug log entries
    episode_id: u64,
}

/// A running game: controller, timer, snapshot channel and tick log
pub struct Session {
    config: Config,
    episode: Arc<Mutex<Episode>>,
    driver: Mutex<TickDriver>,
    snapshots: Arc<watch::Sender<Snapshot>>,
    logger: DebugLogger,
}

impl Session {
    /// Builds a session from validated configuration; the timer starts with `start`
    pub fn new(config: Config, logger: DebugLogger) -> Result<Self, String> {
        config.validate()?;

        let controller = controller_from_config(
            &config,
            config.game.grid_size,
            config.game.start_running,
        );
        let (snapshots, _) = watch::channel(controller.snapshot());

        Ok(Session {
            config,
            episode: Arc::new(Mutex::new(Episode {
                controller,
                generation: 0,
                episode_id: 0,
            })),
            driver: Mutex::new(TickDriver::new()),
            snapshots: Arc::new(snapshots),
            logger,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.timing.tick_interval_ms)
    }

    /// Schedules the timer if the episode is running
    pub fn start(&self) {
        let mut episode = self.episode.lock();
        self.reschedule_locked(&mut episode);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.episode.lock().controller.snapshot()
    }

    /// Receives a snapshot after every commit
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub fn is_scheduled(&self) -> bool {
        self.driver.lock().is_active()
    }

    /// Pauses or resumes without touching episode state
    pub fn set_running(&self, running: bool) -> Snapshot {
        let mut episode = self.episode.lock();
        episode.controller.set_running(running);
        info!("Session running: {}", episode.controller.is_running());

        self.publish_locked(&episode);
        self.reschedule_locked(&mut episode);
        episode.controller.snapshot()
    }

    pub fn toggle_pause(&self) -> Snapshot {
        let running = self.episode.lock().controller.is_running();
        self.set_running(!running)
    }

    /// Starts a fresh episode on the current grid
    pub fn reset(&self, running: bool) -> Snapshot {
        let mut episode = self.episode.lock();
        episode.controller.reset(running);
        episode.episode_id += 1;

        self.publish_locked(&episode);
        self.reschedule_locked(&mut episode);
        episode.controller.snapshot()
    }

    /// Replaces the controller with a fresh episode on a new grid size
    pub fn set_grid_size(&self, grid_size: i32) -> Result<Snapshot, String> {
        validate_grid_size(grid_size, self.config.game.max_grid_size)?;

        let mut episode = self.episode.lock();
        let running = episode.controller.is_running();
        episode.controller = controller_from_config(&self.config, grid_size, running);
        episode.episode_id += 1;
        info!("Grid size changed to {}x{}", grid_size, grid_size);

        self.publish_locked(&episode);
        self.reschedule_locked(&mut episode);
        Ok(episode.controller.snapshot())
    }

    fn publish_locked(&self, episode: &Episode) {
        self.snapshots.send_replace(episode.controller.snapshot());
    }

    /// Cancels the live timer and, if still running, schedules a new one bound
    /// to a fresh generation. Caller holds the episode lock.
    fn reschedule_locked(&self, episode: &mut Episode) {
        episode.generation += 1;
        let generation = episode.generation;

        let mut driver = self.driver.lock();
        if !episode.controller.is_running() {
            driver.cancel();
            debug!("Timer cancelled (generation {})", generation);
            return;
        }

        let shared = Arc::clone(&self.episode);
        let snapshots = Arc::clone(&self.snapshots);
        let logger = self.logger.clone();

        driver.reschedule(self.tick_interval(), move || {
            let mut episode = shared.lock();
            if episode.generation != generation {
                return false;
            }

            episode.controller.step();
            let snapshot = episode.controller.snapshot();
            logger.log_tick(episode.episode_id, &snapshot);
            snapshots.send_replace(snapshot);

            episode.controller.is_running()
        });
        debug!(
            "Timer scheduled every {:?} (generation {})",
            self.tick_interval(),
            generation
        );
    }
}
