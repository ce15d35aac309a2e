// Phase controller for the self-playing snake
//
// Each call to `step` reads the previous episode state, computes the complete next
// state (body, target, cycle index, phase, score) and commits it in one go. A
// step that would self-collide commits nothing but the phase change it causes.
//
// Phases:
// - Free: greedy roaming toward the target while the board is nearly empty
// - Aligning: walk a fixed list of waypoints that lead onto the cycle entry
// - Hamiltonian: follow the cycle, cutting corners while the board is sparse
// - GameOver: terminal after a crash

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{Config, ControllerConfig};
use crate::cycle::{Cycle, CycleCache};
use crate::food::{FoodPlacer, RandomFoodPlacer};
use crate::scorer::{choose_aligning_step, choose_greedy_move};
use crate::types::{CrashCause, Coord, Outcome, Phase, Snapshot};

/// Complete mutable state of one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeState {
    /// Head first, tail last
    pub body: Vec<Coord>,
    pub target: Option<Coord>,
    pub phase: Phase,
    pub waypoints: Vec<Coord>,
    pub waypoint_index: usize,
    pub cycle_index: usize,
    pub score: u32,
    pub running: bool,
    pub outcome: Option<Outcome>,
    /// Committed steps since the last reset
    pub tick: u64,
}

impl EpisodeState {
    /// A running Free-phase episode with the given body and target
    pub fn new(body: Vec<Coord>, target: Option<Coord>) -> Self {
        EpisodeState {
            body,
            target,
            phase: Phase::Free,
            waypoints: Vec::new(),
            waypoint_index: 0,
            cycle_index: 0,
            score: 0,
            running: true,
            outcome: None,
            tick: 0,
        }
    }

    pub fn head(&self) -> Coord {
        self.body[0]
    }
}

/// What a single call to `step` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Not running or already terminal; nothing changed
    Idle,
    /// The head advanced one cell
    Moved { ate: bool },
    /// Aligning gave up and handed control to the cycle without moving
    Stalled,
    /// The episode reached a terminal condition this tick
    Finished(Outcome),
}

enum Advance {
    Moved { ate: bool, exhausted: bool },
    Collided,
}

/// Looks for a cycle shortcut from `index` toward the target
///
/// A skip of `2..=max_skip` positions is accepted only when the cell is a single
/// orthogonal step from the head, is not on the body, brings the head strictly
/// closer to the target than anything found so far, and does not jump past the
/// target's own position on the cycle.
///
/// # Returns
/// `(cycle index, cell)` of the best shortcut, or `None` to take the default successor
pub fn find_shortcut(
    cycle: &Cycle,
    body: &[Coord],
    target: Option<Coord>,
    index: usize,
    max_skip: usize,
) -> Option<(usize, Coord)> {
    let head = *body.first()?;
    let target = target?;
    let target_index = cycle.position_of(&target)?;
    let steps_to_target = cycle.forward_distance(index, target_index);

    let mut best_distance = head.manhattan(&target);
    let mut best = None;

    for skip in 2..=max_skip {
        if skip > steps_to_target {
            break;
        }

        let candidate_index = (index + skip) % cycle.period();
        let candidate = cycle.cell_at(candidate_index);

        if !candidate.is_adjacent(&head) || body.contains(&candidate) {
            continue;
        }

        let distance = candidate.manhattan(&target);
        if distance < best_distance {
            best_distance = distance;
            best = Some((candidate_index, candidate));
        }
    }

    best
}

/// Drives one snake episode on a fixed grid
pub struct Controller<F: FoodPlacer, R: Rng> {
    config: ControllerConfig,
    grid_size: i32,
    cycle: Arc<Cycle>,
    placer: F,
    rng: R,
    state: EpisodeState,
}

impl<F: FoodPlacer, R: Rng> Controller<F, R> {
    /// Creates a controller with a fresh episode
    ///
    /// # Arguments
    /// * `config` - Heuristic constants, fixed for the controller's lifetime
    /// * `grid_size` - Even side length of the square grid
    /// * `placer` - Target placement collaborator
    /// * `rng` - Random source for tie-breaking
    /// * `running` - Whether the episode starts running
    pub fn new(config: ControllerConfig, grid_size: i32, placer: F, rng: R, running: bool) -> Self {
        let cycle = CycleCache::global().get(grid_size);
        let start = cycle.start();

        let mut controller = Controller {
            config,
            grid_size,
            cycle,
            placer,
            rng,
            state: EpisodeState::new(vec![start], None),
        };
        controller.reset(running);
        controller
    }

    /// Reinitialises the episode regardless of its current phase
    pub fn reset(&mut self, running: bool) {
        let body = vec![self.cycle.start()];
        let target = self.placer.propose(&body, self.grid_size);

        self.state = EpisodeState::new(body, target);
        self.state.running = running;

        if target.is_none() {
            self.finish_board_filled();
        }

        info!(
            "Episode reset on {}x{} grid (running: {})",
            self.grid_size, self.grid_size, self.state.running
        );
    }

    /// Replaces the episode state wholesale, e.g. to resume a recorded episode
    pub fn restore(&mut self, state: EpisodeState) {
        self.state = state;
    }

    /// Sets the running flag; terminal episodes stay stopped until reset
    ///
    /// # Returns
    /// The running flag after the call
    pub fn set_running(&mut self, running: bool) -> bool {
        if running && self.state.outcome.is_some() {
            warn!("Ignoring resume: episode already ended with {:?}", self.state.outcome);
            return false;
        }
        self.state.running = running;
        running
    }

    pub fn state(&self) -> &EpisodeState {
        &self.state
    }

    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }

    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_terminal(&self) -> bool {
        self.state.outcome.is_some()
    }

    /// Body length divided by total grid cells
    pub fn occupancy_ratio(&self) -> f64 {
        let side = self.grid_size as f64;
        self.state.body.len() as f64 / (side * side)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.state.tick,
            grid_size: self.grid_size,
            body: self.state.body.clone(),
            target: self.state.target,
            phase: self.state.phase,
            game_over: self.state.phase == Phase::GameOver,
            board_filled: self.state.outcome == Some(Outcome::BoardFilled),
            outcome: self.state.outcome,
            score: self.state.score,
            running: self.state.running,
            cycle_index: self.state.cycle_index,
        }
    }

    /// Performs one simulation tick
    pub fn step(&mut self) -> StepResult {
        if !self.state.running || self.is_terminal() {
            return StepResult::Idle;
        }

        let result = match self.state.phase {
            Phase::Free => self.step_free(),
            Phase::Aligning => self.step_aligning(),
            Phase::Hamiltonian => self.step_hamiltonian(),
            Phase::GameOver => StepResult::Idle,
        };

        if result != StepResult::Idle {
            self.state.tick += 1;
            debug!(
                "Tick {}: {:?} head={:?} len={} score={} -> {:?}",
                self.state.tick,
                self.state.phase,
                self.state.head(),
                self.state.body.len(),
                self.state.score,
                result
            );
        }

        result
    }

    fn step_free(&mut self) -> StepResult {
        let Some(target) = self.state.target else {
            self.begin_alignment();
            return self.step_aligning();
        };

        if self.occupancy_ratio() >= self.config.alignment_threshold {
            self.begin_alignment();
            return self.step_aligning();
        }

        let head = self.state.head();
        let Some(dir) = choose_greedy_move(
            &head,
            &target,
            &self.state.body,
            self.grid_size,
            self.config.openness_weight,
            &mut self.rng,
        ) else {
            warn!("Free phase boxed in at {:?}", head);
            return self.crash(CrashCause::BoxedIn);
        };

        let next = dir.apply(&head);
        debug!("Free: {} toward {:?}", dir.as_str(), target);
        let (ate, exhausted) = match self.advance_to(next) {
            Advance::Moved { ate, exhausted } => (ate, exhausted),
            Advance::Collided => return self.crash(CrashCause::SelfCollision),
        };

        if let Some(index) = self.cycle.position_of(&next) {
            self.state.cycle_index = index;
        }

        if exhausted {
            return self.finish_board_filled();
        }

        if self.occupancy_ratio() >= self.config.alignment_threshold {
            self.begin_alignment();
        }

        StepResult::Moved { ate }
    }

    fn step_aligning(&mut self) -> StepResult {
        let head = self.state.head();

        let Some(&waypoint) = self.state.waypoints.get(self.state.waypoint_index) else {
            warn!("Waypoint list exhausted during alignment; following the cycle");
            self.enter_hamiltonian();
            return StepResult::Stalled;
        };

        let Some(dir) = choose_aligning_step(
            &head,
            &waypoint,
            &self.state.body,
            self.grid_size,
            &mut self.rng,
        ) else {
            warn!("No aligning step from {:?}; following the cycle", head);
            self.enter_hamiltonian();
            return StepResult::Stalled;
        };

        let next = dir.apply(&head);
        let (ate, exhausted) = match self.advance_to(next) {
            Advance::Moved { ate, exhausted } => (ate, exhausted),
            Advance::Collided => {
                warn!("Aligning step into {:?} would collide; following the cycle", next);
                self.enter_hamiltonian();
                return StepResult::Stalled;
            }
        };

        if exhausted {
            return self.finish_board_filled();
        }

        if next.manhattan(&waypoint) <= self.config.waypoint_reach_distance {
            if self.state.waypoint_index + 1 < self.state.waypoints.len() {
                self.state.waypoint_index += 1;
                debug!(
                    "Reached waypoint {:?}, heading for {:?}",
                    waypoint, self.state.waypoints[self.state.waypoint_index]
                );
            } else {
                self.enter_hamiltonian();
            }
        }

        StepResult::Moved { ate }
    }

    fn step_hamiltonian(&mut self) -> StepResult {
        let head = self.state.head();
        let index = self.state.cycle_index;
        let max_skip = self.config.max_skip_for(self.occupancy_ratio());

        let default_index = (index + 1) % self.cycle.period();
        let (chosen_index, next) = find_shortcut(
            &self.cycle,
            &self.state.body,
            self.state.target,
            index,
            max_skip,
        )
        .unwrap_or((default_index, self.cycle.cell_at(default_index)));

        if !next.is_adjacent(&head) {
            warn!(
                "Cycle successor {:?} of index {} is not adjacent to head {:?}",
                next, index, head
            );
            return self.crash(CrashCause::NoViableMove);
        }

        if chosen_index != default_index {
            debug!(
                "Shortcut: index {} -> {} (skip {})",
                index,
                chosen_index,
                self.cycle.forward_distance(index, chosen_index)
            );
        }

        let (ate, exhausted) = match self.advance_to(next) {
            Advance::Moved { ate, exhausted } => (ate, exhausted),
            Advance::Collided => return self.crash(CrashCause::SelfCollision),
        };
        self.state.cycle_index = chosen_index;

        if exhausted {
            return self.finish_board_filled();
        }

        StepResult::Moved { ate }
    }

    /// Builds the next body and commits it unless the head lands on the body
    fn advance_to(&mut self, next: Coord) -> Advance {
        let ate = self.state.target == Some(next);

        let mut body = Vec::with_capacity(self.state.body.len() + 1);
        body.push(next);
        body.extend_from_slice(&self.state.body);
        if !ate {
            body.pop();
        }

        if body[1..].contains(&next) {
            return Advance::Collided;
        }

        let mut exhausted = false;
        if ate {
            self.state.score += self.config.food_reward;
            self.state.target = self.placer.propose(&body, self.grid_size);
            exhausted = self.state.target.is_none();
        }

        self.state.body = body;
        Advance::Moved { ate, exhausted }
    }

    fn begin_alignment(&mut self) {
        let mid = self.grid_size / 2;
        let max = self.grid_size - 1;

        self.state.waypoints = vec![
            Coord::new(0, mid),
            Coord::new(0, max),
            Coord::new(mid, max),
            self.cycle.start(),
        ];
        self.state.waypoint_index = 0;
        self.state.phase = Phase::Aligning;

        info!(
            "Aligning at occupancy {:.3} (length {})",
            self.occupancy_ratio(),
            self.state.body.len()
        );
    }

    fn enter_hamiltonian(&mut self) {
        let head = self.state.head();
        self.state.cycle_index = self.cycle.position_of(&head).unwrap_or(0);
        self.state.phase = Phase::Hamiltonian;
        self.state.waypoints.clear();
        self.state.waypoint_index = 0;

        info!(
            "Following the cycle from index {} (head {:?})",
            self.state.cycle_index, head
        );
    }

    fn crash(&mut self, cause: CrashCause) -> StepResult {
        let outcome = Outcome::Crashed(cause);
        self.state.phase = Phase::GameOver;
        self.state.running = false;
        self.state.outcome = Some(outcome);

        info!(
            "GAME OVER: {:?} at tick {} (score {}, length {})",
            cause,
            self.state.tick + 1,
            self.state.score,
            self.state.body.len()
        );
        StepResult::Finished(outcome)
    }

    fn finish_board_filled(&mut self) -> StepResult {
        self.state.running = false;
        self.state.outcome = Some(Outcome::BoardFilled);

        info!(
            "Board filled: score {}, length {}",
            self.state.score,
            self.state.body.len()
        );
        StepResult::Finished(Outcome::BoardFilled)
    }
}

/// Controller with seeded-or-OS random food placement and tie-breaking
pub type AutoController = Controller<RandomFoodPlacer<StdRng>, StdRng>;

/// Builds a reproducible controller; tie-breaking and placement use distinct streams
pub fn seeded_controller(config: &Config, grid_size: i32, seed: u64, running: bool) -> AutoController {
    let placer = RandomFoodPlacer::new(
        StdRng::seed_from_u64(seed.wrapping_add(1)),
        config.food.exhaustive_fallback,
    );
    Controller::new(
        config.controller.clone(),
        grid_size,
        placer,
        StdRng::seed_from_u64(seed),
        running,
    )
}

/// Builds a controller from `[game].seed`, falling back to OS entropy
pub fn controller_from_config(config: &Config, grid_size: i32, running: bool) -> AutoController {
    match config.game.seed {
        Some(seed) => seeded_controller(config, grid_size, seed, running),
        None => {
            let placer = RandomFoodPlacer::new(
                StdRng::from_os_rng(),
                config.food.exhaustive_fallback,
            );
            Controller::new(
                config.controller.clone(),
                grid_size,
                placer,
                StdRng::from_os_rng(),
                running,
            )
        }
    }
}
