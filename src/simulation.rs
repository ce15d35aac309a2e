// Headless episode runner
//
// Runs seeded episodes without a timer, checking body invariants after every
// tick. Batches are spread over the rayon thread pool.

use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashSet;

use crate::config::Config;
use crate::controller::{seeded_controller, StepResult};
use crate::types::{Coord, Outcome};

/// Result of a single headless episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub seed: u64,
    pub grid_size: i32,
    /// `None` when the tick cap was hit first
    pub outcome: Option<Outcome>,
    pub ticks: u64,
    pub score: u32,
    pub final_length: usize,
    /// Ticks whose committed body broke an invariant
    pub invariant_violations: Vec<String>,
}

/// Aggregate over a batch of episodes
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub episodes: usize,
    pub boards_filled: usize,
    pub crashes: usize,
    pub capped: usize,
    pub average_score: f64,
    pub average_ticks: f64,
    pub invariant_violations: usize,
}

/// Checks distinctness and adjacency of a committed body
pub fn check_body(body: &[Coord], grid_size: i32) -> Result<(), String> {
    if body.is_empty() {
        return Err("body is empty".to_string());
    }

    if let Some(cell) = body.iter().find(|cell| !cell.in_bounds(grid_size)) {
        return Err(format!("cell {:?} is out of bounds", cell));
    }

    let mut seen = HashSet::with_capacity(body.len());
    if let Some(cell) = body.iter().find(|cell| !seen.insert(**cell)) {
        return Err(format!("cell {:?} appears twice", cell));
    }

    if let Some(pair) = body.windows(2).find(|pair| !pair[0].is_adjacent(&pair[1])) {
        return Err(format!("{:?} and {:?} are not adjacent", pair[0], pair[1]));
    }

    Ok(())
}

/// Runs one episode from a fresh reset until it ends or `max_ticks` pass
pub fn run_episode(config: &Config, grid_size: i32, seed: u64, max_ticks: u64) -> EpisodeSummary {
    let mut controller = seeded_controller(config, grid_size, seed, true);
    let mut invariant_violations = Vec::new();

    while controller.state().tick < max_ticks {
        let result = controller.step();

        let state = controller.state();
        if !state.outcome.map_or(false, |o| o.is_crash()) {
            if let Err(e) = check_body(&state.body, grid_size) {
                invariant_violations.push(format!("tick {}: {}", state.tick, e));
            }
            if let Some(target) = state.target {
                if state.body.contains(&target) {
                    invariant_violations.push(format!(
                        "tick {}: target {:?} is on the body",
                        state.tick, target
                    ));
                }
            }
        }

        if result == StepResult::Idle || controller.is_terminal() {
            break;
        }
    }

    let state = controller.state();
    EpisodeSummary {
        seed,
        grid_size,
        outcome: state.outcome,
        ticks: state.tick,
        score: state.score,
        final_length: state.body.len(),
        invariant_violations,
    }
}

/// Runs `episodes` seeded episodes in parallel, seeds `base_seed..base_seed + episodes`
pub fn run_batch(
    config: &Config,
    grid_size: i32,
    episodes: usize,
    base_seed: u64,
    max_ticks: u64,
) -> (Vec<EpisodeSummary>, BatchSummary) {
    info!(
        "Simulating {} episodes on {}x{} grid ({} threads)",
        episodes,
        grid_size,
        grid_size,
        rayon::current_num_threads()
    );

    let mut results: Vec<EpisodeSummary> = (0..episodes as u64)
        .into_par_iter()
        .map(|offset| run_episode(config, grid_size, base_seed + offset, max_ticks))
        .collect();
    results.sort_by_key(|summary| summary.seed);

    for summary in results.iter().filter(|s| !s.invariant_violations.is_empty()) {
        warn!(
            "Seed {}: {} invariant violations (first: {})",
            summary.seed,
            summary.invariant_violations.len(),
            summary.invariant_violations[0]
        );
    }

    let summary = summarize(&results);
    (results, summary)
}

/// Aggregates episode results
pub fn summarize(results: &[EpisodeSummary]) -> BatchSummary {
    let episodes = results.len();
    if episodes == 0 {
        return BatchSummary::default();
    }

    BatchSummary {
        episodes,
        boards_filled: results
            .iter()
            .filter(|r| r.outcome == Some(Outcome::BoardFilled))
            .count(),
        crashes: results
            .iter()
            .filter(|r| r.outcome.map_or(false, |o| o.is_crash()))
            .count(),
        capped: results.iter().filter(|r| r.outcome.is_none()).count(),
        average_score: results.iter().map(|r| r.score as f64).sum::<f64>() / episodes as f64,
        average_ticks: results.iter().map(|r| r.ticks as f64).sum::<f64>() / episodes as f64,
        invariant_violations: results.iter().map(|r| r.invariant_violations.len()).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_body_accepts_connected_snake() {
        let body = vec![Coord::new(1, 1), Coord::new(1, 0), Coord::new(0, 0)];
        assert!(check_body(&body, 4).is_ok());
    }

    #[test]
    fn test_check_body_rejects_duplicates_and_gaps() {
        let duplicate = vec![Coord::new(1, 1), Coord::new(1, 0), Coord::new(1, 1)];
        assert!(check_body(&duplicate, 4).is_err());

        let gap = vec![Coord::new(0, 0), Coord::new(2, 0)];
        assert!(check_body(&gap, 4).is_err());

        let outside = vec![Coord::new(4, 0)];
        assert!(check_body(&outside, 4).is_err());
    }

    #[test]
    fn test_summarize_counts_outcomes() {
        let base = EpisodeSummary {
            seed: 0,
            grid_size: 4,
            outcome: Some(Outcome::BoardFilled),
            ticks: 10,
            score: 1500,
            final_length: 16,
            invariant_violations: vec![],
        };
        let crashed = EpisodeSummary {
            seed: 1,
            outcome: Some(Outcome::Crashed(crate::types::CrashCause::SelfCollision)),
            ticks: 30,
            score: 500,
            ..base.clone()
        };
        let capped = EpisodeSummary {
            seed: 2,
            outcome: None,
            ticks: 20,
            score: 1000,
            ..base.clone()
        };

        let summary = summarize(&[base, crashed, capped]);
        assert_eq!(summary.episodes, 3);
        assert_eq!(summary.boards_filled, 1);
        assert_eq!(summary.crashes, 1);
        assert_eq!(summary.capped, 1);
        assert!((summary.average_score - 1000.0).abs() < 1e-9);
        assert!((summary.average_ticks - 20.0).abs() < 1e-9);
    }
}
