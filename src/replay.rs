// Replay module for auditing recorded tick logs
//
// This module provides functionality to:
// 1. Parse JSONL debug logs written by the debug logger
// 2. Group entries by episode and order them by tick
// 3. Check every transition between consecutive ticks against the game rules
// 4. Generate a summary report

use log::{info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::debug_logger::TickLogEntry;
use crate::simulation::check_body;
use crate::types::Snapshot;

/// A rule broken between two recorded ticks
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub episode: u64,
    pub tick: u64,
    pub message: String,
}

/// Statistics for a complete audit
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub episodes: usize,
    pub total_ticks: usize,
    pub violations: usize,
    pub boards_filled: usize,
    pub crashes: usize,
    pub best_score: u32,
}

/// Audit engine for tick logs
pub struct ReplayEngine {
    food_reward: u32,
    verbose: bool,
}

impl ReplayEngine {
    /// # Arguments
    /// * `food_reward` - Score added per consumed target in the recorded games
    /// * `verbose` - Log every checked transition
    pub fn new(food_reward: u32, verbose: bool) -> Self {
        ReplayEngine {
            food_reward,
            verbose,
        }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<TickLogEntry>, String> {
        let file = File::open(log_path.as_ref())
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: TickLogEntry = serde_json::from_str(&line).map_err(|e| {
                format!("Failed to parse JSON on line {}: {}", line_num + 1, e)
            })?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Groups entries per episode, ordered by tick
    ///
    /// Ticks are logged from spawned tasks, so file order is not guaranteed.
    pub fn group_episodes(entries: &[TickLogEntry]) -> BTreeMap<u64, Vec<Snapshot>> {
        let mut episodes: BTreeMap<u64, Vec<Snapshot>> = BTreeMap::new();
        for entry in entries {
            episodes
                .entry(entry.episode)
                .or_default()
                .push(entry.snapshot.clone());
        }
        for snapshots in episodes.values_mut() {
            snapshots.sort_by_key(|s| s.tick);
            snapshots.dedup_by_key(|s| s.tick);
        }
        episodes
    }

    /// Checks one transition between consecutive recorded ticks
    pub fn check_transition(&self, prev: &Snapshot, next: &Snapshot) -> Vec<String> {
        let mut problems = Vec::new();

        if !next.game_over {
            if let Err(e) = check_body(&next.body, next.grid_size) {
                problems.push(e);
            }
            if let Some(target) = next.target {
                if next.body.contains(&target) {
                    problems.push(format!("target {:?} lies on the body", target));
                }
            }
        }

        // Gaps in the log (lost lines) only allow the per-snapshot checks
        if next.tick != prev.tick + 1 || next.game_over {
            return problems;
        }

        let (Some(prev_head), Some(next_head)) = (prev.head(), next.head()) else {
            problems.push("empty body".to_string());
            return problems;
        };

        if prev.body == next.body {
            // Aligning fallback commits a phase change without moving
            return problems;
        }

        if !prev_head.is_adjacent(&next_head) {
            problems.push(format!(
                "head jumped from {:?} to {:?}",
                prev_head, next_head
            ));
        }

        let gained = next.score.checked_sub(prev.score);
        let grew = next.body.len() as i64 - prev.body.len() as i64;
        match (gained, grew) {
            (Some(0), 0) => {}
            (Some(points), 1) if points == self.food_reward => {
                if prev.target != Some(next_head) {
                    problems.push(format!(
                        "grew at {:?} but the target was {:?}",
                        next_head, prev.target
                    ));
                }
            }
            _ => problems.push(format!(
                "score {} -> {} with length {} -> {}",
                prev.score,
                next.score,
                prev.body.len(),
                next.body.len()
            )),
        }

        problems
    }

    /// Audits every episode in the log
    pub fn audit(&self, entries: &[TickLogEntry]) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (episode, snapshots) in Self::group_episodes(entries) {
            for pair in snapshots.windows(2) {
                let problems = self.check_transition(&pair[0], &pair[1]);

                if self.verbose && problems.is_empty() {
                    info!("Episode {} tick {}: ✓ OK", episode, pair[1].tick);
                }

                for message in problems {
                    warn!("Episode {} tick {}: ✗ {}", episode, pair[1].tick, message);
                    violations.push(Violation {
                        episode,
                        tick: pair[1].tick,
                        message,
                    });
                }
            }
        }

        violations
    }

    /// Generates statistics from an audited log
    pub fn generate_stats(&self, entries: &[TickLogEntry], violations: &[Violation]) -> ReplayStats {
        let episodes = Self::group_episodes(entries);
        let finals: Vec<&Snapshot> = episodes.values().filter_map(|s| s.last()).collect();

        ReplayStats {
            episodes: episodes.len(),
            total_ticks: episodes.values().map(|s| s.len()).sum(),
            violations: violations.len(),
            boards_filled: finals.iter().filter(|s| s.board_filled).count(),
            crashes: finals.iter().filter(|s| s.game_over).count(),
            best_score: finals.iter().map(|s| s.score).max().unwrap_or(0),
        }
    }

    /// Prints a detailed report of the audit
    pub fn print_report(&self, entries: &[TickLogEntry], violations: &[Violation]) {
        let stats = self.generate_stats(entries, violations);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY AUDIT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Episodes:       {}", stats.episodes);
        println!("Ticks:          {}", stats.total_ticks);
        println!("Boards filled:  {}", stats.boards_filled);
        println!("Crashes:        {}", stats.crashes);
        println!("Best score:     {}", stats.best_score);
        println!("Violations:     {}", stats.violations);
        println!("═══════════════════════════════════════════════════════════\n");

        if !violations.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED VIOLATIONS");
            println!("═══════════════════════════════════════════════════════════");

            for violation in violations {
                println!(
                    "Episode {} tick {}: {}",
                    violation.episode, violation.tick, violation.message
                );
            }
            println!();
        }
    }
}
