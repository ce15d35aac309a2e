// Configuration module for reading Snake.toml
// Every tunable of the controller lives here so the phase logic never hardcodes thresholds

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub game: GameConfig,
    pub timing: TimingConfig,
    pub controller: ControllerConfig,
    pub food: FoodConfig,
    pub debug: DebugConfig,
}

/// Episode setup
#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    /// Side length of the square grid; must be even for the cycle to close
    pub grid_size: i32,
    /// Fixed seed for tie-breaking and food placement; random when absent
    pub seed: Option<u64>,
    pub start_running: bool,
    /// Largest side length accepted at startup or through a grid change
    pub max_grid_size: i32,
}

/// Tick scheduling
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub tick_interval_ms: u64,
}

/// Shortcut budget for one occupancy band
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SkipTier {
    /// Tier applies while occupancy ratio is strictly below this value
    pub below_ratio: f64,
    pub max_skip: usize,
}

/// Heuristic constants consumed by the phase controller
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Occupancy ratio at which Free roaming hands over to alignment
    pub alignment_threshold: f64,
    pub food_reward: u32,
    /// Weight of the open-neighbour term in the greedy score
    pub openness_weight: f64,
    pub waypoint_reach_distance: i32,
    /// Max skip once the ratio is past every tier (1 disables shortcuts)
    pub default_max_skip: usize,
    pub skip_tiers: Vec<SkipTier>,
}

impl ControllerConfig {
    /// Largest cycle skip allowed at the given occupancy ratio
    ///
    /// # Arguments
    /// * `ratio` - Body length divided by total grid cells
    ///
    /// # Returns
    /// The `max_skip` of the first tier whose bound exceeds `ratio`,
    /// or `default_max_skip` when none does
    pub fn max_skip_for(&self, ratio: f64) -> usize {
        self.skip_tiers
            .iter()
            .find(|tier| ratio < tier.below_ratio)
            .map(|tier| tier.max_skip)
            .unwrap_or(self.default_max_skip)
    }
}

/// Food placement behaviour
#[derive(Debug, Deserialize, Clone)]
pub struct FoodConfig {
    /// Scan for a free cell when random sampling gives up
    pub exhaustive_fallback: bool,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed and validated configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            game: GameConfig {
                grid_size: 20,
                seed: None,
                start_running: true,
                max_grid_size: 200,
            },
            timing: TimingConfig {
                tick_interval_ms: 50,
            },
            controller: ControllerConfig {
                alignment_threshold: 0.05,
                food_reward: 100,
                openness_weight: 0.3,
                waypoint_reach_distance: 1,
                default_max_skip: 1,
                skip_tiers: vec![
                    SkipTier { below_ratio: 0.10, max_skip: 30 },
                    SkipTier { below_ratio: 0.20, max_skip: 20 },
                    SkipTier { below_ratio: 0.25, max_skip: 15 },
                    SkipTier { below_ratio: 0.30, max_skip: 5 },
                ],
            },
            food: FoodConfig {
                exhaustive_fallback: true,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "snake_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }

    /// Rejects values the controller cannot run with
    pub fn validate(&self) -> Result<(), String> {
        let max = self.game.max_grid_size;
        if max < 2 || max.checked_mul(max).is_none() {
            return Err(format!(
                "game.max_grid_size must be at least 2 and its square must fit in i32, got {}",
                max
            ));
        }
        validate_grid_size(self.game.grid_size, max)?;

        if self.timing.tick_interval_ms == 0 {
            return Err("timing.tick_interval_ms must be positive".to_string());
        }

        let controller = &self.controller;
        if !(0.0..=1.0).contains(&controller.alignment_threshold) {
            return Err(format!(
                "controller.alignment_threshold must be within [0, 1], got {}",
                controller.alignment_threshold
            ));
        }
        if controller.default_max_skip == 0 {
            return Err("controller.default_max_skip must be at least 1".to_string());
        }
        if controller.waypoint_reach_distance < 0 {
            return Err("controller.waypoint_reach_distance must not be negative".to_string());
        }
        let ascending = controller
            .skip_tiers
            .windows(2)
            .all(|pair| pair[0].below_ratio < pair[1].below_ratio);
        if !ascending {
            return Err("controller.skip_tiers must be sorted by ascending below_ratio".to_string());
        }

        Ok(())
    }
}

/// The serpentine cycle only closes on an even, positive grid size
///
/// # Arguments
/// * `grid_size` - Requested side length
/// * `max_grid_size` - Upper bound from `[game].max_grid_size`
pub fn validate_grid_size(grid_size: i32, max_grid_size: i32) -> Result<(), String> {
    if grid_size < 2 || grid_size % 2 != 0 {
        return Err(format!(
            "grid size must be an even number of at least 2, got {}",
            grid_size
        ));
    }
    if grid_size > max_grid_size {
        return Err(format!(
            "grid size {} exceeds the maximum of {}",
            grid_size, max_grid_size
        ));
    }
    Ok(())
}
