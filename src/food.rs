// Target placement
//
// The controller only depends on the `FoodPlacer` contract: propose a cell that is
// not on the body, or report that none could be found.

use log::debug;
use rand::Rng;

use crate::types::Coord;

/// Proposes a free cell for the next target
pub trait FoodPlacer {
    /// Returns a cell outside `body`, or `None` when the board is exhausted
    fn propose(&mut self, body: &[Coord], grid_size: i32) -> Option<Coord>;
}

/// Uniform rejection sampling with a bounded number of attempts
pub struct RandomFoodPlacer<R: Rng> {
    rng: R,
    exhaustive_fallback: bool,
}

impl<R: Rng> RandomFoodPlacer<R> {
    /// # Arguments
    /// * `rng` - Random source used for sampling
    /// * `exhaustive_fallback` - Scan the grid for free cells after sampling gives up,
    ///   so that `None` always means no free cell remains
    pub fn new(rng: R, exhaustive_fallback: bool) -> Self {
        RandomFoodPlacer {
            rng,
            exhaustive_fallback,
        }
    }

    fn sample(&mut self, grid_size: i32) -> Coord {
        Coord {
            x: self.rng.random_range(0..grid_size),
            y: self.rng.random_range(0..grid_size),
        }
    }

    fn scan_free_cell(&mut self, body: &[Coord], grid_size: i32) -> Option<Coord> {
        let free: Vec<Coord> = (0..grid_size)
            .flat_map(|y| (0..grid_size).map(move |x| Coord { x, y }))
            .filter(|cell| !body.contains(cell))
            .collect();

        if free.is_empty() {
            return None;
        }
        Some(free[self.rng.random_range(0..free.len())])
    }
}

impl<R: Rng> FoodPlacer for RandomFoodPlacer<R> {
    fn propose(&mut self, body: &[Coord], grid_size: i32) -> Option<Coord> {
        if grid_size <= 0 {
            return None;
        }

        let side = grid_size as usize;
        let attempts = side * side;
        for _ in 0..attempts {
            let candidate = self.sample(grid_size);
            if !body.contains(&candidate) {
                return Some(candidate);
            }
        }

        if !self.exhaustive_fallback {
            debug!("No free cell found after {} attempts", attempts);
            return None;
        }

        let found = self.scan_free_cell(body, grid_size);
        if found.is_none() {
            debug!("Board exhausted: no free cell on {}x{} grid", grid_size, grid_size);
        }
        found
    }
}
