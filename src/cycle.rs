// Serpentine Hamiltonian cycle over a square grid
//
// Row 0 is scanned left to right across the full width. The remaining rows are
// scanned boustrophedon-style over columns 1.., and column 0 is kept free as a
// return lane walked from the bottom row back up to the start. With an even
// number of rows the last serpentine row ends next to that lane, so the walk
// closes into a loop that visits every cell exactly once.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::types::Coord;

/// Closed traversal of every grid cell; immutable once generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    grid_size: i32,
    /// `grid_size² + 1` cells, last one repeating the first
    cells: Vec<Coord>,
    /// Open-loop index of each cell, addressed by `y * grid_size + x`
    positions: Vec<usize>,
}

/// Builds the boustrophedon cycle for an even grid size
///
/// Odd sizes produce a path whose closing edge is not a single step; callers
/// validate the size upstream (see `config::validate_grid_size`).
pub fn generate_cycle(grid_size: i32) -> Cycle {
    debug_assert!(
        grid_size >= 2 && grid_size % 2 == 0,
        "serpentine cycle needs an even grid size, got {}",
        grid_size
    );

    let side = grid_size.max(0) as usize;
    let mut cells = Vec::with_capacity(side * side + 1);

    cells.extend((0..grid_size).map(|x| Coord { x, y: 0 }));
    for y in 1..grid_size {
        if y % 2 == 1 {
            cells.extend((1..grid_size).rev().map(|x| Coord { x, y }));
        } else {
            cells.extend((1..grid_size).map(|x| Coord { x, y }));
        }
    }
    cells.extend((1..grid_size).rev().map(|y| Coord { x: 0, y }));

    let mut positions = vec![0; side * side];
    for (index, cell) in cells.iter().enumerate() {
        positions[cell.y as usize * side + cell.x as usize] = index;
    }

    if let Some(&first) = cells.first() {
        cells.push(first);
    }

    Cycle {
        grid_size,
        cells,
        positions,
    }
}

impl Cycle {
    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }

    /// Every cell including the repeated closing cell
    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    /// Stored cells, including the closing cell; use `period` for the loop length
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of distinct cells in the loop (`grid_size²`)
    pub fn period(&self) -> usize {
        self.positions.len()
    }

    /// First cell of the cycle, also its closing cell
    pub fn start(&self) -> Coord {
        self.cells[0]
    }

    /// Cell at an open-loop index; wraps past the closing cell
    pub fn cell_at(&self, index: usize) -> Coord {
        self.cells[index % self.period()]
    }

    /// Open-loop index of a cell, `None` when it lies outside the grid
    pub fn position_of(&self, cell: &Coord) -> Option<usize> {
        if !cell.in_bounds(self.grid_size) {
            return None;
        }
        let side = self.grid_size as usize;
        self.positions
            .get(cell.y as usize * side + cell.x as usize)
            .copied()
    }

    /// Steps needed to go from `from` to `to` moving forward along the loop
    pub fn forward_distance(&self, from: usize, to: usize) -> usize {
        let period = self.period();
        (to % period + period - from % period) % period
    }
}

/// Process-wide memo of cycles keyed by grid size
pub struct CycleCache {
    cycles: Mutex<HashMap<i32, Arc<Cycle>>>,
}

impl CycleCache {
    pub fn new() -> Self {
        CycleCache {
            cycles: Mutex::new(HashMap::new()),
        }
    }

    /// Shared cache used by every controller in the process
    pub fn global() -> &'static CycleCache {
        static CACHE: OnceLock<CycleCache> = OnceLock::new();
        CACHE.get_or_init(CycleCache::new)
    }

    /// Returns the cycle for `grid_size`, generating it on first use
    pub fn get(&self, grid_size: i32) -> Arc<Cycle> {
        self.cycles
            .lock()
            .entry(grid_size)
            .or_insert_with(|| {
                log::debug!("Generating Hamiltonian cycle for {}x{} grid", grid_size, grid_size);
                Arc::new(generate_cycle(grid_size))
            })
            .clone()
    }
}

impl Default for CycleCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_serpentine_order_on_4x4() {
        let cycle = generate_cycle(4);
        let expected = vec![
            Coord::new(0, 0),
            Coord::new(1, 0),
            Coord::new(2, 0),
            Coord::new(3, 0),
            Coord::new(3, 1),
            Coord::new(2, 1),
            Coord::new(1, 1),
            Coord::new(1, 2),
            Coord::new(2, 2),
            Coord::new(3, 2),
            Coord::new(3, 3),
            Coord::new(2, 3),
            Coord::new(1, 3),
            Coord::new(0, 3),
            Coord::new(0, 2),
            Coord::new(0, 1),
            Coord::new(0, 0),
        ];

        assert_eq!(cycle.cells(), expected.as_slice());
        assert_eq!(cycle.len(), 17);
        assert_eq!(cycle.period(), 16);
    }

    #[test]
    fn test_smallest_grid_cycle() {
        let cycle = generate_cycle(2);
        assert_eq!(
            cycle.cells(),
            &[
                Coord::new(0, 0),
                Coord::new(1, 0),
                Coord::new(1, 1),
                Coord::new(0, 1),
                Coord::new(0, 0),
            ]
        );
    }

    #[test]
    fn test_cycle_is_closed_and_covers_grid() {
        for grid_size in (2..=12).step_by(2) {
            let cycle = generate_cycle(grid_size);
            let cells = cycle.cells();
            let open = &cells[..cells.len() - 1];

            assert_eq!(cells.first(), cells.last());
            let unique: HashSet<&Coord> = open.iter().collect();
            assert_eq!(unique.len(), (grid_size * grid_size) as usize);

            for pair in cells.windows(2) {
                assert!(
                    pair[0].is_adjacent(&pair[1]),
                    "{:?} -> {:?} not adjacent on grid {}",
                    pair[0],
                    pair[1],
                    grid_size
                );
            }
        }
    }

    #[test]
    fn test_position_of_matches_cells() {
        let cycle = generate_cycle(6);
        for (index, cell) in cycle.cells()[..cycle.period()].iter().enumerate() {
            assert_eq!(cycle.position_of(cell), Some(index));
        }
        assert_eq!(cycle.position_of(&Coord::new(6, 0)), None);
        assert_eq!(cycle.position_of(&Coord::new(-1, 2)), None);
    }

    #[test]
    fn test_cell_at_wraps_past_closing_cell() {
        let cycle = generate_cycle(4);
        assert_eq!(cycle.cell_at(15), Coord::new(0, 1));
        assert_eq!(cycle.cell_at(16), Coord::new(0, 0));
        assert_eq!(cycle.cell_at(17), Coord::new(1, 0));
    }

    #[test]
    fn test_forward_distance_wraps() {
        let cycle = generate_cycle(4);
        assert_eq!(cycle.forward_distance(3, 5), 2);
        assert_eq!(cycle.forward_distance(14, 1), 3);
        assert_eq!(cycle.forward_distance(7, 7), 0);
    }

    #[test]
    fn test_cache_returns_shared_instance() {
        let cache = CycleCache::new();
        let a = cache.get(8);
        let b = cache.get(8);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.grid_size(), 8);
    }
}
