// Local move scoring for the Free and Aligning phases
//
// Candidates are the four orthogonal neighbours of the head. A candidate is
// invalid when it leaves the grid or lands on the body (tail included). Ties on
// the best score are broken uniformly at random through the injected `Rng` so
// the snake does not oscillate between equally good cells.

use rand::Rng;

use crate::types::{Coord, Direction};

/// Number of in-bounds, unoccupied orthogonal neighbours of a cell
pub fn open_neighbor_count(cell: &Coord, body: &[Coord], grid_size: i32) -> usize {
    cell.neighbors()
        .iter()
        .filter(|n| n.in_bounds(grid_size) && !body.contains(n))
        .count()
}

fn is_valid_candidate(candidate: &Coord, body: &[Coord], grid_size: i32) -> bool {
    candidate.in_bounds(grid_size) && !body.contains(candidate)
}

/// Greedy score of stepping onto `candidate`; lower is better
///
/// # Returns
/// `None` when the candidate is out of bounds or occupied, otherwise
/// `manhattan(candidate, target) - openness_weight * open_neighbor_count(candidate)`
pub fn score_move(
    candidate: &Coord,
    body: &[Coord],
    target: &Coord,
    grid_size: i32,
    openness_weight: f64,
) -> Option<f64> {
    if !is_valid_candidate(candidate, body, grid_size) {
        return None;
    }

    let distance = candidate.manhattan(target) as f64;
    let openness = open_neighbor_count(candidate, body, grid_size) as f64;
    Some(distance - openness_weight * openness)
}

/// Picks uniformly among the lowest-scoring directions
fn pick_best<R, F>(head: &Coord, rng: &mut R, mut score: F) -> Option<Direction>
where
    R: Rng + ?Sized,
    F: FnMut(&Coord) -> Option<f64>,
{
    let scored: Vec<(Direction, f64)> = Direction::all()
        .iter()
        .filter_map(|&dir| score(&dir.apply(head)).map(|s| (dir, s)))
        .collect();

    let best = scored
        .iter()
        .map(|&(_, s)| s)
        .fold(f64::INFINITY, f64::min);

    let tied: Vec<Direction> = scored
        .iter()
        .filter(|&&(_, s)| s == best)
        .map(|&(dir, _)| dir)
        .collect();

    match tied.len() {
        0 => None,
        1 => Some(tied[0]),
        n => Some(tied[rng.random_range(0..n)]),
    }
}

/// Chooses the Free-phase move toward `target`
///
/// # Returns
/// `None` when all four neighbours are invalid (boxed in)
pub fn choose_greedy_move<R: Rng + ?Sized>(
    head: &Coord,
    target: &Coord,
    body: &[Coord],
    grid_size: i32,
    openness_weight: f64,
    rng: &mut R,
) -> Option<Direction> {
    pick_best(head, rng, |candidate| {
        score_move(candidate, body, target, grid_size, openness_weight)
    })
}

/// Chooses the Aligning-phase step toward `waypoint`, ranked by distance only
///
/// # Returns
/// `None` when all four neighbours are invalid (boxed in)
pub fn choose_aligning_step<R: Rng + ?Sized>(
    head: &Coord,
    waypoint: &Coord,
    body: &[Coord],
    grid_size: i32,
    rng: &mut R,
) -> Option<Direction> {
    pick_best(head, rng, |candidate| {
        is_valid_candidate(candidate, body, grid_size)
            .then(|| candidate.manhattan(waypoint) as f64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    /// Always yields zero, so every tie resolves to the first tied direction
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    #[test]
    fn test_score_rejects_out_of_bounds_and_body() {
        let body = vec![Coord::new(1, 1), Coord::new(1, 2)];
        let target = Coord::new(3, 3);

        assert_eq!(score_move(&Coord::new(-1, 0), &body, &target, 4, 0.3), None);
        assert_eq!(score_move(&Coord::new(4, 0), &body, &target, 4, 0.3), None);
        assert_eq!(score_move(&Coord::new(1, 2), &body, &target, 4, 0.3), None);
    }

    #[test]
    fn test_score_combines_distance_and_openness() {
        let body = vec![Coord::new(1, 1)];
        let target = Coord::new(3, 0);

        // (2,1): distance 2, neighbours (2,2) (2,0) (3,1) open, (1,1) body
        let score = score_move(&Coord::new(2, 1), &body, &target, 4, 0.3).unwrap();
        assert!((score - (2.0 - 0.9)).abs() < 1e-9);

        // Corner (0,0): distance 3, two in-bounds open neighbours
        let corner = score_move(&Coord::new(0, 0), &body, &target, 4, 0.3).unwrap();
        assert!((corner - (3.0 - 0.6)).abs() < 1e-9);
    }

    #[test]
    fn test_greedy_moves_toward_target() {
        let body = vec![Coord::new(1, 0), Coord::new(1, 1), Coord::new(2, 1)];
        let dir = choose_greedy_move(&body[0], &Coord::new(3, 0), &body, 4, 0.3, &mut ZeroRng);
        assert_eq!(dir, Some(Direction::Right));
    }

    #[test]
    fn test_greedy_prefers_roomier_cell_at_equal_distance() {
        // Up (1,2) and Right (2,1) are both one step from the target, but the
        // body hems in (2,1) from below
        let body = vec![Coord::new(1, 1), Coord::new(1, 0), Coord::new(2, 0)];
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..50 {
            let dir = choose_greedy_move(&body[0], &Coord::new(2, 2), &body, 4, 0.3, &mut rng);
            assert_eq!(dir, Some(Direction::Up));
        }
    }

    #[test]
    fn test_greedy_never_picks_invalid_cells() {
        let mut rng = StdRng::seed_from_u64(11);
        let body = vec![Coord::new(0, 0), Coord::new(0, 1)];
        for _ in 0..100 {
            let dir = choose_greedy_move(&body[0], &Coord::new(3, 3), &body, 4, 0.3, &mut rng)
                .expect("right is always open");
            assert_eq!(dir, Direction::Right);
        }
    }

    #[test]
    fn test_boxed_in_reports_no_move() {
        // Head in the corner with both neighbours occupied
        let body = vec![
            Coord::new(0, 0),
            Coord::new(1, 0),
            Coord::new(1, 1),
            Coord::new(0, 1),
        ];
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(
            choose_greedy_move(&body[0], &Coord::new(3, 3), &body, 4, 0.3, &mut rng),
            None
        );
        assert_eq!(
            choose_aligning_step(&body[0], &Coord::new(3, 3), &body, 4, &mut rng),
            None
        );
    }

    #[test]
    fn test_zero_rng_breaks_ties_toward_first_direction() {
        // From (1,1) to (2,2), Up and Right are equally close
        let body = vec![Coord::new(1, 1)];
        let step = choose_aligning_step(&body[0], &Coord::new(2, 2), &body, 4, &mut ZeroRng);
        assert_eq!(step, Some(Direction::Up));
    }

    #[test]
    fn test_random_tie_break_reaches_every_tied_direction() {
        let body = vec![Coord::new(1, 1)];
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..200 {
            let step = choose_aligning_step(&body[0], &Coord::new(2, 2), &body, 4, &mut rng)
                .expect("open board");
            seen.insert(step);
        }

        assert_eq!(
            seen,
            [Direction::Up, Direction::Right].into_iter().collect()
        );
    }
}
