// Core value types shared by the controller, the tick driver and the HTTP layer

use serde::{Deserialize, Serialize};

/// 2D coordinate on the grid
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Calculates Manhattan distance between two coordinates
    pub fn manhattan(&self, other: &Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// True when the two cells share an edge
    pub fn is_adjacent(&self, other: &Coord) -> bool {
        self.manhattan(other) == 1
    }

    /// Checks if a coordinate lies inside a square grid of the given size
    pub fn in_bounds(&self, grid_size: i32) -> bool {
        self.x >= 0 && self.x < grid_size && self.y >= 0 && self.y < grid_size
    }

    /// The four orthogonal neighbours, in `Direction::all()` order
    pub fn neighbors(&self) -> [Coord; 4] {
        Direction::all().map(|dir| dir.apply(self))
    }
}

/// Represents the four possible movement directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all possible directions
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Calculates the next coordinate when moving in this direction
    pub fn apply(&self, coord: &Coord) -> Coord {
        match self {
            Direction::Up => Coord { x: coord.x, y: coord.y + 1 },
            Direction::Down => Coord { x: coord.x, y: coord.y - 1 },
            Direction::Left => Coord { x: coord.x - 1, y: coord.y },
            Direction::Right => Coord { x: coord.x + 1, y: coord.y },
        }
    }
}

/// Move-selection strategy active for the current tick
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Greedy roaming toward food while the board is nearly empty
    Free,
    /// Walking a fixed list of waypoints onto the cycle entry
    Aligning,
    /// Following the cycle, with shortcuts while the board is sparse
    Hamiltonian,
    GameOver,
}

/// Why an episode crashed
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrashCause {
    /// Every orthogonal move was out of bounds or on the body
    BoxedIn,
    SelfCollision,
    /// The cycle successor was not a single step away from the head
    NoViableMove,
}

/// Terminal condition of an episode
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "cause")]
pub enum Outcome {
    Crashed(CrashCause),
    /// No free cell was left for the next target
    BoardFilled,
}

impl Outcome {
    pub fn is_crash(&self) -> bool {
        matches!(self, Outcome::Crashed(_))
    }
}

/// Read-only copy of the episode state, published after every committed tick
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tick: u64,
    pub grid_size: i32,
    pub body: Vec<Coord>,
    pub target: Option<Coord>,
    pub phase: Phase,
    pub game_over: bool,
    pub board_filled: bool,
    pub outcome: Option<Outcome>,
    pub score: u32,
    pub running: bool,
    pub cycle_index: usize,
}

impl Snapshot {
    pub fn head(&self) -> Option<Coord> {
        self.body.first().copied()
    }
}
