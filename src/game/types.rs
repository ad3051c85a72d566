use super::constants::{APPLE_POINTS, BOOSTED_APPLE_POINTS, LEMON_POINTS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
  pub x: i32,
  pub y: i32,
}

impl Position {
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
  Up,
  Down,
  Left,
  Right,
}

impl Direction {
  pub const ALL: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
  ];

  pub fn opposite(self) -> Self {
    match self {
      Self::Up => Self::Down,
      Self::Down => Self::Up,
      Self::Left => Self::Right,
      Self::Right => Self::Left,
    }
  }

  pub fn delta(self) -> (i32, i32) {
    match self {
      Self::Up => (0, -1),
      Self::Down => (0, 1),
      Self::Left => (-1, 0),
      Self::Right => (1, 0),
    }
  }

  pub fn is_horizontal(self) -> bool {
    matches!(self, Self::Left | Self::Right)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
  Apple,
  Lemon,
}

impl FoodKind {
  /// Points for eating this item. The apple boost never touches lemons.
  pub fn points(self, boosted: bool) -> u32 {
    match self {
      Self::Lemon => LEMON_POINTS,
      Self::Apple if boosted => BOOSTED_APPLE_POINTS,
      Self::Apple => APPLE_POINTS,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Food {
  #[serde(flatten)]
  pub position: Position,
  pub kind: FoodKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CellKind {
  Empty,
  SnakeBody,
  OpponentBody,
  Apple,
  Lemon,
}

/// Boundary rule for a session grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Topology {
  /// Coordinates wrap modulo the grid size.
  OpenWorld,
  /// The outermost ring of cells is solid.
  Walled,
}

impl Topology {
  pub fn step(self, from: Position, direction: Direction, grid_size: i32) -> Position {
    let (dx, dy) = direction.delta();
    let x = from.x + dx;
    let y = from.y + dy;
    match self {
      Self::OpenWorld => Position::new(x.rem_euclid(grid_size), y.rem_euclid(grid_size)),
      Self::Walled => Position::new(x, y),
    }
  }

  pub fn is_wall(self, position: Position, grid_size: i32) -> bool {
    match self {
      Self::OpenWorld => false,
      Self::Walled => is_boundary_ring(position, grid_size),
    }
  }
}

/// True for cells on or outside the outermost ring of a square grid.
pub fn is_boundary_ring(position: Position, grid_size: i32) -> bool {
  position.x <= 0 || position.y <= 0 || position.x >= grid_size - 1 || position.y >= grid_size - 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
  Idle,
  Playing,
  Paused,
  GameOver,
}
