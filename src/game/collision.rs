use super::bots::{Bot, BotId};
use super::types::{Position, Topology};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
  None,
  Wall,
  SelfBody,
  Opponent(BotId),
}

impl Collision {
  pub fn is_terminal(self) -> bool {
    !matches!(self, Self::None)
  }

  pub fn describe(self) -> &'static str {
    match self {
      Self::None => "none",
      Self::Wall => "wall",
      Self::SelfBody => "self",
      Self::Opponent(_) => "opponent",
    }
  }
}

/// Classifies a proposed head cell.
///
/// `body` is the current snake without its head. Walls only exist under the
/// walled topology and are never suppressed; immunity hides self and opponent
/// hits for this step entirely.
pub fn resolve(
  head: Position,
  mut body: impl Iterator<Item = Position>,
  opponents: &[Bot],
  immune: bool,
  topology: Topology,
  grid_size: i32,
) -> Collision {
  if topology.is_wall(head, grid_size) {
    return Collision::Wall;
  }
  if immune {
    return Collision::None;
  }
  if body.any(|segment| segment == head) {
    return Collision::SelfBody;
  }
  if let Some(bot) = opponents.iter().find(|bot| bot.snake.contains(head)) {
    return Collision::Opponent(bot.id);
  }
  Collision::None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::game::snake::Snake;
  use crate::game::types::Direction;

  fn bot_at(id: BotId, cells: &[(i32, i32)]) -> Bot {
    let snake =
      Snake::from_segments(cells.iter().map(|(x, y)| Position::new(*x, *y))).unwrap();
    Bot::new(id, snake, Direction::Left)
  }

  fn body(cells: &[(i32, i32)]) -> impl Iterator<Item = Position> + '_ {
    cells.iter().map(|(x, y)| Position::new(*x, *y))
  }

  #[test]
  fn empty_cell_is_no_collision() {
    let collision = resolve(
      Position::new(4, 4),
      body(&[(3, 4), (2, 4)]),
      &[],
      false,
      Topology::OpenWorld,
      20,
    );
    assert_eq!(collision, Collision::None);
  }

  #[test]
  fn self_hit_is_detected() {
    let collision = resolve(
      Position::new(3, 4),
      body(&[(3, 4), (2, 4)]),
      &[],
      false,
      Topology::OpenWorld,
      20,
    );
    assert_eq!(collision, Collision::SelfBody);
  }

  #[test]
  fn opponent_hit_reports_bot_id() {
    let bots = [bot_at(1, &[(10, 10)]), bot_at(2, &[(6, 6), (7, 6)])];
    let collision = resolve(
      Position::new(7, 6),
      body(&[]),
      &bots,
      false,
      Topology::Walled,
      30,
    );
    assert_eq!(collision, Collision::Opponent(2));
  }

  #[test]
  fn immunity_suppresses_self_and_opponent() {
    let bots = [bot_at(1, &[(5, 5)])];
    assert_eq!(
      resolve(
        Position::new(3, 4),
        body(&[(3, 4)]),
        &bots,
        true,
        Topology::Walled,
        30
      ),
      Collision::None
    );
    assert_eq!(
      resolve(Position::new(5, 5), body(&[]), &bots, true, Topology::Walled, 30),
      Collision::None
    );
  }

  #[test]
  fn walls_only_exist_in_rooms_and_ignore_immunity() {
    let head = Position::new(0, 5);
    assert_eq!(
      resolve(head, body(&[]), &[], true, Topology::Walled, 30),
      Collision::Wall
    );
    assert_eq!(
      resolve(head, body(&[]), &[], false, Topology::OpenWorld, 30),
      Collision::None
    );
  }
}
