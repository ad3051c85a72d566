use super::bots::{step_bot, Bot, BotEvent};
use super::collision::{self, Collision};
use super::constants::{PLAYER_START, SPAWN_MARGIN};
use super::generator::{free_cell, generate_batch, FoodPlan};
use super::modifiers::{ActiveModifier, ActiveModifiers, ModifierEffect, ModifierSpec};
use super::rooms::Room;
use super::snake::Snake;
use super::types::{CellKind, Direction, Food, FoodKind, Phase, Position, Topology};
use rand::Rng;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
  /// The session was not playing; nothing moved.
  Skipped,
  Moved,
  Ate {
    kind: FoodKind,
    points: u32,
    boosted: bool,
  },
  GameOver {
    collision: Collision,
    score: u32,
    /// Points handed to the bot the player ran into.
    stolen_by: Option<String>,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
  Activated,
  AlreadyActive,
  NotRunning,
}

/// One player's run: phase, snake, food field, score and active modifiers.
///
/// Every mutation goes through the methods below; the room (grid, bots, top
/// score) is passed in by the caller and must match the session topology.
#[derive(Debug, Clone)]
pub struct GameSession {
  phase: Phase,
  topology: Topology,
  grid_size: i32,
  snake: Snake,
  direction: Direction,
  next_direction: Direction,
  food: Vec<Food>,
  score: u32,
  modifiers: ActiveModifiers,
  tick_count: u64,
}

impl GameSession {
  pub fn open_world(grid_size: i32) -> Self {
    Self::new(Topology::OpenWorld, grid_size)
  }

  pub fn walled(grid_size: i32) -> Self {
    Self::new(Topology::Walled, grid_size)
  }

  fn new(topology: Topology, grid_size: i32) -> Self {
    Self {
      phase: Phase::Idle,
      topology,
      grid_size,
      snake: Snake::new(Position::new(PLAYER_START.0, PLAYER_START.1)),
      direction: Direction::Right,
      next_direction: Direction::Right,
      food: Vec::new(),
      score: 0,
      modifiers: ActiveModifiers::default(),
      tick_count: 0,
    }
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn is_playing(&self) -> bool {
    self.phase == Phase::Playing
  }

  pub fn topology(&self) -> Topology {
    self.topology
  }

  pub fn grid_size(&self) -> i32 {
    self.grid_size
  }

  pub fn snake(&self) -> &Snake {
    &self.snake
  }

  pub fn direction(&self) -> Direction {
    self.direction
  }

  #[cfg(test)]
  pub fn next_direction(&self) -> Direction {
    self.next_direction
  }

  pub fn food(&self) -> &[Food] {
    &self.food
  }

  pub fn score(&self) -> u32 {
    self.score
  }

  pub fn modifiers(&self) -> &ActiveModifiers {
    &self.modifiers
  }

  pub fn tick_count(&self) -> u64 {
    self.tick_count
  }

  pub fn is_fast(&self) -> bool {
    self.modifiers.has_effect(ModifierEffect::Speed)
  }

  /// `idle -> playing` with a fresh round. Any other phase is left alone.
  pub fn start<R: Rng>(&mut self, room: Option<&Room>, rng: &mut R) -> bool {
    if self.phase != Phase::Idle {
      return false;
    }
    self.reset_round(room, rng);
    true
  }

  pub fn pause(&mut self) -> bool {
    if self.phase != Phase::Playing {
      return false;
    }
    self.phase = Phase::Paused;
    true
  }

  pub fn resume(&mut self) -> bool {
    if self.phase != Phase::Paused {
      return false;
    }
    self.phase = Phase::Playing;
    true
  }

  /// Re-initializes the round from any phase, including a finished one.
  pub fn restart<R: Rng>(&mut self, room: Option<&Room>, rng: &mut R) {
    self.reset_round(room, rng);
  }

  /// Queues a turn for the next tick. Reversing the committed direction is
  /// dropped, as is input outside a running round.
  pub fn set_direction(&mut self, direction: Direction) -> bool {
    if !matches!(self.phase, Phase::Playing | Phase::Paused) {
      return false;
    }
    if direction == self.direction.opposite() {
      return false;
    }
    self.next_direction = direction;
    true
  }

  pub fn activate_modifier(&mut self, spec: &ModifierSpec) -> Activation {
    if !matches!(self.phase, Phase::Playing | Phase::Paused) {
      return Activation::NotRunning;
    }
    if self.modifiers.activate(spec) {
      Activation::Activated
    } else {
      Activation::AlreadyActive
    }
  }

  /// One second of modifier countdown; returns the modifiers that expired.
  pub fn tick_modifiers(&mut self) -> Vec<ActiveModifier> {
    if self.phase != Phase::Playing {
      return Vec::new();
    }
    self.modifiers.countdown()
  }

  /// One movement step of the player snake.
  ///
  /// Collisions are settled before food, and food before regeneration. The
  /// room top score is checked after every bite and at game over, where any
  /// bot steal is applied too; folding the score into the profile is left to
  /// the caller.
  pub fn advance<R: Rng>(
    &mut self,
    mut room: Option<&mut Room>,
    player_name: &str,
    rng: &mut R,
  ) -> TickOutcome {
    if self.phase != Phase::Playing {
      return TickOutcome::Skipped;
    }
    self.tick_count += 1;
    self.direction = self.next_direction;

    let new_head = self
      .topology
      .step(self.snake.head(), self.direction, self.grid_size);
    let immune = self.modifiers.has_effect(ModifierEffect::Immunity);
    let opponents: &[Bot] = room.as_deref().map(|room| room.bots.as_slice()).unwrap_or(&[]);
    let collision = collision::resolve(
      new_head,
      self.snake.tail_segments(),
      opponents,
      immune,
      self.topology,
      self.grid_size,
    );
    if collision.is_terminal() {
      return self.finish(collision, room.as_deref_mut(), player_name);
    }

    let boosted = self.modifiers.has_effect(ModifierEffect::PointBoost);
    let Some(index) = self.food.iter().position(|item| item.position == new_head) else {
      self.snake.advance(new_head, false);
      return TickOutcome::Moved;
    };

    let eaten = self.food.remove(index);
    let points = eaten.kind.points(boosted);
    self.score += points;
    self.snake.advance(new_head, true);
    if let Some(room) = room.as_deref_mut() {
      room.record_score(player_name, self.score);
    }
    if self.food.is_empty() {
      self.regenerate_food(room.as_deref(), rng);
    }
    TickOutcome::Ate {
      kind: eaten.kind,
      points,
      boosted: boosted && eaten.kind == FoodKind::Apple,
    }
  }

  /// One bot-clock step for every bot in `room`. Bots share the food field
  /// with the player and refill it when they empty it.
  pub fn advance_bots<R: Rng>(&mut self, room: &mut Room, rng: &mut R) -> Vec<BotEvent> {
    if self.phase != Phase::Playing || self.topology != Topology::Walled {
      return Vec::new();
    }
    let mut events = Vec::new();
    for index in 0..room.bots.len() {
      let occupied = self.occupied(Some(&*room));
      let event = step_bot(
        &mut room.bots[index],
        &mut self.food,
        self.grid_size,
        &occupied,
        rng,
      );
      if let Some(BotEvent::Ate { score, .. }) = &event {
        let name = room.bots[index].name.clone();
        room.record_score(&name, *score);
      }
      events.extend(event);
    }
    if self.food.is_empty() {
      self.regenerate_food(Some(&*room), rng);
    }
    events
  }

  pub fn cell_kind(&self, position: Position, room: Option<&Room>) -> CellKind {
    if self.snake.contains(position) {
      return CellKind::SnakeBody;
    }
    if let Some(room) = room {
      if room.bots.iter().any(|bot| bot.snake.contains(position)) {
        return CellKind::OpponentBody;
      }
    }
    match self.food.iter().find(|item| item.position == position) {
      Some(item) if item.kind == FoodKind::Lemon => CellKind::Lemon,
      Some(_) => CellKind::Apple,
      None => CellKind::Empty,
    }
  }

  /// Row-major classification of every cell, `board[y][x]`.
  pub fn board(&self, room: Option<&Room>) -> Vec<Vec<CellKind>> {
    (0..self.grid_size)
      .map(|y| {
        (0..self.grid_size)
          .map(|x| self.cell_kind(Position::new(x, y), room))
          .collect()
      })
      .collect()
  }

  fn finish(&mut self, collision: Collision, room: Option<&mut Room>, player_name: &str) -> TickOutcome {
    self.phase = Phase::GameOver;
    self.modifiers.clear();
    let score = self.score;
    let mut stolen_by = None;
    if let Some(room) = room {
      room.record_score(player_name, score);
      if let Collision::Opponent(bot_id) = collision {
        if let Some(bot) = room.bot_mut(bot_id) {
          bot.score += score;
          let (name, bot_score) = (bot.name.clone(), bot.score);
          room.record_score(&name, bot_score);
          stolen_by = Some(name);
        }
      }
    }
    tracing::info!(score, cause = collision.describe(), "game over");
    TickOutcome::GameOver {
      collision,
      score,
      stolen_by,
    }
  }

  fn reset_round<R: Rng>(&mut self, room: Option<&Room>, rng: &mut R) {
    let start = Position::new(PLAYER_START.0, PLAYER_START.1);
    let blocked = room
      .map(|room| room.bots.iter().any(|bot| bot.snake.contains(start)))
      .unwrap_or(false);
    let head = if blocked {
      let occupied = self.bot_cells(room);
      free_cell(self.grid_size, SPAWN_MARGIN, &occupied, rng).unwrap_or(start)
    } else {
      start
    };

    self.phase = Phase::Playing;
    self.snake.reset(head);
    self.direction = Direction::Right;
    self.next_direction = Direction::Right;
    self.score = 0;
    self.modifiers.clear();
    self.tick_count = 0;
    self.food.clear();
    self.regenerate_food(room, rng);
  }

  fn food_plan(&self, room: Option<&Room>) -> FoodPlan {
    let bonus_apples = u32::from(self.modifiers.has_effect(ModifierEffect::MoreFood));
    match room {
      Some(room) => FoodPlan::Room {
        occupancy: room.occupancy,
        bonus_apples,
      },
      None => FoodPlan::OpenWorld {
        snake_len: self.snake.len(),
        score: self.score,
        bonus_apples,
      },
    }
  }

  fn regenerate_food<R: Rng>(&mut self, room: Option<&Room>, rng: &mut R) {
    let occupied = self.occupied(room);
    let batch = generate_batch(self.food_plan(room), self.grid_size, &occupied, rng);
    self.food.extend(batch);
  }

  fn bot_cells(&self, room: Option<&Room>) -> HashSet<Position> {
    room.map(|room| {
      room.bots
        .iter()
        .flat_map(|bot| bot.snake.segments())
        .collect()
    })
    .unwrap_or_default()
  }

  fn occupied(&self, room: Option<&Room>) -> HashSet<Position> {
    let mut occupied = self.bot_cells(room);
    occupied.extend(self.snake.segments());
    occupied.extend(self.food.iter().map(|item| item.position));
    occupied
  }
}
