use crate::config::Config;
use crate::game::bots::BotEvent;
use crate::game::collision::Collision;
use crate::game::constants::PLAYER_START;
use crate::game::rooms::{RoomId, RoomManager};
use crate::game::scheduler::Scheduler;
use crate::game::session::{Activation, GameSession, TickOutcome};
use crate::game::types::{Direction, FoodKind, Phase, Position};
use crate::profile::catalog::{Catalog, SkinVisual};
use crate::profile::{sanitize_name, Profile, ProfilePatch, Purchase, PurchaseError, DEFAULT_NAME};
use crate::protocol::{BotView, Command, Notice, StateView};
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::Arc;

/// Pending change to the stored profile snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileWrite {
  Save(Profile),
  Clear,
}

/// The single-client game: profile, shop, rooms and the running session.
///
/// Every UI operation and every scheduler quantum goes through here. Results
/// the UI should hear about are queued as notices; profile changes are queued
/// as a [`ProfileWrite`] for the runtime to persist.
pub struct Arcade {
  catalog: Arc<dyn Catalog>,
  profile: Option<Profile>,
  rooms: RoomManager,
  session: GameSession,
  scheduler: Scheduler,
  rng: StdRng,
  open_grid_size: i32,
  notices: Vec<Notice>,
  pending_write: Option<ProfileWrite>,
}

impl Arcade {
  pub fn new(config: &Config, catalog: Arc<dyn Catalog>, rng: StdRng) -> Self {
    Self {
      catalog,
      profile: None,
      rooms: RoomManager::new(config.room_count, config.room_capacity, config.room_grid_size),
      session: GameSession::open_world(config.open_grid_size),
      scheduler: Scheduler::new(
        config.tick_ms,
        config.speed_tick_ms,
        config.bot_tick_ms,
        config.modifier_tick_ms,
      ),
      rng,
      open_grid_size: config.open_grid_size,
      notices: Vec::new(),
      pending_write: None,
    }
  }

  #[cfg(test)]
  pub fn session(&self) -> &GameSession {
    &self.session
  }

  pub fn profile(&self) -> Option<&Profile> {
    self.profile.as_ref()
  }

  pub fn is_playing(&self) -> bool {
    self.session.is_playing()
  }

  pub fn take_notices(&mut self) -> Vec<Notice> {
    std::mem::take(&mut self.notices)
  }

  pub fn take_profile_write(&mut self) -> Option<ProfileWrite> {
    self.pending_write.take()
  }

  pub fn apply(&mut self, command: Command) {
    tracing::debug!(?command, "command");
    match command {
      Command::Start => {
        self.start();
      }
      Command::Pause => {
        self.pause();
      }
      Command::Resume => {
        self.resume();
      }
      Command::Restart => {
        self.restart();
      }
      Command::SetDirection { direction } => {
        self.set_direction(direction);
      }
      Command::JoinRoom { room_id } => {
        self.join_room(room_id);
      }
      Command::LeaveRoom => {
        self.leave_room();
      }
      Command::BuyModifier { id } => self.buy_modifier(&id),
      Command::BuyCosmetic { id } => self.buy_cosmetic(&id),
      Command::ActivateModifier { id } => self.activate_modifier(&id),
      Command::EquipCosmetic { id } => self.equip_cosmetic(&id),
    }
  }

  pub fn start(&mut self) -> bool {
    let started = self.session.start(self.rooms.current(), &mut self.rng);
    if started {
      self.scheduler.reset();
    }
    started
  }

  pub fn pause(&mut self) -> bool {
    self.session.pause()
  }

  pub fn resume(&mut self) -> bool {
    self.session.resume()
  }

  /// Starts a fresh round from paused, playing or finished sessions.
  pub fn restart(&mut self) -> bool {
    if self.session.phase() == Phase::Idle {
      return false;
    }
    self.session.restart(self.rooms.current(), &mut self.rng);
    self.scheduler.reset();
    true
  }

  pub fn set_direction(&mut self, direction: Direction) -> bool {
    self.session.set_direction(direction)
  }

  pub fn join_room(&mut self, room_id: RoomId) -> bool {
    let occupied = HashSet::from([Position::new(PLAYER_START.0, PLAYER_START.1)]);
    match self.rooms.join(room_id, &occupied, &mut self.rng) {
      Ok(room) => {
        let grid_size = room.grid_size;
        self.session = GameSession::walled(grid_size);
        self.scheduler.reset();
        self.notify(Notice::success(format!("Joined room {room_id}")));
        true
      }
      Err(err) => {
        self.notify(Notice::error(err.to_string()));
        false
      }
    }
  }

  pub fn leave_room(&mut self) -> bool {
    let Some(room_id) = self.rooms.leave() else {
      return false;
    };
    self.session = GameSession::open_world(self.open_grid_size);
    self.scheduler.reset();
    self.notify(Notice::info(format!("Left room {room_id}")));
    true
  }

  pub fn buy_modifier(&mut self, id: &str) {
    let catalog = Arc::clone(&self.catalog);
    let Some(profile) = self.signed_in() else { return };
    let result = profile.purchase_modifier(catalog.as_ref(), id);
    self.settle_purchase(result);
  }

  pub fn buy_cosmetic(&mut self, id: &str) {
    let catalog = Arc::clone(&self.catalog);
    let Some(profile) = self.signed_in() else { return };
    let result = profile.purchase_cosmetic(catalog.as_ref(), id);
    self.settle_purchase(result);
  }

  fn settle_purchase(&mut self, result: Result<Purchase, PurchaseError>) {
    match result {
      Ok(purchase) => {
        tracing::debug!(item = %purchase.id, price = purchase.price, "purchase");
        self.mark_profile_dirty();
        self.notify(Notice::success(format!("Purchased {}!", purchase.name)));
      }
      Err(PurchaseError::UnknownItem(id)) => {
        tracing::debug!(%id, "ignoring purchase of unknown item");
      }
      Err(err) => self.notify(Notice::error(err.to_string())),
    }
  }

  pub fn activate_modifier(&mut self, id: &str) {
    let Some(spec) = self.catalog.modifier(id).cloned() else {
      return;
    };
    let Some(profile) = self.signed_in() else { return };
    if !profile.owns_modifier(id) {
      self.notify(Notice::error(format!("You don't own {}", spec.name)));
      return;
    }
    match self.session.activate_modifier(&spec) {
      Activation::Activated => {
        self.notify(Notice::success(format!("{} activated!", spec.name)));
      }
      Activation::AlreadyActive => {
        self.notify(Notice::info(format!("{} is already active", spec.name)));
      }
      Activation::NotRunning => {
        self.notify(Notice::error("Start a game to use power-ups"));
      }
    }
  }

  pub fn equip_cosmetic(&mut self, id: &str) {
    let Some(name) = self.catalog.cosmetic(id).map(|item| item.name.clone()) else {
      return;
    };
    let Some(profile) = self.signed_in() else { return };
    if profile.equip(id) {
      self.mark_profile_dirty();
      self.notify(Notice::success(format!("Equipped {name}")));
    }
  }

  /// Signs in under `name`.
  ///
  /// The signed-in profile is kept when the name matches it. Otherwise `known`,
  /// a stored profile with that name, is picked up before a starter profile is
  /// created.
  pub fn login(&mut self, name: &str, known: Option<Profile>) -> Profile {
    let username = sanitize_name(name);
    let current = self.profile.take().filter(|profile| profile.username == username);
    let known = known.filter(|profile| profile.username == username);
    let (profile, returning) = match current.or(known) {
      Some(profile) => (profile, true),
      None => (Profile::starter(&username), false),
    };
    tracing::info!(username = %profile.username, id = %profile.id, returning, "signed in");
    let greeting = if returning { "Welcome back" } else { "Welcome" };
    self.notify(Notice::success(format!("{greeting}, {}!", profile.username)));
    self.profile = Some(profile.clone());
    self.mark_profile_dirty();
    profile
  }

  /// Signs in a profile loaded from storage without writing it back.
  pub fn restore(&mut self, profile: Profile) {
    self.profile = Some(profile);
  }

  pub fn logout(&mut self) -> bool {
    if self.profile.take().is_none() {
      return false;
    }
    self.pending_write = Some(ProfileWrite::Clear);
    self.notify(Notice::info("Logged out"));
    true
  }

  pub fn apply_patch(&mut self, patch: ProfilePatch) -> Option<&Profile> {
    self.profile.as_mut()?.apply(patch);
    self.mark_profile_dirty();
    self.profile.as_ref()
  }

  /// One scheduler quantum. Returns whether anything visible changed.
  pub fn on_quantum(&mut self) -> bool {
    if !self.session.is_playing() {
      return false;
    }
    let due = self.scheduler.tick(self.session.is_fast());
    if due.movement {
      self.advance_player();
    }
    if due.bots {
      self.advance_bots();
    }
    if due.modifiers {
      for expired in self.session.tick_modifiers() {
        self.notify(Notice::info(format!("{} has expired", expired.name)));
      }
    }
    due.movement || due.bots || due.modifiers
  }

  fn advance_player(&mut self) {
    let name = self
      .profile
      .as_ref()
      .map(|profile| profile.username.clone())
      .unwrap_or_else(|| DEFAULT_NAME.to_string());
    let outcome = self
      .session
      .advance(self.rooms.current_mut(), &name, &mut self.rng);
    match outcome {
      TickOutcome::Ate { kind, points, boosted } => {
        if let Some(notice) = bite_notice(kind, points, boosted) {
          self.notify(notice);
        }
      }
      TickOutcome::GameOver {
        collision,
        score,
        stolen_by,
      } => {
        if let Some(profile) = self.profile.as_mut() {
          profile.fold_score(score);
          self.mark_profile_dirty();
        }
        if let Some(bot_name) = &stolen_by {
          self.notify(Notice::error(format!("{bot_name} stole your {score} points!")));
        }
        self.notify(game_over_notice(collision, stolen_by.as_deref(), score));
      }
      TickOutcome::Moved | TickOutcome::Skipped => {}
    }
  }

  fn advance_bots(&mut self) {
    let Some(room) = self.rooms.current_mut() else {
      return;
    };
    let events = self.session.advance_bots(room, &mut self.rng);
    let mut respawned = Vec::new();
    for event in events {
      match event {
        BotEvent::Respawned { bot_id } => {
          if let Some(bot) = room.bots.iter().find(|bot| bot.id == bot_id) {
            respawned.push(bot.name.clone());
          }
        }
        BotEvent::Ate { bot_id, kind, score } => {
          tracing::debug!(bot_id, ?kind, score, "bot ate");
        }
      }
    }
    for name in respawned {
      self.notify(Notice::info(format!("{name} crashed into itself and respawned")));
    }
  }

  pub fn view(&self) -> StateView {
    let room = self.rooms.current();
    let skin_class = match &self.profile {
      Some(profile) => profile.skin_class(self.catalog.as_ref()),
      None => SkinVisual::default().css_class(),
    };
    StateView {
      phase: self.session.phase(),
      topology: self.session.topology(),
      grid_size: self.session.grid_size(),
      snake: self.session.snake().segments().collect(),
      direction: self.session.direction(),
      food: self.session.food().to_vec(),
      board: self.session.board(room),
      score: self.session.score(),
      tick_count: self.session.tick_count(),
      active_modifiers: self.session.modifiers().iter().cloned().collect(),
      rooms: self.rooms.rooms().to_vec(),
      current_room: self.rooms.current_id(),
      bots: room
        .map(|room| room.bots.iter().map(BotView::from).collect())
        .unwrap_or_default(),
      profile: self.profile.clone(),
      offers: self
        .profile
        .as_ref()
        .map(|profile| profile.offers(self.catalog.as_ref()))
        .unwrap_or_default(),
      skin_class,
    }
  }

  fn signed_in(&mut self) -> Option<&mut Profile> {
    if self.profile.is_none() {
      self.notify(Notice::error("Please sign in first"));
    }
    self.profile.as_mut()
  }

  fn mark_profile_dirty(&mut self) {
    if let Some(profile) = &self.profile {
      self.pending_write = Some(ProfileWrite::Save(profile.clone()));
    }
  }

  fn notify(&mut self, notice: Notice) {
    tracing::debug!(level = ?notice.level, message = %notice.message, "notice");
    self.notices.push(notice);
  }
}

/// Lemons and boosted apples get a toast; plain apples do not.
fn bite_notice(kind: FoodKind, points: u32, boosted: bool) -> Option<Notice> {
  match kind {
    FoodKind::Lemon => Some(Notice::success(format!("Lemon collected! +{points} points"))),
    FoodKind::Apple if boosted => Some(Notice::success(format!("Power-up active! +{points} points"))),
    FoodKind::Apple => None,
  }
}

fn game_over_notice(collision: Collision, stolen_by: Option<&str>, score: u32) -> Notice {
  let cause = match (collision, stolen_by) {
    (Collision::Opponent(_), Some(bot_name)) => format!("You crashed into {bot_name}"),
    (Collision::Opponent(_), None) => "You crashed into a bot".to_string(),
    (Collision::SelfBody, _) => "You ran into yourself".to_string(),
    (Collision::Wall | Collision::None, _) => "You hit the wall".to_string(),
  };
  Notice::info(format!("Game over! {cause}. Score: {score}"))
}
