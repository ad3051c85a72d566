use crate::game::bots::Bot;
use crate::game::modifiers::ActiveModifier;
use crate::game::rooms::{Room, RoomId};
use crate::game::types::{CellKind, Direction, Food, Phase, Position, Topology};
use crate::profile::{Offers, Profile};
use serde::{Deserialize, Serialize};

/// UI operation, as sent over `POST /api/command` or the socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
  Start,
  Pause,
  Resume,
  Restart,
  SetDirection {
    direction: Direction,
  },
  JoinRoom {
    #[serde(rename = "roomId")]
    room_id: RoomId,
  },
  LeaveRoom,
  BuyModifier {
    id: String,
  },
  BuyCosmetic {
    id: String,
  },
  ActivateModifier {
    id: String,
  },
  EquipCosmetic {
    id: String,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
  Info,
  Success,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn info(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Info,
      message: message.into(),
    }
  }

  pub fn success(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Success,
      message: message.into(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Error,
      message: message.into(),
    }
  }
}

/// Everything the UI needs to draw one frame and the shop.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
  pub phase: Phase,
  pub topology: Topology,
  pub grid_size: i32,
  pub snake: Vec<Position>,
  pub direction: Direction,
  pub food: Vec<Food>,
  /// `board[y][x]`, the same cells as `snake`, `food` and `bots` in grid form.
  pub board: Vec<Vec<CellKind>>,
  pub score: u32,
  /// Movement steps taken this round.
  pub tick_count: u64,
  pub active_modifiers: Vec<ActiveModifier>,
  pub rooms: Vec<Room>,
  pub current_room: Option<RoomId>,
  pub bots: Vec<BotView>,
  pub profile: Option<Profile>,
  pub offers: Offers,
  pub skin_class: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotView {
  pub id: u32,
  pub name: String,
  pub snake: Vec<Position>,
  pub score: u32,
  pub color_class: &'static str,
}

impl From<&Bot> for BotView {
  fn from(bot: &Bot) -> Self {
    Self {
      id: bot.id,
      name: bot.name.clone(),
      snake: bot.snake.segments().collect(),
      score: bot.score,
      color_class: bot.color.css_class(),
    }
  }
}

/// Frames pushed to the UI over the socket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
  State(Box<StateView>),
  Notice(Notice),
}

pub fn decode_command(text: &str) -> Option<Command> {
  serde_json::from_str(text).ok()
}

pub fn encode_message(message: &ServerMessage) -> Option<String> {
  serde_json::to_string(message).ok()
}
