use super::bots::{spawn_roster, Bot, BotId};
use super::types::Position;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

pub type RoomId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room {0} not found")]
    NotFound(RoomId),
    #[error("Room {0} is full")]
    Full(RoomId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopPlayer {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub occupancy: u32,
    pub capacity: u32,
    pub grid_size: i32,
    pub top_player: Option<TopPlayer>,
    #[serde(skip)]
    pub bots: Vec<Bot>,
}

impl Room {
    fn new(id: RoomId, capacity: u32, grid_size: i32) -> Self {
        Self {
            id,
            occupancy: 0,
            capacity,
            grid_size,
            top_player: None,
            bots: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.occupancy >= self.capacity
    }

    /// Replaces the top record when `score` beats it. Returns whether it did.
    pub fn record_score(&mut self, name: &str, score: u32) -> bool {
        let beats = match &self.top_player {
            Some(top) => score > top.score,
            None => score > 0,
        };
        if beats {
            self.top_player = Some(TopPlayer {
                name: name.to_string(),
                score,
            });
        }
        beats
    }

    pub fn bot_mut(&mut self, id: BotId) -> Option<&mut Bot> {
        self.bots.iter_mut().find(|bot| bot.id == id)
    }
}

/// Process-lifetime room table plus the marker for the room this client is in.
#[derive(Debug)]
pub struct RoomManager {
    rooms: Vec<Room>,
    current: Option<RoomId>,
}

impl RoomManager {
    /// Pre-creates rooms `1..=count`, all empty.
    pub fn new(count: u32, capacity: u32, grid_size: i32) -> Self {
        Self {
            rooms: (1..=count)
                .map(|id| Room::new(id, capacity, grid_size))
                .collect(),
            current: None,
        }
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn current_id(&self) -> Option<RoomId> {
        self.current
    }

    pub fn current(&self) -> Option<&Room> {
        let id = self.current?;
        self.rooms.iter().find(|room| room.id == id)
    }

    pub fn current_mut(&mut self) -> Option<&mut Room> {
        let id = self.current?;
        self.rooms.iter_mut().find(|room| room.id == id)
    }

    fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|room| room.id == id)
    }

    /// Enters room `id`, leaving any other room first. Nothing changes when the
    /// target is unknown or full. Bots spawn clear of `occupied`.
    pub fn join<R: Rng>(
        &mut self,
        id: RoomId,
        occupied: &HashSet<Position>,
        rng: &mut R,
    ) -> Result<&Room, RoomError> {
        if self.current == Some(id) {
            return self.current().ok_or(RoomError::NotFound(id));
        }
        let room = self
            .rooms
            .iter()
            .find(|room| room.id == id)
            .ok_or(RoomError::NotFound(id))?;
        if room.is_full() {
            return Err(RoomError::Full(id));
        }

        self.leave();

        let room = self.room_mut(id).ok_or(RoomError::NotFound(id))?;
        room.occupancy += 1;
        room.bots = spawn_roster(room.grid_size, occupied, rng);
        let occupancy = room.occupancy;
        self.current = Some(id);
        tracing::info!(room_id = id, occupancy, "joined room");
        self.current().ok_or(RoomError::NotFound(id))
    }

    /// Leaves the current room, discarding its bots. Returns the room left.
    pub fn leave(&mut self) -> Option<RoomId> {
        let id = self.current.take()?;
        if let Some(room) = self.room_mut(id) {
            room.occupancy = room.occupancy.saturating_sub(1);
            room.bots.clear();
            tracing::info!(room_id = id, occupancy = room.occupancy, "left room");
        }
        Some(id)
    }
}
