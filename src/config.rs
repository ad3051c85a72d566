use crate::game::constants::{
    BOT_TICK_MS, MIN_GRID_SIZE, MODIFIER_TICK_MS, OPEN_GRID_SIZE, ROOM_CAPACITY, ROOM_COUNT,
    ROOM_GRID_SIZE, SCHEDULER_QUANTUM_MS, SPEED_TICK_MS, TICK_MS,
};
use anyhow::{bail, Context};
use std::env;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/arcade.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub tick_ms: u64,
    pub speed_tick_ms: u64,
    pub bot_tick_ms: u64,
    pub modifier_tick_ms: u64,
    pub open_grid_size: i32,
    pub room_count: u32,
    pub room_capacity: u32,
    pub room_grid_size: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            tick_ms: TICK_MS,
            speed_tick_ms: SPEED_TICK_MS,
            bot_tick_ms: BOT_TICK_MS,
            modifier_tick_ms: MODIFIER_TICK_MS,
            open_grid_size: OPEN_GRID_SIZE,
            room_count: ROOM_COUNT,
            room_capacity: ROOM_CAPACITY,
            room_grid_size: ROOM_GRID_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let config = Self {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            database_url: lookup("DATABASE_URL")
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.database_url),
            tick_ms: parse_var(&lookup, "TICK_MS", defaults.tick_ms)?,
            speed_tick_ms: parse_var(&lookup, "SPEED_TICK_MS", defaults.speed_tick_ms)?,
            bot_tick_ms: parse_var(&lookup, "BOT_TICK_MS", defaults.bot_tick_ms)?,
            modifier_tick_ms: parse_var(&lookup, "MODIFIER_TICK_MS", defaults.modifier_tick_ms)?,
            open_grid_size: parse_var(&lookup, "OPEN_GRID_SIZE", defaults.open_grid_size)?,
            room_count: parse_var(&lookup, "ROOM_COUNT", defaults.room_count)?,
            room_capacity: parse_var(&lookup, "ROOM_CAPACITY", defaults.room_capacity)?,
            room_grid_size: parse_var(&lookup, "ROOM_GRID_SIZE", defaults.room_grid_size)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("TICK_MS", self.tick_ms),
            ("SPEED_TICK_MS", self.speed_tick_ms),
            ("BOT_TICK_MS", self.bot_tick_ms),
            ("MODIFIER_TICK_MS", self.modifier_tick_ms),
        ] {
            if value < SCHEDULER_QUANTUM_MS {
                bail!("{name} must be at least {SCHEDULER_QUANTUM_MS} ms, got {value}");
            }
        }
        if self.speed_tick_ms > self.tick_ms {
            bail!(
                "SPEED_TICK_MS ({}) must not exceed TICK_MS ({})",
                self.speed_tick_ms,
                self.tick_ms
            );
        }
        for (name, value) in [
            ("OPEN_GRID_SIZE", self.open_grid_size),
            ("ROOM_GRID_SIZE", self.room_grid_size),
        ] {
            if value < MIN_GRID_SIZE {
                bail!("{name} must be at least {MIN_GRID_SIZE}, got {value}");
            }
        }
        if self.room_count == 0 {
            bail!("ROOM_COUNT must be at least 1");
        }
        if self.room_capacity == 0 {
            bail!("ROOM_CAPACITY must be at least 1");
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {name}: {raw:?}")),
        _ => Ok(default),
    }
}
