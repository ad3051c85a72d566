pub const SCHEDULER_QUANTUM_MS: u64 = 50;
pub const TICK_MS: u64 = 150;
pub const SPEED_TICK_MS: u64 = 100;
pub const BOT_TICK_MS: u64 = 300;
pub const MODIFIER_TICK_MS: u64 = 1000;

pub const OPEN_GRID_SIZE: i32 = 20;
pub const ROOM_GRID_SIZE: i32 = 30;
pub const ROOM_COUNT: u32 = 10;
pub const ROOM_CAPACITY: u32 = 20;
pub const MIN_GRID_SIZE: i32 = 8;

pub const PLAYER_START: (i32, i32) = (5, 5);

pub const APPLE_POINTS: u32 = 1;
pub const BOOSTED_APPLE_POINTS: u32 = 5;
pub const LEMON_POINTS: u32 = 10;

pub const LEMON_CHANCE: f64 = 0.1;
pub const LEMON_SCORE_THRESHOLD: u32 = 20;
pub const DOUBLE_APPLE_LENGTH: usize = 10;
pub const ROOM_APPLES_PER_OCCUPANT: u32 = 3;
pub const ROOM_OCCUPANTS_PER_LEMON: u32 = 3;
pub const SPAWN_MARGIN: i32 = 2;
pub const MAX_REJECTION_ATTEMPTS: usize = 256;

pub const BOT_COUNT: usize = 2;
pub const BOT_RANDOM_TURN_CHANCE: f64 = 0.10;
pub const BOT_GREEDY_CHANCE: f64 = 0.80;
