pub mod bots;
pub mod collision;
pub mod constants;
pub mod generator;
pub mod modifiers;
pub mod rooms;
pub mod scheduler;
pub mod session;
pub mod snake;
pub mod types;
