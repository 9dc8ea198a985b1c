pub mod config;
pub mod hiit;
pub mod history;
pub mod plank;
pub mod preset;
pub mod stats;
mod workout;
