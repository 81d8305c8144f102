pub mod config;
pub mod error;
pub mod invite;
pub mod keyboard;
pub mod quiz;
pub mod runner;
pub mod store;
pub mod telegram;
pub mod update;
