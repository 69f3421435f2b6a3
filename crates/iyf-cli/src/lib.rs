//! In-your-face CLI library.
//!
//! This crate provides the command-line host for the reminder engine: a
//! terminal presentation surface and the async driver that runs the engine
//! against the wall clock.

mod cli;
pub mod commands;
mod config;
pub mod monitor;
pub mod surface;

pub use cli::{Cli, Commands};
pub use config::Config;
