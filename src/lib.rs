pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod game;
pub mod input;
pub mod models;
pub mod net;
pub mod services;
pub mod state;
pub mod util;

// Convenient re-exports (so call sites can do `catchbot::Registry`, etc.)
pub use commands::process_command;
pub use state::registry::{Registry, Repos};
