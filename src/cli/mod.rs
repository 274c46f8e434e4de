pub mod commands;

pub use commands::{ChatCommand, Cli, Commands, dispatch};
