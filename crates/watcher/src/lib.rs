//! Schedule watcher: the guarded poll cycle, its timer and the bot commands.

pub mod commands;
pub mod error;
pub mod poller;
pub mod runner;

pub use commands::{run_command_loop, BotCommand, CommandHandler};
pub use error::{CycleError, HandlerError};
pub use poller::{CycleOutcome, Poller};
pub use runner::run_poll_loop;
