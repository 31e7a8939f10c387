use clap::{Parser, Subcommand};

/// Outage-schedule watcher with a Telegram bot front end.
#[derive(Parser, Debug)]
#[command(name = "svitlo", version, about = "Power-outage schedule watcher and Telegram notifier")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the poller, the bot listener and the liveness endpoint (default)
    Serve,
    /// Run a single poll cycle now; may notify subscribers
    Check,
    /// Fetch and print today's schedule without storing or sending anything
    Preview,
    /// Print the current subscribers
    Subscribers,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    pub fn default_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
