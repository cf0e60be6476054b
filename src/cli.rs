//! CLI domain: parse, route, help, and output only.
//! No domain orchestration; single route table dispatches to the shell session.

mod help;
mod output;
mod parse;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands};
pub use route::{run_one_shot, shell_command, RunContext};
