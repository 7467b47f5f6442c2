//! CLI domain: parse, route, output, and presentation only.
//! No story orchestration; the route table dispatches to `run`.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands};
pub use route::RunContext;
