//! Integration tests for the sfcli shell

mod cli_commands;
mod record_commands;
mod session_navigation;
pub mod test_utils;
