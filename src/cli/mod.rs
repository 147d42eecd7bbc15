// (c) 2024 Ross Younger
//! Command Line Interface for ifupdown-ng
mod args;
mod cli_main;
mod commands;
pub(crate) mod styles;
pub use cli_main::cli;
