//! ifupdown-ng: network interface configuration from interfaces(5) files
// (c) 2024 Ross Younger

//! This crate reads the interfaces(5) configuration of a system and brings its network
//! interfaces up and down by running their lifecycle hooks.
//!
//! * [`config`] parses the configuration files into a [`config::SystemConfig`].
//! * [`hook`] builds the hook environment and runs hook scripts.
//! * [`settings`] holds the settings of the tool itself.
//!
//! The `ifup`, `ifdown` and `ifquery` commands are provided by [`cli()`].

mod cli;
pub use cli::cli;
pub mod config;
pub mod hook;
pub mod os;
pub mod settings;
pub mod util;
