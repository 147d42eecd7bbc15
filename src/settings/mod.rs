// (c) 2024 Ross Younger
//! # Settings of the tool itself
//!
//! Not to be confused with the interfaces(5) [configuration](crate::config),
//! these control where ifupdown-ng finds things. They are obtained from the following sources,
//! in increasing order of precedence:
//! 1. Hard-wired defaults
//! 1. The system-wide settings file, `/etc/ifupdown-ng.toml`
//! 1. Environment variables named `IFUPDOWN_NG_<FIELD>`, for example `IFUPDOWN_NG_CONFIG_DIR`
//! 1. Command-line options
//!
//! To see the settings in effect and where each came from, run `ifup --show-config`.
//!
//! ## File format
//!
//! The settings file is TOML.
//!
//! ```toml
//! config_dir = "/etc/network"
//! interfaces = "/etc/network/interfaces"
//! default_path = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
//! ```
//!
//! The full list of supported fields is defined by [Settings].

mod structure;
pub use structure::Settings;

mod manager;
pub use manager::{CommandLine, Manager, ENV_PREFIX};
