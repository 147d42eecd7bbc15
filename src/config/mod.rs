// (c) 2024 Ross Younger
//! # Interface configuration
//!
//! ifupdown-ng reads the network configuration of the system from an interfaces(5) file,
//! typically `/etc/network/interfaces`.
//!
//! ## File format
//!
//! The file is line-oriented. Each statement begins with a keyword.
//!
//! * `iface <name> <family> <method>` begins an interface stanza. The lines that follow,
//!   up to the next top-level statement, are options of that interface: `<option> <value>`.
//! * `mapping <pattern>...` begins a mapping stanza, which accepts `script <path>` and any number of `map <line>` options.
//! * `auto <ifname>...` and `allow-<group> <ifname>...` add interfaces to an allow-group (`auto` is itself a group).
//! * `source <pattern>` reads more files. Shell quoting, `~` and `$VARIABLE` expansion and wildcards are supported.
//!
//! Lines beginning with `#` are comments. A `#` anywhere else is **not** a comment; it is kept, with a warning.
//!
//! A line ending in a single backslash continues on the next line.
//!
//! ### Example
//!
//! ```text
//! # The loopback network interface
//! auto lo eth0
//! iface lo inet loopback
//!
//! iface eth0 inet static
//!     address 192.0.2.7/24
//!     gateway 192.0.2.254
//!     up ip route add 198.51.100.0/24 \
//!         via 192.0.2.1
//!
//! source /etc/network/interfaces.d/*
//! ```
//!
//! ### Traps and tips
//! 1. `pre-up`, `up`, `down` and `post-down` may be given more than once; every occurrence is kept,
//!    and they run in file order. All other options may be given only once per stanza.
//! 1. `post-up` and `pre-down` are deprecated spellings of `up` and `down`.
//! 1. A `source` statement always ends the stanza before it. Options after a `source` are errors.
//! 1. Problems are reported with their file and line number.
//!    A configuration with errors is not acted upon; one with only warnings is.

mod position;
pub use position::{Diagnostics, Position};

mod tokenizer;
pub use tokenizer::{Statement, TokenStream};

mod words;

mod iface;
pub use iface::{
    is_multivalue, valid_option_key, IfaceKey, InterfaceConfig, OptionValue, MULTIVALUE_OPTIONS,
};

mod mapping;
pub use mapping::Mapping;
pub(crate) use mapping::{fnmatch_pattern, FNMATCH};

mod directive;

mod system;
pub use system::{LoadStatus, SystemConfig, MAX_SOURCE_DEPTH};
