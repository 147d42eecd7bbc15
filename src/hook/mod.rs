// (c) 2024 Ross Younger
//! # Hooks
//!
//! At each [phase](Phase) of bringing an interface up or down, ifupdown-ng runs:
//! * the commands given in the interface's stanza under the phase's name (`pre-up`, `up`, `down`, `post-down`),
//!   each by `/bin/sh -c`;
//! * every eligible executable in the phase's hook directory, `/etc/network/if-<phase>.d`, in lexical order.
//!
//! When starting, the stanza commands run first; when stopping, the hook directory runs first.
//! The first failure stops the phase.
//!
//! ## Environment
//!
//! Hooks run with a clean environment containing:
//! * `PHASE`, `MODE` (`start` or `stop`) and `VERBOSITY` (`0` or `1`);
//! * `IFACE` (the device), `LOGICAL` (the configuration name), `ADDRFAM` and `METHOD`.
//!   For the group-wide pass these are `--all`, the group name, `meta` and `none`;
//! * `IF_<OPTION>` for every option of the interface, for example `IF_BOND_SLAVES` for `bond-slaves`.
//!   Options given more than once have their values separated by newlines;
//! * `PATH`, `PWD`, `HOME`, `SHELL`, `LOGNAME`, `USER` and `USERNAME`;
//! * the locale and terminal variables of the invoking process, except that `LC_ALL` is removed
//!   and `LC_COLLATE`, `LC_CTYPE` and `LC_NUMERIC` are set to `C`.

mod phase;
pub use phase::{Mode, Phase};

mod environment;
pub use environment::{
    env_to_option, option_to_env, BaseEnvironment, EnvLayer, Environment, HookContext, HookTarget,
    CONTEXT_VARS, TERM_VARS,
};

mod runner;
pub use runner::{exit_code, hook_scripts, HookRunner};
