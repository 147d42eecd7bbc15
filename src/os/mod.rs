//! OS abstraction layer
// (c) 2024 Ross Younger

use std::path::PathBuf;

/// The parts of a user account record that hook scripts get to see
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Login name
    pub name: String,
    /// Home directory
    pub home: String,
    /// Login shell
    pub shell: String,
}

impl Account {
    /// A minimal record for a user id that has no entry in the account database
    #[must_use]
    pub fn synthetic(uid: u32) -> Self {
        Self {
            name: uid.to_string(),
            home: "/".into(),
            shell: "/bin/sh".into(),
        }
    }
}

/// General platform abstraction trait.
/// The active implementation should be pulled into this crate
/// and exported as `Platform`.
///
/// Usage:
/// ```
///    use ifupdown_ng::os::Platform;
///    use ifupdown_ng::os::AbstractPlatform as _;
///    println!("{}", Platform::system_config_dir().display());
/// ```
pub trait AbstractPlatform {
    /// Directory holding the interfaces file and the hook directories.
    /// On most platforms this will be `/etc/network`
    fn system_config_dir() -> PathBuf;

    /// The absolute path to the system settings file for this tool.
    /// # Note
    /// This is a _theoretical_ path construction; it does not guarantee that the path actually exists.
    fn system_settings_path() -> PathBuf;

    /// The `PATH` hook scripts run with, unless configured otherwise
    fn default_path() -> &'static str;

    /// The shell used to run commands given in interface stanzas
    fn shell() -> &'static str;

    /// The account record of the invoking user.
    ///
    /// If the account database has no entry for the current user id, returns [`Account::synthetic`].
    fn current_account() -> Account;
}

#[cfg(any(unix, doc))]
mod unix;

#[cfg(any(unix, doc))]
pub use unix::*;

static_assertions::assert_cfg!(unix, "This OS is not yet supported");
