// OS abstraction layer for ifupdown-ng - Unix implementation
// (c) 2024 Ross Younger

use super::{AbstractPlatform, Account};
use nix::unistd::{getuid, User};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
/// OS abstraction layer for Unix-like platforms
pub struct Unix {}

/// The platform implementation for this build
pub type Platform = Unix;

impl AbstractPlatform for Unix {
    fn system_config_dir() -> PathBuf {
        PathBuf::from("/etc/network")
    }

    fn system_settings_path() -> PathBuf {
        PathBuf::from("/etc/ifupdown-ng.toml")
    }

    fn default_path() -> &'static str {
        "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
    }

    fn shell() -> &'static str {
        "/bin/sh"
    }

    fn current_account() -> Account {
        let uid = getuid();
        match User::from_uid(uid) {
            Ok(Some(user)) => {
                // passwd(5): an empty shell field means /bin/sh
                let shell = if user.shell.as_os_str().is_empty() {
                    Self::shell().to_owned()
                } else {
                    user.shell.to_string_lossy().into_owned()
                };
                Account {
                    name: user.name,
                    home: user.dir.to_string_lossy().into_owned(),
                    shell,
                }
            }
            Ok(None) => {
                debug!("no account record for uid {uid}");
                Account::synthetic(uid.as_raw())
            }
            Err(e) => {
                debug!("account lookup for uid {uid} failed: {e}");
                Account::synthetic(uid.as_raw())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::Platform;
    use crate::os::{AbstractPlatform as _, Account};

    #[test]
    fn account_is_populated() {
        let account = Platform::current_account();
        assert!(!account.name.is_empty());
        assert!(!account.shell.is_empty());
    }

    #[test]
    fn synthetic_account() {
        let a = Account::synthetic(4242);
        assert_eq!(a.name, "4242");
        assert_eq!(a.home, "/");
        assert_eq!(a.shell, "/bin/sh");
    }

    #[test]
    fn paths() {
        assert!(Platform::system_config_dir().is_absolute());
        assert!(Platform::default_path().contains("/sbin"));
    }
}
