//! Settings structure
// (c) 2024 Ross Younger

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::os::{AbstractPlatform as _, Platform};

/// The set of configurable options supported by ifupdown-ng.
///
/// **Note:** The implementation of `default()` for this struct returns the hard-wired defaults for this platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Directory holding the hook script directories (`if-pre-up.d` and friends).
    /// [default: /etc/network]
    pub config_dir: PathBuf,

    /// The interfaces(5) file to read.
    /// If not set, this is `interfaces` within the configuration directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<PathBuf>,

    /// The `PATH` that hook scripts and stanza commands run with
    pub default_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: Platform::system_config_dir(),
            interfaces: None,
            default_path: Platform::default_path().into(),
        }
    }
}

impl Settings {
    /// The interfaces(5) file to read
    #[must_use]
    pub fn interfaces_file(&self) -> PathBuf {
        self.interfaces
            .clone()
            .unwrap_or_else(|| self.config_dir.join("interfaces"))
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::Settings;

    #[test]
    fn derived_paths() {
        let mut s = Settings::default();
        assert_eq!(s.interfaces_file(), PathBuf::from("/etc/network/interfaces"));
        s.config_dir = PathBuf::from("/run/net");
        assert_eq!(s.interfaces_file(), PathBuf::from("/run/net/interfaces"));
        s.interfaces = Some(PathBuf::from("/tmp/ifaces"));
        assert_eq!(s.interfaces_file(), PathBuf::from("/tmp/ifaces"));
    }
}
