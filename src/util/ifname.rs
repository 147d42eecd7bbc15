//! Interface name helpers
// (c) 2024 Ross Younger

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn valid_component(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_name_char)
}

/// Returns true if an interface name is valid.
///
/// A valid name is a device name, optionally followed by `:` and an alias label.
/// Both parts are made of ASCII letters, digits, `_` and `-`.
#[must_use]
pub fn valid_interface_name(iface: &str) -> bool {
    match iface.split_once(':') {
        None => valid_component(iface),
        Some((device, label)) => valid_component(device) && valid_component(label),
    }
}

/// Returns true if an interface name appears to be an alias (`eth0:1`)
#[must_use]
pub fn interface_is_alias(iface: &str) -> bool {
    iface.contains(':')
}

/// Returns the physical device portion of an interface name
#[must_use]
pub fn interface_device(iface: &str) -> &str {
    iface.split_once(':').map_or(iface, |(device, _)| device)
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::{interface_device, interface_is_alias, valid_interface_name};
    use anyhow::{anyhow, Context, Result};
    use assertables::assert_eq_as_result;

    #[test]
    fn name_validation() -> Result<()> {
        for (name, expected) in [
            ("eth0", true),
            ("eth0:1", true),
            ("br-lan_2", true),
            ("WLAN0", true),
            ("eth0:home-net", true),
            ("", false),
            (":1", false),
            ("eth0:", false),
            ("eth0:1:2", false),
            ("eth 0", false),
            ("eth0.100", false),
            ("wlan0!", false),
        ] {
            assert_eq_as_result!(valid_interface_name(name), expected)
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("name \"{name}\""))?;
        }
        Ok(())
    }

    #[test]
    fn aliases() {
        assert!(interface_is_alias("eth0:1"));
        assert!(!interface_is_alias("eth0"));
        assert_eq!(interface_device("eth0:1"), "eth0");
        assert_eq!(interface_device("eth0"), "eth0");
        assert_eq!(interface_device("eth0:1:2"), "eth0");
    }
}
