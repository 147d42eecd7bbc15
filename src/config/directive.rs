//! Statement keywords
// (c) 2024 Ross Younger

/// What a statement's keyword asks the dispatcher to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Directive<'a> {
    /// `source <pattern>...`
    Source,
    /// `auto <ifname>...` or `allow-<group> <ifname>...`
    Allow { group: &'a str },
    /// `mapping <pattern>...`
    Mapping,
    /// `iface <name> <family> <method>`
    Iface,
    /// Anything else is an option for the current stanza
    Setting,
}

impl Directive<'_> {
    pub(super) fn classify(keyword: &str) -> Directive<'_> {
        match keyword {
            "source" => Directive::Source,
            "auto" => Directive::Allow { group: "auto" },
            "mapping" => Directive::Mapping,
            "iface" => Directive::Iface,
            _ => match keyword.strip_prefix("allow-") {
                Some(group) => Directive::Allow { group },
                None => Directive::Setting,
            },
        }
    }

    /// Top-level statements close the current stanza
    pub(super) fn is_top_level(self) -> bool {
        !matches!(self, Directive::Setting)
    }
}

/// Allow-group names are lowercase words
pub(super) fn valid_group_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase())
}

#[cfg(test)]
mod test {
    use super::{valid_group_name, Directive};

    #[test]
    fn keywords() {
        assert_eq!(Directive::classify("source"), Directive::Source);
        assert_eq!(
            Directive::classify("auto"),
            Directive::Allow { group: "auto" }
        );
        assert_eq!(
            Directive::classify("allow-hotplug"),
            Directive::Allow { group: "hotplug" }
        );
        assert_eq!(Directive::classify("allow-"), Directive::Allow { group: "" });
        assert_eq!(Directive::classify("mapping"), Directive::Mapping);
        assert_eq!(Directive::classify("iface"), Directive::Iface);
        assert_eq!(Directive::classify("address"), Directive::Setting);
        assert_eq!(Directive::classify("allowed"), Directive::Setting);
        assert!(!Directive::Setting.is_top_level());
        assert!(Directive::Source.is_top_level());
    }

    #[test]
    fn group_names() {
        assert!(valid_group_name("auto"));
        assert!(valid_group_name("hotplug"));
        assert!(!valid_group_name(""));
        assert!(!valid_group_name("hot-plug"));
        assert!(!valid_group_name("Hotplug"));
        assert!(!valid_group_name("eth0"));
    }
}
