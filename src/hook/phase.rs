//! Lifecycle phases
// (c) 2024 Ross Younger

/// A point in an interface's lifecycle at which hooks run
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Phase {
    /// Before the interface is configured
    PreUp,
    /// After the interface is configured
    Up,
    /// Before the interface is deconfigured
    Down,
    /// After the interface is deconfigured
    PostDown,
}

/// Whether an interface is being brought up or taken down
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// Bringing up (`pre-up` and `up`)
    Start,
    /// Taking down (`down` and `post-down`)
    Stop,
}

impl Phase {
    /// The phases run by `ifup`, in order
    pub const UP: [Phase; 2] = [Phase::PreUp, Phase::Up];
    /// The phases run by `ifdown`, in order
    pub const DOWN: [Phase; 2] = [Phase::Down, Phase::PostDown];

    /// The coarser mode this phase belongs to
    #[must_use]
    pub fn mode(self) -> Mode {
        match self {
            Phase::PreUp | Phase::Up => Mode::Start,
            Phase::Down | Phase::PostDown => Mode::Stop,
        }
    }

    /// The interface option whose commands run in this phase
    #[must_use]
    pub fn option_key(self) -> &'static str {
        match self {
            Phase::PreUp => "pre-up",
            Phase::Up => "up",
            Phase::Down => "down",
            Phase::PostDown => "post-down",
        }
    }

    /// The name of the directory of hook scripts for this phase
    #[must_use]
    pub fn hook_dir_name(self) -> String {
        format!("if-{self}.d")
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr as _;

    use strum::VariantNames as _;

    use super::{Mode, Phase};
    use crate::config::MULTIVALUE_OPTIONS;

    #[test]
    fn names() {
        assert_eq!(Phase::PreUp.to_string(), "pre-up");
        assert_eq!(Phase::PostDown.to_string(), "post-down");
        assert_eq!(Phase::from_str("down").unwrap(), Phase::Down);
        assert!(Phase::from_str("post-up").is_err());
        assert_eq!(Phase::VARIANTS, MULTIVALUE_OPTIONS);
        assert_eq!(Mode::Stop.to_string(), "stop");
    }

    #[test]
    fn modes() {
        for p in Phase::UP {
            assert_eq!(p.mode(), Mode::Start);
        }
        for p in Phase::DOWN {
            assert_eq!(p.mode(), Mode::Stop);
        }
    }

    #[test]
    fn option_keys_match_names() {
        for p in Phase::UP.into_iter().chain(Phase::DOWN) {
            assert_eq!(p.option_key(), p.to_string());
        }
        assert_eq!(Phase::PreUp.hook_dir_name(), "if-pre-up.d");
    }
}
