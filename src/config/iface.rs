//! Interface configuration stanzas
// (c) 2024 Ross Younger

use std::{collections::BTreeMap, fmt::Display};

use super::tokenizer::TokenStream;

/// Options which may be given more than once; every occurrence is kept, in file order.
pub const MULTIVALUE_OPTIONS: [&str; 4] = ["pre-up", "up", "down", "post-down"];

/// Old option spellings, and what they now mean
const LEGACY_OPTION_SYNONYMS: [(&str, &str); 2] = [("post-up", "up"), ("pre-down", "down")];

/// Is this option key allowed to occur more than once?
#[must_use]
pub fn is_multivalue(key: &str) -> bool {
    MULTIVALUE_OPTIONS.contains(&key)
}

/// Option keys are lowercase words matching `^[a-z][a-z0-9-]*$`
#[must_use]
pub fn valid_option_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn legacy_synonym(key: &str) -> Option<&'static str> {
    LEGACY_OPTION_SYNONYMS
        .iter()
        .find_map(|(old, new)| (*old == key).then_some(*new))
}

/// The identity of an interface configuration: `iface <name> <family> <method>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IfaceKey {
    /// Logical configuration name
    pub name: String,
    /// Address family (`inet`, `inet6`, ...)
    pub family: String,
    /// Configuration method (`static`, `dhcp`, `loopback`, ...)
    pub method: String,
}

impl IfaceKey {
    /// Constructor
    pub fn new<N, F, M>(name: N, family: F, method: M) -> Self
    where
        N: Into<String>,
        F: Into<String>,
        M: Into<String>,
    {
        Self {
            name: name.into(),
            family: family.into(),
            method: method.into(),
        }
    }
}

impl Display for IfaceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.name, self.family, self.method)
    }
}

/// The value of an interface option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// A scalar option, given once
    Single(String),
    /// One of the [`MULTIVALUE_OPTIONS`], with each occurrence in order
    Multi(Vec<String>),
}

impl OptionValue {
    /// All values of this option, in order
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            OptionValue::Single(s) => std::slice::from_ref(s),
            OptionValue::Multi(v) => v,
        }
    }
}

impl Display for OptionValue {
    /// Multiple values are shown one per line
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.values().join("\n"))
    }
}

/// One `iface` stanza
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    key: IfaceKey,
    /// Reserved for allow-group membership
    pub automatic: bool,
    options: BTreeMap<String, OptionValue>,
}

impl InterfaceConfig {
    /// Creates an empty configuration
    #[must_use]
    pub fn new(key: IfaceKey) -> Self {
        Self {
            key,
            automatic: true,
            options: BTreeMap::new(),
        }
    }

    /// The identity triple
    #[must_use]
    pub fn key(&self) -> &IfaceKey {
        &self.key
    }
    /// Logical configuration name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.key.name
    }
    /// Address family
    #[must_use]
    pub fn family(&self) -> &str {
        &self.key.family
    }
    /// Configuration method
    #[must_use]
    pub fn method(&self) -> &str {
        &self.key.method
    }

    /// All options, ordered by key
    #[must_use]
    pub fn options(&self) -> &BTreeMap<String, OptionValue> {
        &self.options
    }

    /// Looks up a single option
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    /// The commands given under a multivalue key (empty if there are none)
    #[must_use]
    pub fn commands(&self, key: &str) -> &[String] {
        self.get(key).map(OptionValue::values).unwrap_or_default()
    }

    /// Handles an option line within this stanza
    pub(crate) fn parse_option(&mut self, stream: &mut TokenStream, keyword: &str, rest: &str) {
        if !valid_option_key(keyword) {
            stream.error(format!("Invalid option name: {keyword}"));
            return;
        }
        if rest.is_empty() {
            stream.warning(format!("Option is empty: {keyword}"));
        }
        let key = if let Some(new) = legacy_synonym(keyword) {
            stream.warning(format!(
                "Option \"{keyword}\" is deprecated, please use \"{new}\" instead"
            ));
            new
        } else {
            keyword
        };

        if is_multivalue(key) {
            self.append(key, rest);
        } else if self.options.contains_key(key) {
            stream.error(format!("Duplicate option: {key}"));
        } else {
            let _ = self
                .options
                .insert(key.to_owned(), OptionValue::Single(rest.to_owned()));
        }
    }

    /// Called when this stanza is no longer the one being parsed
    #[allow(clippy::unused_self)]
    pub(crate) fn close_parsing(&self, _stream: &mut TokenStream) {}

    /// Sets an option from outside of a configuration file.
    ///
    /// Multivalue options are appended to; scalar options are overwritten.
    /// Deprecated spellings are accepted, and stored under their current names.
    pub fn set_option(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        anyhow::ensure!(valid_option_key(key), "invalid option name: {key}");
        let key = legacy_synonym(key).unwrap_or(key);
        if is_multivalue(key) {
            self.append(key, value);
        } else {
            let _ = self
                .options
                .insert(key.to_owned(), OptionValue::Single(value.to_owned()));
        }
        Ok(())
    }

    fn append(&mut self, key: &str, value: &str) {
        let entry = self
            .options
            .entry(key.to_owned())
            .or_insert_with(|| OptionValue::Multi(Vec::new()));
        match entry {
            OptionValue::Multi(v) => v.push(value.to_owned()),
            OptionValue::Single(_) => *entry = OptionValue::Multi(vec![value.to_owned()]),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////////
