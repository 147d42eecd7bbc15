//! Settings file wrangling
// (c) 2024 Ross Younger

use super::Settings;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map, Value},
    Figment, Metadata, Profile, Provider,
};
use serde::Deserialize;
use std::{fmt::Display, path::Path};
use tabled::{settings::style::Style, Table, Tabled};
use tracing::trace;

use crate::os::{AbstractPlatform as _, Platform};

/// Prefix of environment variables that override settings
pub const ENV_PREFIX: &str = "IFUPDOWN_NG_";

// SYSTEM DEFAULTS //////////////////////////////////////////////////////////////////////////////////////////////

/// A `[https://docs.rs/figment/latest/figment/trait.Provider.html](figment::Provider)` that holds
/// our set of fixed system default options
#[derive(Default)]
struct SystemDefault {}

impl SystemDefault {
    const META_NAME: &str = "default";
}

impl Provider for SystemDefault {
    fn metadata(&self) -> Metadata {
        figment::Metadata::named(Self::META_NAME)
    }

    fn data(&self) -> std::result::Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(Settings::default()).data()
    }
}

// COMMAND LINE ///////////////////////////////////////////////////////////////////////////////////////////////

/// A provider holding settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    values: Dict,
}

impl CommandLine {
    const META_NAME: &str = "command line";

    /// Sets a value
    #[must_use]
    pub fn with<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        let _ = self.values.insert(key.into(), value.into());
        self
    }
}

impl Provider for CommandLine {
    fn metadata(&self) -> Metadata {
        figment::Metadata::named(Self::META_NAME)
    }

    fn data(&self) -> std::result::Result<Map<Profile, Dict>, figment::Error> {
        Ok(Map::from([(Profile::Default, self.values.clone())]))
    }
}

// SETTINGS MANAGER ///////////////////////////////////////////////////////////////////////////////////////////

/// Processes and merges all possible settings sources.
///
/// In increasing order of precedence:
/// 1. Hard-wired defaults
/// 1. The system settings file (typically `/etc/ifupdown-ng.toml`)
/// 1. Environment variables prefixed `IFUPDOWN_NG_`
/// 1. Command-line options
#[derive(Debug, Default)]
pub struct Manager {
    /// Settings data
    data: Figment,
}

fn add_system_settings(f: Figment) -> Figment {
    let path = Platform::system_settings_path();
    if !path.exists() {
        trace!("system settings file {path:?} not present");
        return f;
    }
    f.merge(Toml::file(path.as_path()))
}

impl Manager {
    /// Initialises this structure, reading the system settings file and the environment.
    #[must_use]
    pub fn new() -> Self {
        let mut data = Figment::new().merge(SystemDefault::default());
        // N.B. This may leave data in a fused-error state, if the file isn't parseable.
        data = add_system_settings(data);
        data = data.merge(Env::prefixed(ENV_PREFIX));
        Self { data }
    }

    /// Testing/internal constructor, does not read files or the environment
    #[must_use]
    #[allow(unused)]
    pub(crate) fn without_files() -> Self {
        let data = Figment::new().merge(SystemDefault::default());
        Self { data }
    }

    /// Merges in a data set, which is some sort of [figment::Provider](https://docs.rs/figment/latest/figment/trait.Provider.html).
    pub fn merge_provider<T>(&mut self, provider: T)
    where
        T: Provider,
    {
        let f = std::mem::take(&mut self.data);
        self.data = f.merge(provider); // in the error case, this leaves the provider in a fused state
    }

    /// Merges in a data set from a TOML file
    pub fn merge_toml_file<T>(&mut self, toml: T)
    where
        T: AsRef<Path>,
    {
        let path = toml.as_ref();
        let provider = Toml::file_exact(path);
        self.merge_provider(provider);
    }

    /// Attempts to extract a particular struct from the data.
    ///
    /// Within ifupdown-ng, `T` is usually [Settings], but it isn't intrinsically required to be.
    pub fn get<'de, T>(&self) -> anyhow::Result<T, figment::Error>
    where
        T: Deserialize<'de>,
    {
        self.data.extract::<T>()
    }
}

// PRETTY PRINT SUPPORT ///////////////////////////////////////////////////////////////////////////////////////

#[derive(Tabled)]
struct PrettySetting {
    field: String,
    value: String,
    source: String,
}

impl PrettySetting {
    fn render_source(meta: Option<&Metadata>) -> String {
        if let Some(m) = meta {
            m.source
                .as_ref()
                .map_or_else(|| m.name.to_string(), figment::Source::to_string)
        } else {
            String::new()
        }
    }

    fn render_value(value: &Value) -> String {
        match value {
            Value::String(_tag, s) => s.to_string(),
            Value::Char(_tag, c) => c.to_string(),
            Value::Bool(_tag, b) => b.to_string(),
            Value::Num(_tag, num) => {
                if let Some(i) = num.to_i128() {
                    i.to_string()
                } else if let Some(u) = num.to_u128() {
                    u.to_string()
                } else if let Some(ff) = num.to_f64() {
                    ff.to_string()
                } else {
                    "<number>".into()
                }
            }
            Value::Empty(_tag, _) => "<empty>".into(),
            Value::Dict(_tag, dict) => format!(
                "{{{}}}",
                dict.iter()
                    .map(|(k, v)| format!("{k}={}", PrettySetting::render_value(v)))
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            Value::Array(_tag, vec) => {
                format!(
                    "[{}]",
                    vec.iter()
                        .map(PrettySetting::render_value)
                        .collect::<Vec<_>>()
                        .join(",")
                )
            }
        }
    }

    fn new(field: &str, value: &Value, meta: Option<&Metadata>) -> Self {
        Self {
            field: field.into(),
            value: PrettySetting::render_value(value),
            source: PrettySetting::render_source(meta),
        }
    }
}

impl Display for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = match self.data.data() {
            Ok(d) => d,
            Err(e) => {
                // This isn't terribly helpful as it doesn't have metadata attached; BUT attempting to get() a struct does.
                return write!(f, "error: {e}");
            }
        };
        let Some(data) = data.get(&Profile::Default) else {
            return Ok(());
        };

        let mut fields = Vec::<PrettySetting>::new();

        for field in data.keys() {
            let value = self.data.find_value(field);
            let value = match value {
                Ok(v) => v,
                Err(e) => {
                    writeln!(f, "error on field {field}: {e}")?;
                    continue;
                }
            };
            let meta = self.data.find_metadata(field);
            fields.push(PrettySetting::new(field, &value, meta));
        }
        write!(f, "{}", Table::new(fields).with(Style::sharp()))
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use assertables::assert_contains;

    use super::{CommandLine, Manager};
    use crate::settings::Settings;
    use crate::util::make_test_tempfile;

    #[test]
    fn defaults() {
        let mgr = Manager::without_files();
        let result = mgr.get::<Settings>().unwrap();
        let expected = Settings::default();
        assert_eq!(expected, result);
    }

    #[test]
    fn layering() {
        let (path, _tempdir) = make_test_tempfile(
            r#"
            config_dir = "/srv/network"
            default_path = "/opt/bin:/bin"
        "#,
            "test.toml",
        );
        let mut mgr = Manager::without_files();
        mgr.merge_toml_file(path);
        mgr.merge_provider(CommandLine::default().with("default_path", "/cli/bin"));
        let result = mgr.get::<Settings>().unwrap();
        assert_eq!(result.config_dir, PathBuf::from("/srv/network"));
        assert_eq!(result.default_path, "/cli/bin");
        assert_eq!(result.interfaces_file(), PathBuf::from("/srv/network/interfaces"));

        let shown = mgr.to_string();
        assert_contains!(shown, "command line");
        assert_contains!(shown, "test.toml");
        assert_contains!(shown, "/srv/network");
    }

    #[test]
    fn interfaces_override() {
        let mut mgr = Manager::without_files();
        mgr.merge_provider(CommandLine::default().with("interfaces", "/tmp/if"));
        let result = mgr.get::<Settings>().unwrap();
        assert_eq!(result.interfaces_file(), PathBuf::from("/tmp/if"));
        assert_contains!(mgr.to_string(), "/tmp/if");
    }

    #[test]
    fn unparseable_toml() {
        let (path, _tempdir) = make_test_tempfile(
            r"
            config_dir = /etc
            rx 123 # this line is a syntax error
        ",
            "test.toml",
        );
        let mut mgr = Manager::without_files();
        mgr.merge_toml_file(path);
        assert!(mgr.get::<Settings>().is_err());
    }

    #[test]
    fn type_error() {
        let (path, _tempdir) = make_test_tempfile(
            r"
            default_path = 42
        ",
            "test.toml",
        );
        let mut mgr = Manager::without_files();
        mgr.merge_toml_file(path);
        assert!(mgr.get::<Settings>().is_err());
    }
}
