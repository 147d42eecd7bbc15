//! The environment that hook and stanza scripts run in
// (c) 2024 Ross Younger

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

use super::Phase;
use crate::{
    config::{valid_option_key, InterfaceConfig},
    os::{AbstractPlatform as _, Account, Platform},
};

/// A set of environment variables
pub type EnvLayer = BTreeMap<String, String>;

/// Locale and terminal variables, which are passed through from the parent process
pub const TERM_VARS: [&str; 16] = [
    "LANG",
    "LC_ADDRESS",
    "LC_ALL",
    "LC_COLLATE",
    "LC_CTYPE",
    "LC_IDENTIFICATION",
    "LC_MEASUREMENT",
    "LC_MESSAGES",
    "LC_MONETARY",
    "LC_NAME",
    "LC_NUMERIC",
    "LC_PAPER",
    "LC_TELEPHONE",
    "LC_TIME",
    "TERM",
    "TERMCAP",
];

/// Locale variables that break text parsing in scripts.
/// `None` means the variable is removed.
const TERM_OVERRIDE: [(&str, Option<&str>); 4] = [
    ("LC_ALL", None),
    ("LC_COLLATE", Some("C")),
    ("LC_CTYPE", Some("C")),
    ("LC_NUMERIC", Some("C")),
];

/// Variables set for every hook, in addition to the option variables
pub const CONTEXT_VARS: [&str; 7] = [
    "PHASE",
    "MODE",
    "VERBOSITY",
    "IFACE",
    "LOGICAL",
    "ADDRFAM",
    "METHOD",
];

/// Converts an option key to its environment variable: `foo-bar` becomes `IF_FOO_BAR`
#[must_use]
pub fn option_to_env(key: &str) -> Option<String> {
    valid_option_key(key).then(|| format!("IF_{}", key.to_ascii_uppercase().replace('-', "_")))
}

/// Converts an option environment variable back to its key: `IF_FOO_BAR` becomes `foo-bar`.
///
/// Returns `None` for anything that is not an option variable.
#[must_use]
pub fn env_to_option(env: &str) -> Option<String> {
    let rest = env.strip_prefix("IF_")?;
    let mut chars = rest.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    valid.then(|| rest.to_ascii_lowercase().replace('_', "-"))
}

/// The part of a hook's environment that doesn't depend on the hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseEnvironment {
    cwd: PathBuf,
    vars: EnvLayer,
}

impl BaseEnvironment {
    /// Builds the base environment from explicit inputs.
    ///
    /// Only the locale and terminal variables of `parent` are used.
    pub fn new<I, K, V>(cwd: PathBuf, path: &str, account: &Account, parent: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars: EnvLayer = parent
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| TERM_VARS.contains(&k.as_str()))
            .collect();
        for (key, value) in TERM_OVERRIDE {
            let _ = match value {
                Some(v) => vars.insert(key.into(), v.into()),
                None => vars.remove(key),
            };
        }
        for key in ["LOGNAME", "USER", "USERNAME"] {
            let _ = vars.insert(key.into(), account.name.clone());
        }
        let _ = vars.insert("HOME".into(), account.home.clone());
        let _ = vars.insert("SHELL".into(), account.shell.clone());
        let _ = vars.insert("PATH".into(), path.into());
        let _ = vars.insert("PWD".into(), cwd.to_string_lossy().into_owned());
        Self { cwd, vars }
    }

    /// Builds the base environment for this process: the current directory,
    /// the given `PATH`, the current user, and this process's locale.
    #[must_use]
    pub fn from_process(path: &str) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self::new(cwd, path, &Platform::current_account(), std::env::vars())
    }

    /// Overrides the working directory
    #[must_use]
    pub fn with_cwd(mut self, cwd: PathBuf) -> Self {
        let _ = self
            .vars
            .insert("PWD".into(), cwd.to_string_lossy().into_owned());
        self.cwd = cwd;
        self
    }

    /// Overrides `PATH`
    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        let _ = self.vars.insert("PATH".into(), path.into());
        self
    }

    /// The working directory
    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The variables
    #[must_use]
    pub fn vars(&self) -> &EnvLayer {
        &self.vars
    }
}

/// What a hook is being run for
#[derive(Debug, Clone, Copy)]
pub enum HookTarget<'a> {
    /// A single interface configuration, applied to a device
    Interface {
        /// The configuration
        config: &'a InterfaceConfig,
        /// The device being acted on
        device: &'a str,
    },
    /// The group-wide pass over an allow-group
    Group(&'a str),
}

/// The hook-specific part of the environment
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    phase: Phase,
    target: HookTarget<'a>,
    verbose: bool,
}

impl<'a> HookContext<'a> {
    /// Constructor
    #[must_use]
    pub fn new(phase: Phase, target: HookTarget<'a>, verbose: bool) -> Self {
        Self {
            phase,
            target,
            verbose,
        }
    }

    /// The phase being run
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// What the hook is being run for
    #[must_use]
    pub fn target(&self) -> HookTarget<'a> {
        self.target
    }

    /// Looks up one variable.
    ///
    /// Only the [`CONTEXT_VARS`] and option variables are recognised.
    #[must_use]
    pub fn get(&self, var: &str) -> Option<String> {
        let fixed = match (var, self.target) {
            ("PHASE", _) => self.phase.to_string(),
            ("MODE", _) => self.phase.mode().to_string(),
            ("VERBOSITY", _) => String::from(if self.verbose { "1" } else { "0" }),
            ("IFACE", HookTarget::Interface { device, .. }) => device.into(),
            ("IFACE", HookTarget::Group(_)) => "--all".into(),
            ("LOGICAL", HookTarget::Interface { config, .. }) => config.name().into(),
            ("LOGICAL", HookTarget::Group(group)) => group.into(),
            ("ADDRFAM", HookTarget::Interface { config, .. }) => config.family().into(),
            ("ADDRFAM", HookTarget::Group(_)) => "meta".into(),
            ("METHOD", HookTarget::Interface { config, .. }) => config.method().into(),
            ("METHOD", HookTarget::Group(_)) => "none".into(),
            (_, HookTarget::Interface { config, .. }) => {
                let option = env_to_option(var)?;
                return config.get(&option).map(ToString::to_string);
            }
            (_, HookTarget::Group(_)) => return None,
        };
        Some(fixed)
    }

    /// Every variable, as a concrete set
    #[must_use]
    pub fn layer(&self) -> EnvLayer {
        let mut layer: EnvLayer = CONTEXT_VARS
            .iter()
            .filter_map(|k| Some(((*k).to_owned(), self.get(k)?)))
            .collect();
        if let HookTarget::Interface { config, .. } = self.target {
            layer.extend(
                config
                    .options()
                    .iter()
                    .filter_map(|(k, v)| Some((option_to_env(k)?, v.to_string()))),
            );
        }
        layer
    }
}

/// A complete process environment, built from layers.
///
/// Later layers take precedence over earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    cwd: PathBuf,
    layers: Vec<EnvLayer>,
}

impl Environment {
    /// Combines the base environment with a hook context
    #[must_use]
    pub fn new(base: &BaseEnvironment, context: &HookContext<'_>) -> Self {
        Self {
            cwd: base.cwd.clone(),
            layers: vec![base.vars.clone(), context.layer()],
        }
    }

    /// Looks up one variable
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(key))
            .map(String::as_str)
    }

    /// The working directory for commands
    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Every variable, with precedence applied
    #[must_use]
    pub fn merged(&self) -> EnvLayer {
        self.layers
            .iter()
            .flat_map(|layer| layer.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }

    /// Sets up a command to run in exactly this environment
    #[must_use]
    pub fn command<S: AsRef<OsStr>>(&self, program: S) -> Command {
        let mut command = Command::new(program);
        let _ = command
            .env_clear()
            .envs(self.merged())
            .current_dir(&self.cwd);
        command
    }
}

///////////////////////////////////////////////////////////////////////////////////////
