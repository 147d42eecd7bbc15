//! Running hooks
// (c) 2024 Ross Younger

use std::{
    fmt::Display,
    io::ErrorKind,
    os::unix::{fs::PermissionsExt as _, process::ExitStatusExt as _},
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::{BaseEnvironment, Environment, HookContext, HookTarget, Mode, Phase};
use crate::{
    os::{AbstractPlatform as _, Platform},
    settings::Settings,
};

/// One thing to run
#[derive(Debug, Clone, Copy)]
enum Step<'a> {
    /// A command from the interface stanza, run by the shell
    Command(&'a str),
    /// An executable from the phase's hook directory
    Script(&'a Path),
}

impl Display for Step<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Command(c) => write!(f, "{c}"),
            Step::Script(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Converts an exit status to a shell-style code: the exit code, or 128 plus the signal number
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|s| 128 + s))
        .unwrap_or(1)
}

/// Is this a name that run-parts(8) would run?
fn valid_script_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Lists the scripts in a hook directory that should run, in the order they should run.
///
/// These are the executable regular files (or symlinks to them) whose names consist only of
/// letters, digits, underscores and hyphens.
/// A missing directory has no scripts.
pub fn hook_scripts(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("hook directory {} not present", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).with_context(|| format!("reading {}", dir.display())),
    };
    let mut scripts = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading {}", dir.display()))?;
        let name = entry.file_name();
        if !name.to_str().is_some_and(valid_script_name) {
            continue;
        }
        let path = entry.path();
        // follows symlinks
        let Ok(meta) = std::fs::metadata(&path) else {
            continue;
        };
        if meta.is_file() && meta.permissions().mode() & 0o111 != 0 {
            scripts.push(path);
        }
    }
    scripts.sort();
    Ok(scripts)
}

/// Runs the hooks for a phase
#[derive(Debug, Clone)]
pub struct HookRunner {
    config_dir: PathBuf,
    base: BaseEnvironment,
    run_scripts: bool,
    no_act: bool,
}

impl HookRunner {
    /// Creates a runner for this process's environment
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            config_dir: settings.config_dir.clone(),
            base: BaseEnvironment::from_process(&settings.default_path),
            run_scripts: true,
            no_act: false,
        }
    }

    /// Replaces the base environment
    #[must_use]
    pub fn with_base(mut self, base: BaseEnvironment) -> Self {
        self.base = base;
        self
    }

    /// Enables or disables the scripts in the hook directories.
    /// Commands in interface stanzas are not affected.
    #[must_use]
    pub fn with_scripts(mut self, run_scripts: bool) -> Self {
        self.run_scripts = run_scripts;
        self
    }

    /// If set, commands are logged but not run
    #[must_use]
    pub fn with_no_act(mut self, no_act: bool) -> Self {
        self.no_act = no_act;
        self
    }

    /// The directory of hook scripts for a phase
    #[must_use]
    pub fn hook_dir(&self, phase: Phase) -> PathBuf {
        self.config_dir.join(phase.hook_dir_name())
    }

    /// Runs every hook for a phase, stopping at the first failure.
    ///
    /// For an interface, the commands from its stanza run as well as the hook directory;
    /// when starting they run first, when stopping they run last.
    ///
    /// Returns the exit code of the failing hook, or 0 if all succeeded.
    /// An error is returned only if a hook could not be run at all.
    pub fn run_hook(&self, phase: Phase, target: HookTarget<'_>, verbose: bool) -> Result<i32> {
        let context = HookContext::new(phase, target, verbose);
        let env = Environment::new(&self.base, &context);

        let commands: &[String] = match target {
            HookTarget::Interface { config, .. } => config.commands(phase.option_key()),
            HookTarget::Group(_) => &[],
        };
        let scripts = if self.run_scripts {
            hook_scripts(&self.hook_dir(phase))?
        } else {
            Vec::new()
        };
        let commands = commands.iter().map(|c| Step::Command(c));
        let scripts = scripts.iter().map(|p| Step::Script(p));
        let steps: Vec<Step<'_>> = match phase.mode() {
            Mode::Start => commands.chain(scripts).collect(),
            Mode::Stop => scripts.chain(commands).collect(),
        };

        for step in steps {
            let code = self.run_step(&env, phase, step)?;
            if code != 0 {
                warn!("{phase}: {step} failed with exit code {code}");
                return Ok(code);
            }
        }
        Ok(0)
    }

    fn run_step(&self, env: &Environment, phase: Phase, step: Step<'_>) -> Result<i32> {
        if self.no_act {
            info!("{phase}: would run {step}");
            return Ok(0);
        }
        debug!("{phase}: running {step}");
        let mut command = match step {
            Step::Command(c) => {
                let mut command = env.command(Platform::shell());
                let _ = command.arg("-c").arg(c);
                command
            }
            Step::Script(p) => env.command(p),
        };
        let status = command
            .stdin(Stdio::null())
            .status()
            .with_context(|| format!("running {step}"))?;
        Ok(exit_code(status))
    }
}

///////////////////////////////////////////////////////////////////////////////////////
