// ifupdown-ng command-line arguments
// (c) 2024 Ross Younger

use std::{path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand};

use super::styles::CLAP_STYLES;

/// The commands this binary provides.
/// If it is invoked under one of these names, that command is selected.
pub(crate) const COMMANDS: [&str; 3] = ["ifup", "ifdown", "ifquery"];

#[derive(Debug, Parser, Clone)]
#[command(
    author,
    version(env!("IFUPDOWN_NG_VERSION_STRING")),
    about,
    styles(CLAP_STYLES),
    infer_long_args(true),
    after_help = "This binary may also be invoked as ifup, ifdown or ifquery (e.g. via a symlink)."
)]
pub(crate) struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub(crate) enum Command {
    /// Brings up network interfaces
    Ifup(UpDownArgs),
    /// Takes down network interfaces
    Ifdown(UpDownArgs),
    /// Displays network interface configuration
    Ifquery(QueryArgs),
}

impl Command {
    pub(crate) fn common(&self) -> &CommonArgs {
        match self {
            Command::Ifup(a) | Command::Ifdown(a) => &a.common,
            Command::Ifquery(a) => &a.common,
        }
    }
}

/// Options shared by every command
#[derive(Debug, Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonArgs {
    /// The interfaces(5) file to load [default: /etc/network/interfaces]
    #[arg(short, long, value_name("FILE"))]
    pub interfaces: Option<PathBuf>,

    /// Only processes interfaces marked `allow-CLASS` (may be repeated) [default: auto]
    #[arg(long, value_name("CLASS"))]
    pub allow: Vec<String>,

    /// Ignores interfaces matching this glob pattern (may be repeated)
    #[arg(short = 'X', long, value_name("PATTERN"))]
    pub exclude: Vec<String>,

    /// Prints what is happening as it happens
    ///
    /// This has the same effect as setting `RUST_LOG=ifupdown_ng=debug` in the environment.
    /// If present, `RUST_LOG` overrides this option.
    #[arg(short, long, action, conflicts_with("quiet"))]
    pub verbose: bool,

    /// Reports only errors
    #[arg(short, long, action)]
    pub quiet: bool,

    /// Sets OPTION to VALUE as though it were in every interface stanza acted on (may be repeated)
    #[arg(short = 'o', long = "option", value_name("OPTION=VALUE"), value_parser = parse_override)]
    pub options: Vec<(String, String)>,

    /// Disables all mapping scripts
    #[arg(long, action)]
    pub no_mappings: bool,

    /// Disables all hook scripts (in `if-*.d` under the configuration directory)
    ///
    /// Commands given in interface stanzas still run.
    #[arg(long, action)]
    pub no_scripts: bool,

    /// Logs to a file
    ///
    /// By default the log receives everything printed to stderr.
    /// To override this behaviour, set the environment variable `RUST_LOG_FILE_DETAIL` (same semantics as `RUST_LOG`).
    #[arg(long, action, value_name("FILE"), help_heading("Debug"))]
    pub log_file: Option<String>,

    /// Shows the settings in effect, and where each came from, then exits
    #[arg(long, action, help_heading("Debug"))]
    pub show_config: bool,
}

impl CommonArgs {
    /// The allow-groups to operate on
    pub(crate) fn groups(&self) -> Vec<&str> {
        if self.allow.is_empty() {
            vec!["auto"]
        } else {
            self.allow.iter().map(String::as_str).collect()
        }
    }

    pub(crate) fn trace_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}

/// Parses `OPTION=VALUE`
fn parse_override(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected OPTION=VALUE, got `{arg}`"))?;
    if key.is_empty() {
        return Err(format!("missing option name in `{arg}`"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// An interface to act on, with the logical configuration to use for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub ifname: String,
    pub logical: Option<String>,
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ifname, logical) = match s.split_once('=') {
            Some((i, l)) => (i, Some(l)),
            None => (s, None),
        };
        if ifname.is_empty() || logical.is_some_and(str::is_empty) {
            return Err(format!("expected IFACE or IFACE=LOGICAL, got `{s}`"));
        }
        Ok(Self {
            ifname: ifname.to_owned(),
            logical: logical.map(str::to_owned),
        })
    }
}

/// Arguments to `ifup` and `ifdown`
#[derive(Debug, Args, Clone)]
pub(crate) struct UpDownArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Displays commands but does not run them
    ///
    /// Mapping scripts still run.
    #[arg(short = 'n', long, action)]
    pub no_act: bool,

    /// Processes all interfaces in the selected allow-groups
    #[arg(short, long, action, conflicts_with("targets"))]
    pub all: bool,

    /// The interfaces to process, each optionally with the logical interface configuration to use
    #[arg(
        value_name("IFACE[=LOGICAL]"),
        required_unless_present_any(["all", "show_config"])
    )]
    pub targets: Vec<Target>,
}

/// Arguments to `ifquery`
#[derive(Debug, Args, Clone)]
pub(crate) struct QueryArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Lists all interfaces in the selected allow-groups
    #[arg(short, long, action, conflicts_with("targets"))]
    pub list: bool,

    /// The interfaces to query
    #[arg(value_name("IFACE"), required_unless_present_any(["list", "show_config"]))]
    pub targets: Vec<String>,
}

#[cfg(test)]
mod test {
    use clap::Parser as _;

    use super::{CliArgs, Command, Target};

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("ifupdown-ng").chain(args.iter().copied()))
    }

    #[test]
    fn up_targets() {
        let args = parse(&["ifup", "eth0", "wlan0=home", "-o", "mtu=9000"]).unwrap();
        let Command::Ifup(a) = args.command else {
            panic!("wrong command");
        };
        assert_eq!(
            a.targets,
            vec![
                Target {
                    ifname: "eth0".into(),
                    logical: None
                },
                Target {
                    ifname: "wlan0".into(),
                    logical: Some("home".into())
                },
            ]
        );
        assert_eq!(a.common.options, vec![("mtu".into(), "9000".into())]);
        assert_eq!(a.common.groups(), vec!["auto"]);
        assert_eq!(a.common.trace_level(), "info");
    }

    #[test]
    fn all_or_targets() {
        let args = parse(&["ifdown", "-a", "--allow", "hotplug", "--allow", "boot", "-v"]).unwrap();
        let Command::Ifdown(a) = args.command else {
            panic!("wrong command");
        };
        assert!(a.all);
        assert_eq!(a.common.groups(), vec!["hotplug", "boot"]);
        assert_eq!(a.common.trace_level(), "debug");

        assert!(parse(&["ifdown"]).is_err());
        assert!(parse(&["ifdown", "-a", "eth0"]).is_err());
        assert!(parse(&["ifup", "=foo"]).is_err());
        assert!(parse(&["ifup", "eth0="]).is_err());
        assert!(parse(&["ifup", "--show-config"]).is_ok());
    }

    #[test]
    fn query_list_or_targets() {
        assert!(parse(&["ifquery", "-l"]).is_ok());
        assert!(parse(&["ifquery", "eth0", "eth1"]).is_ok());
        assert!(parse(&["ifquery"]).is_err());
        assert!(parse(&["ifquery", "-l", "eth0"]).is_err());
        // -n is not meaningful for a query
        assert!(parse(&["ifquery", "-n", "eth0"]).is_err());
    }

    #[test]
    fn bad_override() {
        assert!(parse(&["ifup", "-o", "mtu", "eth0"]).is_err());
        assert!(parse(&["ifup", "-o", "=1", "eth0"]).is_err());
        assert!(parse(&["ifup", "-v", "-q", "eth0"]).is_err());
    }

    #[test]
    fn log_file_is_long_only() {
        let args = parse(&["ifquery", "--log-file", "/tmp/x", "-l"]).unwrap();
        assert_eq!(args.command.common().log_file.as_deref(), Some("/tmp/x"));
    }
}
