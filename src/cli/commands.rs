//! The ifup, ifdown and ifquery commands
// (c) 2024 Ross Younger

use std::collections::BTreeSet;

use anyhow::{Context as _, Result};
use glob::Pattern;
use tracing::{debug, error, info};

use super::args::{CommonArgs, QueryArgs, Target, UpDownArgs};
use crate::{
    config::{fnmatch_pattern, InterfaceConfig, SystemConfig, FNMATCH},
    hook::{HookRunner, HookTarget, Mode, Phase},
    settings::Settings,
    util::{interface_device, interface_is_alias},
};

/// Compiles the `--exclude` patterns
fn exclude_patterns(args: &CommonArgs) -> Result<Vec<Pattern>> {
    args.exclude
        .iter()
        .map(|p| fnmatch_pattern(p).with_context(|| format!("invalid exclude pattern {p}")))
        .collect()
}

fn is_excluded(excludes: &[Pattern], ifname: &str) -> bool {
    let excluded = excludes.iter().any(|p| p.matches_with(ifname, FNMATCH));
    if excluded {
        debug!("{ifname} is excluded");
    }
    excluded
}

/// Works out which logical interface configuration applies to a target
fn logical_name(system: &SystemConfig, target: &Target, no_mappings: bool) -> String {
    if let Some(logical) = &target.logical {
        return logical.clone();
    }
    if !no_mappings {
        if let Some(mapped) = system.map_interface(&target.ifname) {
            debug!("{} mapped to {mapped}", target.ifname);
            return mapped;
        }
    }
    target.ifname.clone()
}

/// Returns a copy of a configuration with the `-o` overrides applied
fn with_overrides(config: &InterfaceConfig, overrides: &[(String, String)]) -> Result<InterfaceConfig> {
    let mut config = config.clone();
    for (key, value) in overrides {
        config
            .set_option(key, value)
            .with_context(|| format!("applying option {key}={value}"))?;
    }
    Ok(config)
}

/// Renders a configuration's options as `key: value` lines.
/// Options with several values produce one line per value.
pub(crate) fn render_options(config: &InterfaceConfig) -> String {
    config
        .options()
        .iter()
        .flat_map(|(key, value)| value.values().iter().map(move |v| format!("{key}: {v}\n")))
        .collect()
}

// IFUP / IFDOWN ////////////////////////////////////////////////////////////////////////

struct UpDown<'a> {
    system: &'a SystemConfig,
    args: &'a UpDownArgs,
    runner: HookRunner,
    phases: [Phase; 2],
    excludes: Vec<Pattern>,
}

impl UpDown<'_> {
    fn verb(&self) -> &'static str {
        match self.phases[0].mode() {
            Mode::Start => "Bringing up",
            Mode::Stop => "Taking down",
        }
    }

    fn run_phases(&self, target: HookTarget<'_>, what: &str) -> Result<bool> {
        for phase in self.phases {
            let code = self
                .runner
                .run_hook(phase, target, self.args.common.verbose)?;
            if code != 0 {
                error!("{what}: {phase} failed with exit code {code}");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn interface(&self, target: &Target) -> Result<bool> {
        let common = &self.args.common;
        let ifname = target.ifname.as_str();
        if is_excluded(&self.excludes, ifname) {
            return Ok(true);
        }
        if interface_is_alias(ifname) {
            debug!("{ifname} is an alias on {}", interface_device(ifname));
        }
        let logical = logical_name(self.system, target, common.no_mappings);
        let mut found = false;
        for config in self.system.configs_named(&logical) {
            found = true;
            let config = with_overrides(config, &common.options)?;
            info!("{} {ifname} ({})", self.verb(), config.key());
            let hook_target = HookTarget::Interface {
                config: &config,
                device: ifname,
            };
            if !self.run_phases(hook_target, ifname)? {
                return Ok(false);
            }
        }
        if !found {
            error!("No configuration found for {ifname} (logical interface {logical})");
        }
        Ok(found)
    }

    /// Runs an interface, logging any error
    fn interface_logged(&self, target: &Target) -> bool {
        self.interface(target)
            .inspect_err(|e| error!("{}: {e:#}", target.ifname))
            .unwrap_or(false)
    }

    fn group(&self, group: &str) -> Result<bool> {
        debug!("allow-group {group}");
        if !self.run_phases(HookTarget::Group(group), group)? {
            return Ok(false);
        }
        let Some(members) = self.system.allow_group(group) else {
            debug!("allow-group {group} has no members");
            return Ok(true);
        };
        let mut success = true;
        for ifname in members {
            let target = Target {
                ifname: ifname.clone(),
                logical: None,
            };
            success &= self.interface_logged(&target);
        }
        Ok(success)
    }
}

/// Brings interfaces up or down, by running the given phases in order.
///
/// Returns true if everything succeeded.
pub(crate) fn updown(
    settings: &Settings,
    system: &SystemConfig,
    args: &UpDownArgs,
    phases: [Phase; 2],
) -> Result<bool> {
    let common = &args.common;
    let updown = UpDown {
        system,
        args,
        runner: HookRunner::new(settings)
            .with_scripts(!common.no_scripts)
            .with_no_act(args.no_act),
        phases,
        excludes: exclude_patterns(common)?,
    };

    let mut success = true;
    if args.all {
        for group in common.groups() {
            success &= updown
                .group(group)
                .inspect_err(|e| error!("allow-group {group}: {e:#}"))
                .unwrap_or(false);
        }
    } else {
        for target in &args.targets {
            success &= updown.interface_logged(target);
        }
    }
    Ok(success)
}

// IFQUERY //////////////////////////////////////////////////////////////////////////////

/// Lists or describes interfaces.
///
/// Returns true if everything asked for was found.
pub(crate) fn query(system: &SystemConfig, args: &QueryArgs) -> Result<bool> {
    let common = &args.common;
    let excludes = exclude_patterns(common)?;

    if args.list {
        let mut seen = BTreeSet::new();
        for group in common.groups() {
            for ifname in system.allow_group(group).into_iter().flatten() {
                if !is_excluded(&excludes, ifname) && seen.insert(ifname.as_str()) {
                    println!("{ifname}");
                }
            }
        }
        return Ok(true);
    }

    let mut success = true;
    for ifname in &args.targets {
        let target = Target {
            ifname: ifname.clone(),
            logical: None,
        };
        let logical = logical_name(system, &target, common.no_mappings);
        let rendered = system
            .configs_named(&logical)
            .map(|c| with_overrides(c, &common.options).map(|c| render_options(&c)))
            .collect::<Result<Vec<_>>>()?;
        if rendered.is_empty() {
            error!("No configuration found for {ifname} (logical interface {logical})");
            success = false;
        }
        print!("{}", rendered.join("\n"));
    }
    Ok(success)
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use std::path::Path;

    use clap::Parser as _;

    use super::{query, render_options, updown, with_overrides};
    use crate::{
        cli::args::{CliArgs, Command, QueryArgs, UpDownArgs},
        config::{SystemConfig, TokenStream},
        hook::Phase,
        settings::Settings,
    };

    fn system(text: &str) -> SystemConfig {
        let mut system = SystemConfig::new();
        let _ = system.load_stream(TokenStream::for_string(text, "<test>"));
        assert_eq!(system.total_errors(), 0);
        system
    }

    fn settings(dir: &Path) -> Settings {
        Settings {
            config_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn updown_args(args: &[&str]) -> UpDownArgs {
        let args = CliArgs::try_parse_from(std::iter::once("ifupdown-ng").chain(args.iter().copied()))
            .unwrap();
        match args.command {
            Command::Ifup(a) | Command::Ifdown(a) => a,
            Command::Ifquery(_) => panic!("wrong command"),
        }
    }

    fn query_args(args: &[&str]) -> QueryArgs {
        let args = CliArgs::try_parse_from(
            ["ifupdown-ng", "ifquery"].into_iter().chain(args.iter().copied()),
        )
        .unwrap();
        match args.command {
            Command::Ifquery(a) => a,
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn render() {
        let sys = system("iface eth0 inet static\n  mtu 1500\n  up a\n  up b\n");
        let cfg = sys.configs().values().next().unwrap();
        assert_eq!(render_options(cfg), "mtu: 1500\nup: a\nup: b\n");

        let cfg = with_overrides(cfg, &[("mtu".into(), "9000".into()), ("up".into(), "c".into())])
            .unwrap();
        assert_eq!(render_options(&cfg), "mtu: 9000\nup: a\nup: b\nup: c\n");

        assert!(with_overrides(&cfg, &[("bad name".into(), "x".into())]).is_err());
    }

    #[test]
    fn up_runs_stanza_commands_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let sys = system(&format!(
            "iface eth0 inet manual\n  mtu 1500\n  up test \"$IF_MTU\" = 9000 && touch {}\n",
            marker.display()
        ));
        let args = updown_args(&["ifup", "eth0", "-o", "mtu=9000"]);
        assert!(updown(&settings(dir.path()), &sys, &args, Phase::UP).unwrap());
        assert!(marker.exists());
    }

    #[test]
    fn no_act_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let sys = system(&format!(
            "iface eth0 inet manual\n  down touch {}\n",
            marker.display()
        ));
        let args = updown_args(&["ifdown", "-n", "eth0"]);
        assert!(updown(&settings(dir.path()), &sys, &args, Phase::DOWN).unwrap());
        assert!(!marker.exists());
    }

    #[test]
    fn logical_name_selects_config() {
        let dir = tempfile::tempdir().unwrap();
        let sys = system("iface home inet manual\n  up test \"$IFACE\" = wlan0 && test \"$LOGICAL\" = home\n");
        let s = settings(dir.path());
        assert!(updown(&s, &sys, &updown_args(&["ifup", "wlan0=home"]), Phase::UP).unwrap());
        // no configuration for wlan0 itself
        assert!(!updown(&s, &sys, &updown_args(&["ifup", "wlan0"]), Phase::UP).unwrap());
    }

    #[test]
    fn failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let sys = system("iface eth0 inet manual\n  pre-up false\n");
        let args = updown_args(&["ifup", "eth0"]);
        assert!(!updown(&settings(dir.path()), &sys, &args, Phase::UP).unwrap());
    }

    #[test]
    fn all_processes_groups_with_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let (m0, m1) = (dir.path().join("eth0"), dir.path().join("eth1"));
        let sys = system(&format!(
            "auto eth0 eth1\niface eth0 inet manual\n  up touch {}\niface eth1 inet manual\n  up touch {}\n",
            m0.display(),
            m1.display()
        ));
        let args = updown_args(&["ifup", "-a", "-X", "*1"]);
        assert!(updown(&settings(dir.path()), &sys, &args, Phase::UP).unwrap());
        assert!(m0.exists());
        assert!(!m1.exists());

        // a group with no members is not a failure
        let args = updown_args(&["ifup", "-a", "--allow", "hotplug"]);
        assert!(updown(&settings(dir.path()), &sys, &args, Phase::UP).unwrap());
    }

    #[test]
    fn group_hook_failure_skips_members() {
        let dir = tempfile::tempdir().unwrap();
        let hooks = dir.path().join("if-pre-up.d");
        std::fs::create_dir(&hooks).unwrap();
        std::os::unix::fs::symlink("/bin/false", hooks.join("10-fail")).unwrap();
        let marker = dir.path().join("marker");
        let sys = system(&format!(
            "auto eth0\niface eth0 inet manual\n  up touch {}\n",
            marker.display()
        ));
        let args = updown_args(&["ifup", "-a"]);
        assert!(!updown(&settings(dir.path()), &sys, &args, Phase::UP).unwrap());
        assert!(!marker.exists());

        let args = updown_args(&["ifup", "-a", "--no-scripts"]);
        assert!(updown(&settings(dir.path()), &sys, &args, Phase::UP).unwrap());
        assert!(marker.exists());
    }

    #[test]
    fn queries() {
        let sys = system("auto lo\niface lo inet loopback\niface eth0 inet dhcp\n  hostname box\n");
        assert!(query(&sys, &query_args(&["-l"])).unwrap());
        assert!(query(&sys, &query_args(&["eth0", "lo"])).unwrap());
        assert!(!query(&sys, &query_args(&["eth9"])).unwrap());
        assert!(query(&sys, &query_args(&["-X", "l**", "-l"])).unwrap());
        assert!(query(&sys, &query_args(&["-X", "[", "-l"])).unwrap());
    }
}
