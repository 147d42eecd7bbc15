// Main CLI entrypoint
// (c) 2024 Ross Younger

use std::{ffi::OsString, path::Path, process::ExitCode};

use anyhow::Context as _;
use clap::Parser;

use super::{
    args::{CliArgs, Command, COMMANDS},
    commands,
};
use crate::{
    config::{LoadStatus, SystemConfig},
    hook::Phase,
    settings::{CommandLine, Manager, Settings},
    util::setup_tracing,
};

/// If we were invoked under the name of one of our commands, inserts that command
/// as the first argument so the parser selects it.
fn args_for_invocation<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().collect();
    let invoked_as = args
        .first()
        .and_then(|a| Path::new(a).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| COMMANDS.contains(n))
        .map(OsString::from);
    if let Some(command) = invoked_as {
        args.insert(1, command);
    }
    args
}

/// Main CLI entrypoint
pub fn cli() -> anyhow::Result<ExitCode> {
    let args = CliArgs::parse_from(args_for_invocation(std::env::args_os()));
    let common = args.command.common();
    setup_tracing(common.trace_level(), common.log_file.as_deref())
        .inspect_err(|e| eprintln!("{e:?}"))?;

    run(&args)
        .inspect_err(|e| tracing::error!("{e:#}"))
        .or_else(|_| Ok(false))
        .map(|success| {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        })
}

fn run(args: &CliArgs) -> anyhow::Result<bool> {
    let common = args.command.common();
    let mut manager = Manager::new();
    if let Some(interfaces) = &common.interfaces {
        manager.merge_provider(
            CommandLine::default().with("interfaces", interfaces.to_string_lossy().into_owned()),
        );
    }
    if common.show_config {
        println!("{manager}");
        return Ok(true);
    }
    let settings: Settings = manager.get().context("reading settings")?;

    let mut system = SystemConfig::new();
    let _ = system.load_interfaces_file(settings.interfaces_file());
    if system.log_total_errors() == LoadStatus::Broken {
        return Ok(false);
    }

    match &args.command {
        Command::Ifup(a) => commands::updown(&settings, &system, a, Phase::UP),
        Command::Ifdown(a) => commands::updown(&settings, &system, a, Phase::DOWN),
        Command::Ifquery(a) => commands::query(&system, a),
    }
}
