// (c) 2024 Ross Younger
//! Styling of the command-line help

#[allow(clippy::enum_glob_use)]
use anstyle::AnsiColor::*;
use anstyle::{Color::Ansi, Style};
use clap::builder::styling::Styles;

const fn coloured(colour: anstyle::AnsiColor) -> Style {
    Style::new().fg_color(Some(Ansi(colour)))
}

/// Section headings and the usage line
const HEADING: Style = coloured(Yellow).underline();
/// `IFACE`, `FILE` and other value names
const VALUE_NAME: Style = coloured(Cyan);

/// Colours for clap's help and error output
pub(crate) const CLAP_STYLES: Styles = Styles::styled()
    .usage(HEADING)
    .header(HEADING)
    .literal(Style::new().bold())
    .placeholder(VALUE_NAME)
    .valid(VALUE_NAME.bold().underline())
    .invalid(coloured(Yellow).bold())
    .error(coloured(Red).bold());
