//! Log output setup
// (c) 2024 Ross Younger

use std::{fs::File, sync::Arc};

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

const STANDARD_ENV_VAR: &str = "RUST_LOG";
const LOG_FILE_DETAIL_ENV_VAR: &str = "RUST_LOG_FILE_DETAIL";

struct FilterResult {
    filter: EnvFilter,
    /// The filter came from the environment, so may admit other crates' events
    used_env: bool,
}

/// The filter named by an environment variable, or else only our own events at `trace_level`.
/// A variable that is set but unparseable is an error.
fn filter_for(trace_level: &str, key: &str) -> anyhow::Result<FilterResult> {
    EnvFilter::try_from_env(key)
        .map(|filter| FilterResult {
            filter,
            used_env: true,
        })
        .or_else(|e| {
            if std::env::var(key).is_ok() {
                anyhow::bail!("{key} (set in environment) was invalid: {e}");
            }
            Ok(FilterResult {
                filter: EnvFilter::new(format!("ifupdown_ng={trace_level}")),
                used_env: false,
            })
        })
}

/// Installs the log subscriber: compact messages on stderr, and optionally a plain-text log file.
///
/// Only ifupdown-ng's own events are logged, at `trace_level`, unless `RUST_LOG` says otherwise.
/// The file follows `RUST_LOG_FILE_DETAIL` if that is set.
///
/// If this fails there is no subscriber, so the caller has to report the error itself.
pub fn setup(trace_level: &str, filename: Option<&str>) -> anyhow::Result<()> {
    let mut layers = Vec::new();

    let filter = filter_for(trace_level, STANDARD_ENV_VAR)?;
    // targets are only interesting when other crates may be logging
    let format = fmt::layer()
        .compact()
        .without_time()
        .with_target(filter.used_env)
        .with_writer(std::io::stderr)
        .with_filter(filter.filter)
        .boxed();
    layers.push(format);

    if let Some(filename) = filename {
        let out_file = Arc::new(
            File::create(filename).with_context(|| format!("opening log file {filename}"))?,
        );
        let filter = if std::env::var(LOG_FILE_DETAIL_ENV_VAR).is_ok() {
            FilterResult {
                filter: EnvFilter::try_from_env(LOG_FILE_DETAIL_ENV_VAR)?,
                used_env: true,
            }
        } else {
            filter_for(trace_level, STANDARD_ENV_VAR)?
        };
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(out_file)
            .with_target(filter.used_env)
            .compact()
            .with_ansi(false)
            .with_filter(filter.filter)
            .boxed();
        layers.push(layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("installing log subscriber")?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::filter_for;

    #[test]
    fn default_filter_is_own_crate_only() {
        let result = filter_for("debug", "IFUPDOWN_NG_NO_SUCH_FILTER_VAR").unwrap();
        assert!(!result.used_env);
        assert_eq!(result.filter.to_string(), "ifupdown_ng=debug");
    }
}
