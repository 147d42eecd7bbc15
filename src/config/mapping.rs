//! Interface mapping stanzas
// (c) 2024 Ross Younger

use std::{
    io::{ErrorKind, Write as _},
    os::unix::process::ExitStatusExt as _,
    process::{Command, Stdio},
};

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern, PatternError};
use tracing::{debug, error, warn};

use super::tokenizer::TokenStream;
use crate::util::valid_interface_name;

/// `fnmatch(3)` without flags: case-sensitive, and wildcards may match `/` and leading dots
pub(crate) const FNMATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Where the bracket expression opening at `start` closes, if it does.
/// A `]` straight after the opening `[` or `[!` is part of the set.
fn bracket_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    chars.get(j..)?.iter().position(|c| *c == ']').map(|p| j + p)
}

/// Compiles an `fnmatch(3)` pattern, to be matched with [`FNMATCH`].
///
/// `glob` patterns differ in three ways, which are translated here:
/// a backslash escapes the next character; runs of `*` mean the same as one;
/// a `[` with no closing `]` is an ordinary character.
pub(crate) fn fnmatch_pattern(pattern: &str) -> Result<Pattern, PatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '\\' => match chars.get(i + 1) {
                Some(c) => {
                    out.push_str(&Pattern::escape(&c.to_string()));
                    i += 1;
                }
                None => out.push('\\'),
            },
            '[' => match bracket_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            c => out.push(c),
        }
        i += 1;
    }
    Pattern::new(&out)
}

/// One `mapping` stanza.
///
/// A mapping rule applies to interface names matching any of its patterns.
/// Its script is run with the interface name as its argument and the `map` lines on its standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    patterns: Vec<Pattern>,
    script: Option<String>,
    stdin_lines: Vec<String>,
}

impl Mapping {
    /// Creates a mapping from a set of glob patterns.
    ///
    /// Invalid patterns are reported and left out.
    pub(crate) fn new(stream: &mut TokenStream, patterns: &[&str]) -> Self {
        let mut compiled = Vec::with_capacity(patterns.len());
        for p in patterns {
            match fnmatch_pattern(p) {
                Ok(pat) if !compiled.contains(&pat) => compiled.push(pat),
                Ok(_) => (),
                Err(e) => stream.error(format!("Invalid mapping pattern {p}: {e}")),
            }
        }
        Self {
            patterns: compiled,
            script: None,
            stdin_lines: Vec::new(),
        }
    }

    /// Creates a mapping outside of any configuration file
    pub fn from_parts<S: Into<String>>(
        patterns: &[&str],
        script: S,
        stdin_lines: &[&str],
    ) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| fnmatch_pattern(p).with_context(|| format!("invalid mapping pattern {p}")))
            .collect::<Result<_>>()?;
        Ok(Self {
            patterns,
            script: Some(script.into()),
            stdin_lines: stdin_lines.iter().map(|s| (*s).to_owned()).collect(),
        })
    }

    /// The patterns this mapping applies to
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }

    /// The mapping script, if one has been set
    #[must_use]
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Lines to be fed to the script, without their line terminators
    #[must_use]
    pub fn stdin_lines(&self) -> &[String] {
        &self.stdin_lines
    }

    /// Handles an option line within this stanza
    pub(crate) fn parse_option(&mut self, stream: &mut TokenStream, keyword: &str, rest: &str) {
        match keyword {
            "script" => {
                if self.script.is_some() {
                    stream.error("Duplicate 'script' option");
                } else if !rest.is_empty() {
                    self.script = Some(rest.to_owned());
                }
            }
            "map" => self.stdin_lines.push(rest.to_owned()),
            _ => stream.error(format!("Invalid option in this stanza: {keyword}")),
        }
    }

    /// Called when this stanza is no longer the one being parsed
    pub(crate) fn close_parsing(&self, stream: &mut TokenStream) {
        if self.script.is_none() {
            stream.error("No 'script' option was specified");
        }
    }

    /// Does this mapping apply to the given interface config name?
    #[must_use]
    pub fn should_map(&self, config_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(config_name, FNMATCH))
    }

    /// Runs the mapping script for an interface.
    ///
    /// Returns the interface name if the script succeeded and printed a valid interface name,
    /// or `None` if it did not.
    /// An error is returned only if the script could not be run at all.
    pub fn perform_mapping(&self, ifname: &str) -> Result<Option<String>> {
        let script = self
            .script
            .as_deref()
            .context("mapping has no script")?;
        let mut child = Command::new(script)
            .arg(ifname)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("running mapping script {script}"))?;

        // Input is fed from another thread, so a script that writes a lot before
        // reading cannot block us while we block it.
        let writer = child.stdin.take().map(|mut stdin| {
            let input: String = self.stdin_lines.iter().map(|l| format!("{l}\n")).collect();
            std::thread::spawn(move || match stdin.write_all(input.as_bytes()) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            })
        });
        let output = child
            .wait_with_output()
            .context("waiting for mapping script")?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| anyhow::anyhow!("mapping script input thread panicked"))?
                .context("writing to mapping script")?;
        }

        if let Some(signal) = output.status.signal() {
            warn!("Mapping script died with signal {signal}");
            return Ok(None);
        }
        if !output.status.success() {
            debug!(
                "Mapping script exited with code {}",
                output.status.code().unwrap_or_default()
            );
            return Ok(None);
        }
        if output.stdout.is_empty() {
            warn!("Mapping script succeeded with no output");
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let config_name = stdout.split('\n').next().unwrap_or_default();
        if valid_interface_name(config_name) {
            return Ok(Some(ifname.to_owned()));
        }
        error!("Mapped {ifname} to invalid interface config name: {config_name}");
        Ok(None)
    }
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::Mapping;
    use crate::config::tokenizer::TokenStream;

    fn stream() -> TokenStream {
        TokenStream::for_string("", "<test>")
    }

    #[test]
    fn glob_matching() {
        let mut s = stream();
        let m = Mapping::new(&mut s, &["eth*", "wl?n[0-3]"]);
        assert!(m.should_map("eth0"));
        assert!(m.should_map("eth"));
        assert!(m.should_map("wlan2"));
        assert!(!m.should_map("wlan"));
        assert!(!m.should_map("wlan7"));
        assert!(!m.should_map("ETH0"));
        assert!(!m.should_map("veth0"));
        assert_eq!(s.diagnostics().errors(), 0);
    }

    #[test]
    fn fnmatch_rules() {
        let mut s = stream();
        let m = Mapping::new(&mut s, &["eth**"]);
        assert!(m.should_map("eth0"));
        assert!(m.should_map("eth"));

        let m = Mapping::new(&mut s, &["eth\\*"]);
        assert!(m.should_map("eth*"));
        assert!(!m.should_map("eth0"));
        assert!(!m.should_map("eth\\x"));

        let m = Mapping::new(&mut s, &["br[", "bo[!]0]?"]);
        assert!(m.should_map("br["));
        assert!(m.should_map("bo1x"));
        assert!(!m.should_map("bo]x"));
        assert!(!m.should_map("br"));

        let m = Mapping::new(&mut s, &["en\\"]);
        assert!(m.should_map("en\\"));
        assert_eq!(s.diagnostics().errors(), 0);
    }

    #[test]
    fn duplicate_patterns_are_merged() {
        let mut s = stream();
        let m = Mapping::new(&mut s, &["wlan*", "wlan**", "wlan*"]);
        assert_eq!(s.diagnostics().errors(), 0);
        assert_eq!(m.patterns().collect::<Vec<_>>(), vec!["wlan*"]);
    }

    #[test]
    fn options() {
        let mut s = stream();
        let mut m = Mapping::new(&mut s, &["eth*"]);
        m.close_parsing(&mut s);
        assert_eq!(s.diagnostics().errors(), 1);

        m.parse_option(&mut s, "script", "/usr/local/bin/map-it");
        m.parse_option(&mut s, "map", "eth0 home");
        m.parse_option(&mut s, "map", "eth1 work");
        m.parse_option(&mut s, "script", "/bin/other");
        assert_eq!(s.diagnostics().errors(), 2);
        m.parse_option(&mut s, "address", "10.0.0.1");
        assert_eq!(s.diagnostics().errors(), 3);

        assert_eq!(m.script(), Some("/usr/local/bin/map-it"));
        assert_eq!(m.stdin_lines(), ["eth0 home", "eth1 work"]);
        m.close_parsing(&mut s);
        assert_eq!(s.diagnostics().errors(), 3);
    }

    #[test]
    fn empty_script_is_unset() {
        let mut s = stream();
        let mut m = Mapping::new(&mut s, &["eth*"]);
        m.parse_option(&mut s, "script", "");
        m.close_parsing(&mut s);
        assert_eq!(s.diagnostics().errors(), 1);
    }

    #[test]
    fn stdin_drives_the_script() {
        // `sh -s` runs its standard input as a script
        let m = Mapping::from_parts(&["*"], "/bin/sh", &["echo home"]).unwrap();
        assert_eq!(m.perform_mapping("-s").unwrap(), Some("-s".into()));

        let m = Mapping::from_parts(&["*"], "/bin/sh", &["echo 'not valid!'"]).unwrap();
        assert_eq!(m.perform_mapping("-s").unwrap(), None);

        let m = Mapping::from_parts(&["*"], "/bin/sh", &["echo home", "exit 3"]).unwrap();
        assert_eq!(m.perform_mapping("-s").unwrap(), None);

        let m = Mapping::from_parts(&["*"], "/bin/sh", &["kill -9 $$"]).unwrap();
        assert_eq!(m.perform_mapping("-s").unwrap(), None);
    }

    #[test]
    fn large_output_before_reading_input() {
        // more than a pipe buffer in both directions
        let mut lines = vec!["yes eth0 | head -n 50000".to_owned()];
        lines.extend((0..2000).map(|i| format!(": padding line {i} {}", "x".repeat(40))));
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let m = Mapping::from_parts(&["*"], "/bin/sh", &lines).unwrap();
        assert_eq!(m.perform_mapping("-s").unwrap(), Some("-s".into()));
    }

    #[test]
    fn failed_mapping() {
        let m = Mapping::from_parts(&["*"], "/bin/false", &[]).unwrap();
        assert_eq!(m.perform_mapping("eth0").unwrap(), None);
    }

    #[test]
    fn no_output() {
        let m = Mapping::from_parts(&["*"], "/bin/true", &["ignored"]).unwrap();
        assert_eq!(m.perform_mapping("eth0").unwrap(), None);
    }

    #[test]
    fn invalid_output() {
        let m = Mapping::from_parts(&["*"], "/bin/echo", &[]).unwrap();
        // echo prints its argument, which is not a valid interface name
        assert_eq!(m.perform_mapping("not/valid").unwrap(), None);
        assert_eq!(m.perform_mapping("eth0").unwrap(), Some("eth0".into()));
    }

    #[test]
    fn missing_script() {
        let m = Mapping::from_parts(&["*"], "/nonexistent/mapper", &[]).unwrap();
        assert!(m.perform_mapping("eth0").is_err());
    }
}
