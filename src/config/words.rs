//! Shell-style word expansion for `source` statements
// (c) 2024 Ross Younger

use std::path::PathBuf;

use anyhow::{Context, Result};
use glob::{glob_with, MatchOptions, Pattern};

/// One word of input, as both literal text and as a glob pattern.
///
/// Quoted or escaped characters are literal in the pattern; unquoted wildcards are live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct Word {
    pub(super) literal: String,
    pub(super) pattern: String,
}

impl Word {
    fn push_live(&mut self, ch: char) {
        self.literal.push(ch);
        self.pattern.push(ch);
    }

    fn push_quoted(&mut self, ch: char) {
        self.literal.push(ch);
        self.pattern.push_str(&Pattern::escape(ch.encode_utf8(&mut [0u8; 4])));
    }

    fn push_quoted_str(&mut self, s: &str) {
        self.literal.push_str(s);
        self.pattern.push_str(&Pattern::escape(s));
    }

    /// Expands a leading `~` or `~user`
    fn expand_tilde(self) -> Result<Self> {
        let (head, tail) = split_first_component(&self.literal);
        let (_, pattern_tail) = split_first_component(&self.pattern);
        let home = expanduser::expanduser(head)
            .with_context(|| format!("expanding {head}"))?
            .to_string_lossy()
            .into_owned();
        Ok(Self {
            literal: format!("{home}{tail}"),
            pattern: format!("{}{pattern_tail}", Pattern::escape(&home)),
        })
    }
}

fn split_first_component(s: &str) -> (&str, &str) {
    s.find('/').map_or((s, ""), |i| s.split_at(i))
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn lookup<F>(name: &str, env: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env(name).unwrap_or_default()
}

/// Splits a string into shell words.
///
/// Words are delimited by whitespace, subject to single and double quotes and backslash escapes.
/// `$NAME` and `${NAME}` are expanded (outside single quotes) using `env`; unset variables expand to nothing.
/// A leading unquoted `~` is expanded to a home directory.
/// An unquoted expansion that comes to nothing produces no word.
/// Command substitution is refused.
pub(super) fn split_words<F>(input: &str, env: F) -> Result<Vec<Word>>
where
    F: Fn(&str) -> Option<String>,
{
    let input: Vec<char> = input.chars().collect();
    let mut output = Vec::new();
    let mut i = 0;
    while i < input.len() {
        if input[i].is_whitespace() {
            i += 1;
            continue;
        }

        // We're at the start of a real word
        let mut word = Word::default();
        let tilde = input[i] == '~';
        let mut quote_state: char = '\0';
        // anything seen other than unquoted expansions
        let mut explicit = false;

        while i < input.len() {
            let ch = input[i];
            if quote_state != '\0' || !(ch == '$' || ch.is_whitespace()) {
                explicit = true;
            }
            match (ch, quote_state) {
                ('`', '\0' | '"') => anyhow::bail!("command substitution is not permitted"),
                ('$', '\0' | '"') => {
                    let next = input.get(i + 1).copied();
                    match next {
                        Some('(') => anyhow::bail!("command substitution is not permitted"),
                        Some('{') => {
                            let start = i + 2;
                            let Some(len) = input[start..].iter().position(|c| *c == '}') else {
                                anyhow::bail!("unterminated variable reference");
                            };
                            let name: String = input[start..start + len].iter().collect();
                            anyhow::ensure!(
                                !name.is_empty() && name.chars().all(is_name_char),
                                "bad substitution: ${{{name}}}"
                            );
                            word.push_quoted_str(&lookup(&name, &env));
                            i = start + len;
                        }
                        Some(c) if is_name_char(c) && !c.is_ascii_digit() => {
                            let start = i + 1;
                            let len = input[start..]
                                .iter()
                                .position(|c| !is_name_char(*c))
                                .unwrap_or(input.len() - start);
                            let name: String = input[start..start + len].iter().collect();
                            word.push_quoted_str(&lookup(&name, &env));
                            i = start + len - 1;
                        }
                        _ => word.push_quoted(ch), // a lone dollar is literal
                    }
                }
                ('\\', '\'') => word.push_quoted(ch),
                // within double quotes, backslash only escapes these
                ('\\', '"') => match input.get(i + 1).copied() {
                    Some(nn @ ('$' | '`' | '"' | '\\')) => {
                        word.push_quoted(nn);
                        i += 1;
                    }
                    _ => word.push_quoted(ch),
                },
                ('\\', _) => {
                    match input.get(i + 1) {
                        Some(nn) => {
                            word.push_quoted(*nn);
                            i += 1;
                        }
                        None => word.push_quoted(ch),
                    }
                }
                (c, '\0') if c.is_whitespace() => break, // end of word
                (q @ ('\'' | '"'), '\0') => quote_state = q, // start of quote
                (q1, q2) if q1 == q2 => quote_state = '\0', // end of quote
                (c, '\0') => word.push_live(c),
                (c, _) => word.push_quoted(c),
            }
            i += 1;
        }

        anyhow::ensure!(quote_state == '\0', "unterminated quote");
        i += 1;
        if !explicit && word.literal.is_empty() {
            continue;
        }
        output.push(if tilde { word.expand_tilde()? } else { word });
    }
    Ok(output)
}

/// Expands the argument of a `source` statement into a list of paths.
///
/// Each word is glob-expanded; a word matching nothing is kept literally.
/// Relative paths are relative to the working directory.
pub(super) fn expand_source_pattern<F>(input: &str, env: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> Option<String>,
{
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_leading_dot: true,
        require_literal_separator: true,
    };
    let mut result = Vec::new();
    for word in split_words(input, env)? {
        let matches: Vec<PathBuf> = glob_with(&word.pattern, options)
            .map(|paths| paths.flatten().collect())
            .unwrap_or_default();
        if matches.is_empty() {
            result.push(PathBuf::from(word.literal));
        } else {
            result.extend(matches);
        }
    }
    Ok(result)
}

/// Reads variables from the process environment
pub(super) fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

///////////////////////////////////////////////////////////////////////////////////////
