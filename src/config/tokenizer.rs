//! Statement tokenizer for interfaces(5) files
// (c) 2024 Ross Younger

use std::{
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader, Cursor},
    path::Path,
};

use super::position::{Diagnostics, Position};
use crate::util::valid_interface_name;

/// A logical line from an interfaces(5) file, split into its first word and the rest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// The first whitespace-delimited word
    pub keyword: String,
    /// Everything after the first run of whitespace (possibly empty)
    pub rest: String,
}

impl Statement {
    fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (keyword, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(kw, rest)| (kw, rest.trim_start()));
        Some(Self {
            keyword: keyword.into(),
            rest: rest.into(),
        })
    }
}

/// If this line ends in a single backslash, returns it without that backslash
fn continuation(line: &str) -> Option<&str> {
    if line.ends_with("\\\\") {
        return None;
    }
    line.strip_suffix('\\')
}

/// Reads an interfaces(5)-format file as a sequence of [`Statement`]s.
///
/// Blank lines and comment lines are dropped, and backslash-newline continuations
/// are joined, so neither ever surfaces as a statement.
///
/// # Note
/// This is a one-shot iterator. Once it has returned `None` the input has been
/// released; the error and warning counts remain available.
pub struct TokenStream {
    reader: Option<Box<dyn BufRead>>,
    pos: Position,
    diagnostics: Diagnostics,
    continued_line: Option<String>,
    depth: usize,
}

impl std::fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream")
            .field("pos", &self.pos)
            .field("diagnostics", &self.diagnostics)
            .field("continued_line", &self.continued_line)
            .field("exhausted", &self.reader.is_none())
            .finish_non_exhaustive()
    }
}

impl TokenStream {
    /// Opens a file for reading
    pub fn open<P>(path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::for_reader(
            BufReader::new(file),
            path.to_string_lossy().as_ref(),
        ))
    }

    /// Reads from an already-open line source
    pub fn for_reader<R>(reader: R, filename: &str) -> Self
    where
        R: BufRead + 'static,
    {
        Self {
            reader: Some(Box::new(reader)),
            pos: Position::new(filename),
            diagnostics: Diagnostics::default(),
            continued_line: None,
            depth: 0,
        }
    }

    /// Reads from an in-memory string
    pub fn for_string<S>(contents: S, filename: &str) -> Self
    where
        S: Into<String>,
    {
        Self::for_reader(Cursor::new(contents.into()), filename)
    }

    pub(crate) fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// How many `source` statements deep this file is (0 for a top-level file)
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// The current read position
    #[must_use]
    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// Error and warning counts for this file so far
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Reports an error at the current position
    pub(crate) fn error<M: Display>(&mut self, msg: M) {
        self.diagnostics.error(&self.pos, msg);
    }

    /// Reports a warning at the current position
    pub(crate) fn warning<M: Display>(&mut self, msg: M) {
        self.diagnostics.warning(&self.pos, msg);
    }

    /// Reports an error if an interface name is not valid
    pub(crate) fn validate_interface_name(&mut self, ifname: &str) -> bool {
        if valid_interface_name(ifname) {
            return true;
        }
        self.error(format!("Invalid interface name: {ifname}"));
        false
    }

    /// Reads one physical line, without leading whitespace or line terminator.
    /// A read error is reported, and ends the input.
    fn read_line(&mut self) -> Option<String> {
        let reader = self.reader.as_mut()?;
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                self.reader = None;
                None
            }
            Ok(_) => {
                self.pos.next_line();
                let line = line.strip_suffix('\n').unwrap_or(&line);
                let line = line.strip_suffix('\r').unwrap_or(line);
                Some(line.trim_start().to_owned())
            }
            Err(e) => {
                self.reader = None;
                self.error(format!("Read error: {e}"));
                None
            }
        }
    }
}

impl Iterator for TokenStream {
    type Item = Statement;

    fn next(&mut self) -> Option<Statement> {
        loop {
            let line = if let Some(line) = self.read_line() {
                line
            } else if self.continued_line.is_some() {
                self.warning("Trailing backslash at EOF");
                String::new()
            } else {
                return None;
            };

            let line = match self.continued_line.take() {
                Some(head) => format!("{head} {line}"),
                None if line.starts_with('#') => continue,
                None => line,
            };

            if let Some(head) = continuation(&line) {
                self.continued_line = Some(head.trim_end().to_owned());
                continue;
            }

            if line.contains('#') {
                self.warning("Possible inline comment found");
                self.warning("Comments must be on separate lines");
            }

            if let Some(statement) = Statement::from_line(&line) {
                return Some(statement);
            }
        }
    }
}

impl std::iter::FusedIterator for TokenStream {}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use anyhow::{anyhow, Context, Result};
    use assertables::assert_eq_as_result;

    use super::{Statement, TokenStream};
    use crate::util::make_test_tempfile;

    fn st(keyword: &str, rest: &str) -> Statement {
        Statement {
            keyword: keyword.into(),
            rest: rest.into(),
        }
    }

    fn tokenize(input: &str) -> (Vec<Statement>, TokenStream) {
        let mut stream = TokenStream::for_string(input, "<string>");
        let statements = stream.by_ref().collect();
        (statements, stream)
    }

    #[test]
    fn statement_splitting() -> Result<()> {
        for (input, expected) in [
            ("", vec![]),
            ("   ", vec![]),
            ("auto eth0", vec![st("auto", "eth0")]),
            ("  auto   eth0 eth1", vec![st("auto", "eth0 eth1")]),
            ("auto\teth0", vec![st("auto", "eth0")]),
            ("keyword", vec![st("keyword", "")]),
            ("address 10.0.0.1   \n", vec![st("address", "10.0.0.1")]),
            ("a b\r\nc d\r\n", vec![st("a", "b"), st("c", "d")]),
            ("\n\n# a comment\n   # another\nx y\n", vec![st("x", "y")]),
        ] {
            let (statements, stream) = tokenize(input);
            let msg = || format!("input {input:?} failed");
            assert_eq_as_result!(statements, expected)
                .map_err(|e| anyhow!(e))
                .with_context(msg)?;
            assert_eq_as_result!(stream.diagnostics().warnings(), 0)
                .map_err(|e| anyhow!(e))
                .with_context(msg)?;
        }
        Ok(())
    }

    #[test]
    fn continuation_lines() {
        let (statements, stream) = tokenize("up ip addr \\\n  add 1.2.3.4\n");
        assert_eq!(statements, vec![st("up", "ip addr add 1.2.3.4")]);
        assert_eq!(stream.position().line(), 2);
        assert_eq!(stream.diagnostics().warnings(), 0);

        let (statements, _) = tokenize("a \\\nb \\\nc\nd e\n");
        assert_eq!(statements, vec![st("a", "b c"), st("d", "e")]);
    }

    #[test]
    fn continued_comment_is_not_a_comment() {
        let (statements, stream) = tokenize("up echo \\\n# hello\n");
        assert_eq!(statements, vec![st("up", "echo # hello")]);
        assert_eq!(stream.diagnostics().warnings(), 2);
    }

    #[test]
    fn double_backslash_is_not_a_continuation() {
        let (statements, _) = tokenize("map foo\\\\\nmap bar\n");
        assert_eq!(statements, vec![st("map", "foo\\\\"), st("map", "bar")]);
    }

    #[test]
    fn inline_comment_is_kept() {
        let (statements, stream) = tokenize("address 10.0.0.1 # home\n");
        assert_eq!(statements, vec![st("address", "10.0.0.1 # home")]);
        assert_eq!(stream.diagnostics().warnings(), 2);
        assert_eq!(stream.diagnostics().errors(), 0);
    }

    #[test]
    fn trailing_backslash_at_eof() {
        let (statements, stream) = tokenize("auto eth0\nup foo \\");
        assert_eq!(statements, vec![st("auto", "eth0"), st("up", "foo")]);
        assert_eq!(stream.diagnostics().warnings(), 1);

        let (statements, stream) = tokenize("\\\n");
        assert!(statements.is_empty());
        assert_eq!(stream.diagnostics().warnings(), 1);
    }

    #[test]
    fn exhausted_stream_stays_exhausted() {
        let mut stream = TokenStream::for_string("auto lo\n", "<string>");
        assert_eq!(stream.next(), Some(st("auto", "lo")));
        assert_eq!(stream.next(), None);
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn line_counting() {
        let mut stream = TokenStream::for_string("\n# x\n\niface lo inet loopback\n", "f");
        let _ = stream.next();
        assert_eq!(stream.position().line(), 4);
        assert_eq!(stream.position().to_string(), "f:4");
    }

    #[test]
    fn read_error_ends_input() {
        let data = b"auto eth0\n\xff\xfe\nauto eth1\n".to_vec();
        let mut stream = TokenStream::for_reader(Cursor::new(data), "binary");
        let statements: Vec<_> = stream.by_ref().collect();
        assert_eq!(statements, vec![st("auto", "eth0")]);
        assert_eq!(stream.diagnostics().errors(), 1);
    }

    #[test]
    fn read_real_file() {
        let (path, _dir) = make_test_tempfile(
            r"
            auto lo
            iface lo inet loopback
        ",
            "interfaces",
        );
        let stream = TokenStream::open(&path).unwrap();
        assert_eq!(stream.position().filename(), path.to_string_lossy());
        let statements: Vec<_> = stream.collect();
        assert_eq!(
            statements,
            vec![st("auto", "lo"), st("iface", "lo inet loopback")]
        );
    }

    #[test]
    fn interface_name_validation_counts_errors() {
        let mut stream = TokenStream::for_string("", "<string>");
        assert!(stream.validate_interface_name("eth0"));
        assert!(!stream.validate_interface_name("eth0!"));
        assert_eq!(stream.diagnostics().errors(), 1);
    }
}
