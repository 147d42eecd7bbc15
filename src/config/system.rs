//! The whole-system configuration, and the stanza dispatcher that builds it
// (c) 2024 Ross Younger

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use tracing::{debug, error, warn};

use super::{
    directive::{valid_group_name, Directive},
    iface::{IfaceKey, InterfaceConfig},
    mapping::Mapping,
    position::Diagnostics,
    tokenizer::{Statement, TokenStream},
    words::{expand_source_pattern, process_env},
};

/// Maximum number of interfaces files open at once via `source`
pub const MAX_SOURCE_DEPTH: usize = 16;

/// The outcome of loading a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// No errors or warnings
    Clean,
    /// Warnings but no errors; usable, with care
    Unsafe,
    /// Errors were found; not safe to act upon
    Broken,
}

/// The stanza that is currently receiving option lines
#[derive(Debug)]
enum Current {
    /// Index into the mappings list
    Mapping(usize),
    /// A registered interface config
    Iface(IfaceKey),
    /// An invalid `iface` stanza; its options are parsed for diagnostics, then discarded
    Detached(InterfaceConfig),
}

/// The parsed contents of a system's interfaces(5) files.
///
/// # Note
/// Once loaded, a `SystemConfig` can only be reloaded after calling [`SystemConfig::clear`].
#[derive(Debug, Default)]
pub struct SystemConfig {
    allow_groups: BTreeMap<String, BTreeSet<String>>,
    configs: BTreeMap<IfaceKey, InterfaceConfig>,
    mappings: Vec<Mapping>,
    streams: Vec<TokenStream>,
    current: Option<Current>,
    totals: Diagnostics,
}

impl SystemConfig {
    /// Creates an empty configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties every collection and resets the counters
    pub fn clear(&mut self) {
        self.allow_groups.clear();
        self.configs.clear();
        self.mappings.clear();
        self.streams.clear();
        self.current = None;
        self.totals = Diagnostics::default();
    }

    /// Reads an interfaces file, and every file it sources.
    ///
    /// Problems are counted and logged, never returned; see [`SystemConfig::log_total_errors`].
    pub fn load_interfaces_file<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        let path = path.as_ref();
        match TokenStream::open(path) {
            Ok(stream) => self.load_stream(stream),
            Err(e) => {
                self.totals
                    .unpositioned_error(format!("{e}: {}", path.display()));
                self
            }
        }
    }

    /// Reads an already-open interfaces file, and every file it sources.
    pub fn load_stream(&mut self, stream: TokenStream) -> &mut Self {
        debug_assert!(self.streams.is_empty(), "load is not re-entrant");
        debug!("loading {}", stream.position().filename());
        self.streams.push(stream);
        self.process();
        self
    }

    fn process(&mut self) {
        while let Some(mut stream) = self.streams.pop() {
            let Some(statement) = stream.next() else {
                self.close_current(&mut stream);
                self.totals.absorb(stream.diagnostics());
                debug!("finished {}", stream.position().filename());
                continue;
            };
            let included = self.dispatch(&mut stream, &statement);
            self.streams.push(stream);
            // The first file found must be the first one read
            self.streams.extend(included.into_iter().rev());
        }
    }

    /// Handles one statement. Returns any files it sourced, in the order they should be read.
    fn dispatch(&mut self, stream: &mut TokenStream, statement: &Statement) -> Vec<TokenStream> {
        let Statement { keyword, rest } = statement;
        let directive = Directive::classify(keyword);
        if directive.is_top_level() {
            self.close_current(stream);
        }
        match directive {
            Directive::Source => return self.parse_source(stream, rest),
            Directive::Allow { group } => self.parse_allow(stream, keyword, group, rest),
            Directive::Mapping => self.parse_mapping(stream, rest),
            Directive::Iface => self.parse_iface(stream, rest),
            Directive::Setting => self.parse_option(stream, keyword, rest),
        }
        Vec::new()
    }

    fn close_current(&mut self, stream: &mut TokenStream) {
        match self.current.take() {
            Some(Current::Mapping(index)) => {
                if let Some(mapping) = self.mappings.get(index) {
                    mapping.close_parsing(stream);
                }
            }
            Some(Current::Iface(key)) => {
                if let Some(config) = self.configs.get(&key) {
                    config.close_parsing(stream);
                }
            }
            Some(Current::Detached(config)) => config.close_parsing(stream),
            None => (),
        }
    }

    fn parse_source(&mut self, stream: &mut TokenStream, rest: &str) -> Vec<TokenStream> {
        if rest.is_empty() {
            stream.error("Empty \"source\" statement");
            return Vec::new();
        }
        let depth = stream.depth() + 1;
        if depth >= MAX_SOURCE_DEPTH {
            stream.error("Too many nested \"source\" statements");
            return Vec::new();
        }
        let paths = match expand_source_pattern(rest, process_env) {
            Ok(paths) => paths,
            Err(e) => {
                stream.error(format!("Invalid \"source\" statement: {e:#}"));
                return Vec::new();
            }
        };
        paths
            .into_iter()
            .filter_map(|path| match TokenStream::open(&path) {
                Ok(included) => Some(included.with_depth(depth)),
                Err(e) => {
                    stream.error(format!("{e}: {}", path.display()));
                    None
                }
            })
            .collect()
    }

    fn parse_allow(&mut self, stream: &mut TokenStream, keyword: &str, group: &str, rest: &str) {
        if !valid_group_name(group) {
            stream.error(format!("Invalid statement: {keyword}"));
            return;
        }
        let names: Vec<&str> = rest.split_whitespace().collect();
        if names.is_empty() {
            stream.error(format!("Empty \"{keyword}\" statement"));
            return;
        }
        let members = self.allow_groups.entry(group.to_owned()).or_default();
        for name in names {
            if stream.validate_interface_name(name) {
                let _ = members.insert(name.to_owned());
            }
        }
    }

    fn parse_mapping(&mut self, stream: &mut TokenStream, rest: &str) {
        let patterns: Vec<&str> = rest.split_whitespace().collect();
        if patterns.is_empty() {
            stream.error("Empty mapping statement");
            return;
        }
        self.mappings.push(Mapping::new(stream, &patterns));
        self.current = Some(Current::Mapping(self.mappings.len() - 1));
    }

    fn parse_iface(&mut self, stream: &mut TokenStream, rest: &str) {
        let params: Vec<&str> = rest.split_whitespace().collect();
        let mut valid = true;
        if params.len() != 3 {
            stream.error("Wrong number of parameters to \"iface\"");
            valid = false;
        }
        let param = |i: usize| params.get(i).copied().unwrap_or_default();
        let key = IfaceKey::new(param(0), param(1), param(2));

        if !stream.validate_interface_name(&key.name) {
            valid = false;
        }
        if self.configs.contains_key(&key) {
            stream.error(format!("Duplicate iface: {key}"));
            valid = false;
        }

        let config = InterfaceConfig::new(key.clone());
        self.current = Some(if valid {
            let _ = self.configs.insert(key.clone(), config);
            Current::Iface(key)
        } else {
            Current::Detached(config)
        });
    }

    fn parse_option(&mut self, stream: &mut TokenStream, keyword: &str, rest: &str) {
        match &mut self.current {
            Some(Current::Mapping(index)) => {
                if let Some(mapping) = self.mappings.get_mut(*index) {
                    mapping.parse_option(stream, keyword, rest);
                }
            }
            Some(Current::Iface(key)) => {
                if let Some(config) = self.configs.get_mut(key) {
                    config.parse_option(stream, keyword, rest);
                }
            }
            Some(Current::Detached(config)) => config.parse_option(stream, keyword, rest),
            None => stream.error(format!("Option not in a valid stanza: {keyword}")),
        }
    }

    // ACCESSORS //////////////////////////////////////////////////////////////////////

    /// Every allow-group, by name
    #[must_use]
    pub fn allow_groups(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.allow_groups
    }

    /// The members of one allow-group
    #[must_use]
    pub fn allow_group(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.allow_groups.get(name)
    }

    /// Every interface configuration, ordered by identity
    #[must_use]
    pub fn configs(&self) -> &BTreeMap<IfaceKey, InterfaceConfig> {
        &self.configs
    }

    /// The interface configurations with a given logical name
    pub fn configs_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a InterfaceConfig> + 'a {
        self.configs.values().filter(move |c| c.name() == name)
    }

    /// The mapping rules, in file order
    #[must_use]
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Runs the mapping rules that apply to an interface, in order, until one of them succeeds
    #[must_use]
    pub fn map_interface(&self, ifname: &str) -> Option<String> {
        self.mappings
            .iter()
            .filter(|m| m.should_map(ifname))
            .find_map(|m| match m.perform_mapping(ifname) {
                Ok(result) => result,
                Err(e) => {
                    warn!("{e:#}");
                    None
                }
            })
    }

    /// Total errors and warnings from every file read
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        self.totals
    }

    /// Total errors from every file read
    #[must_use]
    pub fn total_errors(&self) -> usize {
        self.totals.errors()
    }

    /// Total warnings from every file read
    #[must_use]
    pub fn total_warnings(&self) -> usize {
        self.totals.warnings()
    }

    /// Logs a summary of any problems found, and classifies the configuration
    pub fn log_total_errors(&self) -> LoadStatus {
        let (errors, warnings) = (self.total_errors(), self.total_warnings());
        if errors > 0 {
            error!("Broken config: {errors} errors and {warnings} warnings");
            LoadStatus::Broken
        } else if warnings > 0 {
            warn!("Unsafe config: {warnings} warnings");
            LoadStatus::Unsafe
        } else {
            LoadStatus::Clean
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////////
