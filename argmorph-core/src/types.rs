//! Core data model shared by the generators, the harness and the engine.

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Default per-variant execution timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 2.0;

/// Separator between the tokens of a flattened command.
pub const TOKEN_SEPARATOR: char = ' ';

/// Split a flattened command back into tokens.
///
/// The inverse of [`Command::flatten`] for commands whose tokens contain no
/// separator. No quoting or escape processing takes place.
pub fn split_flattened(command: &str) -> std::str::Split<'_, char> {
    command.split(TOKEN_SEPARATOR)
}

/// An argv-style command; token 0 is the executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command(Vec<String>);

impl Command {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// First token containing [`TOKEN_SEPARATOR`]. Such a token would be
    /// broken apart when the flattened command is split again.
    pub fn token_with_separator(&self) -> Option<(usize, &str)> {
        self.0
            .iter()
            .enumerate()
            .find(|(_, token)| token.contains(TOKEN_SEPARATOR))
            .map(|(index, token)| (index, token.as_str()))
    }

    /// Tokens joined with single spaces.
    pub fn flatten(&self) -> String {
        self.0.join(" ")
    }

    /// Flattened command with `token` at `index` replaced.
    pub fn flatten_with(&self, index: usize, token: &str) -> String {
        self.0
            .iter()
            .enumerate()
            .map(|(i, t)| if i == index { token } else { t.as_str() })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten())
    }
}

/// A fully validated test specification.
///
/// The front end guarantees that `char_offset` lies outside the executable,
/// that `arg_index` is never 0 and that `scan_range` never contains 0.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub command: Command,
    /// Code-point offset into the flattened command.
    pub char_offset: usize,
    /// Preferred argument for the argument-based strategies; `None` selects
    /// the first option-like token.
    pub arg_index: Option<usize>,
    pub scan_range: Vec<u32>,
    /// Runs before every execution; its stdout feeds the command's stdin.
    pub pre_command: Option<Command>,
    /// Runs after every variant execution, whatever the outcome.
    pub post_command: Option<Command>,
    pub exit_code_only: bool,
    pub timeout: Duration,
}

impl TestCase {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            char_offset: 0,
            arg_index: None,
            scan_range: Vec::new(),
            pre_command: None,
            post_command: None,
            exit_code_only: false,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_char_offset(mut self, offset: usize) -> Self {
        self.char_offset = offset;
        self
    }

    pub fn with_arg_index(mut self, index: usize) -> Self {
        self.arg_index = Some(index);
        self
    }

    pub fn with_scan_range(mut self, range: impl IntoIterator<Item = u32>) -> Self {
        self.scan_range = range.into_iter().collect();
        self
    }

    pub fn with_pre_command(mut self, command: Command) -> Self {
        self.pre_command = Some(command);
        self
    }

    pub fn with_post_command(mut self, command: Command) -> Self {
        self.post_command = Some(command);
        self
    }

    pub fn with_exit_code_only(mut self, exit_code_only: bool) -> Self {
        self.exit_code_only = exit_code_only;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Basename of the unquoted executable, used to label results.
    pub fn display_name(&self) -> String {
        let exe = self.command.get(0).unwrap_or_default().trim_matches('"');
        exe.rsplit(['/', '\\']).next().unwrap_or(exe).to_string()
    }
}

/// Reference behaviour of the unmutated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineResult {
    pub exit_code: i32,
    /// stdout, ` / `, stderr.
    pub output: Vec<u8>,
}

impl BaselineResult {
    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Joins captured stdout and stderr the way baselines and variants are compared.
pub fn combine_output(stdout: &[u8], stderr: &[u8]) -> Vec<u8> {
    let mut combined = Vec::with_capacity(stdout.len() + stderr.len() + 3);
    combined.extend_from_slice(stdout);
    combined.extend_from_slice(b" / ");
    combined.extend_from_slice(stderr);
    combined
}

/// How a candidate is identified within its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CandidateId {
    /// Unicode code point inserted or substituted.
    CodePoint(u32),
    /// Zero-based truncation index (prefix length minus one).
    Ordinal(usize),
    /// The only candidate of its category.
    Singleton,
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateId::CodePoint(cp) => write!(f, "0x{cp:04X}"),
            CandidateId::Ordinal(i) => write!(f, "#{i}"),
            CandidateId::Singleton => f.write_str("-"),
        }
    }
}

impl Serialize for CandidateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CandidateId::CodePoint(cp) => serializer.serialize_u32(*cp),
            CandidateId::Ordinal(i) => serializer.serialize_u64(*i as u64),
            CandidateId::Singleton => serializer.serialize_none(),
        }
    }
}

/// A mutated command string and its identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub command: String,
}

impl Candidate {
    pub fn new(id: CandidateId, command: impl Into<String>) -> Self {
        Self {
            id,
            command: command.into(),
        }
    }
}

pub type MatchSet = BTreeSet<Candidate>;

/// The mutation categories, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    OptionChar,
    CharInsert,
    CharSubstitute,
    Quotes,
    Shorthands,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::OptionChar,
        Category::CharInsert,
        Category::CharSubstitute,
        Category::Quotes,
        Category::Shorthands,
    ];

    /// Stable machine-readable key.
    pub fn key(&self) -> &'static str {
        match self {
            Category::OptionChar => "option_char",
            Category::CharInsert => "char_insert",
            Category::CharSubstitute => "char_substitute",
            Category::Quotes => "quotes",
            Category::Shorthands => "shorthands",
        }
    }

    /// Label used for progress bars.
    pub fn label(&self) -> &'static str {
        match self {
            Category::OptionChar => "Dash/hyphen",
            Category::CharInsert => "Special chars (insert)",
            Category::CharSubstitute => "Special chars (replace)",
            Category::Quotes => "Quote insertion",
            Category::Shorthands => "Shorthand command",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Three-state outcome of one category.
///
/// `NotApplicable` means the preconditions were not met and nothing ran;
/// `TestedEmpty` means candidates ran and none matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "matches", rename_all = "snake_case")]
pub enum CategoryResult<T> {
    NotApplicable,
    TestedEmpty,
    Found(T),
}

impl<T> CategoryResult<T> {
    pub fn is_applicable(&self) -> bool {
        !matches!(self, CategoryResult::NotApplicable)
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            CategoryResult::Found(value) => Some(value),
            _ => None,
        }
    }
}

impl CategoryResult<MatchSet> {
    /// Wraps a tested set, keeping an empty set distinct from "not applicable".
    pub fn from_matches(matches: MatchSet) -> Self {
        if matches.is_empty() {
            CategoryResult::TestedEmpty
        } else {
            CategoryResult::Found(matches)
        }
    }

    pub fn match_count(&self) -> usize {
        self.found().map_or(0, BTreeSet::len)
    }
}

/// Per-test-case result mapping handed to the report writer unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcomes {
    pub option_char: CategoryResult<MatchSet>,
    pub char_insert: CategoryResult<MatchSet>,
    pub char_substitute: CategoryResult<MatchSet>,
    pub quotes: CategoryResult<String>,
    pub shorthands: CategoryResult<MatchSet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_joins_with_spaces() {
        let cmd = Command::new(["net", "start", "fax"]);
        assert_eq!(cmd.flatten(), "net start fax");
        assert_eq!(cmd.flatten_with(1, "s\"t\"art"), "net s\"t\"art fax");
    }

    #[test]
    fn test_split_flattened_inverts_flatten() {
        let cmd = Command::new(["echo", "s\"t\"art", "a\\b"]);
        let flattened = cmd.flatten();
        let tokens: Vec<&str> = split_flattened(&flattened).collect();
        assert_eq!(tokens, cmd.tokens());
        assert!(cmd.token_with_separator().is_none());
    }

    #[test]
    fn test_token_with_separator_found() {
        let cmd = Command::new(["sh", "-c", "exit 3"]);
        assert_eq!(cmd.token_with_separator(), Some((2, "exit 3")));
        assert_eq!(split_flattened(&cmd.flatten()).count(), 4);
    }

    #[test]
    fn test_display_name_strips_path_and_quotes() {
        let tc = TestCase::new(Command::new(["\"C:\\Windows\\System32\\net.exe\"", "start"]));
        assert_eq!(tc.display_name(), "net.exe");
        let tc = TestCase::new(Command::new(["/usr/bin/ls", "-l"]));
        assert_eq!(tc.display_name(), "ls");
    }

    #[test]
    fn test_from_matches_keeps_three_states_apart() {
        let empty = CategoryResult::from_matches(MatchSet::new());
        assert_eq!(empty, CategoryResult::TestedEmpty);
        assert!(empty.is_applicable());
        assert_ne!(empty, CategoryResult::NotApplicable);

        let mut set = MatchSet::new();
        set.insert(Candidate::new(CandidateId::CodePoint(0x2D), "ls -l"));
        let found = CategoryResult::from_matches(set);
        assert_eq!(found.match_count(), 1);
    }

    #[test]
    fn test_category_result_serializes_status_tag() {
        let na: CategoryResult<String> = CategoryResult::NotApplicable;
        let empty: CategoryResult<String> = CategoryResult::TestedEmpty;
        let found = CategoryResult::Found("s\"t\"art".to_string());
        assert_eq!(
            serde_json::to_string(&na).unwrap(),
            r#"{"status":"not_applicable"}"#
        );
        assert_eq!(
            serde_json::to_string(&empty).unwrap(),
            r#"{"status":"tested_empty"}"#
        );
        assert!(serde_json::to_string(&found).unwrap().contains("\"found\""));
    }

    #[test]
    fn test_candidate_ordering_by_identifier() {
        let a = Candidate::new(CandidateId::CodePoint(0x41), "z");
        let b = Candidate::new(CandidateId::CodePoint(0x42), "a");
        assert!(a < b);
        assert_eq!(CandidateId::CodePoint(0x430).to_string(), "0x0430");
    }
}
