//! Variant generators, one per mutation category.
//!
//! Each strategy is stateless and works purely on the [`TestCase`]. All
//! offsets are code-point offsets into the flattened command.

mod option_char;
mod quotes;
mod shorthand;
mod special_chars;

pub use option_char::{ALTERNATIVE_DELIMITERS, OptionCharSubstitution, STANDARD_DELIMITERS};
pub use quotes::QuoteInjection;
pub use shorthand::OptionShortening;
pub use special_chars::{CharInsertion, CharSubstitution};

use crate::types::{Candidate, Category, Command, TestCase};

/// Characters that have look-alikes in the Spacing Modifier Letters block
/// (U+02B0..U+02FF).
const PREFERRED_CHARS: &str = "hjrwyxsl";

/// Candidates produced by a strategy whose preconditions were met.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    pub candidates: Vec<Candidate>,
    /// Code points that are not valid scalar values; counted as failed.
    pub unmaterialized: Vec<u32>,
}

impl CandidateSet {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            unmaterialized: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Output of a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    NotApplicable,
    Candidates(CandidateSet),
}

impl Generated {
    pub fn candidates(&self) -> Option<&CandidateSet> {
        match self {
            Generated::Candidates(set) => Some(set),
            Generated::NotApplicable => None,
        }
    }
}

/// Shared interface of all mutation strategies.
pub trait CandidateGenerator {
    fn category(&self) -> Category;
    fn generate(&self, test_case: &TestCase) -> Generated;
}

/// The fixed set of strategies, dispatched by variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    OptionChar(OptionCharSubstitution),
    CharInsert(CharInsertion),
    CharSubstitute(CharSubstitution),
    Quotes(QuoteInjection),
    Shorthands(OptionShortening),
}

impl Strategy {
    /// Every strategy, in execution order.
    pub const ALL: [Strategy; 5] = [
        Strategy::OptionChar(OptionCharSubstitution),
        Strategy::CharInsert(CharInsertion),
        Strategy::CharSubstitute(CharSubstitution),
        Strategy::Quotes(QuoteInjection),
        Strategy::Shorthands(OptionShortening),
    ];

    pub fn for_category(category: Category) -> Self {
        match category {
            Category::OptionChar => Strategy::OptionChar(OptionCharSubstitution),
            Category::CharInsert => Strategy::CharInsert(CharInsertion),
            Category::CharSubstitute => Strategy::CharSubstitute(CharSubstitution),
            Category::Quotes => Strategy::Quotes(QuoteInjection),
            Category::Shorthands => Strategy::Shorthands(OptionShortening),
        }
    }
}

impl CandidateGenerator for Strategy {
    fn category(&self) -> Category {
        match self {
            Strategy::OptionChar(s) => s.category(),
            Strategy::CharInsert(s) => s.category(),
            Strategy::CharSubstitute(s) => s.category(),
            Strategy::Quotes(s) => s.category(),
            Strategy::Shorthands(s) => s.category(),
        }
    }

    fn generate(&self, test_case: &TestCase) -> Generated {
        match self {
            Strategy::OptionChar(s) => s.generate(test_case),
            Strategy::CharInsert(s) => s.generate(test_case),
            Strategy::CharSubstitute(s) => s.generate(test_case),
            Strategy::Quotes(s) => s.generate(test_case),
            Strategy::Shorthands(s) => s.generate(test_case),
        }
    }
}

fn is_option_like(token: &str) -> bool {
    token.starts_with(STANDARD_DELIMITERS)
}

/// Pick the argument the argument-based strategies operate on.
///
/// Scans from index 1 (skipping the executable) for a token starting with
/// `/` or `-`. With an override only that index is considered. Falls back
/// to index 1, which is less likely to be something like a filename.
pub fn select_arg_index(command: &Command, arg_index: Option<usize>) -> usize {
    command
        .tokens()
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(i, _)| arg_index.is_none_or(|wanted| *i == wanted))
        .find(|(_, token)| is_option_like(token))
        .map_or(1, |(i, _)| i)
}

/// Default character offset (1-based position within `token`) for the
/// character-based strategies.
///
/// Skips the first character, which is either an option char or the first
/// letter of a keyword, and prefers characters with known look-alikes.
pub fn preferred_char_offset(token: &str) -> usize {
    if let Some(i) = token
        .chars()
        .skip(1)
        .position(|c| c.to_lowercase().any(|lower| PREFERRED_CHARS.contains(lower)))
    {
        return i + 2;
    }
    match token.chars().nth(1) {
        Some('-') => 3,
        Some(_) => 2,
        None => 1,
    }
}

/// Code-point offset of the first character of `command[index]` in the
/// flattened command.
pub(crate) fn token_start_offset(command: &Command, index: usize) -> usize {
    command.tokens()[..index]
        .iter()
        .map(|t| t.chars().count() + 1)
        .sum()
}
