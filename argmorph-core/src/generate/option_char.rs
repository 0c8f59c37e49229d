use super::{CandidateGenerator, CandidateSet, Generated, is_option_like, token_start_offset};
use crate::types::{Candidate, CandidateId, Category, TestCase};
use tracing::info;

/// Delimiters that introduce an option.
pub const STANDARD_DELIMITERS: [char; 2] = ['/', '-'];

/// Slash-, hyphen- and dash-like code points tried in place of the option char.
pub const ALTERNATIVE_DELIMITERS: [char; 31] = [
    '/', '\\', '\u{2215}', '\u{244A}', '\u{2044}', '\u{29F8}', '\u{002D}', '\u{007E}', '\u{00AD}',
    '\u{058A}', '\u{05BE}', '\u{1400}', '\u{1806}', '\u{2010}', '\u{2012}', '\u{2013}', '\u{2014}',
    '\u{2015}', '\u{2053}', '\u{2212}', '\u{2E17}', '\u{2E3A}', '\u{2E3B}', '\u{301C}', '\u{3030}',
    '\u{30A0}', '\u{FE31}', '\u{FE32}', '\u{FE58}', '\u{FE63}', '\u{FF0D}',
];

/// Replace the option char of the first option-like argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionCharSubstitution;

impl CandidateGenerator for OptionCharSubstitution {
    fn category(&self) -> Category {
        Category::OptionChar
    }

    fn generate(&self, test_case: &TestCase) -> Generated {
        info!(
            "Looking for arguments starting with one of: {}",
            STANDARD_DELIMITERS.map(String::from).join(" ")
        );
        let command = &test_case.command;
        let start = test_case.arg_index.unwrap_or(1).max(1);

        let Some(index) = (start..command.len()).find(|&i| is_option_like(&command.tokens()[i])) else {
            info!("No arguments found");
            return Generated::NotApplicable;
        };
        info!("Argument found ({})", command.tokens()[index]);

        let flat = command.flatten();
        let chars: Vec<char> = flat.chars().collect();
        let pos = token_start_offset(command, index);
        let before: String = chars[..pos].iter().collect();
        let after: String = chars[pos + 1..].iter().collect();

        info!(
            "Preparing {} alternative signs to test",
            ALTERNATIVE_DELIMITERS.len()
        );
        let candidates = ALTERNATIVE_DELIMITERS
            .iter()
            .map(|&alt| {
                Candidate::new(
                    CandidateId::CodePoint(alt as u32),
                    format!("{before}{alt}{after}"),
                )
            })
            .filter(|candidate| candidate.command != flat)
            .collect();
        Generated::Candidates(CandidateSet::new(candidates))
    }
}
