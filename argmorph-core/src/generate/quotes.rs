use super::{CandidateGenerator, CandidateSet, Generated, select_arg_index};
use crate::types::{Candidate, CandidateId, Category, TestCase};
use tracing::info;

/// Wrap the second character of the selected argument in double quotes,
/// e.g. `net start` -> `net s"t"art`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteInjection;

impl CandidateGenerator for QuoteInjection {
    fn category(&self) -> Category {
        Category::Quotes
    }

    fn generate(&self, test_case: &TestCase) -> Generated {
        info!("Starting 'quote insertion' test");
        let command = &test_case.command;
        if command.len() < 2 {
            return Generated::NotApplicable;
        }

        let index = select_arg_index(command, test_case.arg_index);
        let mut chars = command.tokens()[index].chars();
        let (Some(first), Some(second)) = (chars.next(), chars.next()) else {
            info!("Selected argument is too short for quote insertion");
            return Generated::NotApplicable;
        };
        let rest: String = chars.collect();
        let quoted = format!("{first}\"{second}\"{rest}");

        Generated::Candidates(CandidateSet::new(vec![Candidate::new(
            CandidateId::Singleton,
            command.flatten_with(index, &quoted),
        )]))
    }
}
