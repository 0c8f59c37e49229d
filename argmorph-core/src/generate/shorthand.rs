use super::{CandidateGenerator, CandidateSet, Generated, select_arg_index};
use crate::types::{Candidate, CandidateId, Category, TestCase};
use tracing::info;

const VALUE_SEPARATORS: [char; 2] = [':', '='];

/// Truncate the selected option name to every shorter prefix.
///
/// For options carrying a value (`/activ:true`, `--level=3`) only the name
/// is shortened and the value is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionShortening;

impl CandidateGenerator for OptionShortening {
    fn category(&self) -> Category {
        Category::Shorthands
    }

    fn generate(&self, test_case: &TestCase) -> Generated {
        info!("Starting 'shortened option' test");
        let command = &test_case.command;
        if command.len() < 2 {
            return Generated::NotApplicable;
        }

        let index = select_arg_index(command, test_case.arg_index);
        let argument = &command.tokens()[index];
        let chars: Vec<char> = argument.chars().collect();

        let has_value = argument
            .split(VALUE_SEPARATORS)
            .filter(|segment| !segment.is_empty())
            .count()
            > 1;
        let size = if has_value {
            argument
                .split(VALUE_SEPARATORS)
                .find(|segment| !segment.is_empty())
                .map_or(0, |segment| segment.chars().count())
        } else {
            chars.len()
        };

        if size <= 2 {
            info!(
                "Length of selected command-line option is {}, cannot be further shortened",
                size
            );
            return Generated::NotApplicable;
        }

        let remainder: String = if has_value {
            chars[size..].iter().collect()
        } else {
            String::new()
        };
        let candidates = (0..size - 1)
            .map(|i| {
                let prefix: String = chars[..=i].iter().collect();
                Candidate::new(
                    CandidateId::Ordinal(i),
                    command.flatten_with(index, &format!("{prefix}{remainder}")),
                )
            })
            .collect();
        Generated::Candidates(CandidateSet::new(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Command;

    fn generate(tokens: &[&str]) -> Generated {
        OptionShortening.generate(&TestCase::new(Command::new(tokens.iter().copied())))
    }

    fn commands(generated: Generated) -> Vec<String> {
        match generated {
            Generated::Candidates(set) => set.candidates.into_iter().map(|c| c.command).collect(),
            Generated::NotApplicable => panic!("expected candidates"),
        }
    }

    #[test]
    fn test_shortens_name_and_keeps_value() {
        let got = commands(generate(&["tool", "/activ:true"]));
        assert_eq!(
            got,
            vec![
                "tool /:true",
                "tool /a:true",
                "tool /ac:true",
                "tool /act:true",
                "tool /acti:true",
            ]
        );
        assert!(!got.contains(&"tool /activ:true".to_string()));
    }

    #[test]
    fn test_shortens_whole_argument_without_value() {
        let got = commands(generate(&["net", "start", "fax"]));
        assert_eq!(got, vec!["net s fax", "net st fax", "net sta fax", "net star fax"]);
    }

    #[test]
    fn test_short_segment_not_applicable() {
        assert_eq!(generate(&["tool", "/a:value"]), Generated::NotApplicable);
        assert_eq!(generate(&["tool", "ab"]), Generated::NotApplicable);
        assert_eq!(generate(&["tool"]), Generated::NotApplicable);
    }

    #[test]
    fn test_equals_separator() {
        let got = commands(generate(&["tool", "--lvl=3"]));
        assert_eq!(got.len(), 4);
        assert_eq!(got[0], "tool -=3");
        assert_eq!(got[3], "tool --lv=3");
    }

    #[test]
    fn test_ordinals_are_prefix_indices() {
        let Generated::Candidates(set) = generate(&["tool", "/verbose"]) else {
            panic!("expected candidates");
        };
        let ids: Vec<_> = set.candidates.iter().map(|c| c.id).collect();
        assert_eq!(ids, (0..7).map(CandidateId::Ordinal).collect::<Vec<_>>());
    }
}
