use super::{CandidateGenerator, CandidateSet, Generated};
use crate::types::{Candidate, CandidateId, Category, TestCase};
use tracing::{debug, info};

/// Insert every scan-range character right after `char_offset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharInsertion;

/// Replace the character at `char_offset` with every scan-range character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharSubstitution;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Insert,
    Replace,
}

fn lowercase_eq(a: char, b: char) -> bool {
    a.to_lowercase().eq(b.to_lowercase())
}

fn generate(test_case: &TestCase, op: Operation) -> Generated {
    info!(
        "Starting 'special chars ({})' test",
        match op {
            Operation::Insert => "insert",
            Operation::Replace => "replace",
        }
    );
    let chars: Vec<char> = test_case.command.flatten().chars().collect();
    let offset = test_case.char_offset.min(chars.len().saturating_sub(1));
    let original = chars.get(offset).copied();

    let split = match op {
        Operation::Insert => (offset + 1).min(chars.len()),
        Operation::Replace => offset,
    };
    let resume = (offset + 1).min(chars.len());
    let before: String = chars[..split].iter().collect();
    let after: String = chars[resume..].iter().collect();

    let mut set = CandidateSet::default();
    for &code_point in &test_case.scan_range {
        let Some(c) = char::from_u32(code_point) else {
            debug!("Code point 0x{:04X} cannot be materialized", code_point);
            set.unmaterialized.push(code_point);
            continue;
        };
        if op == Operation::Replace && original.is_some_and(|o| lowercase_eq(o, c)) {
            continue;
        }
        set.candidates.push(Candidate::new(
            CandidateId::CodePoint(code_point),
            format!("{before}{c}{after}"),
        ));
    }
    Generated::Candidates(set)
}

impl CandidateGenerator for CharInsertion {
    fn category(&self) -> Category {
        Category::CharInsert
    }

    fn generate(&self, test_case: &TestCase) -> Generated {
        generate(test_case, Operation::Insert)
    }
}

impl CandidateGenerator for CharSubstitution {
    fn category(&self) -> Category {
        Category::CharSubstitute
    }

    fn generate(&self, test_case: &TestCase) -> Generated {
        generate(test_case, Operation::Replace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Command;

    fn net_start(offset: usize, range: Vec<u32>) -> TestCase {
        TestCase::new(Command::new(["net", "start", "fax"]))
            .with_char_offset(offset)
            .with_scan_range(range)
    }

    fn candidates(generated: Generated) -> CandidateSet {
        match generated {
            Generated::Candidates(set) => set,
            Generated::NotApplicable => panic!("expected candidates"),
        }
    }

    #[test]
    fn test_substitution_with_cyrillic_a() {
        let set = candidates(CharSubstitution.generate(&net_start(6, vec![0x0430])));
        assert_eq!(
            set.candidates,
            vec![Candidate::new(
                CandidateId::CodePoint(0x0430),
                "net st\u{430}rt fax"
            )]
        );
    }

    #[test]
    fn test_substitution_skips_original_case_insensitively() {
        let range = vec!['a' as u32, 'A' as u32, 'b' as u32];
        let set = candidates(CharSubstitution.generate(&net_start(6, range)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.candidates[0].command, "net stbrt fax");
    }

    #[test]
    fn test_insertion_goes_after_offset() {
        let set = candidates(CharInsertion.generate(&net_start(6, vec![0x02B0])));
        assert_eq!(set.candidates[0].command, "net sta\u{2B0}rt fax");
    }

    #[test]
    fn test_insertion_keeps_original_char_candidate() {
        let set = candidates(CharInsertion.generate(&net_start(6, vec!['a' as u32])));
        assert_eq!(set.candidates[0].command, "net staart fax");
    }

    #[test]
    fn test_surrogates_are_recorded_not_generated() {
        let set = candidates(CharInsertion.generate(&net_start(6, vec![0xD800, 0x41])));
        assert_eq!(set.unmaterialized, vec![0xD800]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_offsets_are_code_points() {
        let tc = TestCase::new(Command::new(["\u{e9}\u{e9}", "ab"]))
            .with_char_offset(3)
            .with_scan_range(vec!['x' as u32]);
        let set = candidates(CharSubstitution.generate(&tc));
        assert_eq!(set.candidates[0].command, "\u{e9}\u{e9} xb");
    }
}
