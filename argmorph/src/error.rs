//! Front-end diagnostics with miette integration.
//!
//! Everything here is raised before the first test case runs. Error codes
//! follow the convention `AMG-Exxx`.

#![allow(unused_assignments)]

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

/// Invalid test-case input, from the command line or a batch file.
#[derive(Error, Diagnostic, Debug)]
pub enum ArgError {
    /// The command string could not be split into tokens.
    #[error("Cannot parse command \"{command}\": {reason}")]
    #[diagnostic(code("AMG-E001"), help("Check for unbalanced quotes"))]
    UnparsableCommand { command: String, reason: String },

    /// A token keeps a space after splitting, so it cannot survive being
    /// flattened into a single command line and split again.
    #[error("Argument {index} (\"{token}\") contains a space")]
    #[diagnostic(
        code("AMG-E015"),
        help("Variants are split on single spaces before execution; quoted arguments containing spaces are not supported")
    )]
    SpaceInArgument { index: usize, token: String },

    /// Nothing after the executable to mutate.
    #[error("Command \"{command}\" has no arguments")]
    #[diagnostic(
        code("AMG-E002"),
        help("Obfuscation is tested on arguments; add at least one, e.g. \"net start fax\"")
    )]
    NoArguments { command: String },

    /// `--char-offset` points past the end of the command.
    #[error("Char offset {offset} is not within bounds of the command (0..{len})")]
    #[diagnostic(code("AMG-E003"))]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// `--char-offset` points into the executable name.
    #[error("Char offset {offset} selects a character of the process name")]
    #[diagnostic(code("AMG-E004"), help("Characters can only be inserted into arguments"))]
    OffsetInExecutable { offset: usize },

    /// `--char-offset` selects a character that is not ASCII alphanumeric.
    #[error("Selected char '{selected}' is not alphanumeric")]
    #[diagnostic(code("AMG-E005"), help("Pick the offset of a letter or digit"))]
    OffsetNotAlphanumeric { selected: char },

    /// `--custom-range` combined with a named range.
    #[error("Custom ranges cannot be combined with --range {range}")]
    #[diagnostic(
        code("AMG-E006"),
        help("Drop --range or set it to 'custom' when giving --custom-range")
    )]
    CustomRangeConflict { range: String },

    /// `--range custom` without any `--custom-range`.
    #[error("Range 'custom' selected but no custom range given")]
    #[diagnostic(code("AMG-E007"), help("Add --custom-range 0x??..0x??"))]
    MissingCustomRange,

    /// A custom range includes the null character.
    #[error("Null bytes cannot be included in custom ranges")]
    #[diagnostic(code("AMG-E008"), help("Start the range from 0x01 instead"))]
    NullInCustomRange,

    /// The report directory does not exist.
    #[error("Report directory does not exist: {path}")]
    #[diagnostic(code("AMG-E009"), help("Create it first or pass --no-report"))]
    ReportDirMissing { path: PathBuf },

    /// The batch file could not be read.
    #[error("Failed to read batch file: {path}")]
    #[diagnostic(code("AMG-E010"))]
    BatchReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A batch line is not a valid test-case object.
    #[error("Invalid test case on line {line}")]
    #[diagnostic(code("AMG-E011"))]
    BatchParse {
        line: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    /// A batch entry without a command.
    #[error("Test case on line {line} has no 'command'")]
    #[diagnostic(code("AMG-E012"), help("Every JSON line needs a \"command\" key"))]
    BatchMissingCommand { line: usize },

    /// Timeout outside the supported window.
    #[error("Invalid timeout {value}s")]
    #[diagnostic(code("AMG-E013"), help("Use a value between {min} and {max} seconds"))]
    InvalidTimeout { value: f64, min: f64, max: f64 },

    /// A batch entry failed validation.
    #[error("Invalid test case on line {line}")]
    #[diagnostic(code("AMG-E014"))]
    InBatch {
        line: usize,
        #[source]
        #[diagnostic_source]
        source: Box<ArgError>,
    },
}

// Lets `#[diagnostic_source]` accept the boxed nested error.
impl std::borrow::Borrow<dyn Diagnostic> for Box<ArgError> {
    fn borrow(&self) -> &(dyn Diagnostic + 'static) {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_prefixed() {
        let err = ArgError::MissingCustomRange;
        assert_eq!(err.code().unwrap().to_string(), "AMG-E007");
        let err = ArgError::OffsetInExecutable { offset: 1 };
        assert_eq!(err.code().unwrap().to_string(), "AMG-E004");
        let err = ArgError::SpaceInArgument {
            index: 2,
            token: "exit 3".to_string(),
        };
        assert_eq!(err.code().unwrap().to_string(), "AMG-E015");
    }

    #[test]
    fn test_batch_wrapper_keeps_cause() {
        let err = ArgError::InBatch {
            line: 3,
            source: Box::new(ArgError::NullInCustomRange),
        };
        assert_eq!(err.to_string(), "Invalid test case on line 3");
        assert!(err.diagnostic_source().is_some());
    }
}
