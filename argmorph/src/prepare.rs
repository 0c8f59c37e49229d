//! Turn user input (flags or a batch line) into validated test cases.

use crate::error::ArgError;
use argmorph_core::config::{MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
use argmorph_core::{Command, TestCase, preferred_char_offset, select_arg_index};
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const EDUCATED_RANGES: [Range<u32>; 4] = [
    0x01..0xFF,
    0x0100..0x052F,
    0x2070..0x218F,
    0xFF00..0xFFEF,
];
const FULL_RANGE: Range<u32> = 0x01..0xFFFF;
const ASCII_RANGE: Range<u32> = 0x01..0xFF;

/// Named character ranges to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeName {
    /// Latin, Cyrillic, letter-like symbols and full-width forms
    Educated,
    /// The whole Basic Multilingual Plane
    Full,
    /// Latin-1
    Ascii,
    /// Ranges given with --custom-range
    Custom,
}

impl fmt::Display for RangeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RangeName::Educated => "educated",
            RangeName::Full => "full",
            RangeName::Ascii => "ascii",
            RangeName::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// A half-open code point range written as `0x20..0x7F`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct CodeRange(pub Range<u32>);

fn parse_code_point(value: &str) -> Result<u32, String> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    };
    parsed.map_err(|_| format!("'{value}' is not a code point (use 0x.. or decimal)"))
}

impl FromStr for CodeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((start, end)) = s.split_once("..") else {
            return Err(format!("expected START..END, got '{s}'"));
        };
        Ok(Self(parse_code_point(start)?..parse_code_point(end)?))
    }
}

impl TryFrom<String> for CodeRange {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for CodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}..0x{:04X}", self.0.start, self.0.end)
    }
}

/// Per-test-case options, shared by the command line and batch lines.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaseOptions {
    pub command: String,
    pub range: Option<RangeName>,
    pub custom_range: Vec<CodeRange>,
    pub char_offset: Option<usize>,
    pub pre_command: Option<String>,
    pub post_command: Option<String>,
    pub exit_code_only: bool,
    /// Seconds; falls back to the run-wide default.
    pub timeout: Option<f64>,
}

impl CaseOptions {
    pub fn build(&self, default_timeout_secs: f64) -> Result<TestCase, ArgError> {
        let prepared = prepare_command(&self.command, self.char_offset)?;
        let scan_range = scan_range(self.range, &self.custom_range)?;
        let timeout = validate_timeout(self.timeout.unwrap_or(default_timeout_secs))?;

        let mut test_case = TestCase::new(prepared.command)
            .with_char_offset(prepared.char_offset)
            .with_arg_index(prepared.arg_index)
            .with_scan_range(scan_range)
            .with_exit_code_only(self.exit_code_only)
            .with_timeout(timeout);
        if let Some(pre) = optional_command(self.pre_command.as_deref())? {
            test_case = test_case.with_pre_command(pre);
        }
        if let Some(post) = optional_command(self.post_command.as_deref())? {
            test_case = test_case.with_post_command(post);
        }
        Ok(test_case)
    }
}

/// A tokenized command and the position the character strategies work on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub command: Command,
    pub char_offset: usize,
    pub arg_index: usize,
}

/// Split a command string into tokens the way the platform shell would.
#[cfg(not(windows))]
pub fn split_command(command: &str) -> Result<Vec<String>, ArgError> {
    shell_words::split(command).map_err(|err| ArgError::UnparsableCommand {
        command: command.to_string(),
        reason: err.to_string(),
    })
}

/// Split a command string on unquoted whitespace, keeping the quotes;
/// Windows programs parse their own command line.
#[cfg(windows)]
pub fn split_command(command: &str) -> Result<Vec<String>, ArgError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in command.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(ArgError::UnparsableCommand {
            command: command.to_string(),
            reason: "missing closing quote".to_string(),
        });
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn optional_command(command: Option<&str>) -> Result<Option<Command>, ArgError> {
    match command.map(str::trim).filter(|c| !c.is_empty()) {
        Some(command) => Ok(Some(Command::new(split_command(command)?))),
        None => Ok(None),
    }
}

/// Tokenize `command_flat` and settle on a char offset.
///
/// Offsets count code points in the tokens re-joined with single spaces.
/// Without an explicit offset, a character of the first option-like
/// argument with a known look-alike is chosen.
pub fn prepare_command(
    command_flat: &str,
    char_offset: Option<usize>,
) -> Result<PreparedCommand, ArgError> {
    info!("Preparing parameters for {}", command_flat);
    let command = Command::new(split_command(command_flat)?);
    #[cfg(not(windows))]
    if let Some((index, token)) = command.token_with_separator() {
        return Err(ArgError::SpaceInArgument {
            index,
            token: token.to_string(),
        });
    }
    if command.len() < 2 {
        return Err(ArgError::NoArguments {
            command: command_flat.to_string(),
        });
    }

    let chars: Vec<char> = command.flatten().chars().collect();
    let starts: Vec<usize> = command
        .tokens()
        .iter()
        .scan(0, |next, token| {
            let start = *next;
            *next += token.chars().count() + 1;
            Some(start)
        })
        .collect();

    let (char_offset, arg_index) = match char_offset {
        Some(offset) => {
            if offset >= chars.len() {
                return Err(ArgError::OffsetOutOfBounds {
                    offset,
                    len: chars.len(),
                });
            }
            if offset < starts[1] {
                return Err(ArgError::OffsetInExecutable { offset });
            }
            let selected = chars[offset];
            if !selected.is_ascii_alphanumeric() {
                return Err(ArgError::OffsetNotAlphanumeric { selected });
            }
            let arg_index = starts.iter().rposition(|&start| start <= offset).unwrap_or(1);
            (offset, arg_index)
        }
        None => {
            let arg_index = select_arg_index(&command, None);
            let token = &command.tokens()[arg_index];
            let option_name = token.split(':').next().unwrap_or(token);
            info!("No char offset specified - using second char of first argument instead");
            let offset = starts[arg_index] + preferred_char_offset(option_name) - 1;
            // empty tokens ('') have no character of their own
            (offset.min(chars.len() - 1), arg_index)
        }
    };

    info!(
        "Char offset = {} (char '{}', argument index = {})",
        char_offset, chars[char_offset], arg_index
    );
    Ok(PreparedCommand {
        command,
        char_offset,
        arg_index,
    })
}

/// Expand the range selection into the ordered list of code points to scan.
pub fn scan_range(range: Option<RangeName>, custom: &[CodeRange]) -> Result<Vec<u32>, ArgError> {
    let selected = range.unwrap_or(if custom.is_empty() {
        RangeName::Educated
    } else {
        RangeName::Custom
    });

    let scan: Vec<u32> = match selected {
        RangeName::Custom if custom.is_empty() => return Err(ArgError::MissingCustomRange),
        RangeName::Custom => {
            let scan: Vec<u32> = custom.iter().flat_map(|r| r.0.clone()).collect();
            if scan.contains(&0) {
                return Err(ArgError::NullInCustomRange);
            }
            scan
        }
        other if !custom.is_empty() => {
            return Err(ArgError::CustomRangeConflict {
                range: other.to_string(),
            });
        }
        RangeName::Educated => EDUCATED_RANGES.iter().flat_map(Range::clone).collect(),
        RangeName::Full => FULL_RANGE.collect(),
        RangeName::Ascii => ASCII_RANGE.collect(),
    };

    info!("{} range selected ({} values)", selected, scan.len());
    Ok(scan)
}

/// Check a timeout in seconds and convert it.
pub fn validate_timeout(secs: f64) -> Result<Duration, ArgError> {
    if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&secs) {
        return Err(ArgError::InvalidTimeout {
            value: secs,
            min: MIN_TIMEOUT_SECS,
            max: MAX_TIMEOUT_SECS,
        });
    }
    Ok(Duration::from_secs_f64(secs))
}
