//! Per-test-case report files.

use anyhow::{Context, Result};
use argmorph_core::{CategoryResult, MatchSet, TestCase, TestOutcomes};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

const FORBIDDEN_FILE_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Collapse a scan range into `0xAAAA..0xBBBB` runs of consecutive code
/// points (both ends inclusive).
pub fn ranges(scan: &[u32]) -> String {
    let mut runs: Vec<(u32, u32)> = Vec::new();
    for &cp in scan {
        match runs.last_mut() {
            Some((_, end)) if end.checked_add(1) == Some(cp) => *end = cp,
            _ => runs.push((cp, cp)),
        }
    }
    runs.iter()
        .map(|(start, end)| format!("0x{start:04X}..0x{end:04X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `<name>.log` with characters that are invalid in file names removed.
pub fn report_file_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !FORBIDDEN_FILE_CHARS.contains(c)).collect();
    format!("{cleaned}.log")
}

/// Escape control characters so every variant stays on its own line.
fn printable(command: &str) -> String {
    command
        .chars()
        .map(|c| {
            if c.is_control() {
                c.escape_unicode().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}

fn write_code_point_matches(out: &mut String, result: &CategoryResult<MatchSet>) {
    let Some(matches) = result.found() else {
        out.push_str("No alternative commands were found.\n");
        return;
    };
    let _ = writeln!(
        out,
        "The following {} commands were found to be working:",
        matches.len()
    );
    // MatchSet is ordered by identifier
    for candidate in matches {
        let _ = writeln!(out, "{} : {}", candidate.id, printable(&candidate.command));
    }
}

/// Render the report text for one test case.
pub fn render_report(
    test_case: &TestCase,
    outcomes: &TestOutcomes,
    generated_at: DateTime<Local>,
) -> String {
    let name = test_case.display_name();
    let mut out = String::new();

    let _ = writeln!(out, "ARGUMENT OBFUSCATION REPORT FOR {name}");
    let _ = writeln!(out, "- Generated on {}", generated_at.to_rfc3339());
    let _ = writeln!(out, "- Command used      : {}", test_case.command);
    let _ = writeln!(
        out,
        "- Insertion position: {}^",
        " ".repeat(test_case.char_offset)
    );
    let _ = writeln!(out, "- Char ranges scanned: {}", ranges(&test_case.scan_range));

    out.push_str("\n:: Option Char Substitution\n");
    if outcomes.option_char.is_applicable() {
        write_code_point_matches(&mut out, &outcomes.option_char);
    } else {
        out.push_str(
            "The command does not contain any arguments starting with a slash or dash.\n",
        );
    }

    if outcomes.char_insert.is_applicable() {
        out.push_str("\n:: Character Insertion\n");
        write_code_point_matches(&mut out, &outcomes.char_insert);
    }

    if outcomes.char_substitute.is_applicable() {
        out.push_str("\n:: Character Substitution\n");
        write_code_point_matches(&mut out, &outcomes.char_substitute);
    }

    match &outcomes.quotes {
        CategoryResult::NotApplicable => {}
        CategoryResult::Found(command) => {
            out.push_str("\n:: Quote Insertion\n");
            out.push_str("Inserting quotes in the first argument did work, such as:\n");
            let _ = writeln!(out, "{}", printable(command));
        }
        CategoryResult::TestedEmpty => {
            out.push_str("\n:: Quote Insertion\n");
            out.push_str("Inserting quotes in the first argument did not appear to be working.\n");
        }
    }

    out.push_str("\n:: Shorthand Commands\n");
    match &outcomes.shorthands {
        CategoryResult::NotApplicable => {
            out.push_str("The command is too short to be further shortened.\n");
        }
        CategoryResult::TestedEmpty => out.push_str("No alternative commands were found.\n"),
        CategoryResult::Found(matches) => {
            let _ = writeln!(
                out,
                "The following {} commands were found to be working:",
                matches.len()
            );
            let mut shortened: Vec<&str> = matches.iter().map(|c| c.command.as_str()).collect();
            shortened.sort_by_key(|command| command.chars().count());
            for command in shortened {
                let _ = writeln!(out, "{command}");
            }
        }
    }

    out
}

/// Write the report for `test_case` into `report_dir`, replacing any
/// previous report for the same process.
pub fn write_report(
    report_dir: &Path,
    test_case: &TestCase,
    outcomes: &TestOutcomes,
) -> Result<PathBuf> {
    let path = report_dir.join(report_file_name(&test_case.display_name()));
    let content = render_report(test_case, outcomes, Local::now());
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(path)
}
