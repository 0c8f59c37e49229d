//! JSON lines batch files: one test case per non-blank line.

use crate::error::ArgError;
use crate::prepare::CaseOptions;
use argmorph_core::TestCase;
use miette::{NamedSource, SourceSpan};
use std::path::Path;
use tracing::debug;

/// Parse every non-blank line of `content` into case options.
///
/// Line numbers are 1-based and refer to the original file.
pub fn parse_batch(name: &str, content: &str) -> Result<Vec<(usize, CaseOptions)>, ArgError> {
    let mut entries = Vec::new();
    let mut line_start = 0;
    for (index, line) in content.split_inclusive('\n').enumerate() {
        let number = index + 1;
        let offset = line_start;
        line_start += line.len();
        if line.trim().is_empty() {
            continue;
        }

        let options: CaseOptions = serde_json::from_str(line).map_err(|err| {
            let column = err.column().saturating_sub(1).min(line.trim_end().len());
            ArgError::BatchParse {
                line: number,
                src: NamedSource::new(name, content.to_string()),
                span: SourceSpan::from((offset + column, 1)),
                message: err.to_string(),
            }
        })?;
        if options.command.trim().is_empty() {
            return Err(ArgError::BatchMissingCommand { line: number });
        }
        entries.push((number, options));
    }
    debug!("{} test cases read from {}", entries.len(), name);
    Ok(entries)
}

/// Read and validate a whole batch file. Any invalid line aborts the run
/// before the first test case executes.
pub fn load_batch(path: &Path, default_timeout_secs: f64) -> Result<Vec<TestCase>, ArgError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArgError::BatchReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    parse_batch(&path.display().to_string(), &content)?
        .into_iter()
        .map(|(line, options)| {
            options
                .build(default_timeout_secs)
                .map_err(|err| ArgError::InBatch {
                    line,
                    source: Box::new(err),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::RangeName;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_parse_skips_blank_lines() {
        let content = concat!(
            r#"{"command": "net start fax", "range": "ascii"}"#,
            "\n\n   \n",
            r#"{"command": "certutil /urlcache", "custom_range": ["0x41..0x43"], "timeout": 0.5}"#,
            "\n",
        );
        let entries = parse_batch("batch.jsonl", content).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, 1);
        assert_eq!(entries[0].1.range, Some(RangeName::Ascii));
        assert_eq!(entries[1].0, 4);
        assert_eq!(entries[1].1.custom_range[0].0, 0x41..0x43);
        assert_eq!(entries[1].1.timeout, Some(0.5));
    }

    #[test]
    fn test_parse_error_points_at_line() {
        let content = "{\"command\": \"a b\"}\n{\"command\": \"a b\", \"range\": \"greek\"}\n";
        match parse_batch("batch.jsonl", content) {
            Err(ArgError::BatchParse { line, span, .. }) => {
                assert_eq!(line, 2);
                assert!(span.offset() >= content.find('\n').unwrap());
                assert!(span.offset() < content.len());
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_command() {
        let content = "{\"range\": \"ascii\"}\n";
        assert!(matches!(
            parse_batch("batch.jsonl", content),
            Err(ArgError::BatchMissingCommand { line: 1 })
        ));
    }

    #[test]
    fn test_load_batch_builds_cases() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"command": "net start fax", "exit_code_only": true}}"#).unwrap();
        writeln!(file, r#"{{"command": "tool /activ:true", "timeout": 5}}"#).unwrap();

        let cases = load_batch(file.path(), 2.0).unwrap();
        assert_eq!(cases.len(), 2);
        assert!(cases[0].exit_code_only);
        assert_eq!(cases[0].timeout, Duration::from_secs(2));
        assert_eq!(cases[1].timeout, Duration::from_secs(5));
        assert_eq!(cases[1].display_name(), "tool");
    }

    #[test]
    fn test_load_batch_wraps_validation_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"command": "whoami"}}"#).unwrap();

        match load_batch(file.path(), 2.0) {
            Err(ArgError::InBatch { line, source }) => {
                assert_eq!(line, 1);
                assert!(matches!(*source, ArgError::NoArguments { .. }));
            }
            other => panic!("expected batch error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_batch(Path::new("/nonexistent/argmorph.jsonl"), 2.0),
            Err(ArgError::BatchReadFailed { .. })
        ));
    }
}
