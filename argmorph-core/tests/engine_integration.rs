//! End-to-end engine tests against small shell scripts standing in for real
//! system tools.

#![cfg(unix)]

use argmorph_core::{
    Candidate, CandidateId, CategoryResult, Command, Engine, MatchSet, TestCase,
    is_missing_executable,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Behaves like a service manager that also accepts a Cyrillic 'a', the
/// `st` abbreviation and embedded quotes for `start`.
fn fake_net(dir: &Path) -> String {
    write_script(
        dir,
        "net",
        r#"case "$1" in
  start|stаrt|st|'s"t"art') echo "The service name is invalid." >&2; exit 2;;
  *) echo "The syntax of this command is: NET [ START | STOP ]"; exit 1;;
esac"#,
    )
    .display()
    .to_string()
}

fn offset_of(command: &Command, token: usize, within: usize) -> usize {
    command.tokens()[..token]
        .iter()
        .map(|t| t.chars().count() + 1)
        .sum::<usize>()
        + within
}

#[tokio::test]
async fn test_service_manager_outcomes() {
    let dir = TempDir::new().unwrap();
    let command = Command::new([fake_net(dir.path()), "start".into(), "fax".into()]);
    let offset = offset_of(&command, 1, 2);
    let tc = TestCase::new(command)
        .with_char_offset(offset)
        .with_scan_range([0x0430, 'b' as u32]);

    let outcomes = Engine::new(4).run(&tc).await.unwrap();

    // no option-like argument
    assert_eq!(outcomes.option_char, CategoryResult::NotApplicable);
    assert_eq!(outcomes.char_insert, CategoryResult::TestedEmpty);

    let substituted = outcomes.char_substitute.found().expect("homoglyph accepted");
    let ids: Vec<_> = substituted.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![CandidateId::CodePoint(0x0430)]);
    assert!(substituted.iter().next().unwrap().command.ends_with(" st\u{430}rt fax"));

    assert!(outcomes.quotes.found().unwrap().ends_with(" s\"t\"art fax"));

    let shortened = outcomes.shorthands.found().expect("abbreviation accepted");
    assert_eq!(shortened.len(), 1);
    assert_eq!(shortened.iter().next().unwrap().id, CandidateId::Ordinal(1));
}

#[tokio::test]
async fn test_option_char_alternatives_tested() {
    let dir = TempDir::new().unwrap();
    let script = write_script(
        dir.path(),
        "tool",
        r#"case "$1" in
  /x|-x) echo ok; exit 0;;
  *) echo "bad option $1" >&2; exit 3;;
esac"#,
    );
    let tc = TestCase::new(Command::new([script.display().to_string(), "/x".into()]))
        .with_char_offset(script.display().to_string().chars().count() + 2);

    let outcomes = Engine::new(8).run(&tc).await.unwrap();

    let expected: MatchSet = [Candidate::new(
        CandidateId::CodePoint('-' as u32),
        format!("{} -x", script.display()),
    )]
    .into_iter()
    .collect();
    assert_eq!(outcomes.option_char, CategoryResult::Found(expected));
    // "/x" cannot be shortened any further
    assert_eq!(outcomes.shorthands, CategoryResult::NotApplicable);
}

#[tokio::test]
async fn test_timeouts_count_as_failures_and_post_command_runs_per_variant() {
    let dir = TempDir::new().unwrap();
    let script = write_script(
        dir.path(),
        "slow",
        r#"case "$1" in
  run) exit 0;;
  *) sleep 5;;
esac"#,
    );
    let counter = dir.path().join("post.count");
    let post = Command::new([
        "sh".to_string(),
        "-c".to_string(),
        format!("echo x >> {}", counter.display()),
    ]);
    let exe = script.display().to_string();
    let offset = exe.chars().count() + 2;
    let tc = TestCase::new(Command::new([exe, "run".into()]))
        .with_char_offset(offset)
        .with_post_command(post)
        .with_timeout(Duration::from_millis(300));

    let outcomes = Engine::new(4).run(&tc).await.unwrap();

    // "r", "ru" and r"u"n all hang and are killed
    assert_eq!(outcomes.shorthands, CategoryResult::TestedEmpty);
    assert_eq!(outcomes.quotes, CategoryResult::TestedEmpty);
    // empty scan range: tested, nothing to find
    assert_eq!(outcomes.char_insert, CategoryResult::TestedEmpty);

    let runs = fs::read_to_string(&counter).unwrap();
    assert_eq!(runs.lines().count(), 3);
}

#[tokio::test]
async fn test_random_token_requires_exit_code_only() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "echoer", r#"echo "$2""#);
    let command = Command::new([script.display().to_string(), "go".into(), "{random}".into()]);

    let strict = TestCase::new(command.clone());
    let outcomes = Engine::new(2).run(&strict).await.unwrap();
    // every execution prints a different token
    assert_eq!(outcomes.quotes, CategoryResult::TestedEmpty);

    let lenient = TestCase::new(command).with_exit_code_only(true);
    let outcomes = Engine::new(2).run(&lenient).await.unwrap();
    assert!(outcomes.quotes.found().unwrap().contains("g\"o\" {random}"));
}

#[tokio::test]
async fn test_pre_command_feeds_stdin() {
    let dir = TempDir::new().unwrap();
    let script = write_script(
        dir.path(),
        "reader",
        r#"read line
case "$1" in
  print|'p"r"int') echo "got $line";;
  *) exit 4;;
esac"#,
    );
    let tc = TestCase::new(Command::new([script.display().to_string(), "print".into()]))
        .with_pre_command(Command::new(["echo", "hello"]));

    let outcomes = Engine::new(2).run(&tc).await.unwrap();

    // the quoted variant only matches if it also read "hello" from stdin
    assert!(outcomes.quotes.found().is_some());
    assert_eq!(outcomes.shorthands, CategoryResult::TestedEmpty);
}

#[tokio::test]
async fn test_quotes_and_backslashes_are_not_consumed() {
    let command = Command::new(["echo", "start"]);
    let tc = TestCase::new(command)
        .with_char_offset(7)
        .with_scan_range([0x5C, 0x62]);

    let outcomes = Engine::new(2).run(&tc).await.unwrap();

    assert_eq!(outcomes.quotes, CategoryResult::TestedEmpty);
    for result in [&outcomes.char_insert, &outcomes.char_substitute] {
        if let Some(matches) = result.found() {
            assert!(matches.iter().all(|c| c.id != CandidateId::CodePoint(0x5C)));
        }
    }
}

#[tokio::test]
async fn test_argument_with_space_aborts_test_case() {
    let tc = TestCase::new(Command::new(["sh", "-c", "exit 3"]));
    let err = Engine::new(2).run(&tc).await.unwrap_err();
    assert!(err.to_string().contains("contains a space"));
    assert!(!is_missing_executable(&err));
}

#[tokio::test]
async fn test_missing_executable_is_reported() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("not-installed");
    let tc = TestCase::new(Command::new([missing.display().to_string(), "/a".into()]));

    let err = Engine::new(2).run(&tc).await.unwrap_err();
    assert!(is_missing_executable(&err));
}
