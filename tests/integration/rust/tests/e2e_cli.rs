//! End-to-End CLI Integration Tests
//!
//! Runs the whole catalog through the lab_cli entry point.
//! This is the highest level integration test - arguments to printed trace.

use clap::Parser as ClapParser;
use lab_cli::{run, Cli};
use scenarios::{catalog, Chapter};

fn run_args(args: &[&str]) -> (u8, String, String) {
    let mut argv = vec!["promise-lab"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("arguments should parse");
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let code = match run(&cli, &mut out, &mut err) {
        Ok(summary) => summary.exit_code(),
        Err(e) => e.exit_code(),
    };
    (
        code,
        String::from_utf8(out).expect("utf-8 stdout"),
        String::from_utf8(err).expect("utf-8 stderr"),
    )
}

/// Scenarios whose run ends in an uncaught exception
const UNCAUGHT: &[&str] = &[
    "promise-throw-in-timer",
    "try-around-definitions",
    "try-around-timer",
    "lost-stack-trace",
    "which-call-failed",
];

/// Test: each scenario exits 1 exactly when it ends uncaught
#[test]
fn test_e2e_exit_status_per_scenario() {
    for scenario in catalog() {
        let (code, _, err) = run_args(&[scenario.name]);
        let expected = if UNCAUGHT.contains(&scenario.name) { 1 } else { 0 };
        assert_eq!(code, expected, "{}", scenario.name);
        assert_eq!(
            err.contains("Uncaught "),
            expected == 1,
            "{}: {}",
            scenario.name,
            err
        );
    }
}

/// Test: every chapter runs end to end with one banner per scenario
#[test]
fn test_e2e_every_chapter() {
    for chapter in Chapter::ALL {
        let (_, out, _) = run_args(&["--chapter", chapter.name()]);
        let banners = out.lines().filter(|l| l.starts_with("=== ")).count();
        assert_eq!(banners, scenarios::by_chapter(chapter).count(), "{}", chapter);
    }
}

/// Test: listing names every scenario
#[test]
fn test_e2e_list_names_everything() {
    let (code, out, err) = run_args(&["--list"]);
    assert_eq!(code, 0);
    assert!(err.is_empty());
    for scenario in catalog() {
        assert!(out.contains(scenario.name), "{}", scenario.name);
    }
}

/// Test: several named scenarios run in the order given
#[test]
fn test_e2e_named_scenarios_in_order() {
    let (code, out, _) = run_args(&["await-mixed-catch", "sync-order"]);
    assert_eq!(code, 0);
    assert_eq!(
        out,
        "=== await-mixed-catch ===\n1\n2\n3\n4\n5\n\n\
         === sync-order ===\nstatement 1\nstatement 2\nstatement 3... all in order\n"
    );
}

/// Test: an unknown name stops before anything runs
#[test]
fn test_e2e_unknown_scenario() {
    let (code, out, _) = run_args(&["sync-order", "nope"]);
    assert_eq!(code, 2);
    assert!(out.is_empty());
}
