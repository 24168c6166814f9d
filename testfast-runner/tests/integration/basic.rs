// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, bail};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;
use testfast_runner::{
    errors::{DiscoveryError, ExecuteError, RunAndPersistError},
    list::TestList,
    record::{RecordStore, TestRecord, TestRecordSet},
    reporter::LogReporter,
    runner::{RunStatus, TestRunner, run_and_persist},
};

fn schedule(names: &[&str]) -> TestRecordSet {
    names
        .iter()
        .map(|name| TestRecord::new_unrun(id(name)))
        .collect()
}

fn history_triples(store: &RecordStore) -> Result<Vec<(String, bool)>> {
    Ok(store
        .read()?
        .iter()
        .map(|record| (record.id.name.clone(), record.passed))
        .collect())
}

#[test]
fn discover_lists_prefixed_tests() -> Result<()> {
    let fake = FakeGo::new(&["Test_Add", "Test_Sub", "BenchmarkAdd"])?;

    let tests = TestList::discover(fake.config(), "./...")?;
    let ids: Vec<_> = tests.iter().map(|test| test.id.clone()).collect();
    assert_eq!(ids, vec![id("Test_Add"), id("Test_Sub")]);
    assert_eq!(fake.invocations()?, vec!["test -json -list . ./..."]);

    Ok(())
}

#[test]
fn discover_failure_reports_stderr() -> Result<()> {
    let fake = FakeGo::with_listing("", 1)?;

    match TestList::discover(fake.config(), "./...") {
        Err(DiscoveryError::ListFailed {
            exit_code, stderr, ..
        }) => {
            assert_eq!(exit_code, Some(1));
            assert_eq!(stderr, "go: cannot find main module\n");
        }
        other => bail!("expected list failure, found {other:?}"),
    }

    Ok(())
}

#[test]
fn discover_malformed_output() -> Result<()> {
    let fake = FakeGo::with_listing(
        indoc! {r#"
            {"Action":"output","Package":"example.com/calc","Output":"Test_Add\n"}
            not json
        "#},
        0,
    )?;

    match TestList::discover(fake.config(), "./...") {
        Err(DiscoveryError::Parse {
            line_number, line, ..
        }) => {
            assert_eq!(line_number, 2);
            assert_eq!(line, "not json");
        }
        other => bail!("expected parse error, found {other:?}"),
    }

    Ok(())
}

#[test]
fn fail_fast_stops_at_first_failure() -> Result<()> {
    let fake = FakeGo::new(&[])?;
    let runner = TestRunner::new(fake.config(), None);
    let mut reporter = RecordingReporter::default();

    let report = runner.execute(
        schedule(&["Test_First", "Test_SecondFail", "Test_Third"]),
        &mut reporter,
    )?;

    assert_eq!(
        report.status,
        RunStatus::TestFailed {
            id: id("Test_SecondFail")
        }
    );
    assert_eq!(report.records.len(), 2);
    assert_eq!(fake.tests_run()?, vec!["Test_First", "Test_SecondFail"]);
    assert_eq!(
        reporter.finished,
        vec![
            ("Test_First".to_owned(), true),
            ("Test_SecondFail".to_owned(), false)
        ]
    );
    assert_eq!(
        reporter.failure_details,
        vec!["--- FAIL: Test_SecondFail (0.00s)\nFAIL\n"]
    );

    let stats = reporter.run_stats.expect("run finished");
    assert_eq!(
        (stats.finished_count, stats.passed, stats.failed),
        (2, 1, 1)
    );
    assert!(stats.stopped_early());

    Ok(())
}

#[test]
fn log_reporter_writes_failure_output() -> Result<()> {
    let fake = FakeGo::new(&[])?;
    let runner = TestRunner::new(fake.config(), None);
    let mut reporter = LogReporter::new(Vec::new());

    runner.execute(schedule(&["Test_Add", "Test_SubFail"]), &mut reporter)?;

    let stderr = String::from_utf8(reporter.into_inner())?;
    assert_eq!(stderr, "--- FAIL: Test_SubFail (0.00s)\nFAIL\n");

    Ok(())
}

#[test]
fn run_args_are_forwarded() -> Result<()> {
    let mut fake = FakeGo::new(&[])?;
    fake.config_mut().run_args = vec!["-count=1".to_owned()];
    let runner = TestRunner::new(fake.config(), None);

    let report = runner.execute(schedule(&["Test_Add"]), &mut RecordingReporter::default())?;
    assert_eq!(report.status, RunStatus::Passed);
    assert_eq!(
        fake.invocations()?,
        vec!["test -count=1 -run ^Test_Add$ example.com/calc"]
    );

    Ok(())
}

#[test]
fn coverage_is_stitched() -> Result<()> {
    let fake = FakeGo::new(&[])?;
    let profile = fake.root().join("coverage.out");
    fs::write(&profile, "mode: set\nexample.com/calc/stale.go:1.1,2.2 1 1\n")?;

    let runner = TestRunner::new(fake.config(), Some(&profile));
    let report = runner.execute(
        schedule(&["Test_Add", "Test_Sub", "Test_MulFail"]),
        &mut RecordingReporter::default(),
    )?;
    assert!(!report.status.is_success());

    assert_eq!(
        fs::read_to_string(&profile)?,
        indoc! {"
            mode: set
            example.com/calc/Test_Add.go:1.1,2.2 1 1
            example.com/calc/Test_Sub.go:1.1,2.2 1 1
            example.com/calc/Test_MulFail.go:1.1,2.2 1 1
        "}
    );

    let fragments = fake.coverage_fragments()?;
    assert_eq!(fragments.len(), 3);
    for fragment in &fragments {
        assert!(!fragment.exists(), "fragment {fragment} was removed");
    }

    Ok(())
}

#[test]
fn unexpected_exit_removes_coverage_fragment() -> Result<()> {
    let fake = FakeGo::new(&[])?;
    let profile = fake.root().join("coverage.out");

    let runner = TestRunner::new(fake.config(), Some(&profile));
    match runner.execute(
        schedule(&["Test_Add", "Test_Broken", "Test_Sub"]),
        &mut RecordingReporter::default(),
    ) {
        Err(ExecuteError::UnexpectedExit { .. }) => {}
        other => bail!("expected unexpected exit, found {other:?}"),
    }

    assert_eq!(
        fs::read_to_string(&profile)?,
        "mode: set\nexample.com/calc/Test_Add.go:1.1,2.2 1 1\n"
    );
    let fragments = fake.coverage_fragments()?;
    assert_eq!(fragments.len(), 2);
    for fragment in &fragments {
        assert!(!fragment.exists(), "fragment {fragment} was removed");
    }

    Ok(())
}

#[test]
fn unexpected_exit_aborts_without_persisting() -> Result<()> {
    let fake = FakeGo::new(&["Test_Add", "Test_Broken", "Test_Sub"])?;
    let tests = TestList::discover(fake.config(), "./...")?;
    let store = RecordStore::new(fake.history_path());

    let result = run_and_persist(
        fake.config(),
        &tests,
        &store,
        None,
        &mut RecordingReporter::default(),
    );
    match result {
        Err(RunAndPersistError::Execute(ExecuteError::UnexpectedExit {
            exit_status,
            output,
            ..
        })) => {
            assert_eq!(exit_status.code(), Some(2));
            assert_eq!(output, "# example.com/calc [build failed]\n");
        }
        other => bail!("expected unexpected exit, found {other:?}"),
    }

    assert_eq!(fake.tests_run()?, vec!["Test_Add", "Test_Broken"]);
    assert!(!store.path().exists(), "history is not written on abort");

    Ok(())
}

#[test]
fn history_drives_next_run() -> Result<()> {
    let fake = FakeGo::new(&["Test_Add", "Test_SubFail", "Test_Mul"])?;
    let tests = TestList::discover(fake.config(), "./...")?;
    let store = RecordStore::new(fake.history_path());

    // First run: no history, so discovery order. Stops at Test_SubFail.
    let mut reporter = RecordingReporter::default();
    let status = run_and_persist(fake.config(), &tests, &store, None, &mut reporter)?;
    assert_eq!(
        status,
        RunStatus::TestFailed {
            id: id("Test_SubFail")
        }
    );
    assert_eq!(reporter.scheduled, Some((3, 3)));
    assert_eq!(reporter.history_written, Some(2));
    assert_eq!(
        history_triples(&store)?,
        vec![
            ("Test_SubFail".to_owned(), false),
            ("Test_Add".to_owned(), true)
        ]
    );

    // Second run: Test_Mul has no history and runs first, then the previous failure.
    let mut reporter = RecordingReporter::default();
    let status = run_and_persist(fake.config(), &tests, &store, None, &mut reporter)?;
    assert!(!status.is_success());
    assert_eq!(reporter.scheduled, Some((3, 1)));
    assert_eq!(
        fake.tests_run()?,
        vec![
            "Test_Add",
            "Test_SubFail",
            "Test_Mul",
            "Test_SubFail"
        ]
    );
    assert_eq!(
        history_triples(&store)?,
        vec![
            ("Test_SubFail".to_owned(), false),
            ("Test_Mul".to_owned(), true)
        ]
    );

    Ok(())
}

#[test]
fn passing_run_persists_everything() -> Result<()> {
    let fake = FakeGo::new(&["Test_Add", "Test_Sub"])?;
    let tests = TestList::discover(fake.config(), "./...")?;
    let store = RecordStore::new(fake.history_path());

    let status = run_and_persist(
        fake.config(),
        &tests,
        &store,
        None,
        &mut RecordingReporter::default(),
    )?;
    assert_eq!(status, RunStatus::Passed);
    assert_eq!(
        fs::read_to_string(store.path())?,
        indoc! {r#"
            [
              {
                "package": "example.com/calc",
                "name": "Test_Add",
                "passed": true
              },
              {
                "package": "example.com/calc",
                "name": "Test_Sub",
                "passed": true
              }
            ]
        "#}
    );

    Ok(())
}

#[test]
fn reporter_failure_still_persists_history() -> Result<()> {
    let fake = FakeGo::new(&["Test_Add", "Test_SubFail", "Test_Mul"])?;
    let tests = TestList::discover(fake.config(), "./...")?;
    let store = RecordStore::new(fake.history_path());

    // Only failure details are written, so the reporter breaks on Test_SubFail.
    let mut reporter = LogReporter::new(BrokenPipe);
    match run_and_persist(fake.config(), &tests, &store, None, &mut reporter) {
        Err(RunAndPersistError::Report(_)) => {}
        other => bail!("expected a reporter error, found {other:?}"),
    }

    assert_eq!(fake.tests_run()?, vec!["Test_Add", "Test_SubFail"]);
    assert_eq!(
        history_triples(&store)?,
        vec![
            ("Test_SubFail".to_owned(), false),
            ("Test_Add".to_owned(), true)
        ]
    );

    Ok(())
}

#[test]
fn execute_returns_records_on_reporter_failure() -> Result<()> {
    let fake = FakeGo::new(&[])?;
    let runner = TestRunner::new(fake.config(), None);

    match runner.execute(
        schedule(&["Test_Add", "Test_SubFail", "Test_Mul"]),
        &mut LogReporter::new(BrokenPipe),
    ) {
        Err(ExecuteError::Report { records, .. }) => {
            let outcomes: Vec<_> = records
                .iter()
                .map(|record| (record.id.name.as_str(), record.passed))
                .collect();
            assert_eq!(outcomes, vec![("Test_Add", true), ("Test_SubFail", false)]);
        }
        other => bail!("expected a reporter error, found {other:?}"),
    }

    Ok(())
}
