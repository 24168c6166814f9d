// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test runner.
//!
//! The main structure in this module is [`TestRunner`]. It runs scheduled tests one at a time,
//! each in its own `go test` process, and stops at the first failure.

use crate::{
    config::TestfastConfig,
    coverage::{CoverageFragment, CoverageProfile},
    errors::{ExecuteError, RunAndPersistError},
    go_cli::GoCli,
    list::{TestIdentity, TestList},
    record::{RecordStore, TestRecord, TestRecordSet, rearrange},
    reporter::{Reporter, ReporterEvent},
};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use tracing::debug;

/// How a run ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RunStatus {
    /// Every scheduled test passed.
    Passed,

    /// A test failed, and the rest of the schedule was not run.
    TestFailed {
        /// The test that failed.
        id: TestIdentity,
    },
}

impl RunStatus {
    /// Returns true if every scheduled test passed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Statistics for a test run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RunStats {
    /// The number of tests that were scheduled.
    ///
    /// If the run stopped at a failure, this will be more than `finished_count`.
    pub initial_run_count: usize,

    /// The number of tests that finished running.
    pub finished_count: usize,

    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed.
    pub failed: usize,
}

impl RunStats {
    /// Returns true if some scheduled tests weren't run.
    pub fn stopped_early(&self) -> bool {
        self.finished_count < self.initial_run_count
    }

    fn on_test_finished(&mut self, record: &TestRecord) {
        self.finished_count += 1;
        if record.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// The result of [`TestRunner::execute`].
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Updated records for every test that was run, in execution order.
    ///
    /// After a failure, this ends with the failing test. Tests after it are not included.
    pub records: TestRecordSet,

    /// How the run ended.
    pub status: RunStatus,

    /// Statistics for the run.
    pub stats: RunStats,
}

/// Runs tests sequentially in a Go project.
#[derive(Debug)]
pub struct TestRunner<'cfg> {
    config: &'cfg TestfastConfig,
    coverage_profile: Option<Utf8PathBuf>,
}

impl<'cfg> TestRunner<'cfg> {
    /// Creates a new runner. If `coverage_profile` is specified, coverage from every test is
    /// accumulated there.
    pub fn new(config: &'cfg TestfastConfig, coverage_profile: Option<&Utf8Path>) -> Self {
        Self {
            config,
            coverage_profile: coverage_profile.map(Utf8Path::to_owned),
        }
    }

    /// Runs `schedule` in order, stopping at the first failing test.
    ///
    /// A failing test is reported through [`RunReport::status`]. An `Err` means the run could not
    /// continue: `go test` couldn't be started, exited with a status other than success or test
    /// failure, or coverage couldn't be written. If the reporter fails, the records gathered so far
    /// are returned in [`ExecuteError::Report`].
    pub fn execute(
        &self,
        schedule: TestRecordSet,
        reporter: &mut dyn Reporter,
    ) -> Result<RunReport, ExecuteError> {
        let coverage = self
            .coverage_profile
            .as_deref()
            .map(CoverageProfile::create)
            .transpose()?;

        let total = schedule.len();
        let mut stats = RunStats {
            initial_run_count: total,
            ..RunStats::default()
        };
        let mut records = TestRecordSet::with_capacity(total);
        let mut status = RunStatus::Passed;

        for (index, scheduled) in schedule.into_iter().enumerate() {
            let record = self.run_test(scheduled.id, coverage.as_ref())?;
            stats.on_test_finished(&record);
            let reported = reporter.report_event(ReporterEvent::TestFinished {
                record: &record,
                index,
                total,
            });

            let failed_id = (!record.passed).then(|| record.id.clone());
            records.push(record);
            if let Err(error) = reported {
                return Err(ExecuteError::Report { records, error });
            }
            if let Some(id) = failed_id {
                status = RunStatus::TestFailed { id };
                break;
            }
        }

        if let Err(error) = reporter.report_event(ReporterEvent::RunFinished { stats }) {
            return Err(ExecuteError::Report { records, error });
        }
        Ok(RunReport {
            records,
            status,
            stats,
        })
    }

    fn run_test(
        &self,
        id: TestIdentity,
        coverage: Option<&CoverageProfile>,
    ) -> Result<TestRecord, ExecuteError> {
        let fragment = coverage.map(CoverageProfile::new_fragment).transpose()?;
        let go_cli = GoCli::run_test(
            &self.config.go_path,
            &self.config.root,
            &id,
            fragment.as_ref().map(CoverageFragment::path),
            &self.config.run_args,
        );
        let command = go_cli.command_string();

        let output = go_cli
            .to_expression()
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|error| ExecuteError::Exec {
                command: command.clone(),
                error,
            })?;
        let details = String::from_utf8_lossy(&output.stdout).into_owned();

        let Some(passed) = classify_exit(output.status.code(), self.config.test_failure_exit_code)
        else {
            return Err(ExecuteError::UnexpectedExit {
                command,
                exit_status: output.status,
                output: details,
            });
        };
        debug!("`{command}` exited with {}", output.status);

        if let (Some(coverage), Some(fragment)) = (coverage, fragment) {
            coverage.append(fragment)?;
        }

        Ok(TestRecord {
            id,
            passed,
            details,
        })
    }
}

/// Maps an exit code to whether the test passed. `None` means the exit was neither a pass nor a
/// test failure.
fn classify_exit(code: Option<i32>, test_failure_exit_code: i32) -> Option<bool> {
    match code {
        Some(0) => Some(true),
        Some(code) if code == test_failure_exit_code => Some(false),
        _ => None,
    }
}

/// Schedules the discovered tests against the history, runs them, and writes the updated history.
///
/// History is written whether or not a test failed, and also if the reporter failed partway. It is
/// not written if the run was aborted by any other error.
pub fn run_and_persist(
    config: &TestfastConfig,
    tests: &TestList,
    history: &RecordStore,
    coverage_profile: Option<&Utf8Path>,
    reporter: &mut dyn Reporter,
) -> Result<RunStatus, RunAndPersistError> {
    reporter.report_event(ReporterEvent::TestsDiscovered { count: tests.len() })?;

    let previous = history.read()?;
    reporter.report_event(ReporterEvent::HistoryLoaded {
        path: history.path(),
        count: previous.len(),
    })?;

    let known: HashSet<_> = previous.iter().map(|record| record.id.clone()).collect();
    let schedule = rearrange(previous, tests.to_records());
    let new = schedule
        .iter()
        .filter(|record| !known.contains(&record.id))
        .count();
    reporter.report_event(ReporterEvent::RunStarted {
        scheduled: schedule.len(),
        new,
    })?;

    let runner = TestRunner::new(config, coverage_profile);
    let RunReport {
        mut records,
        status,
        ..
    } = match runner.execute(schedule, reporter) {
        Ok(report) => report,
        Err(ExecuteError::Report { mut records, error }) => {
            // The outcomes are known even though they couldn't be shown.
            history.write(&mut records)?;
            return Err(RunAndPersistError::Report(error));
        }
        Err(error) => return Err(error.into()),
    };

    history.write(&mut records)?;
    reporter.report_event(ReporterEvent::HistoryWritten {
        path: history.path(),
        count: records.len(),
    })?;

    Ok(status)
}
