// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporting the progress of a test run.
//!
//! The runner never logs through a global sink of its own. Instead, every event is passed to a
//! [`Reporter`] supplied by the caller. [`LogReporter`] is the standard implementation: it emits
//! `tracing` events and writes the output of a failing test to standard error.

use crate::{errors::WriteEventError, record::TestRecord, runner::RunStats};
use camino::Utf8Path;
use std::io::Write;
use tracing::{error, info};

/// A sink for events produced over the course of a run.
pub trait Reporter {
    /// Reports a single event.
    fn report_event(&mut self, event: ReporterEvent<'_>) -> Result<(), WriteEventError>;
}

/// An event produced over the course of a run.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ReporterEvent<'a> {
    /// Discovery finished.
    TestsDiscovered {
        /// The number of tests discovered.
        count: usize,
    },

    /// Previous history was loaded.
    HistoryLoaded {
        /// The path to the history file.
        path: &'a Utf8Path,

        /// The number of records in the history.
        count: usize,
    },

    /// The run is about to start.
    RunStarted {
        /// The number of tests scheduled.
        scheduled: usize,

        /// The number of scheduled tests that have no history.
        new: usize,
    },

    /// A test finished running.
    TestFinished {
        /// The outcome of the test, including its captured output.
        record: &'a TestRecord,

        /// The 0-based position of the test in the schedule.
        index: usize,

        /// The number of tests in the schedule.
        total: usize,
    },

    /// The run finished, either because every test passed or because a test failed.
    RunFinished {
        /// Statistics for the run.
        stats: RunStats,
    },

    /// The updated history was written.
    HistoryWritten {
        /// The path to the history file.
        path: &'a Utf8Path,

        /// The number of records written.
        count: usize,
    },
}

/// A [`Reporter`] that emits `tracing` events.
///
/// The captured output of a failing test is written verbatim to `stderr`.
#[derive(Debug)]
pub struct LogReporter<W> {
    stderr: W,
}

impl<W: Write> LogReporter<W> {
    /// Creates a new reporter writing failure output to `stderr`.
    pub fn new(stderr: W) -> Self {
        Self { stderr }
    }

    /// Consumes the reporter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.stderr
    }

    fn write_details(&mut self, details: &str) -> Result<(), WriteEventError> {
        self.stderr
            .write_all(details.as_bytes())
            .and_then(|()| self.stderr.flush())
            .map_err(WriteEventError::new)
    }
}

impl<W: Write> Reporter for LogReporter<W> {
    fn report_event(&mut self, event: ReporterEvent<'_>) -> Result<(), WriteEventError> {
        match event {
            ReporterEvent::TestsDiscovered { count } => {
                info!("discovered {count} {}", plural_tests(count));
            }
            ReporterEvent::HistoryLoaded { path, count } => {
                info!("loaded {count} previous test records from {path}");
            }
            ReporterEvent::RunStarted { scheduled, new } => {
                info!(
                    "running {scheduled} {} ({new} new)",
                    plural_tests(scheduled)
                );
            }
            ReporterEvent::TestFinished { record, .. } => {
                let package = record.id.package.as_str();
                let name = record.id.name.as_str();
                if record.passed {
                    info!(package, name, result = "passed");
                } else {
                    error!(package, name, result = "failed");
                    self.write_details(&record.details)?;
                }
            }
            ReporterEvent::RunFinished { stats } => {
                info!(
                    "ran {} of {} {}: {} passed, {} failed",
                    stats.finished_count,
                    stats.initial_run_count,
                    plural_tests(stats.initial_run_count),
                    stats.passed,
                    stats.failed,
                );
                if stats.stopped_early() {
                    info!(
                        "stopped after the first failure, {} not run",
                        stats.initial_run_count - stats.finished_count
                    );
                }
            }
            ReporterEvent::HistoryWritten { path, count } => {
                info!("wrote {count} test records to {path}");
            }
        }
        Ok(())
    }
}

fn plural_tests(count: usize) -> &'static str {
    if count == 1 { "test" } else { "tests" }
}
