// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test discovery through `go test -json -list`.

use crate::{
    config::TestfastConfig,
    errors::{DiscoveryError, ParseListError},
    go_cli::GoCli,
    record::{TestRecord, TestRecordSet},
};
use serde::Serialize;
use std::{
    fmt,
    io::{self, BufRead, BufReader},
};
use testfast_metadata::{GoTestAction, GoTestEvent};
use tracing::debug;

/// The unique key of a test: the package it lives in and its name.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct TestIdentity {
    /// The import path of the package.
    pub package: String,

    /// The name of the test function.
    pub name: String,
}

impl TestIdentity {
    /// Creates a new test identity.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.name)
    }
}

/// A test found by discovery, along with the event it was extracted from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiscoveredTest {
    /// The identity of the test.
    pub id: TestIdentity,

    /// The raw `go test -json` event.
    pub event: GoTestEvent,
}

/// The ordered list of tests produced by discovery.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestList {
    tests: Vec<DiscoveredTest>,
}

impl TestList {
    /// Lists the tests in `packages` by running `go test -json -list` in the project root.
    ///
    /// Output is parsed as it streams in. A malformed line is reported immediately, and a non-zero
    /// exit is reported along with the captured standard error.
    pub fn discover(config: &TestfastConfig, packages: &str) -> Result<Self, DiscoveryError> {
        let go_cli = GoCli::list(&config.go_path, &config.root, packages);
        let command = go_cli.command_string();

        let reader_handle = go_cli
            .to_expression()
            .stderr_capture()
            .unchecked()
            .reader()
            .map_err(|error| DiscoveryError::Exec {
                command: command.clone(),
                error,
            })?;

        // Returning early drops the handle, which kills the child.
        let test_list = Self::parse(BufReader::new(&reader_handle), &config.test_prefix)
            .map_err(|error| error.into_discovery_error(&command))?;

        // After reading completes (EOF), the handle is internally waited on.
        let output = reader_handle
            .try_wait()
            .map_err(|error| DiscoveryError::Read {
                command: command.clone(),
                error,
            })?
            .ok_or_else(|| DiscoveryError::Read {
                command: command.clone(),
                error: io::Error::other("child process did not exit after closing stdout"),
            })?;

        if !output.status.success() {
            return Err(DiscoveryError::ListFailed {
                command,
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        debug!("discovered {} tests in {packages}", test_list.len());
        Ok(test_list)
    }

    /// Parses `go test -json -list` output.
    ///
    /// Only `output` events whose text starts with `test_prefix` are kept; everything else
    /// (package summaries, build output, `ok` lines) is skipped.
    pub fn parse(reader: impl BufRead, test_prefix: &str) -> Result<Self, ParseListError> {
        let mut tests = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(ParseListError::Read)?;
            let event: GoTestEvent =
                serde_json::from_str(&line).map_err(|error| ParseListError::Parse {
                    line_number: idx + 1,
                    line: line.clone(),
                    error,
                })?;

            if event.action != GoTestAction::Output || !event.output.starts_with(test_prefix) {
                continue;
            }

            let id = TestIdentity::new(event.package.clone(), event.output_trimmed());
            tests.push(DiscoveredTest { id, event });
        }

        Ok(Self { tests })
    }

    /// Returns the number of discovered tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if no tests were discovered.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Iterates over the discovered tests in discovery order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &DiscoveredTest> + '_ {
        self.tests.iter()
    }

    /// Converts the discovered tests to fresh, not-yet-passed records.
    pub fn to_records(&self) -> TestRecordSet {
        self.tests
            .iter()
            .map(|test| TestRecord::new_unrun(test.id.clone()))
            .collect()
    }
}

impl ParseListError {
    fn into_discovery_error(self, command: &str) -> DiscoveryError {
        match self {
            Self::Read(error) => DiscoveryError::Read {
                command: command.to_owned(),
                error,
            },
            Self::Parse {
                line_number,
                line,
                error,
            } => DiscoveryError::Parse {
                line_number,
                line,
                error,
            },
        }
    }
}
