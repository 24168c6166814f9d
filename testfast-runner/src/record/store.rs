// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{RecordReadError, RecordWriteError},
    list::TestIdentity,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fs, io};
use testfast_metadata::{TestRecordSummary, parse_history};
use tracing::debug;

/// The outcome of one test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestRecord {
    /// The test this record is for.
    pub id: TestIdentity,

    /// Whether the test passed the last time it was run.
    pub passed: bool,

    /// Output captured the last time the test was run in this process.
    ///
    /// This is never persisted: records read from history always have empty details.
    pub details: String,
}

impl TestRecord {
    /// Creates a record for a test that hasn't been run yet.
    pub fn new_unrun(id: TestIdentity) -> Self {
        Self {
            id,
            passed: false,
            details: String::new(),
        }
    }

    /// Returns the persisted form of this record.
    pub fn summary(&self) -> TestRecordSummary {
        TestRecordSummary {
            package: self.id.package.clone(),
            name: self.id.name.clone(),
            passed: self.passed,
        }
    }
}

impl From<TestRecordSummary> for TestRecord {
    fn from(summary: TestRecordSummary) -> Self {
        Self {
            id: TestIdentity::new(summary.package, summary.name),
            passed: summary.passed,
            details: String::new(),
        }
    }
}

/// An ordered sequence of test records.
///
/// Order is only a scheduling hint: when written, failed tests sort before passed ones.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestRecordSet {
    records: Vec<TestRecord>,
}

impl TestRecordSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Appends a record.
    pub fn push(&mut self, record: TestRecord) {
        self.records.push(record);
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, TestRecord> {
        self.records.iter()
    }

    /// Moves every failed record before every passed record.
    ///
    /// The sort is stable: within each group, records keep their relative order.
    pub fn sort_failed_first(&mut self) {
        // false < true, so failed records sort first.
        self.records.sort_by_key(|record| record.passed);
    }

    /// Returns the persisted form of every record, in order.
    pub fn summaries(&self) -> Vec<TestRecordSummary> {
        self.records.iter().map(TestRecord::summary).collect()
    }
}

impl FromIterator<TestRecord> for TestRecordSet {
    fn from_iter<I: IntoIterator<Item = TestRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<TestRecord> for TestRecordSet {
    fn extend<I: IntoIterator<Item = TestRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl IntoIterator for TestRecordSet {
    type Item = TestRecord;
    type IntoIter = std::vec::IntoIter<TestRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a TestRecordSet {
    type Item = &'a TestRecord;
    type IntoIter = std::slice::Iter<'a, TestRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Manages persistence of test history.
#[derive(Clone, Debug)]
pub struct RecordStore {
    path: Utf8PathBuf,
}

impl RecordStore {
    /// Creates a new record store backed by the file at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the history file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reads history from disk.
    ///
    /// A missing file is the expected state on a first run, and results in an empty set.
    pub fn read(&self) -> Result<TestRecordSet, RecordReadError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("history file {} does not exist, starting fresh", self.path);
                return Ok(TestRecordSet::new());
            }
            Err(error) => {
                return Err(RecordReadError::Read {
                    path: self.path.clone(),
                    error,
                });
            }
        };

        let summaries =
            parse_history(&contents).map_err(|error| RecordReadError::Deserialize {
                path: self.path.clone(),
                error,
            })?;

        Ok(summaries.into_iter().map(TestRecord::from).collect())
    }

    /// Sorts `records` failed-first, then overwrites the history file with them.
    ///
    /// The write is not atomic: a crash partway through can leave a truncated file behind.
    pub fn write(&self, records: &mut TestRecordSet) -> Result<(), RecordWriteError> {
        records.sort_failed_first();

        if let Some(parent) = self.path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| RecordWriteError::CreateDir {
                path: parent.to_owned(),
                error,
            })?;
        }

        let mut contents = serde_json::to_string_pretty(&records.summaries())
            .map_err(|error| RecordWriteError::Serialize { error })?;
        contents.push('\n');

        fs::write(&self.path, contents).map_err(|error| RecordWriteError::Write {
            path: self.path.clone(),
            error,
        })?;

        debug!("wrote {} records to {}", records.len(), self.path);
        Ok(())
    }
}
