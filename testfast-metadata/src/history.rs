// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

/// The persisted outcome of one test, as stored in the history file.
///
/// The history file is a JSON array of these, ordered so that failed tests come first.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct TestRecordSummary {
    /// The import path of the package containing the test.
    pub package: String,

    /// The name of the test function.
    pub name: String,

    /// Whether the test passed the last time it was run.
    pub passed: bool,
}

/// Parses the contents of a history file.
///
/// A file containing the JSON literal `null` is treated as an empty history. Older history files
/// written for runs with no tests look like that.
pub fn parse_history(contents: &str) -> serde_json::Result<Vec<TestRecordSummary>> {
    let summaries: Option<Vec<TestRecordSummary>> = serde_json::from_str(contents)?;
    Ok(summaries.unwrap_or_default())
}
