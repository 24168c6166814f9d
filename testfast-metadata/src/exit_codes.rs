// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `go-testfast` failures.
///
/// `go-testfast` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TestfastExitCode {}

impl TestfastExitCode {
    /// No errors occurred and every scheduled test passed.
    pub const OK: i32 = 0;

    /// A test failed. The run stopped at the first failure and history was written.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// Listing tests with `go test -list` produced an error.
    pub const TEST_LIST_CREATION_FAILED: i32 = 104;

    /// The history file could not be read or written.
    pub const HISTORY_ERROR: i32 = 107;

    /// The Go toolchain failed in a way that isn't a test failure, or a coverage
    /// profile could not be assembled.
    pub const EXECUTION_FAILED: i32 = 108;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a testfast invocation.
    pub const SETUP_ERROR: i32 = 96;
}
