// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by testfast.

use crate::record::TestRecordSet;
use camino::Utf8PathBuf;
use config::ConfigError;
use std::{io, process::ExitStatus};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse testfast config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of config parse error that occurred.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An error that occurred while discovering tests with `go test -list`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// The toolchain could not be started, or its output could not be attached.
    #[error("failed to execute `{command}`")]
    Exec {
        /// The command that was executed.
        command: String,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// Reading the listing output failed partway through.
    #[error("failed to read output of `{command}`")]
    Read {
        /// The command that was executed.
        command: String,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A line of the listing output was not a valid `go test -json` event.
    #[error("failed to parse line {line_number} of test listing: `{line}`")]
    Parse {
        /// The 1-based line number.
        line_number: usize,

        /// The offending line.
        line: String,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// The listing command exited with a non-zero status.
    #[error("`{command}` failed, stderr:\n{stderr}")]
    ListFailed {
        /// The command that was executed.
        command: String,

        /// The exit code, or `None` if the process was terminated by a signal.
        exit_code: Option<i32>,

        /// Standard error for the process.
        stderr: String,
    },
}

/// An error that occurred while parsing `go test -json -list` output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseListError {
    /// Reading a line failed.
    #[error("failed to read test listing")]
    Read(#[source] io::Error),

    /// A line was not a valid `go test -json` event.
    #[error("failed to parse line {line_number} of test listing: `{line}`")]
    Parse {
        /// The 1-based line number.
        line_number: usize,

        /// The offending line.
        line: String,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error that occurred while reading the history file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordReadError {
    /// Error reading the history file.
    #[error("failed to read history file at {path}")]
    Read {
        /// The path that failed to be read.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// Error deserializing the history file.
    #[error("failed to deserialize history file at {path}")]
    Deserialize {
        /// The path that failed to be deserialized.
        path: Utf8PathBuf,

        /// The underlying deserialization error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error that occurred while writing the history file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordWriteError {
    /// Error creating the directory containing the history file.
    #[error("failed to create directory {path}")]
    CreateDir {
        /// The directory path that failed to be created.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// Error serializing the history.
    #[error("failed to serialize history")]
    Serialize {
        /// The underlying serialization error.
        #[source]
        error: serde_json::Error,
    },

    /// Error writing the history to disk.
    #[error("failed to write history file to {path}")]
    Write {
        /// The path that failed to be written.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while assembling a coverage profile.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoverageError {
    /// A coverage profile left over from a previous run could not be removed.
    #[error("failed to remove stale coverage profile at {path}")]
    RemoveStale {
        /// The profile path.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// A temporary file for a per-test coverage fragment could not be created.
    #[error("failed to create temporary coverage fragment")]
    CreateFragment {
        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// A coverage fragment could not be opened.
    #[error("failed to open coverage fragment at {path}")]
    OpenFragment {
        /// The fragment path.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// The accumulated coverage profile could not be opened.
    #[error("failed to open coverage profile at {path}")]
    OpenProfile {
        /// The profile path.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// Appending a fragment to the coverage profile failed.
    #[error("failed to append coverage fragment {fragment} to {path}")]
    Append {
        /// The profile path.
        path: Utf8PathBuf,

        /// The fragment path.
        fragment: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while writing a reporter event.
#[derive(Debug, Error)]
#[error("error writing reporter output")]
pub struct WriteEventError {
    #[source]
    error: io::Error,
}

impl WriteEventError {
    pub(crate) fn new(error: io::Error) -> Self {
        Self { error }
    }
}

/// An error that aborted a test run.
///
/// A test failing is not an error: see [`RunStatus`](crate::runner::RunStatus).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecuteError {
    /// The toolchain could not be executed.
    #[error("failed to execute `{command}`")]
    Exec {
        /// The command that was executed.
        command: String,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The toolchain exited with a status that indicates neither success nor a test failure.
    #[error("`{command}` exited unexpectedly ({exit_status}), output:\n{output}")]
    UnexpectedExit {
        /// The command that was executed.
        command: String,

        /// The exit status of the process.
        exit_status: ExitStatus,

        /// Combined standard output and standard error for the process.
        output: String,
    },

    /// The coverage profile could not be assembled.
    #[error("error assembling coverage profile")]
    Coverage(#[from] CoverageError),

    /// The reporter failed to write an event. The run stopped at that point.
    #[error("error reporting test run progress")]
    Report {
        /// Records for the tests that finished before the run stopped, in execution order.
        records: TestRecordSet,

        /// The underlying error.
        #[source]
        error: WriteEventError,
    },
}

/// An error returned by [`run_and_persist`](crate::runner::run_and_persist).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunAndPersistError {
    /// The previous history could not be read.
    #[error(transparent)]
    RecordRead(#[from] RecordReadError),

    /// The run was aborted.
    #[error(transparent)]
    Execute(#[from] ExecuteError),

    /// The updated history could not be written.
    #[error(transparent)]
    RecordWrite(#[from] RecordWriteError),

    /// The reporter failed to write an event.
    #[error(transparent)]
    Report(#[from] WriteEventError),
}
