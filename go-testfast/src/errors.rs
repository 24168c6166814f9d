// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::FromPathBufError;
use owo_colors::OwoColorize;
use std::error::Error;
use testfast_metadata::TestfastExitCode;
use testfast_runner::{errors::*, list::TestIdentity};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that go-testfast expects and reports without a backtrace.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine current directory")]
    CurrentDirFailed {
        #[source]
        error: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        error: FromPathBufError,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("test discovery failed")]
    DiscoveryError {
        #[from]
        err: DiscoveryError,
    },
    #[error("history read error")]
    RecordReadError {
        #[from]
        err: RecordReadError,
    },
    #[error("run failed")]
    RunAndPersistError {
        #[from]
        err: RunAndPersistError,
    },
    #[error("test failed")]
    TestRunFailed { id: TestIdentity },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        error: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn write_output_error(error: std::io::Error) -> Self {
        Self::WriteOutputError { error }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. } => TestfastExitCode::SETUP_ERROR,
            Self::DiscoveryError { .. } => TestfastExitCode::TEST_LIST_CREATION_FAILED,
            Self::RecordReadError { .. } => TestfastExitCode::HISTORY_ERROR,
            Self::RunAndPersistError { err } => match err {
                RunAndPersistError::RecordRead(_) | RunAndPersistError::RecordWrite(_) => {
                    TestfastExitCode::HISTORY_ERROR
                }
                RunAndPersistError::Execute(ExecuteError::Report { .. })
                | RunAndPersistError::Report(_) => TestfastExitCode::WRITE_OUTPUT_ERROR,
                _ => TestfastExitCode::EXECUTION_FAILED,
            },
            Self::TestRunFailed { .. } => TestfastExitCode::TEST_RUN_FAILED,
            Self::WriteOutputError { .. } => TestfastExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirFailed { error } => {
                error!("could not determine current directory");
                Some(error as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { error } => {
                error!("current directory is not valid UTF-8");
                Some(error as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse testfast config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::DiscoveryError { err } => {
                error!("{err}");
                err.source()
            }
            Self::RecordReadError { err } => {
                error!("{err}");
                err.source()
            }
            Self::RunAndPersistError { err } => {
                error!("{err}");
                err.source()
            }
            Self::TestRunFailed { id } => {
                error!(
                    "test run failed: {} {}",
                    id.style(styles.bold),
                    "failed".style(styles.failed)
                );
                None
            }
            Self::WriteOutputError { error } => {
                error!("error writing output");
                Some(error as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
