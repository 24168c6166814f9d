// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable data shared between the testfast runner and its consumers.
//!
//! This crate contains:
//!
//! * the wire format of a single `go test -json` event ([`GoTestEvent`]),
//! * the persisted form of one history entry ([`TestRecordSummary`]), and
//! * the documented process exit codes of `go-testfast` ([`TestfastExitCode`]).

mod exit_codes;
mod history;

pub use exit_codes::*;
pub use go_test::*;
pub use history::*;
