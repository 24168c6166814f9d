// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for go-testfast, a history-driven runner for Go tests.
//!
//! The basic flow is:
//!
//! 1. [`TestList::discover`](list::TestList::discover) lists the tests in a Go project.
//! 2. [`RecordStore::read`](record::RecordStore::read) loads the outcomes from the previous run.
//! 3. [`rearrange`](record::rearrange) schedules new tests first, then previous failures, then
//!    previous passes.
//! 4. [`TestRunner::execute`](runner::TestRunner::execute) runs the schedule one test at a time,
//!    stopping at the first failure.
//! 5. [`RecordStore::write`](record::RecordStore::write) saves the outcomes for next time.
//!
//! [`run_and_persist`](runner::run_and_persist) performs steps 2 through 5.

pub mod config;
pub mod coverage;
pub mod errors;
pub mod go_cli;
pub mod list;
pub mod record;
pub mod reporter;
pub mod runner;
