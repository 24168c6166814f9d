// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A history-driven test runner for Go.
//!
//! `go-testfast run` lists the tests in a Go project, runs them one at a time with tests that
//! failed last time first, and stops at the first failure. Outcomes are written to a history file
//! that decides the order of the next run.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter, StderrStyles};
