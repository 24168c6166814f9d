// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test history: the outcome of every known test as of the last run.
//!
//! History is stored as a JSON array in a single file. It is read once at the start of a run,
//! used to decide the execution order (see [`rearrange`]), and rewritten once at the end of the
//! run with failed tests first, so that they are retried first next time.

mod schedule;
mod store;

pub use schedule::*;
pub use store::*;
