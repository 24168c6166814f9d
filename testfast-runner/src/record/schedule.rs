// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::TestRecordSet;
use crate::list::TestIdentity;
use std::collections::HashSet;

/// Computes the execution order for a run from the previous history and the tests discovered now.
///
/// Tests that have no history run first, in discovery order: they need a baseline. Every record
/// in `previous` follows in its stored order, which puts tests that failed last time before tests
/// that passed.
///
/// Records in `previous` that discovery no longer lists are kept and scheduled. If discovery lists
/// the same test more than once, only the first occurrence is scheduled.
pub fn rearrange(previous: TestRecordSet, discovered: TestRecordSet) -> TestRecordSet {
    let mut seen: HashSet<TestIdentity> = previous.iter().map(|record| record.id.clone()).collect();

    let mut schedule = TestRecordSet::with_capacity(previous.len() + discovered.len());
    schedule.extend(
        discovered
            .into_iter()
            .filter(|record| seen.insert(record.id.clone())),
    );
    schedule.extend(previous);
    schedule
}
