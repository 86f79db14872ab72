//! Shared test harness modules for the wikidump CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod execute;
mod helpers;
mod unit;
