//! Tests for the ward-ledger crate.

mod helpers;
