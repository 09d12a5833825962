//! Integration test crate for the permit ledger.
//!
//! This crate exists solely to run tests that span the registry, ledger and
//! host crates. It has no public API; everything lives under `tests/`.

#![forbid(unsafe_code)]
