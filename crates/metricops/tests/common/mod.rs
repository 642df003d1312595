//! Shared test utilities for metricops integration tests.
//!
//! - `MockTransport` answers scripted responses and records every request
//! - `FakeAccount` is a small in-memory backend with real create/update/delete
//!   semantics, for round-trip tests

pub mod fake;
pub mod mock;

pub use fake::FakeAccount;
pub use mock::MockTransport;
