//! Test utilities for Tessera
//!
//! Provides mock collaborators (filters, layout renderers, phases), fixtures
//! and a [`Harness`] that wires the compiler stores together for tests.

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::Harness;
pub use mocks::*;

/// Install a tracing subscriber for test output
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
