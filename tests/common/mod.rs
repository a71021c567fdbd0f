//! Common test infrastructure
//!
//! Spawns an isolated server per test (own temp database, random port) and
//! wraps an HTTP client around it. Tests should only import from this module.

mod client;
mod server;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;
