//! Integration test suite for prelaunch
//!
//! End-to-end tests for the update pipeline and the `prelaunch` binary. Pipeline
//! tests run against the in-memory backend from `prelaunch_cli::test_utils`;
//! binary tests never need a live update server.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: Argument handling, exit codes, and records written by the binary
//! - **pipeline**: Full runs through every phase with listing and metadata sources

mod cli;
mod pipeline;
