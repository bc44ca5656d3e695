//! Test utilities for SQL Tutor integration tests
//!
//! - TestFixture: engine over the built-in knowledge graph with a
//!   recording executor attached
//! - RecordingExecutor / FailingExecutor: executor test doubles

#![allow(dead_code)]

pub mod test_fixture;
