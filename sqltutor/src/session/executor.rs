// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution collaborator
//!
//! The engine never talks to a database itself. A sandbox runner implements
//! [`Executor`]; the session calls it at most once per run, only for queries
//! that passed the safety gate without a blocking finding.

use super::models::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Execution error: {0}")]
    Failed(String),

    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Sandbox unavailable: {0}")]
    Unavailable(String),
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Full result set returned by an executor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryRows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }
}

/// Runs a read-only query against a sandbox database
pub trait Executor: Send + Sync {
    /// `schema_id` is passed through exactly as given to `analyze`
    fn run(&self, query_text: &str, schema_id: &str) -> ExecutionResult<QueryRows>;
}
