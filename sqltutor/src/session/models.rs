// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result model of an analysis run

use super::state::AnalysisState;
use crate::finding::{Finding, Severity};
use crate::planner::LearningStep;
use crate::safety::SafetyVerdict;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One result cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    /// `rows` is truncated for display, `row_count` is the full count
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
        row_count: usize,
    },
    Error {
        message: String,
    },
}

impl ExecutionOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ExecutionOutcome::Error { .. })
    }
}

/// Overall verdict on a learner's query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Correctness {
    /// No findings at all
    Correct,
    /// Findings, none of them blocking
    Partial,
    Incorrect,
}

impl fmt::Display for Correctness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correctness::Correct => f.write_str("CORRECT"),
            Correctness::Partial => f.write_str("PARTIAL"),
            Correctness::Incorrect => f.write_str("INCORRECT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Safety, then syntax, then semantic, then execution findings
    pub findings: Vec<Finding>,
    pub safety_verdict: SafetyVerdict,
    /// Absent when execution was not attempted
    pub execution: Option<ExecutionOutcome>,
    pub learning_path: Vec<LearningStep>,
    pub final_state: AnalysisState,
}

impl AnalysisResult {
    pub fn has_blocking(&self) -> bool {
        self.findings.iter().any(|f| f.is_blocking())
    }

    pub fn correctness(&self) -> Correctness {
        if self.findings.is_empty() {
            Correctness::Correct
        } else if self.has_blocking() {
            Correctness::Incorrect
        } else {
            Correctness::Partial
        }
    }

    /// Findings at or above a severity
    pub fn findings_at_least(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity >= severity)
    }
}
