// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! SQL Tutor - analysis and tutoring engine for learner-written SQL
//!
//! The engine takes a query written by a learner and reports what is wrong
//! with it, why, and which concepts to study next.
//!
//! # Features
//!
//! - **Safety Gate**: Only read-only single `SELECT` statements reach execution
//! - **Syntax Checks**: Missing clauses, clause order, parentheses, string literals
//! - **Semantic Rules**: Aggregation misuse, ambiguous and unknown columns, style hints
//! - **Knowledge Graph**: Concepts with prerequisites, explanations and the sandbox schema
//! - **Learning Paths**: Prerequisite-respecting study order for the concepts involved
//!
//! # Usage
//!
//! ```bash
//! sqltutor analyze "SELECT department, AVG(salary) FROM employees GROUP BY department"
//! sqltutor concepts
//! sqltutor export-knowledge > knowledge.json
//! ```
//!
//! Embedding applications build a [`TutorEngine`], optionally attach an
//! [`Executor`] that runs queries against a sandbox database, and call
//! [`TutorEngine::analyze`].

pub mod config;
pub mod coordinator;
pub mod finding;
pub mod knowledge;
pub mod planner;
pub mod query;
pub mod rules;
pub mod safety;
pub mod session;
pub mod syntax;

pub use config::{ConfigError, EngineConfig};
pub use coordinator::TutorEngine;
pub use finding::{Finding, FindingCode, Severity};
pub use knowledge::{KnowledgeBaseError, KnowledgeQuery, KnowledgeSource, KnowledgeStore};
pub use planner::{LearningPathPlanner, LearningStep};
pub use safety::{SafetyVerdict, StatementKind};
pub use session::{
    AnalysisResult, AnalysisState, Correctness, ExecutionError, ExecutionOutcome, Executor,
    QueryRows, Value,
};

/// SQL Tutor version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// SQL Tutor crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
