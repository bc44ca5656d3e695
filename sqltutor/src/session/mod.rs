// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-request analysis session
//!
//! A session drives one query through the pipeline:
//!
//! 1. safety gate (a rejection skips straight to planning and the run ends
//!    in `Rejected`)
//! 2. syntax checks
//! 3. semantic rules
//! 4. execution, only when the query is allowed, no finding is blocking and
//!    an executor is attached
//! 5. learning path planning
//!
//! Sessions are cheap and single-use; the knowledge store and rule registry
//! are borrowed from the engine.

pub mod executor;
pub mod models;
pub mod state;

pub use executor::{ExecutionError, ExecutionResult, Executor, QueryRows};
pub use models::{AnalysisResult, Correctness, ExecutionOutcome, Value};
pub use state::{AnalysisState, StateTransitionError};

use crate::finding::{Finding, FindingCode};
use crate::knowledge::KnowledgeQuery;
use crate::planner::LearningPathPlanner;
use crate::query::ParsedQuery;
use crate::rules::{RuleContext, RuleRegistry};
use crate::safety::{SafetyGate, SafetyVerdict};
use crate::syntax::SyntaxChecker;

pub struct AnalysisSession<'e> {
    knowledge: &'e dyn KnowledgeQuery,
    rules: &'e RuleRegistry,
    executor: Option<&'e dyn Executor>,
    max_result_rows: usize,
    state: AnalysisState,
    findings: Vec<Finding>,
}

impl<'e> AnalysisSession<'e> {
    pub fn new(
        knowledge: &'e dyn KnowledgeQuery,
        rules: &'e RuleRegistry,
        executor: Option<&'e dyn Executor>,
        max_result_rows: usize,
    ) -> Self {
        Self {
            knowledge,
            rules,
            executor,
            max_result_rows,
            state: AnalysisState::Idle,
            findings: Vec::new(),
        }
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    fn advance(&mut self, next: AnalysisState) {
        match self.state.transition(next) {
            Ok(state) => {
                log::debug!("Analysis state {} -> {}", self.state, state);
                self.state = state;
            }
            Err(e) => log::error!("{}", e),
        }
    }

    /// Run the whole pipeline and report
    pub fn run(mut self, query_text: &str, schema_id: &str) -> AnalysisResult {
        let query = ParsedQuery::parse(query_text);

        let safety = SafetyGate::new().check(&query, self.knowledge);
        let verdict = safety.verdict;
        self.findings.extend(safety.findings);
        self.advance(AnalysisState::Classified);

        let mut execution = None;
        if verdict == SafetyVerdict::Rejected {
            log::debug!("Query rejected as {} statement", safety.kind);
            self.advance(AnalysisState::Rejected);
        } else {
            let syntax = SyntaxChecker::new().check(&query, self.knowledge);
            self.findings.extend(syntax.findings);
            self.advance(AnalysisState::SyntaxChecked);

            let context = RuleContext::new(&query, self.knowledge);
            self.findings.extend(self.rules.evaluate(&context));
            self.advance(AnalysisState::SemanticChecked);

            execution = self.execute(query_text, schema_id);
        }

        let learning_path = LearningPathPlanner::new(self.knowledge).plan(&self.findings);
        if !self.state.is_terminal() {
            self.advance(AnalysisState::Reported);
        }

        AnalysisResult {
            findings: self.findings,
            safety_verdict: verdict,
            execution,
            learning_path,
            final_state: self.state,
        }
    }

    fn execute(&mut self, query_text: &str, schema_id: &str) -> Option<ExecutionOutcome> {
        if self.findings.iter().any(|f| f.is_blocking()) {
            log::debug!("Execution skipped: blocking findings present");
            self.advance(AnalysisState::Blocked);
            return None;
        }
        let Some(executor) = self.executor else {
            log::debug!("Execution skipped: no executor attached");
            self.advance(AnalysisState::Blocked);
            return None;
        };

        let outcome = match executor.run(query_text, schema_id) {
            Ok(result) => {
                let row_count = result.rows.len();
                let mut rows = result.rows;
                rows.truncate(self.max_result_rows);
                ExecutionOutcome::Rows {
                    columns: result.columns,
                    rows,
                    row_count,
                }
            }
            Err(e) => {
                log::warn!("Execution against schema '{}' failed: {}", schema_id, e);
                self.findings.push(Finding::resolve(
                    FindingCode::ExecutionError,
                    query_text.trim(),
                    e.to_string(),
                    self.knowledge,
                ));
                ExecutionOutcome::Error {
                    message: e.to_string(),
                }
            }
        };
        self.advance(AnalysisState::Executed);
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeStore;

    struct FixedRows(usize);

    impl Executor for FixedRows {
        fn run(&self, _query_text: &str, _schema_id: &str) -> ExecutionResult<QueryRows> {
            let rows = (0..self.0).map(|i| vec![Value::Integer(i as i64)]).collect();
            Ok(QueryRows::new(vec!["n".to_string()], rows))
        }
    }

    #[test]
    fn test_rejected_run() {
        let store = KnowledgeStore::load_default();
        let rules = RuleRegistry::builtin();
        let executor = FixedRows(1);
        let result = AnalysisSession::new(&store, &rules, Some(&executor), 10)
            .run("DROP TABLE employees;", "s");

        assert_eq!(result.safety_verdict, SafetyVerdict::Rejected);
        assert!(result.execution.is_none());
        assert_eq!(result.final_state, AnalysisState::Rejected);
    }

    #[test]
    fn test_rows_are_truncated() {
        let store = KnowledgeStore::load_default();
        let rules = RuleRegistry::builtin();
        let executor = FixedRows(25);
        let result = AnalysisSession::new(&store, &rules, Some(&executor), 10)
            .run("SELECT emp_id FROM employees", "s");

        match result.execution {
            Some(ExecutionOutcome::Rows { rows, row_count, .. }) => {
                assert_eq!(rows.len(), 10);
                assert_eq!(row_count, 25);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_no_executor_blocks() {
        let store = KnowledgeStore::load_default();
        let rules = RuleRegistry::builtin();
        let session = AnalysisSession::new(&store, &rules, None, 10);
        assert_eq!(session.state(), AnalysisState::Idle);

        let result = session.run("SELECT emp_id FROM employees", "s");
        assert!(result.execution.is_none());
        assert_eq!(result.safety_verdict, SafetyVerdict::Allowed);
        assert_eq!(result.final_state, AnalysisState::Reported);
    }

    #[test]
    fn test_blocking_finding_skips_execution() {
        let store = KnowledgeStore::load_default();
        let rules = RuleRegistry::builtin();
        let executor = FixedRows(1);
        let result = AnalysisSession::new(&store, &rules, Some(&executor), 10)
            .run("SELECT emp_id FROM employees WHERE last_name = 'Smith", "s");

        assert!(result.has_blocking());
        assert!(result.execution.is_none());
    }
}
