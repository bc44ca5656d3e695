// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Diagnostics produced by an analysis run
//!
//! Every stage of the engine (safety gate, syntax checker, semantic rules,
//! execution) reports problems as [`Finding`] values. A finding is bound to
//! an error type from the knowledge store, which supplies its severity, the
//! explanation template and the concept a learner should study.

use crate::knowledge::KnowledgeQuery;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a finding is
///
/// Ordered from least to most severe, so `severity >= Severity::Warning`
/// reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Style or learning hint; the query is acceptable
    Advisory,
    /// Likely mistake; the query may still run
    Warning,
    /// The query must not be executed
    Blocking,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Advisory => "ADVISORY",
            Severity::Warning => "WARNING",
            Severity::Blocking => "BLOCKING",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of every diagnostic the engine can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    // Syntax
    EmptyQuery,
    MissingSelect,
    MissingFrom,
    ClauseOrder,
    UnbalancedParentheses,
    UnterminatedString,

    // Semantic
    AggregateInWhere,
    #[serde(rename = "MISSING_GROUPBY")]
    MissingGroupBy,
    #[serde(rename = "HAVING_WITHOUT_GROUPBY")]
    HavingWithoutGroupBy,
    AmbiguousColumn,
    SchemaMismatch,

    // Advisory
    SelectStar,
    #[serde(rename = "GROUPBY_WITHOUT_AGGREGATE")]
    GroupByWithoutAggregate,
    #[serde(rename = "GROUPBY_COLUMN_NOT_IN_SELECT")]
    GroupByColumnNotInSelect,
    ImplicitJoin,
    #[serde(rename = "MISSING_ORDERBY")]
    MissingOrderBy,

    // Safety and execution
    SafetyViolation,
    ExecutionError,
}

impl FindingCode {
    /// All codes, in reporting order
    pub const ALL: [FindingCode; 18] = [
        FindingCode::EmptyQuery,
        FindingCode::MissingSelect,
        FindingCode::MissingFrom,
        FindingCode::ClauseOrder,
        FindingCode::UnbalancedParentheses,
        FindingCode::UnterminatedString,
        FindingCode::AggregateInWhere,
        FindingCode::MissingGroupBy,
        FindingCode::HavingWithoutGroupBy,
        FindingCode::AmbiguousColumn,
        FindingCode::SchemaMismatch,
        FindingCode::SelectStar,
        FindingCode::GroupByWithoutAggregate,
        FindingCode::GroupByColumnNotInSelect,
        FindingCode::ImplicitJoin,
        FindingCode::MissingOrderBy,
        FindingCode::SafetyViolation,
        FindingCode::ExecutionError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCode::EmptyQuery => "EMPTY_QUERY",
            FindingCode::MissingSelect => "MISSING_SELECT",
            FindingCode::MissingFrom => "MISSING_FROM",
            FindingCode::ClauseOrder => "CLAUSE_ORDER",
            FindingCode::UnbalancedParentheses => "UNBALANCED_PARENTHESES",
            FindingCode::UnterminatedString => "UNTERMINATED_STRING",
            FindingCode::AggregateInWhere => "AGGREGATE_IN_WHERE",
            FindingCode::MissingGroupBy => "MISSING_GROUPBY",
            FindingCode::HavingWithoutGroupBy => "HAVING_WITHOUT_GROUPBY",
            FindingCode::AmbiguousColumn => "AMBIGUOUS_COLUMN",
            FindingCode::SchemaMismatch => "SCHEMA_MISMATCH",
            FindingCode::SelectStar => "SELECT_STAR",
            FindingCode::GroupByWithoutAggregate => "GROUPBY_WITHOUT_AGGREGATE",
            FindingCode::GroupByColumnNotInSelect => "GROUPBY_COLUMN_NOT_IN_SELECT",
            FindingCode::ImplicitJoin => "IMPLICIT_JOIN",
            FindingCode::MissingOrderBy => "MISSING_ORDERBY",
            FindingCode::SafetyViolation => "SAFETY_VIOLATION",
            FindingCode::ExecutionError => "EXECUTION_ERROR",
        }
    }

    /// Severity used by the built-in knowledge graph
    pub fn default_severity(&self) -> Severity {
        match self {
            FindingCode::AggregateInWhere
            | FindingCode::MissingGroupBy
            | FindingCode::HavingWithoutGroupBy
            | FindingCode::AmbiguousColumn => Severity::Warning,
            FindingCode::SelectStar
            | FindingCode::GroupByWithoutAggregate
            | FindingCode::GroupByColumnNotInSelect
            | FindingCode::ImplicitJoin
            | FindingCode::MissingOrderBy => Severity::Advisory,
            _ => Severity::Blocking,
        }
    }

    /// Concept id linked to this code by the built-in knowledge graph
    pub fn default_concept(&self) -> &'static str {
        match self {
            FindingCode::EmptyQuery => "SELECT_BASICS",
            FindingCode::MissingSelect | FindingCode::MissingFrom | FindingCode::ClauseOrder => {
                "QUERY_STRUCTURE"
            }
            FindingCode::UnbalancedParentheses | FindingCode::UnterminatedString => "SQL_SYNTAX",
            FindingCode::AggregateInWhere => "HAVING_CLAUSE",
            FindingCode::MissingGroupBy
            | FindingCode::HavingWithoutGroupBy
            | FindingCode::GroupByColumnNotInSelect => "GROUP_BY",
            FindingCode::GroupByWithoutAggregate => "AGGREGATE_FUNCTIONS",
            FindingCode::AmbiguousColumn => "TABLE_ALIASES",
            FindingCode::SchemaMismatch => "SCHEMA_BASICS",
            FindingCode::SelectStar => "COLUMN_SELECTION",
            FindingCode::ImplicitJoin => "JOINS",
            FindingCode::MissingOrderBy => "ORDER_BY",
            FindingCode::SafetyViolation => "READ_ONLY_QUERIES",
            FindingCode::ExecutionError => "QUERY_DEBUGGING",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic emitted by an analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub code: FindingCode,
    pub severity: Severity,
    /// Explanation bound to the offending fragment
    pub message: String,
    pub related_concept: String,
    /// Substring of the query or clause name implicated
    pub fragment: String,
}

impl Finding {
    /// Build a finding for `code`, resolving severity, explanation and
    /// concept through the knowledge store
    ///
    /// `{fragment}` and `{detail}` placeholders in the explanation template
    /// are replaced with the given values.
    pub fn resolve(
        code: FindingCode,
        fragment: impl Into<String>,
        detail: impl Into<String>,
        knowledge: &dyn KnowledgeQuery,
    ) -> Self {
        let fragment = fragment.into();
        let detail = detail.into();

        match knowledge.error_type(code) {
            Some(error_type) => Self {
                code,
                severity: error_type.severity,
                message: render_template(&error_type.explanation, &fragment, &detail),
                related_concept: error_type.concept.clone(),
                fragment,
            },
            None => {
                // Stores are validated against FindingCode::ALL at load time
                log::warn!("No error type registered for {}, using defaults", code);
                let message = if detail.is_empty() {
                    format!("{}: {}", code, fragment)
                } else {
                    format!("{}: {}", code, detail)
                };
                Self {
                    code,
                    severity: code.default_severity(),
                    message,
                    related_concept: code.default_concept().to_string(),
                    fragment,
                }
            }
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

fn render_template(template: &str, fragment: &str, detail: &str) -> String {
    template
        .replace("{fragment}", fragment)
        .replace("{detail}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeStore;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Advisory < Severity::Warning);
        assert!(Severity::Warning < Severity::Blocking);
    }

    #[test]
    fn test_code_serialization_matches_as_str() {
        for code in FindingCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_resolve_binds_fragment() {
        let store = KnowledgeStore::load_default();
        let finding = Finding::resolve(
            FindingCode::HavingWithoutGroupBy,
            "HAVING budget > 100000",
            "",
            &store,
        );

        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(finding.related_concept, "GROUP_BY");
        assert!(finding.message.contains("HAVING budget > 100000"));
        assert!(!finding.message.contains("{fragment}"));
    }

    #[test]
    fn test_render_template() {
        assert_eq!(
            render_template("`{fragment}` is wrong: {detail}", "x", "why"),
            "`x` is wrong: why"
        );
    }
}
