// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Structural syntax checks
//!
//! The checker never rejects input outright. It reports what is wrong and
//! hands the recovered clause map downstream so semantic rules still run on
//! whatever structure could be found.
//!
//! # Checks, in reporting order
//!
//! 1. **Presence**: blank input (`EMPTY_QUERY`), no `SELECT`
//!    (`MISSING_SELECT`), no `FROM` (`MISSING_FROM`)
//! 2. **Clause order**: `CLAUSE_ORDER` once for every clause that appears
//!    after a clause that canonically follows it
//! 3. **Lexical**: `UNBALANCED_PARENTHESES`, `UNTERMINATED_STRING`

use crate::finding::{Finding, FindingCode};
use crate::knowledge::KnowledgeQuery;
use crate::query::{ClauseKind, ClauseMap, ParsedQuery, Token};

/// Findings of the syntax stage plus the recovered clause map
#[derive(Debug, Clone, Default)]
pub struct SyntaxReport {
    pub findings: Vec<Finding>,
    pub clauses: ClauseMap,
}

impl SyntaxReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxChecker;

impl SyntaxChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, query: &ParsedQuery<'_>, knowledge: &dyn KnowledgeQuery) -> SyntaxReport {
        let mut findings = Vec::new();

        if query.is_blank() {
            findings.push(Finding::resolve(FindingCode::EmptyQuery, "", "", knowledge));
            return SyntaxReport {
                findings,
                clauses: query.clauses.clone(),
            };
        }

        self.check_presence(query, knowledge, &mut findings);
        self.check_clause_order(query, knowledge, &mut findings);
        self.check_parentheses(query, knowledge, &mut findings);
        self.check_strings(query, knowledge, &mut findings);

        SyntaxReport {
            findings,
            clauses: query.clauses.clone(),
        }
    }

    fn check_presence(
        &self,
        query: &ParsedQuery<'_>,
        knowledge: &dyn KnowledgeQuery,
        findings: &mut Vec<Finding>,
    ) {
        match query.clause(ClauseKind::Select) {
            None => {
                let first = query
                    .tokens
                    .first()
                    .map(|t| t.span.text(query.source))
                    .unwrap_or("");
                findings.push(Finding::resolve(
                    FindingCode::MissingSelect,
                    first,
                    format!("The query starts with '{}'.", first),
                    knowledge,
                ));
            }
            Some(select) if !query.clauses.has(ClauseKind::From) => {
                findings.push(Finding::resolve(
                    FindingCode::MissingFrom,
                    query.clause_text(select),
                    "",
                    knowledge,
                ));
            }
            Some(_) => {}
        }
    }

    fn check_clause_order(
        &self,
        query: &ParsedQuery<'_>,
        knowledge: &dyn KnowledgeQuery,
        findings: &mut Vec<Finding>,
    ) {
        let mut latest: Option<ClauseKind> = None;
        for clause in query.clauses.iter() {
            match latest {
                Some(previous) if previous.rank() > clause.kind.rank() => {
                    findings.push(Finding::resolve(
                        FindingCode::ClauseOrder,
                        clause.keyword.text(query.source),
                        format!("{} must come before {}", clause.kind, previous),
                        knowledge,
                    ));
                }
                _ => latest = Some(clause.kind),
            }
        }
    }

    fn check_parentheses(
        &self,
        query: &ParsedQuery<'_>,
        knowledge: &dyn KnowledgeQuery,
        findings: &mut Vec<Finding>,
    ) {
        let mut open = 0usize;
        let mut unexpected_close = 0usize;
        for token in &query.tokens {
            match token.token {
                Token::LeftParen => open += 1,
                Token::RightParen if open == 0 => unexpected_close += 1,
                Token::RightParen => open -= 1,
                _ => {}
            }
        }

        let detail = match (open, unexpected_close) {
            (0, 0) => return,
            (open, 0) => format!("{} '(' never closed", open),
            (0, close) => format!("{} ')' without a matching '('", close),
            (open, close) => format!(
                "{} '(' never closed and {} ')' without a matching '('",
                open, close
            ),
        };
        let fragment = if unexpected_close > 0 { ")" } else { "(" };
        findings.push(Finding::resolve(
            FindingCode::UnbalancedParentheses,
            fragment,
            detail,
            knowledge,
        ));
    }

    fn check_strings(
        &self,
        query: &ParsedQuery<'_>,
        knowledge: &dyn KnowledgeQuery,
        findings: &mut Vec<Finding>,
    ) {
        if let Some(token) = query
            .tokens
            .iter()
            .find(|t| matches!(t.token, Token::UnterminatedString(_)))
        {
            findings.push(Finding::resolve(
                FindingCode::UnterminatedString,
                token.span.text(query.source),
                "",
                knowledge,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;
    use crate::knowledge::KnowledgeStore;

    fn codes(sql: &str) -> Vec<FindingCode> {
        let store = KnowledgeStore::load_default();
        let query = ParsedQuery::parse(sql);
        SyntaxChecker::new()
            .check(&query, &store)
            .findings
            .into_iter()
            .map(|f| f.code)
            .collect()
    }

    #[test]
    fn test_clean_query() {
        assert!(
            codes("SELECT first_name FROM employees WHERE salary > 50000 ORDER BY first_name")
                .is_empty()
        );
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(codes("   "), vec![FindingCode::EmptyQuery]);
        assert_eq!(codes("-- only a comment"), vec![FindingCode::EmptyQuery]);
    }

    #[test]
    fn test_missing_select_and_from() {
        assert_eq!(codes("FROM employees"), vec![FindingCode::MissingSelect]);
        assert_eq!(codes("SELECT 1 + 1"), vec![FindingCode::MissingFrom]);
    }

    #[test]
    fn test_clause_order_names_both_clauses() {
        let store = KnowledgeStore::load_default();
        let query = ParsedQuery::parse("SELECT a FROM t ORDER BY a WHERE a > 1");
        let report = SyntaxChecker::new().check(&query, &store);

        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.code, FindingCode::ClauseOrder);
        assert_eq!(finding.severity, Severity::Blocking);
        assert_eq!(finding.fragment, "WHERE");
        assert!(finding.message.contains("WHERE must come before ORDER BY"));
    }

    #[test]
    fn test_each_misplaced_clause_reported() {
        assert_eq!(
            codes("SELECT a FROM t HAVING COUNT(*) > 1 WHERE a > 1 GROUP BY a"),
            vec![FindingCode::ClauseOrder, FindingCode::ClauseOrder]
        );

        let store = KnowledgeStore::load_default();
        for (sql, keyword) in [
            (
                "SELECT e.first_name FROM employees e WHERE e.salary > 1 JOIN departments d ON e.department = d.dept_name",
                "JOIN",
            ),
            (
                "SELECT e.first_name FROM employees e WHERE e.salary > 1 LEFT OUTER JOIN departments d ON e.department = d.dept_name",
                "LEFT OUTER JOIN",
            ),
        ] {
            let report = SyntaxChecker::new().check(&ParsedQuery::parse(sql), &store);
            let found: Vec<_> = report
                .findings
                .iter()
                .map(|f| (f.code, f.fragment.as_str()))
                .collect();
            assert_eq!(found, vec![(FindingCode::ClauseOrder, keyword)], "{}", sql);
            assert!(report.findings[0].message.contains("JOIN must come before WHERE"));
        }
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(
            codes("SELECT first_name FROM employees WHERE (salary > 1"),
            vec![FindingCode::UnbalancedParentheses]
        );
        assert_eq!(
            codes("SELECT salary) FROM employees"),
            vec![FindingCode::UnbalancedParentheses]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            codes("SELECT first_name FROM employees WHERE last_name = 'Smith"),
            vec![FindingCode::UnterminatedString]
        );
    }

    #[test]
    fn test_report_keeps_recovered_clauses() {
        let store = KnowledgeStore::load_default();
        let query = ParsedQuery::parse("SELECT a WHERE a = 1 FROM t");
        let report = SyntaxChecker::new().check(&query, &store);
        assert!(report.clauses.has(ClauseKind::From));
        assert!(!report.is_clean());
    }
}
