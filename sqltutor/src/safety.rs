// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Safety gate
//!
//! Classifies a query by its leading keyword and allows only read-only
//! `SELECT` statements through to execution. Classification works on tokens,
//! so keywords inside string literals or comments never trigger a rejection.

use crate::finding::{Finding, FindingCode};
use crate::knowledge::KnowledgeQuery;
use crate::query::{Keyword, ParsedQuery, Token};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement kind derived from the leading keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Alter,
    Create,
    Truncate,
    Replace,
    Merge,
    Grant,
    Revoke,
    /// Anything else, with the leading word uppercased
    Other(String),
    Empty,
}

impl StatementKind {
    pub fn is_read_only(&self) -> bool {
        matches!(self, StatementKind::Select)
    }

    fn from_token(token: &Token, text: &str) -> Self {
        match token {
            Token::Keyword(keyword) => match keyword {
                Keyword::Select => StatementKind::Select,
                Keyword::Insert => StatementKind::Insert,
                Keyword::Update => StatementKind::Update,
                Keyword::Delete => StatementKind::Delete,
                Keyword::Drop => StatementKind::Drop,
                Keyword::Alter => StatementKind::Alter,
                Keyword::Create => StatementKind::Create,
                Keyword::Truncate => StatementKind::Truncate,
                Keyword::Replace => StatementKind::Replace,
                Keyword::Merge => StatementKind::Merge,
                Keyword::Grant => StatementKind::Grant,
                Keyword::Revoke => StatementKind::Revoke,
                other => StatementKind::Other(other.as_str().to_string()),
            },
            _ => StatementKind::Other(text.to_uppercase()),
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Select => f.write_str("SELECT"),
            StatementKind::Insert => f.write_str("INSERT"),
            StatementKind::Update => f.write_str("UPDATE"),
            StatementKind::Delete => f.write_str("DELETE"),
            StatementKind::Drop => f.write_str("DROP"),
            StatementKind::Alter => f.write_str("ALTER"),
            StatementKind::Create => f.write_str("CREATE"),
            StatementKind::Truncate => f.write_str("TRUNCATE"),
            StatementKind::Replace => f.write_str("REPLACE"),
            StatementKind::Merge => f.write_str("MERGE"),
            StatementKind::Grant => f.write_str("GRANT"),
            StatementKind::Revoke => f.write_str("REVOKE"),
            StatementKind::Other(word) => f.write_str(word),
            StatementKind::Empty => f.write_str("EMPTY"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyVerdict {
    Allowed,
    Rejected,
}

impl fmt::Display for SafetyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyVerdict::Allowed => f.write_str("ALLOWED"),
            SafetyVerdict::Rejected => f.write_str("REJECTED"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SafetyReport {
    pub verdict: SafetyVerdict,
    pub kind: StatementKind,
    pub findings: Vec<Finding>,
}

impl SafetyReport {
    pub fn is_allowed(&self) -> bool {
        self.verdict == SafetyVerdict::Allowed
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyGate;

impl SafetyGate {
    pub fn new() -> Self {
        Self
    }

    /// Classify the statement kind; leading `(` are skipped
    pub fn classify(&self, query: &ParsedQuery<'_>) -> StatementKind {
        query
            .tokens
            .iter()
            .find(|t| t.token != Token::LeftParen)
            .map(|t| StatementKind::from_token(&t.token, t.span.text(query.source)))
            .unwrap_or(StatementKind::Empty)
    }

    pub fn check(&self, query: &ParsedQuery<'_>, knowledge: &dyn KnowledgeQuery) -> SafetyReport {
        let kind = self.classify(query);

        if kind == StatementKind::Empty {
            return SafetyReport {
                verdict: SafetyVerdict::Rejected,
                kind,
                findings: vec![Finding::resolve(FindingCode::EmptyQuery, "", "", knowledge)],
            };
        }

        if !kind.is_read_only() {
            let fragment = leading_text(query);
            let finding = Finding::resolve(
                FindingCode::SafetyViolation,
                fragment,
                format!("{} statements modify or manage the database", kind),
                knowledge,
            );
            return SafetyReport {
                verdict: SafetyVerdict::Rejected,
                kind,
                findings: vec![finding],
            };
        }

        if let Some(second) = second_statement(query) {
            let finding = Finding::resolve(
                FindingCode::SafetyViolation,
                second,
                "only a single statement can be run at a time",
                knowledge,
            );
            return SafetyReport {
                verdict: SafetyVerdict::Rejected,
                kind,
                findings: vec![finding],
            };
        }

        SafetyReport {
            verdict: SafetyVerdict::Allowed,
            kind,
            findings: Vec::new(),
        }
    }
}

/// Text of the first statement, up to the first top-level `;`
fn leading_text<'a>(query: &ParsedQuery<'a>) -> &'a str {
    let end = query.clauses.statement_end();
    query.text_of(&(0..end.max(1).min(query.tokens.len())))
}

/// Text of whatever follows the first `;`, if anything
///
/// Parentheses are ignored: a `;` inside them still ends the statement for
/// the database.
fn second_statement<'a>(query: &ParsedQuery<'a>) -> Option<&'a str> {
    let split = query
        .tokens
        .iter()
        .position(|t| t.token == Token::Semicolon)?;

    let rest = split + 1..query.tokens.len();
    let meaningful = query.tokens[rest.clone()]
        .iter()
        .any(|t| t.token != Token::Semicolon);
    if meaningful {
        Some(query.text_of(&rest))
    } else {
        None
    }
}
