// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Semantic rule trait and evaluation context

use crate::finding::FindingCode;
use crate::knowledge::{KnowledgeQuery, SchemaFact};
use crate::query::{ClauseKind, ColumnRef, Keyword, ParsedQuery, TableRef};

/// What a fired rule reports
///
/// `fragment` is the offending query text, `detail` fills the `{detail}`
/// placeholder of the error type's explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub fragment: String,
    pub detail: String,
}

impl RuleHit {
    pub fn new(fragment: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            detail: detail.into(),
        }
    }
}

/// A semantic check over a parsed query
///
/// Rules are pure: they read the context and return at most one hit, which
/// the registry turns into a finding.
pub trait SemanticRule: Send + Sync + std::fmt::Debug {
    /// Finding code emitted when the rule fires
    fn code(&self) -> FindingCode;

    fn name(&self) -> &str;

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit>;
}

/// A table in scope together with its schema facts, if known
#[derive(Debug, Clone)]
pub struct ScopedTable<'q> {
    pub reference: TableRef,
    pub schema: Option<&'q SchemaFact>,
}

impl ScopedTable<'_> {
    pub fn is_known(&self) -> bool {
        self.schema.is_some()
    }

    fn answers_to(&self, qualifier: &str) -> bool {
        self.reference
            .alias
            .as_deref()
            .map(|a| a.eq_ignore_ascii_case(qualifier))
            .unwrap_or(false)
            || (!self.reference.derived && self.reference.name.eq_ignore_ascii_case(qualifier))
    }
}

/// A column reference and the clause it appears in
#[derive(Debug, Clone)]
pub struct ColumnUse {
    pub clause: ClauseKind,
    pub column: ColumnRef,
}

/// Everything a rule may look at
pub struct RuleContext<'q> {
    pub query: &'q ParsedQuery<'q>,
    pub knowledge: &'q dyn KnowledgeQuery,
    tables: Vec<ScopedTable<'q>>,
}

impl<'q> RuleContext<'q> {
    pub fn new(query: &'q ParsedQuery<'q>, knowledge: &'q dyn KnowledgeQuery) -> Self {
        let tables = query
            .table_refs()
            .into_iter()
            .map(|reference| {
                let schema = if reference.derived {
                    None
                } else {
                    knowledge.schema_of(&reference.name)
                };
                ScopedTable { reference, schema }
            })
            .collect();

        Self {
            query,
            knowledge,
            tables,
        }
    }

    pub fn tables(&self) -> &[ScopedTable<'q>] {
        &self.tables
    }

    /// Table a column qualifier refers to, by alias or table name
    pub fn resolve_qualifier(&self, qualifier: &str) -> Option<&ScopedTable<'q>> {
        self.tables.iter().find(|t| t.answers_to(qualifier))
    }

    /// Known in-scope tables that have a column with this name
    pub fn tables_with_column(&self, column: &str) -> Vec<&ScopedTable<'q>> {
        self.tables
            .iter()
            .filter(|t| t.schema.map(|s| s.has_column(column)).unwrap_or(false))
            .collect()
    }

    /// Every in-scope table is a known sandbox table
    ///
    /// Bare columns can only be checked against the schema when this holds.
    pub fn scope_fully_known(&self) -> bool {
        !self.tables.is_empty() && self.tables.iter().all(|t| t.is_known())
    }

    /// Whether a bare name is a select-list alias
    pub fn is_alias(&self, name: &str) -> bool {
        self.query.aliases().contains(&name.to_lowercase())
    }

    /// Column references of the select list, join conditions, WHERE,
    /// GROUP BY, HAVING and ORDER BY, in clause order
    pub fn column_uses(&self) -> Vec<ColumnUse> {
        let query = self.query;
        let mut uses = Vec::new();

        for clause in query.clauses.iter() {
            let ranges = match clause.kind {
                ClauseKind::Select => query
                    .select_items()
                    .into_iter()
                    .map(|item| item.expression)
                    .collect(),
                ClauseKind::Join => {
                    let body = &query.tokens[clause.body.clone()];
                    match body.iter().position(|t| t.token.is_keyword(Keyword::On)) {
                        Some(on) => vec![clause.body.start + on + 1..clause.body.end],
                        None => Vec::new(),
                    }
                }
                ClauseKind::Where
                | ClauseKind::GroupBy
                | ClauseKind::Having
                | ClauseKind::OrderBy => vec![clause.body.clone()],
                ClauseKind::From | ClauseKind::Limit => Vec::new(),
            };

            for range in ranges {
                uses.extend(query.column_refs(range).into_iter().map(|column| ColumnUse {
                    clause: clause.kind,
                    column,
                }));
            }
        }
        uses
    }

    /// Bare column references that name real columns rather than aliases or
    /// output columns
    pub fn bare_columns(&self) -> Vec<ColumnUse> {
        self.column_uses()
            .into_iter()
            .filter(|u| {
                u.column.qualifier.is_none()
                    && u.clause != ClauseKind::OrderBy
                    && !self.is_alias(&u.column.name)
            })
            .collect()
    }
}
