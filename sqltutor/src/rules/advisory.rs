// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Style and learning hints
//!
//! These rules fire on queries that run fine but show a habit worth
//! correcting early.

use super::rule_trait::{RuleContext, RuleHit, SemanticRule};
use crate::finding::FindingCode;
use crate::query::ClauseKind;

/// `SELECT *` or `t.*`
#[derive(Debug, Default)]
pub struct SelectStarRule;

impl SelectStarRule {
    pub fn new() -> Self {
        Self
    }
}

impl SemanticRule for SelectStarRule {
    fn code(&self) -> FindingCode {
        FindingCode::SelectStar
    }

    fn name(&self) -> &str {
        "select_star"
    }

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit> {
        let query = context.query;
        let star = query.select_items().into_iter().find(|item| item.is_star)?;
        Some(RuleHit::new(star.span.text(query.source), ""))
    }
}

/// GROUP BY with no aggregate in the select list
#[derive(Debug, Default)]
pub struct GroupByWithoutAggregateRule;

impl GroupByWithoutAggregateRule {
    pub fn new() -> Self {
        Self
    }
}

impl SemanticRule for GroupByWithoutAggregateRule {
    fn code(&self) -> FindingCode {
        FindingCode::GroupByWithoutAggregate
    }

    fn name(&self) -> &str {
        "group_by_without_aggregate"
    }

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit> {
        let query = context.query;
        let group_by = query.clause(ClauseKind::GroupBy)?;
        if !query.select_aggregates().is_empty() {
            return None;
        }
        Some(RuleHit::new(query.text_of(&group_by.body), ""))
    }
}

/// Grouping column that the select list does not show
#[derive(Debug, Default)]
pub struct GroupByColumnNotInSelectRule;

impl GroupByColumnNotInSelectRule {
    pub fn new() -> Self {
        Self
    }
}

impl SemanticRule for GroupByColumnNotInSelectRule {
    fn code(&self) -> FindingCode {
        FindingCode::GroupByColumnNotInSelect
    }

    fn name(&self) -> &str {
        "group_by_column_not_in_select"
    }

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit> {
        let query = context.query;
        let group_by = query.clause(ClauseKind::GroupBy)?;

        let selected: Vec<String> = query
            .select_columns()
            .into_iter()
            .filter(|c| !c.in_aggregate)
            .map(|c| c.name.to_lowercase())
            .collect();
        // SELECT * shows every grouping column
        if query.select_items().iter().any(|item| item.is_star) {
            return None;
        }

        let mut missing: Vec<String> = Vec::new();
        for column in query.column_refs(group_by.body.clone()) {
            let name = column.name.to_lowercase();
            if selected.contains(&name) || context.is_alias(&name) {
                continue;
            }
            let shown = column.display_name();
            if !missing.contains(&shown) {
                missing.push(shown);
            }
        }

        if missing.is_empty() {
            None
        } else {
            Some(RuleHit::new(missing.join(", "), ""))
        }
    }
}

/// Comma-separated tables in FROM without an explicit JOIN
#[derive(Debug, Default)]
pub struct ImplicitJoinRule;

impl ImplicitJoinRule {
    pub fn new() -> Self {
        Self
    }
}

impl SemanticRule for ImplicitJoinRule {
    fn code(&self) -> FindingCode {
        FindingCode::ImplicitJoin
    }

    fn name(&self) -> &str {
        "implicit_join"
    }

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit> {
        let query = context.query;
        if query.from_item_count() < 2 || query.clauses.has(ClauseKind::Join) {
            return None;
        }
        let from = query.clause(ClauseKind::From)?;
        let tables = context
            .tables()
            .iter()
            .map(|t| t.reference.visible_name().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Some(RuleHit::new(query.text_of(&from.body), tables))
    }
}

/// Rows are returned without ORDER BY
///
/// A grouping query (GROUP BY or HAVING) and a select list of aggregates
/// only, which yields a single row, are left alone.
#[derive(Debug, Default)]
pub struct MissingOrderByRule;

impl MissingOrderByRule {
    pub fn new() -> Self {
        Self
    }
}

impl SemanticRule for MissingOrderByRule {
    fn code(&self) -> FindingCode {
        FindingCode::MissingOrderBy
    }

    fn name(&self) -> &str {
        "missing_order_by"
    }

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit> {
        let query = context.query;
        if !query.clauses.has(ClauseKind::From)
            || query.clauses.has(ClauseKind::OrderBy)
            || query.clauses.has(ClauseKind::GroupBy)
            || query.clauses.has(ClauseKind::Having)
        {
            return None;
        }

        let items = query.select_items();
        let single_row = !items.is_empty()
            && items.iter().all(|item| {
                !item.is_star
                    && !query.aggregate_calls(item.expression.clone()).is_empty()
                    && query
                        .column_refs(item.expression.clone())
                        .iter()
                        .all(|c| c.in_aggregate)
            });
        if single_row {
            return None;
        }

        let select = query.clause(ClauseKind::Select)?;
        Some(RuleHit::new(query.clause_text(select).trim(), ""))
    }
}
