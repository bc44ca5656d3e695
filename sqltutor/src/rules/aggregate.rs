// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Aggregation and grouping rules

use super::rule_trait::{RuleContext, RuleHit, SemanticRule};
use crate::finding::FindingCode;
use crate::query::ClauseKind;

/// Aggregate call at the top level of WHERE
#[derive(Debug, Default)]
pub struct AggregateInWhereRule;

impl AggregateInWhereRule {
    pub fn new() -> Self {
        Self
    }
}

impl SemanticRule for AggregateInWhereRule {
    fn code(&self) -> FindingCode {
        FindingCode::AggregateInWhere
    }

    fn name(&self) -> &str {
        "aggregate_in_where"
    }

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit> {
        let query = context.query;
        let filter = query.clause(ClauseKind::Where)?;
        let calls = query.aggregate_calls(filter.body.clone());
        let first = calls.first()?;

        let detail = calls
            .iter()
            .map(|c| c.span.text(query.source))
            .collect::<Vec<_>>()
            .join(", ");
        Some(RuleHit::new(first.span.text(query.source), detail))
    }
}

/// Non-aggregated column next to an aggregate without GROUP BY
#[derive(Debug, Default)]
pub struct MissingGroupByRule;

impl MissingGroupByRule {
    pub fn new() -> Self {
        Self
    }
}

impl SemanticRule for MissingGroupByRule {
    fn code(&self) -> FindingCode {
        FindingCode::MissingGroupBy
    }

    fn name(&self) -> &str {
        "missing_group_by"
    }

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit> {
        let query = context.query;
        if query.clauses.has(ClauseKind::GroupBy) || query.select_aggregates().is_empty() {
            return None;
        }

        let mut offenders: Vec<String> = Vec::new();
        for column in query.select_columns() {
            let name = column.display_name();
            if !column.in_aggregate && !offenders.contains(&name) {
                offenders.push(name);
            }
        }
        if offenders.is_empty() {
            return None;
        }
        Some(RuleHit::new(offenders.join(", "), ""))
    }
}

/// HAVING without GROUP BY
#[derive(Debug, Default)]
pub struct HavingWithoutGroupByRule;

impl HavingWithoutGroupByRule {
    pub fn new() -> Self {
        Self
    }
}

impl SemanticRule for HavingWithoutGroupByRule {
    fn code(&self) -> FindingCode {
        FindingCode::HavingWithoutGroupBy
    }

    fn name(&self) -> &str {
        "having_without_group_by"
    }

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit> {
        let query = context.query;
        if query.clauses.has(ClauseKind::GroupBy) {
            return None;
        }
        let having = query.clause(ClauseKind::Having)?;
        Some(RuleHit::new(query.clause_text(having), ""))
    }
}
