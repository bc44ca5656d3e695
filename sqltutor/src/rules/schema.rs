// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Rules that check references against the sandbox schema

use super::rule_trait::{RuleContext, RuleHit, SemanticRule};
use crate::finding::FindingCode;

/// Bare column that exists in more than one in-scope table
#[derive(Debug, Default)]
pub struct AmbiguousColumnRule;

impl AmbiguousColumnRule {
    pub fn new() -> Self {
        Self
    }
}

impl SemanticRule for AmbiguousColumnRule {
    fn code(&self) -> FindingCode {
        FindingCode::AmbiguousColumn
    }

    fn name(&self) -> &str {
        "ambiguous_column"
    }

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit> {
        let mut ambiguous: Vec<(String, Vec<String>)> = Vec::new();

        for used in context.bare_columns() {
            let name = used.column.name.to_lowercase();
            if ambiguous.iter().any(|(n, _)| *n == name) {
                continue;
            }
            let owners = context.tables_with_column(&name);
            if owners.len() >= 2 {
                let tables = owners
                    .iter()
                    .map(|t| t.reference.visible_name().to_string())
                    .collect();
                ambiguous.push((name, tables));
            }
        }

        match ambiguous.as_slice() {
            [] => None,
            [(name, tables)] => Some(RuleHit::new(name.clone(), tables.join(", "))),
            many => {
                let fragment = many
                    .iter()
                    .map(|(n, _)| n.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let detail = many
                    .iter()
                    .map(|(n, t)| format!("{}: {}", n, t.join(", ")))
                    .collect::<Vec<_>>()
                    .join("; ");
                Some(RuleHit::new(fragment, detail))
            }
        }
    }
}

/// Unknown table, qualifier or column
#[derive(Debug, Default)]
pub struct SchemaMismatchRule;

impl SchemaMismatchRule {
    pub fn new() -> Self {
        Self
    }

    fn unknown_tables(&self, context: &RuleContext<'_>, problems: &mut Problems) {
        let known = context.knowledge.all_tables();
        for table in context.tables() {
            if table.reference.derived || table.is_known() {
                continue;
            }
            let name = &table.reference.name;
            let suggestions = similar_names(name, known.iter().map(|t| t.as_str()));
            problems.push(
                name,
                with_suggestions(format!("table '{}' does not exist", name), &suggestions),
            );
        }
    }

    fn unknown_columns(&self, context: &RuleContext<'_>, problems: &mut Problems) {
        for used in context.column_uses() {
            let column = &used.column;
            let Some(qualifier) = &column.qualifier else {
                continue;
            };
            match context.resolve_qualifier(qualifier) {
                None => problems.push(
                    &column.display_name(),
                    format!(
                        "'{}' in '{}' is not a table or alias of this query",
                        qualifier,
                        column.display_name()
                    ),
                ),
                Some(table) => {
                    // Unknown tables are reported once, derived tables are not checked
                    let Some(schema) = table.schema else { continue };
                    if !schema.has_column(&column.name) {
                        let suggestions = similar_names(
                            &column.name,
                            schema.columns.iter().map(|c| c.name.as_str()),
                        );
                        problems.push(
                            &column.display_name(),
                            with_suggestions(
                                format!(
                                    "column '{}' does not exist in table '{}'",
                                    column.name, schema.table
                                ),
                                &suggestions,
                            ),
                        );
                    }
                }
            }
        }

        if !context.scope_fully_known() {
            return;
        }
        for used in context.bare_columns() {
            let name = &used.column.name;
            if !context.tables_with_column(name).is_empty() {
                continue;
            }
            let in_scope: Vec<&str> = context
                .tables()
                .iter()
                .filter_map(|t| t.schema.map(|s| s.table.as_str()))
                .collect();
            let candidates = context
                .tables()
                .iter()
                .filter_map(|t| t.schema)
                .flat_map(|s| s.columns.iter().map(|c| c.name.as_str()));
            let suggestions = similar_names(name, candidates);
            problems.push(
                name,
                with_suggestions(
                    format!("column '{}' does not exist in {}", name, in_scope.join(", ")),
                    &suggestions,
                ),
            );
        }
    }
}

impl SemanticRule for SchemaMismatchRule {
    fn code(&self) -> FindingCode {
        FindingCode::SchemaMismatch
    }

    fn name(&self) -> &str {
        "schema_mismatch"
    }

    fn evaluate(&self, context: &RuleContext<'_>) -> Option<RuleHit> {
        let mut problems = Problems::default();
        self.unknown_tables(context, &mut problems);
        self.unknown_columns(context, &mut problems);
        problems.into_hit()
    }
}

/// Distinct problems keyed by the lowercased offending name
#[derive(Default)]
struct Problems {
    names: Vec<String>,
    details: Vec<String>,
}

impl Problems {
    fn push(&mut self, name: &str, detail: String) {
        let key = name.to_lowercase();
        if !self.names.iter().any(|n| n.to_lowercase() == key) {
            self.names.push(name.to_string());
            self.details.push(detail);
        }
    }

    fn into_hit(self) -> Option<RuleHit> {
        let first = self.names.first()?;
        Some(RuleHit::new(first.clone(), self.details.join("; ")))
    }
}

/// Candidates that contain `name` or are contained in it, case-insensitive
fn similar_names<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> Vec<String> {
    let needle = name.to_lowercase();
    let mut similar: Vec<String> = Vec::new();
    for candidate in candidates {
        let lower = candidate.to_lowercase();
        if lower != needle
            && (lower.contains(&needle) || needle.contains(&lower))
            && !similar.contains(&candidate.to_string())
        {
            similar.push(candidate.to_string());
        }
    }
    similar
}

fn with_suggestions(message: String, suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        message
    } else {
        format!("{} (Did you mean: {}?)", message, suggestions.join(", "))
    }
}
