// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Semantic rule engine
//!
//! Rules live in an ordered registry. Evaluation runs every rule against the
//! same context and turns each hit into exactly one finding; a firing rule
//! never stops the ones after it. Adding a rule means registering it, the
//! evaluation loop does not change.

mod advisory;
mod aggregate;
mod rule_trait;
mod schema;

pub use advisory::{
    GroupByColumnNotInSelectRule, GroupByWithoutAggregateRule, ImplicitJoinRule,
    MissingOrderByRule, SelectStarRule,
};
pub use aggregate::{AggregateInWhereRule, HavingWithoutGroupByRule, MissingGroupByRule};
pub use rule_trait::{ColumnUse, RuleContext, RuleHit, ScopedTable, SemanticRule};
pub use schema::{AmbiguousColumnRule, SchemaMismatchRule};

use crate::finding::{Finding, Severity};
use crate::knowledge::KnowledgeQuery;

/// Ordered collection of semantic rules
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn SemanticRule>>,
}

impl RuleRegistry {
    /// Registry without any rules
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in rule set, in reporting order
    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        registry.register(Box::new(AggregateInWhereRule::new()));
        registry.register(Box::new(MissingGroupByRule::new()));
        registry.register(Box::new(HavingWithoutGroupByRule::new()));
        registry.register(Box::new(AmbiguousColumnRule::new()));
        registry.register(Box::new(SchemaMismatchRule::new()));

        // Advisory
        registry.register(Box::new(SelectStarRule::new()));
        registry.register(Box::new(GroupByWithoutAggregateRule::new()));
        registry.register(Box::new(GroupByColumnNotInSelectRule::new()));
        registry.register(Box::new(ImplicitJoinRule::new()));
        registry.register(Box::new(MissingOrderByRule::new()));

        registry
    }

    /// Append a rule; it is evaluated after all rules registered so far
    pub fn register(&mut self, rule: Box<dyn SemanticRule>) {
        self.rules.push(rule);
    }

    /// Drop rules whose error type is ADVISORY in `knowledge`
    pub fn without_advisories(mut self, knowledge: &dyn KnowledgeQuery) -> Self {
        self.rules.retain(|rule| {
            let severity = knowledge
                .error_type(rule.code())
                .map(|e| e.severity)
                .unwrap_or_else(|| rule.code().default_severity());
            severity > Severity::Advisory
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of the registered rules, in order
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule and collect one finding per hit
    pub fn evaluate(&self, context: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            if let Some(hit) = rule.evaluate(context) {
                log::debug!("Rule {} fired on '{}'", rule.name(), hit.fragment);
                findings.push(Finding::resolve(
                    rule.code(),
                    hit.fragment,
                    hit.detail,
                    context.knowledge,
                ));
            }
        }
        findings
    }
}
