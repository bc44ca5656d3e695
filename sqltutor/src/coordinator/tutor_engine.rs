// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Tutor engine - process-wide entry point for query analysis

use crate::config::EngineConfig;
use crate::knowledge::{JsonFileSource, KnowledgeStore};
use crate::rules::RuleRegistry;
use crate::session::{AnalysisResult, AnalysisSession, Executor};
use std::sync::Arc;

/// Tutor engine - owns the knowledge store, the rule set and the optional
/// sandbox executor, and runs one [`AnalysisSession`] per request
///
/// The engine is immutable once built and can be shared across threads.
///
/// # Example
/// ```no_run
/// use sqltutor::TutorEngine;
///
/// let engine = TutorEngine::with_default_knowledge();
/// let result = engine.analyze("SELECT dept_name FROM departments HAVING budget > 100000", "company");
/// for finding in &result.findings {
///     println!("{}", finding);
/// }
/// ```
pub struct TutorEngine {
    knowledge: Arc<KnowledgeStore>,
    rules: RuleRegistry,
    executor: Option<Arc<dyn Executor>>,
    config: EngineConfig,
}

impl TutorEngine {
    /// Build an engine around an already loaded store
    pub fn new(knowledge: Arc<KnowledgeStore>, config: EngineConfig) -> Self {
        let rules = if config.advisory_rules {
            RuleRegistry::builtin()
        } else {
            RuleRegistry::builtin().without_advisories(knowledge.as_ref())
        };
        Self {
            knowledge,
            rules,
            executor: None,
            config,
        }
    }

    /// Engine over the built-in knowledge graph with default settings
    pub fn with_default_knowledge() -> Self {
        Self::new(Arc::new(KnowledgeStore::load_default()), EngineConfig::default())
    }

    /// Load knowledge as configured, falling back to the built-in graph
    pub fn from_config(config: &EngineConfig) -> Self {
        let store = match &config.knowledge_path {
            Some(path) => KnowledgeStore::load_or_default(&JsonFileSource::new(path)),
            None => {
                log::info!("No knowledge path configured, using built-in knowledge graph");
                KnowledgeStore::load_default()
            }
        };
        Self::new(Arc::new(store), config.clone())
    }

    /// Attach a sandbox executor
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Replace the rule set
    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    /// Analyze one learner query
    ///
    /// Never fails: every problem with the query is reported as a finding.
    /// `schema_id` is passed unchanged to the executor.
    pub fn analyze(&self, query_text: &str, schema_id: &str) -> AnalysisResult {
        log::debug!("Analyzing query for schema '{}'", schema_id);
        let session = AnalysisSession::new(
            self.knowledge.as_ref(),
            &self.rules,
            self.executor.as_deref(),
            self.config.max_result_rows,
        );
        session.run(query_text, schema_id)
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.knowledge
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn has_executor(&self) -> bool {
        self.executor.is_some()
    }
}
