// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory knowledge store
//!
//! The store is built once from a [`KnowledgeDocument`], validated, and then
//! only read. All lookups go through the [`KnowledgeQuery`] capability trait
//! so rules and the planner never depend on the concrete representation.

use super::builtin;
use super::error::{KnowledgeBaseError, KnowledgeResult};
use super::model::{Concept, ErrorType, KnowledgeDocument, SchemaFact};
use super::source::KnowledgeSource;
use crate::finding::FindingCode;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Read-only query capability over a knowledge graph
pub trait KnowledgeQuery: Send + Sync {
    /// Direct prerequisites of a concept, `None` for unknown concepts
    fn prerequisites_of(&self, concept_id: &str) -> Option<&BTreeSet<String>>;

    /// Explanation template for a finding code
    fn explanation_for(&self, code: FindingCode) -> Option<&str>;

    /// Schema facts of a sandbox table (case-insensitive)
    fn schema_of(&self, table: &str) -> Option<&SchemaFact>;

    /// Names of all sandbox tables
    fn all_tables(&self) -> BTreeSet<String>;

    fn concept(&self, concept_id: &str) -> Option<&Concept>;

    fn error_type(&self, code: FindingCode) -> Option<&ErrorType>;
}

/// Validated, immutable knowledge graph
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    concepts: BTreeMap<String, Concept>,
    error_types: BTreeMap<FindingCode, ErrorType>,
    /// Keyed by lowercase table name
    tables: BTreeMap<String, SchemaFact>,
}

impl KnowledgeStore {
    /// Load a store from a knowledge source
    pub fn load_from(source: &dyn KnowledgeSource) -> KnowledgeResult<Self> {
        let store = source.load()?;
        log::info!(
            "Loaded knowledge store from {}: {} concepts, {} error types, {} tables",
            source.describe(),
            store.concepts.len(),
            store.error_types.len(),
            store.tables.len()
        );
        Ok(store)
    }

    /// Built-in minimal knowledge graph covering every finding the engine emits
    pub fn load_default() -> Self {
        match Self::from_document(builtin::default_document()) {
            Ok(store) => store,
            Err(e) => {
                // The built-in document is covered by tests; degrade to the
                // unchecked document rather than abort the process
                log::error!("Built-in knowledge document failed validation: {}", e);
                Self::unchecked(builtin::default_document())
            }
        }
    }

    /// Load from `source`, falling back to the built-in store on any failure
    pub fn load_or_default(source: &dyn KnowledgeSource) -> Self {
        match Self::load_from(source) {
            Ok(store) => store,
            Err(e) => {
                log::warn!(
                    "Failed to load knowledge from {}: {}. Using built-in knowledge graph",
                    source.describe(),
                    e
                );
                Self::load_default()
            }
        }
    }

    /// Validate a document and build a store from it
    ///
    /// Rejects duplicate ids, prerequisites or error types that reference
    /// unknown concepts, prerequisite cycles, and documents that leave any
    /// finding code without an error type.
    pub fn from_document(document: KnowledgeDocument) -> KnowledgeResult<Self> {
        let mut concepts = BTreeMap::new();
        for concept in document.concepts {
            if concepts.contains_key(&concept.id) {
                return Err(KnowledgeBaseError::DuplicateId {
                    kind: "concept",
                    id: concept.id,
                });
            }
            concepts.insert(concept.id.clone(), concept);
        }

        for concept in concepts.values() {
            for prerequisite in &concept.prerequisites {
                if !concepts.contains_key(prerequisite) {
                    return Err(KnowledgeBaseError::DanglingReference {
                        from: format!("concept {}", concept.id),
                        to: prerequisite.clone(),
                    });
                }
            }
        }

        check_acyclic(&concepts)?;

        let mut error_types = BTreeMap::new();
        for error_type in document.error_types {
            if !concepts.contains_key(&error_type.concept) {
                return Err(KnowledgeBaseError::DanglingReference {
                    from: format!("error type {}", error_type.code),
                    to: error_type.concept,
                });
            }
            if error_types.contains_key(&error_type.code) {
                return Err(KnowledgeBaseError::DuplicateId {
                    kind: "error type",
                    id: error_type.code.to_string(),
                });
            }
            error_types.insert(error_type.code, error_type);
        }

        if let Some(missing) = FindingCode::ALL
            .iter()
            .find(|code| !error_types.contains_key(*code))
        {
            return Err(KnowledgeBaseError::MissingErrorType(*missing));
        }

        let mut tables = BTreeMap::new();
        for table in document.tables {
            let key = table.table.to_lowercase();
            if tables.contains_key(&key) {
                return Err(KnowledgeBaseError::DuplicateId {
                    kind: "table",
                    id: table.table,
                });
            }
            tables.insert(key, table);
        }

        Ok(Self {
            concepts,
            error_types,
            tables,
        })
    }

    fn unchecked(document: KnowledgeDocument) -> Self {
        Self {
            concepts: document
                .concepts
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            error_types: document
                .error_types
                .into_iter()
                .map(|e| (e.code, e))
                .collect(),
            tables: document
                .tables
                .into_iter()
                .map(|t| (t.table.to_lowercase(), t))
                .collect(),
        }
    }

    /// Export the store as a document, e.g. as a starting point for a custom source
    pub fn to_document(&self) -> KnowledgeDocument {
        KnowledgeDocument {
            concepts: self.concepts.values().cloned().collect(),
            error_types: self.error_types.values().cloned().collect(),
            tables: self.tables.values().cloned().collect(),
        }
    }

    /// All concepts, ordered by id
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }

    /// All sandbox tables, ordered by name
    pub fn tables(&self) -> impl Iterator<Item = &SchemaFact> {
        self.tables.values()
    }

    /// Transitive prerequisites of a concept, nearest first
    pub fn transitive_prerequisites(&self, concept_id: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        let mut frontier: Vec<String> = self
            .prerequisites_of(concept_id)
            .map(|p| p.iter().cloned().collect())
            .unwrap_or_default();

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in frontier {
                if seen.insert(id.clone()) {
                    if let Some(prerequisites) = self.prerequisites_of(&id) {
                        next.extend(prerequisites.iter().cloned());
                    }
                    ordered.push(id);
                }
            }
            frontier = next;
        }
        ordered
    }
}

impl KnowledgeQuery for KnowledgeStore {
    fn prerequisites_of(&self, concept_id: &str) -> Option<&BTreeSet<String>> {
        self.concepts.get(concept_id).map(|c| &c.prerequisites)
    }

    fn explanation_for(&self, code: FindingCode) -> Option<&str> {
        self.error_types.get(&code).map(|e| e.explanation.as_str())
    }

    fn schema_of(&self, table: &str) -> Option<&SchemaFact> {
        self.tables.get(&table.to_lowercase())
    }

    fn all_tables(&self) -> BTreeSet<String> {
        self.tables.values().map(|t| t.table.clone()).collect()
    }

    fn concept(&self, concept_id: &str) -> Option<&Concept> {
        self.concepts.get(concept_id)
    }

    fn error_type(&self, code: FindingCode) -> Option<&ErrorType> {
        self.error_types.get(&code)
    }
}

/// Prerequisite edges point from the prerequisite to the dependent concept
fn check_acyclic(concepts: &BTreeMap<String, Concept>) -> KnowledgeResult<()> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

    for id in concepts.keys() {
        nodes.insert(id.as_str(), graph.add_node(id.as_str()));
    }
    for concept in concepts.values() {
        for prerequisite in &concept.prerequisites {
            if let (Some(&from), Some(&to)) = (
                nodes.get(prerequisite.as_str()),
                nodes.get(concept.id.as_str()),
            ) {
                graph.add_edge(from, to, ());
            }
        }
    }

    toposort(&graph, None)
        .map(|_| ())
        .map_err(|cycle| KnowledgeBaseError::PrerequisiteCycle(graph[cycle.node_id()].to_string()))
}
