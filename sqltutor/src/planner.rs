// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Learning path planner
//!
//! Turns the concepts implicated by a run's findings into an ordered study
//! list. The list contains the implicated concepts plus every transitive
//! prerequisite, ordered so no concept appears before its prerequisites.
//! Among concepts that are ready at the same time, lower difficulty comes
//! first and ties break on the concept id, so the order is deterministic.

use crate::finding::Finding;
use crate::knowledge::KnowledgeQuery;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// One concept on a learning path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningStep {
    pub concept_id: String,
    pub concept_name: String,
    pub difficulty: u32,
    /// Why the concept is on the path
    pub rationale: String,
}

pub struct LearningPathPlanner<'k> {
    knowledge: &'k dyn KnowledgeQuery,
}

impl<'k> LearningPathPlanner<'k> {
    pub fn new(knowledge: &'k dyn KnowledgeQuery) -> Self {
        Self { knowledge }
    }

    pub fn plan(&self, findings: &[Finding]) -> Vec<LearningStep> {
        let mut rationale: BTreeMap<String, String> = BTreeMap::new();
        for finding in findings {
            if self.knowledge.concept(&finding.related_concept).is_none() {
                log::warn!(
                    "Finding {} refers to unknown concept {}, skipping",
                    finding.code,
                    finding.related_concept
                );
                continue;
            }
            rationale
                .entry(finding.related_concept.clone())
                .or_insert_with(|| finding.message.clone());
        }
        if rationale.is_empty() {
            return Vec::new();
        }

        let closure = self.closure(rationale.keys());
        let order = self.order(&closure);

        // Pulled-in concepts name the first dependent that needs them
        for id in &order {
            if rationale.contains_key(id) {
                continue;
            }
            let dependent = order.iter().find(|other| {
                self.knowledge
                    .prerequisites_of(other)
                    .map(|p| p.contains(id))
                    .unwrap_or(false)
            });
            if let Some(dependent) = dependent {
                rationale.insert(id.clone(), format!("prerequisite for {}", dependent));
            }
        }

        order
            .into_iter()
            .filter_map(|id| {
                let concept = self.knowledge.concept(&id)?;
                Some(LearningStep {
                    rationale: rationale.remove(&id).unwrap_or_default(),
                    concept_id: id,
                    concept_name: concept.name.clone(),
                    difficulty: concept.difficulty,
                })
            })
            .collect()
    }

    /// Implicated concepts plus all transitive prerequisites
    fn closure<'a>(&self, implicated: impl Iterator<Item = &'a String>) -> BTreeSet<String> {
        let mut closure = BTreeSet::new();
        let mut pending: Vec<String> = implicated.cloned().collect();
        while let Some(id) = pending.pop() {
            if !closure.insert(id.clone()) {
                continue;
            }
            match self.knowledge.prerequisites_of(&id) {
                Some(prerequisites) => pending.extend(prerequisites.iter().cloned()),
                None => log::warn!("Unknown prerequisite concept {}", id),
            }
        }
        closure.retain(|id| self.knowledge.concept(id).is_some());
        closure
    }

    /// Kahn's algorithm over the closure, min-heap on (difficulty, id)
    fn order(&self, closure: &BTreeSet<String>) -> Vec<String> {
        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for id in closure {
            let prerequisites: Vec<&str> = self
                .knowledge
                .prerequisites_of(id)
                .map(|p| p.iter().map(|s| s.as_str()).filter(|p| closure.contains(*p)).collect())
                .unwrap_or_default();
            in_degree.insert(id.as_str(), prerequisites.len());
            for prerequisite in prerequisites {
                dependents.entry(prerequisite).or_default().push(id.as_str());
            }
        }

        let difficulty = |id: &str| self.knowledge.concept(id).map(|c| c.difficulty).unwrap_or(0);
        let mut ready: BinaryHeap<Reverse<(u32, &str)>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| Reverse((difficulty(*id), *id)))
            .collect();

        let mut order = Vec::with_capacity(closure.len());
        while let Some(Reverse((_, id))) = ready.pop() {
            order.push(id.to_string());
            for &dependent in dependents.get(id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse((difficulty(dependent), dependent)));
                    }
                }
            }
        }

        if order.len() < closure.len() {
            // Stores are validated acyclic at load time
            log::warn!(
                "Prerequisite cycle among {} concepts, path truncated",
                closure.len() - order.len()
            );
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::FindingCode;
    use crate::knowledge::KnowledgeStore;

    fn ids(path: &[LearningStep]) -> Vec<&str> {
        path.iter().map(|s| s.concept_id.as_str()).collect()
    }

    #[test]
    fn test_empty_findings_give_empty_path() {
        let store = KnowledgeStore::load_default();
        assert!(LearningPathPlanner::new(&store).plan(&[]).is_empty());
    }

    #[test]
    fn test_path_respects_prerequisites() {
        let store = KnowledgeStore::load_default();
        let finding = Finding::resolve(FindingCode::HavingWithoutGroupBy, "HAVING x", "", &store);
        let path = LearningPathPlanner::new(&store).plan(&[finding]);

        assert_eq!(
            ids(&path),
            vec!["SELECT_BASICS", "QUERY_STRUCTURE", "AGGREGATE_FUNCTIONS", "GROUP_BY"]
        );
        let position = |id: &str| path.iter().position(|s| s.concept_id == id).unwrap();
        for step in &path {
            for prerequisite in store.transitive_prerequisites(&step.concept_id) {
                assert!(position(&prerequisite) < position(&step.concept_id));
            }
        }
    }

    #[test]
    fn test_rationales() {
        let store = KnowledgeStore::load_default();
        let finding = Finding::resolve(FindingCode::HavingWithoutGroupBy, "HAVING x", "", &store);
        let message = finding.message.clone();
        let path = LearningPathPlanner::new(&store).plan(&[finding]);

        assert_eq!(path.last().unwrap().rationale, message);
        assert_eq!(path[1].rationale, "prerequisite for GROUP_BY");
        assert_eq!(path[2].rationale, "prerequisite for GROUP_BY");
        assert_eq!(path[0].rationale, "prerequisite for QUERY_STRUCTURE");
    }

    #[test]
    fn test_implicated_concepts_are_deduplicated() {
        let store = KnowledgeStore::load_default();
        let first = Finding::resolve(FindingCode::MissingGroupBy, "department", "", &store);
        let second = Finding::resolve(FindingCode::HavingWithoutGroupBy, "HAVING x", "", &store);
        let path = LearningPathPlanner::new(&store).plan(&[first.clone(), second]);

        let group_by: Vec<_> = path.iter().filter(|s| s.concept_id == "GROUP_BY").collect();
        assert_eq!(group_by.len(), 1);
        assert_eq!(group_by[0].rationale, first.message);
    }

    #[test]
    fn test_unknown_concept_is_skipped() {
        let store = KnowledgeStore::load_default();
        let mut finding = Finding::resolve(FindingCode::SelectStar, "*", "", &store);
        finding.related_concept = "WINDOW_FUNCTIONS".to_string();
        assert!(LearningPathPlanner::new(&store).plan(&[finding]).is_empty());
    }
}
