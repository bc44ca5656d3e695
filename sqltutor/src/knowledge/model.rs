// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Knowledge graph entities
//!
//! These are the serialized shapes of a knowledge source. A
//! [`KnowledgeDocument`] is validated into a `KnowledgeStore` and is
//! immutable afterwards.

use crate::finding::{FindingCode, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A unit of SQL knowledge, e.g. GROUP BY
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    /// Display name
    pub name: String,
    /// Difficulty rank, lower is easier
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    /// Concept ids that must be learned first
    #[serde(default)]
    pub prerequisites: BTreeSet<String>,
}

fn default_difficulty() -> u32 {
    1
}

impl Concept {
    pub fn new(id: &str, name: &str, difficulty: u32, prerequisites: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            difficulty,
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Explanation and severity for one finding code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorType {
    pub code: FindingCode,
    pub severity: Severity,
    /// Template with optional `{fragment}` and `{detail}` placeholders
    pub explanation: String,
    /// Related concept id
    pub concept: String,
}

/// One column of a sandbox table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFact {
    pub name: String,
    #[serde(default = "default_data_type", rename = "type")]
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
}

fn default_data_type() -> String {
    "VARCHAR".to_string()
}

fn default_nullable() -> bool {
    true
}

impl ColumnFact {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: true,
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Table definition of the sandbox schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFact {
    pub table: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnFact>,
}

impl SchemaFact {
    pub fn new(table: &str, columns: Vec<ColumnFact>) -> Self {
        Self {
            table: table.to_string(),
            columns,
        }
    }

    /// Case-insensitive column lookup
    pub fn column(&self, name: &str) -> Option<&ColumnFact> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Serialized form of a whole knowledge graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub error_types: Vec<ErrorType>,
    #[serde(default)]
    pub tables: Vec<SchemaFact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = SchemaFact::new(
            "employees",
            vec![ColumnFact::new("emp_id", "INTEGER").primary_key()],
        );
        assert!(table.has_column("EMP_ID"));
        assert!(!table.has_column("salary"));
        assert!(!table.column("emp_id").unwrap().nullable);
    }

    #[test]
    fn test_document_defaults() {
        let json = r#"{
            "concepts": [{"id": "SELECT_BASICS", "name": "SELECT basics"}],
            "tables": [{"table": "t", "columns": [{"name": "a"}]}]
        }"#;
        let doc: KnowledgeDocument = serde_json::from_str(json).unwrap();

        assert_eq!(doc.concepts[0].difficulty, 1);
        assert!(doc.concepts[0].prerequisites.is_empty());
        assert!(doc.error_types.is_empty());
        assert_eq!(doc.tables[0].columns[0].data_type, "VARCHAR");
        assert!(doc.tables[0].columns[0].nullable);
    }
}
