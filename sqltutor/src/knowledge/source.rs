// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Knowledge sources
//!
//! A source produces a validated [`KnowledgeStore`]. The engine never cares
//! where the knowledge came from; it only sees the resulting store.

use super::builtin;
use super::error::{KnowledgeBaseError, KnowledgeResult};
use super::model::KnowledgeDocument;
use super::store::KnowledgeStore;
use std::path::{Path, PathBuf};

/// Anything that can produce a knowledge store
pub trait KnowledgeSource {
    fn load(&self) -> KnowledgeResult<KnowledgeStore>;

    /// Human-readable origin, used in log messages
    fn describe(&self) -> String;
}

/// JSON [`KnowledgeDocument`] stored on disk
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KnowledgeSource for JsonFileSource {
    fn load(&self) -> KnowledgeResult<KnowledgeStore> {
        if !self.path.exists() {
            return Err(KnowledgeBaseError::Unavailable(format!(
                "file not found: {}",
                self.path.display()
            )));
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let document: KnowledgeDocument = serde_json::from_str(&contents)?;
        KnowledgeStore::from_document(document)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Already-parsed document held in memory
#[derive(Debug, Clone)]
pub struct DocumentSource {
    document: KnowledgeDocument,
}

impl DocumentSource {
    pub fn new(document: KnowledgeDocument) -> Self {
        Self { document }
    }
}

impl KnowledgeSource for DocumentSource {
    fn load(&self) -> KnowledgeResult<KnowledgeStore> {
        KnowledgeStore::from_document(self.document.clone())
    }

    fn describe(&self) -> String {
        "in-memory document".to_string()
    }
}

/// The built-in knowledge graph
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

impl KnowledgeSource for BuiltinSource {
    fn load(&self) -> KnowledgeResult<KnowledgeStore> {
        KnowledgeStore::from_document(builtin::default_document())
    }

    fn describe(&self) -> String {
        "built-in knowledge graph".to_string()
    }
}
