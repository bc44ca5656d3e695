// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Knowledge store: concepts, prerequisites, error explanations and schema facts
//!
//! The store is loaded once at process start and shared read-only between
//! analysis runs.

mod builtin;
pub mod error;
pub mod model;
pub mod source;
pub mod store;

pub use builtin::default_document;
pub use error::{KnowledgeBaseError, KnowledgeResult};
pub use model::{ColumnFact, Concept, ErrorType, KnowledgeDocument, SchemaFact};
pub use source::{BuiltinSource, DocumentSource, JsonFileSource, KnowledgeSource};
pub use store::{KnowledgeQuery, KnowledgeStore};
