// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for knowledge store loading

use crate::finding::FindingCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeBaseError {
    #[error("Knowledge source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed knowledge source: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Dangling reference from {from} to unknown concept '{to}'")]
    DanglingReference { from: String, to: String },

    #[error("Prerequisite cycle detected at concept '{0}'")]
    PrerequisiteCycle(String),

    #[error("No error type defined for finding code {0}")]
    MissingErrorType(FindingCode),
}

impl From<std::io::Error> for KnowledgeBaseError {
    fn from(err: std::io::Error) -> Self {
        KnowledgeBaseError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for KnowledgeBaseError {
    fn from(err: serde_json::Error) -> Self {
        KnowledgeBaseError::Malformed(err.to_string())
    }
}

pub type KnowledgeResult<T> = Result<T, KnowledgeBaseError>;
