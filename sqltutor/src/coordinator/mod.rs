// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Tutor engine - central entry point for query analysis
//!
//! The engine borrows its knowledge store and rules to a fresh analysis
//! session for every request.

pub mod tutor_engine;

pub use tutor_engine::TutorEngine;

// Re-export types needed for the public API
pub use crate::session::{AnalysisResult, ExecutionOutcome};
