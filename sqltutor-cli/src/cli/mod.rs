// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for SQL Tutor
//!
//! Provides one-off query analysis and inspection of the knowledge graph.

pub mod commands;
pub mod output;
pub mod tutorcli;

pub use commands::{Cli, Commands};
pub use tutorcli::{handle_analyze, handle_concepts, handle_export, handle_schema, EngineOptions};
