// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query model shared by the syntax checker, the semantic rules and the
//! safety gate

pub mod clauses;
pub mod lexer;
pub mod structure;

pub use clauses::{Clause, ClauseKind, ClauseMap};
pub use lexer::{tokenize, Keyword, Span, SpannedToken, Token};
pub use structure::{is_aggregate, AggregateCall, ColumnRef, ParsedQuery, SelectItem, TableRef};
