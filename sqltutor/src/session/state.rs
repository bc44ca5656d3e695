// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Analysis run state machine
//!
//! ```text
//! Idle -> Classified -> Rejected ------------------------------> Reported
//!                    -> SyntaxChecked -> SemanticChecked -> Executed -> Reported
//!                                                        -> Blocked  -> Reported
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisState {
    Idle,
    Classified,
    /// Safety gate rejected the query; syntax and semantics are skipped.
    /// Terminal, like `Reported`.
    Rejected,
    SyntaxChecked,
    SemanticChecked,
    Executed,
    /// Execution skipped: blocking finding or no executor attached
    Blocked,
    Reported,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Illegal analysis state transition: {from} -> {to}")]
pub struct StateTransitionError {
    pub from: AnalysisState,
    pub to: AnalysisState,
}

impl AnalysisState {
    pub fn can_transition_to(&self, next: AnalysisState) -> bool {
        use AnalysisState::*;
        matches!(
            (self, next),
            (Idle, Classified)
                | (Classified, Rejected)
                | (Classified, SyntaxChecked)
                | (SyntaxChecked, SemanticChecked)
                | (SemanticChecked, Executed)
                | (SemanticChecked, Blocked)
                | (Executed, Reported)
                | (Blocked, Reported)
        )
    }

    pub fn transition(self, next: AnalysisState) -> Result<AnalysisState, StateTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StateTransitionError {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisState::Reported | AnalysisState::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisState::Idle => "IDLE",
            AnalysisState::Classified => "CLASSIFIED",
            AnalysisState::Rejected => "REJECTED",
            AnalysisState::SyntaxChecked => "SYNTAX_CHECKED",
            AnalysisState::SemanticChecked => "SEMANTIC_CHECKED",
            AnalysisState::Executed => "EXECUTED",
            AnalysisState::Blocked => "BLOCKED",
            AnalysisState::Reported => "REPORTED",
        }
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
