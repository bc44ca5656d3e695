// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sqltutor")]
#[command(version, about = "Analyze learner SQL and suggest what to study next", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<log::Level>,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Knowledge graph document (JSON), overrides the configured path
    #[arg(short, long, global = true)]
    pub knowledge: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a single query
    Analyze {
        /// Query text; read from --file or stdin when omitted
        query: Option<String>,

        /// Read the query from a file
        #[arg(short, long, conflicts_with = "query")]
        file: Option<PathBuf>,

        /// Sandbox schema identifier
        #[arg(short, long, default_value = "company")]
        schema: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// List the concepts of the knowledge graph
    Concepts {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show the sandbox schema
    Schema {
        /// Only show this table
        table: Option<String>,
    },

    /// Write the active knowledge graph as a JSON document
    ExportKnowledge {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
