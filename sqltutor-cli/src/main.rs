// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! SQL Tutor CLI entry point

use clap::Parser;
use colored::Colorize;

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // -v/--verbose wins over --log-level; RUST_LOG still applies otherwise
    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        level.to_level_filter()
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let options = cli::EngineOptions {
        config: cli.config,
        knowledge: cli.knowledge,
    };

    match cli.command {
        Commands::Version => {
            println!("{} {}", "SQL Tutor".bold().green(), sqltutor::VERSION);
            println!("Analysis and tutoring engine for learner-written SQL");
            Ok(())
        }

        Commands::Analyze {
            query,
            file,
            schema,
            format,
        } => cli::handle_analyze(&options, query, file, schema, format),

        Commands::Concepts { format } => cli::handle_concepts(&options, format),

        Commands::Schema { table } => cli::handle_schema(&options, table),

        Commands::ExportKnowledge { output } => cli::handle_export(&options, output),
    }
}
