// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for SQL Tutor

use colored::Colorize;
use std::io::Read;
use std::path::PathBuf;

use super::commands::OutputFormat;
use super::output::ReportFormatter;
use sqltutor::{EngineConfig, TutorEngine};

/// Engine-related global flags
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub config: Option<PathBuf>,
    pub knowledge: Option<PathBuf>,
}

impl EngineOptions {
    /// Build an engine from the config file and knowledge override
    ///
    /// A broken config file is an error; a broken knowledge document falls
    /// back to the built-in graph inside the engine.
    fn build_engine(&self) -> Result<TutorEngine, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(path) = &self.knowledge {
            config = config.with_knowledge_path(path);
        }
        config.validate()?;
        Ok(TutorEngine::from_config(&config))
    }
}

/// Handle the analyze command
pub fn handle_analyze(
    options: &EngineOptions,
    query: Option<String>,
    file: Option<PathBuf>,
    schema: String,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = match (query, file) {
        (Some(query), _) => query,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Could not read query file {:?}: {}", path, e))?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let engine = options.build_engine()?;
    if !engine.has_executor() {
        log::info!("No sandbox executor attached, queries are analyzed only");
    }

    let result = engine.analyze(&query, &schema);
    println!("{}", ReportFormatter::format_analysis(&result, format));
    Ok(())
}

/// Handle the concepts command
pub fn handle_concepts(
    options: &EngineOptions,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = options.build_engine()?;
    let concepts: Vec<_> = engine.store().concepts().collect();
    println!("{}", ReportFormatter::format_concepts(&concepts, format));
    Ok(())
}

/// Handle the schema command
pub fn handle_schema(
    options: &EngineOptions,
    table: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = options.build_engine()?;
    let tables: Vec<_> = engine
        .store()
        .tables()
        .filter(|t| match &table {
            Some(name) => t.table.eq_ignore_ascii_case(name),
            None => true,
        })
        .collect();

    if tables.is_empty() {
        if let Some(name) = table {
            eprintln!("{}", format!("Unknown table '{}'", name).red());
            return Err(format!("Unknown table '{}'", name).into());
        }
        println!("{}", "The knowledge graph defines no tables".yellow());
        return Ok(());
    }

    println!("{}", ReportFormatter::format_schema(&tables));
    Ok(())
}

/// Handle the export-knowledge command
pub fn handle_export(
    options: &EngineOptions,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = options.build_engine()?;
    let document = engine.store().to_document();
    let json = serde_json::to_string_pretty(&document)?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!(
                "{}",
                format!("Knowledge graph written to {:?}", path).green()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
