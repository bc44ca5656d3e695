// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Report formatting for CLI output

use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use sqltutor::knowledge::{Concept, SchemaFact};
use sqltutor::{AnalysisResult, Correctness, ExecutionOutcome, SafetyVerdict, Severity};

use super::commands::OutputFormat;

/// Report formatter for the supported output formats
pub struct ReportFormatter;

impl ReportFormatter {
    pub fn format_analysis(result: &AnalysisResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::analysis_table(result),
            OutputFormat::Json => Self::to_json(result),
        }
    }

    pub fn format_concepts(concepts: &[&Concept], format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::concepts_table(concepts),
            OutputFormat::Json => Self::to_json(&concepts),
        }
    }

    pub fn format_schema(tables: &[&SchemaFact]) -> String {
        let mut output = String::new();
        for table in tables {
            output.push_str(&format!("{}\n", table.table.bold().green()));

            let mut grid = Table::new();
            grid.load_preset(UTF8_FULL);
            grid.set_header(vec![
                Cell::new("column").fg(Color::Green),
                Cell::new("type").fg(Color::Green),
                Cell::new("nullable").fg(Color::Green),
                Cell::new("key").fg(Color::Green),
            ]);
            for column in &table.columns {
                grid.add_row(vec![
                    column.name.clone(),
                    column.data_type.clone(),
                    if column.nullable { "yes" } else { "no" }.to_string(),
                    if column.primary_key { "PK" } else { "" }.to_string(),
                ]);
            }
            output.push_str(&grid.to_string());
            output.push_str("\n\n");
        }
        output
    }

    fn analysis_table(result: &AnalysisResult) -> String {
        let mut output = String::new();

        let verdict = match result.safety_verdict {
            SafetyVerdict::Allowed => result.safety_verdict.to_string().green(),
            SafetyVerdict::Rejected => result.safety_verdict.to_string().red(),
        };
        let correctness = match result.correctness() {
            Correctness::Correct => result.correctness().to_string().green(),
            Correctness::Partial => result.correctness().to_string().yellow(),
            Correctness::Incorrect => result.correctness().to_string().red(),
        };
        output.push_str(&format!("{}\n", "Query Analysis".bold().green()));
        output.push_str(&format!("Safety: {}\n", verdict));
        output.push_str(&format!("Result: {}\n\n", correctness));

        if result.findings.is_empty() {
            output.push_str(&format!("{}\n", "No problems found".green()));
        } else {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec![
                Cell::new("severity").fg(Color::Green),
                Cell::new("code").fg(Color::Green),
                Cell::new("message").fg(Color::Green),
                Cell::new("concept").fg(Color::Green),
            ]);
            for finding in &result.findings {
                table.add_row(vec![
                    Cell::new(finding.severity.as_str()).fg(severity_color(finding.severity)),
                    Cell::new(finding.code.as_str()),
                    Cell::new(&finding.message),
                    Cell::new(&finding.related_concept),
                ]);
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output.push('\n');
        match &result.execution {
            Some(ExecutionOutcome::Rows {
                columns,
                rows,
                row_count,
            }) => {
                output.push_str(&format!("{}\n", "Execution".bold().green()));
                output.push_str(&format!(
                    "Rows returned: {} (showing {})\n",
                    row_count,
                    rows.len()
                ));
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(
                    columns
                        .iter()
                        .map(|c| Cell::new(c).fg(Color::Green))
                        .collect::<Vec<_>>(),
                );
                for row in rows {
                    table.add_row(row.iter().map(|v| v.to_string()).collect::<Vec<_>>());
                }
                output.push_str(&table.to_string());
                output.push('\n');
            }
            Some(ExecutionOutcome::Error { message }) => {
                output.push_str(&format!("{}\n", format!("Execution failed: {}", message).red()));
            }
            None if result.safety_verdict == SafetyVerdict::Rejected => {
                output.push_str(&format!("{}\n", "Execution skipped (query rejected)".yellow()));
            }
            None if result.has_blocking() => {
                output.push_str(&format!(
                    "{}\n",
                    "Execution skipped (blocking findings)".yellow()
                ));
            }
            None => {
                output.push_str(&format!(
                    "{}\n",
                    "Execution skipped (no sandbox executor attached)".yellow()
                ));
            }
        }

        if !result.learning_path.is_empty() {
            output.push_str(&format!("\n{}\n", "Learning path:".bold().cyan()));
            for (i, step) in result.learning_path.iter().enumerate() {
                output.push_str(&format!(
                    "  {}. {} ({})\n     {}\n",
                    i + 1,
                    step.concept_name.bold(),
                    step.concept_id,
                    step.rationale.dimmed()
                ));
            }
        }

        output
    }

    fn concepts_table(concepts: &[&Concept]) -> String {
        if concepts.is_empty() {
            return format!("{}\n", "No concepts defined".yellow());
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("id").fg(Color::Green),
            Cell::new("name").fg(Color::Green),
            Cell::new("difficulty").fg(Color::Green),
            Cell::new("prerequisites").fg(Color::Green),
        ]);
        for concept in concepts {
            table.add_row(vec![
                concept.id.clone(),
                concept.name.clone(),
                concept.difficulty.to_string(),
                concept
                    .prerequisites
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            ]);
        }
        format!("{}\n", table)
    }

    fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| {
            format!(
                "{{\"status\": \"error\", \"error\": \"Could not serialize report to JSON: {}\"}}",
                e
            )
        })
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Advisory => Color::Cyan,
        Severity::Warning => Color::Yellow,
        Severity::Blocking => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqltutor::TutorEngine;

    #[test]
    fn test_json_report_carries_codes() {
        let engine = TutorEngine::with_default_knowledge();
        let result = engine.analyze(
            "SELECT dept_name FROM departments HAVING budget > 100000",
            "company",
        );
        let json = ReportFormatter::format_analysis(&result, OutputFormat::Json);
        assert!(json.contains("HAVING_WITHOUT_GROUPBY"));
        assert!(json.contains("\"safety_verdict\": \"ALLOWED\""));
    }

    #[test]
    fn test_table_report_mentions_skipped_execution() {
        colored::control::set_override(false);
        let engine = TutorEngine::with_default_knowledge();

        let result = engine.analyze("SELECT emp_id FROM employees", "company");
        let table = ReportFormatter::format_analysis(&result, OutputFormat::Table);
        assert!(table.contains("no sandbox executor attached"));

        let result = engine.analyze("DELETE FROM employees", "company");
        let table = ReportFormatter::format_analysis(&result, OutputFormat::Table);
        assert!(table.contains("REJECTED"));
        assert!(table.contains("query rejected"));
    }
}
