// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Built-in knowledge graph
//!
//! Used whenever no external knowledge source is configured or the
//! configured one fails to load. It covers every concept and error type the
//! built-in rules reference, plus the sample company schema.

use super::model::{ColumnFact, Concept, ErrorType, KnowledgeDocument, SchemaFact};
use crate::finding::FindingCode;

pub fn default_document() -> KnowledgeDocument {
    KnowledgeDocument {
        concepts: default_concepts(),
        error_types: FindingCode::ALL
            .iter()
            .map(|code| ErrorType {
                code: *code,
                severity: code.default_severity(),
                explanation: explanation(*code).to_string(),
                concept: code.default_concept().to_string(),
            })
            .collect(),
        tables: default_tables(),
    }
}

fn default_concepts() -> Vec<Concept> {
    vec![
        Concept::new("SELECT_BASICS", "SELECT basics", 1, &[]),
        Concept::new("SQL_SYNTAX", "SQL lexical syntax", 1, &[]),
        Concept::new("QUERY_STRUCTURE", "Query clause structure", 1, &["SELECT_BASICS"]),
        Concept::new("READ_ONLY_QUERIES", "Read-only queries", 1, &["SELECT_BASICS"]),
        Concept::new("COLUMN_SELECTION", "Choosing columns", 1, &["SELECT_BASICS"]),
        Concept::new("SCHEMA_BASICS", "Tables and columns", 1, &["SELECT_BASICS"]),
        Concept::new("WHERE_CLAUSE", "Filtering rows with WHERE", 2, &["QUERY_STRUCTURE"]),
        Concept::new("AGGREGATE_FUNCTIONS", "Aggregate functions", 2, &["SELECT_BASICS"]),
        Concept::new("ORDER_BY", "Sorting with ORDER BY", 2, &["QUERY_STRUCTURE"]),
        Concept::new(
            "QUERY_DEBUGGING",
            "Reading database errors",
            2,
            &["SQL_SYNTAX", "SCHEMA_BASICS"],
        ),
        Concept::new(
            "GROUP_BY",
            "Grouping with GROUP BY",
            3,
            &["AGGREGATE_FUNCTIONS", "QUERY_STRUCTURE"],
        ),
        Concept::new("JOINS", "Joining tables", 3, &["SCHEMA_BASICS", "WHERE_CLAUSE"]),
        Concept::new("TABLE_ALIASES", "Table aliases and qualified columns", 3, &["JOINS"]),
        Concept::new(
            "HAVING_CLAUSE",
            "Filtering groups with HAVING",
            4,
            &["GROUP_BY", "WHERE_CLAUSE"],
        ),
    ]
}

fn explanation(code: FindingCode) -> &'static str {
    match code {
        FindingCode::EmptyQuery => "Please enter a SQL query to analyze.",
        FindingCode::MissingSelect => {
            "A query must start with SELECT to say which columns you want. {detail}"
        }
        FindingCode::MissingFrom => {
            "The query has no FROM clause, so there is no table to read '{fragment}' from."
        }
        FindingCode::ClauseOrder => {
            "SQL clauses must follow the order SELECT, FROM, JOIN, WHERE, GROUP BY, HAVING, ORDER BY: {detail}."
        }
        FindingCode::UnbalancedParentheses => {
            "Parentheses are unbalanced: {detail}. Every '(' needs a matching ')'."
        }
        FindingCode::UnterminatedString => {
            "The text literal {fragment} is never closed. End it with a matching quote."
        }
        FindingCode::AggregateInWhere => {
            "'{fragment}' uses an aggregate function in WHERE. WHERE filters individual rows before grouping; filter on aggregates with HAVING instead."
        }
        FindingCode::MissingGroupBy => {
            "'{fragment}' is selected next to an aggregate function without a GROUP BY clause. Add GROUP BY {fragment} or aggregate the column."
        }
        FindingCode::HavingWithoutGroupBy => {
            "'{fragment}' filters groups, but the query has no GROUP BY clause. Use WHERE to filter rows, or add GROUP BY."
        }
        FindingCode::AmbiguousColumn => {
            "Column '{fragment}' exists in more than one table ({detail}). Qualify it with a table name or alias."
        }
        FindingCode::SchemaMismatch => "The query references unknown schema objects: {detail}.",
        FindingCode::SelectStar => {
            "SELECT * returns every column. Listing the columns you need makes the query clearer."
        }
        FindingCode::GroupByWithoutAggregate => {
            "The query groups by {fragment} but selects no aggregate function. Add COUNT, SUM, AVG, MIN or MAX, or use DISTINCT."
        }
        FindingCode::GroupByColumnNotInSelect => {
            "The query groups by '{fragment}' but does not select it, so the groups are hard to tell apart."
        }
        FindingCode::ImplicitJoin => {
            "Tables {detail} are listed with commas. Use an explicit JOIN ... ON to state how rows match."
        }
        FindingCode::MissingOrderBy => {
            "The query has no ORDER BY, so rows come back in no guaranteed order. Add ORDER BY to sort the results."
        }
        FindingCode::SafetyViolation => {
            "This tutoring system only runs read-only SELECT queries: {detail}."
        }
        FindingCode::ExecutionError => {
            "The query failed to execute against the sample database: {detail}"
        }
    }
}

fn default_tables() -> Vec<SchemaFact> {
    vec![
        SchemaFact::new(
            "employees",
            vec![
                ColumnFact::new("emp_id", "INTEGER").primary_key(),
                ColumnFact::new("first_name", "VARCHAR").not_null(),
                ColumnFact::new("last_name", "VARCHAR").not_null(),
                ColumnFact::new("department", "VARCHAR"),
                ColumnFact::new("salary", "DECIMAL"),
                ColumnFact::new("hire_date", "DATE"),
                ColumnFact::new("manager_id", "INTEGER"),
            ],
        ),
        SchemaFact::new(
            "departments",
            vec![
                ColumnFact::new("dept_id", "INTEGER").primary_key(),
                ColumnFact::new("dept_name", "VARCHAR").not_null(),
                ColumnFact::new("location", "VARCHAR"),
                ColumnFact::new("budget", "DECIMAL"),
            ],
        ),
        SchemaFact::new(
            "projects",
            vec![
                ColumnFact::new("project_id", "INTEGER").primary_key(),
                ColumnFact::new("project_name", "VARCHAR").not_null(),
                ColumnFact::new("department", "VARCHAR"),
                ColumnFact::new("start_date", "DATE"),
                ColumnFact::new("end_date", "DATE"),
                ColumnFact::new("budget", "DECIMAL"),
            ],
        ),
    ]
}
