//! End-to-end analysis scenarios
//!
//! Each test drives a learner query through the full pipeline: safety gate,
//! syntax checks, semantic rules, execution and learning path planning.

#[path = "testutils/mod.rs"]
mod testutils;

use sqltutor::{
    AnalysisState, Correctness, EngineConfig, ExecutionError, ExecutionOutcome, FindingCode,
    KnowledgeQuery, KnowledgeStore, SafetyVerdict, Severity, TutorEngine,
};
use std::sync::Arc;
use std::time::Duration;
use testutils::test_fixture::{FailingExecutor, TestFixture};

#[test]
fn test_grouped_average_runs_cleanly() {
    let fixture = TestFixture::new();
    let sql = "SELECT department, AVG(salary) FROM employees GROUP BY department ORDER BY avg_salary DESC;";
    let result = fixture.analyze(sql);

    assert!(!result.has_blocking());
    assert!(result.findings.is_empty(), "{:?}", result.findings);
    assert_eq!(result.correctness(), Correctness::Correct);
    assert_eq!(result.safety_verdict, SafetyVerdict::Allowed);
    assert!(matches!(result.execution, Some(ExecutionOutcome::Rows { .. })));
    assert_eq!(result.final_state, AnalysisState::Reported);

    // Query text and schema id reach the executor unchanged
    assert_eq!(
        fixture.executor.calls(),
        vec![(sql.to_string(), "company".to_string())]
    );
}

#[test]
fn test_having_without_group_by() {
    let fixture = TestFixture::new();
    let store = KnowledgeStore::load_default();
    let result = fixture.analyze("SELECT dept_name FROM departments HAVING budget > 100000;");

    assert_eq!(result.findings.len(), 1);
    let finding = &result.findings[0];
    assert_eq!(finding.code, FindingCode::HavingWithoutGroupBy);
    assert_eq!(finding.related_concept, "GROUP_BY");
    assert_eq!(finding.severity, Severity::Warning);
    assert!(finding.message.contains("HAVING budget > 100000"));
    assert_eq!(result.correctness(), Correctness::Partial);

    let path: Vec<&str> = result
        .learning_path
        .iter()
        .map(|s| s.concept_id.as_str())
        .collect();
    let group_by = path.iter().position(|id| *id == "GROUP_BY").unwrap();
    for (i, id) in path.iter().enumerate() {
        let prerequisites = store.prerequisites_of(id).unwrap();
        if prerequisites.contains("GROUP_BY") {
            assert!(group_by < i, "{} placed before GROUP_BY", id);
        }
    }
    assert_eq!(
        path,
        vec!["SELECT_BASICS", "QUERY_STRUCTURE", "AGGREGATE_FUNCTIONS", "GROUP_BY"]
    );

    // A warning does not block execution
    assert_eq!(fixture.executor.call_count(), 1);
}

#[test]
fn test_drop_table_is_rejected() {
    let fixture = TestFixture::new();
    let result = fixture.analyze("DROP TABLE employees;");

    assert_eq!(result.safety_verdict, SafetyVerdict::Rejected);
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].code, FindingCode::SafetyViolation);
    assert_eq!(result.findings[0].related_concept, "READ_ONLY_QUERIES");
    assert!(result.execution.is_none());
    assert_eq!(fixture.executor.call_count(), 0);
    assert_eq!(result.correctness(), Correctness::Incorrect);
    assert_eq!(result.final_state, AnalysisState::Rejected);

    let path: Vec<&str> = result
        .learning_path
        .iter()
        .map(|s| s.concept_id.as_str())
        .collect();
    assert_eq!(path, vec!["SELECT_BASICS", "READ_ONLY_QUERIES"]);
}

#[test]
fn test_aggregate_in_where_suggests_having() {
    let fixture = TestFixture::new();
    let result = fixture
        .analyze("SELECT department FROM employees WHERE AVG(salary) > 60000 GROUP BY department");

    let codes: Vec<_> = result.findings.iter().map(|f| f.code).collect();
    assert_eq!(
        codes,
        vec![FindingCode::AggregateInWhere, FindingCode::GroupByWithoutAggregate]
    );
    assert!(result.findings[0].message.contains("HAVING"));
    assert!(result
        .learning_path
        .iter()
        .any(|s| s.concept_id == "HAVING_CLAUSE"));
}

#[test]
fn test_schema_mismatch_blocks_execution() {
    let fixture = TestFixture::new();
    let result = fixture.analyze("SELECT first_name FROM employee ORDER BY first_name");

    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].code, FindingCode::SchemaMismatch);
    assert!(result.findings[0].message.contains("Did you mean: employees?"));
    assert!(result.execution.is_none());
    assert_eq!(fixture.executor.call_count(), 0);
}

#[test]
fn test_ambiguous_join_column() {
    let fixture = TestFixture::new();
    let result = fixture.analyze(
        "SELECT project_name, budget FROM projects p JOIN departments d ON p.department = d.dept_name ORDER BY project_name",
    );

    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].code, FindingCode::AmbiguousColumn);
    assert_eq!(result.findings[0].fragment, "budget");
    assert_eq!(result.findings[0].related_concept, "TABLE_ALIASES");
}

#[test]
fn test_implicit_join_hint() {
    let fixture = TestFixture::new();
    let codes = fixture.codes(
        "SELECT e.first_name, d.location FROM employees e, departments d WHERE e.department = d.dept_name ORDER BY e.first_name",
    );
    assert_eq!(codes, vec![FindingCode::ImplicitJoin]);
}

#[test]
fn test_findings_keep_stage_order() {
    let fixture = TestFixture::new();
    let result =
        fixture.analyze("SELECT * FROM employee WHERE COUNT(*) > 1 ORDER BY emp_id HAVING x > 1");

    let codes: Vec<_> = result.findings.iter().map(|f| f.code).collect();
    assert_eq!(
        codes,
        vec![
            FindingCode::ClauseOrder,
            FindingCode::AggregateInWhere,
            FindingCode::HavingWithoutGroupBy,
            FindingCode::SchemaMismatch,
            FindingCode::SelectStar,
        ]
    );
    assert_eq!(result.final_state, AnalysisState::Reported);
}

#[test]
fn test_unordered_rows_get_a_hint() {
    let fixture = TestFixture::new();
    let result = fixture.analyze("SELECT first_name, salary FROM employees WHERE salary > 50000");

    let codes: Vec<_> = result.findings.iter().map(|f| f.code).collect();
    assert_eq!(codes, vec![FindingCode::MissingOrderBy]);
    assert_eq!(result.findings[0].severity, Severity::Advisory);
    assert_eq!(result.findings[0].related_concept, "ORDER_BY");
    assert_eq!(result.correctness(), Correctness::Partial);
    assert_eq!(fixture.executor.call_count(), 1);
    assert!(result.learning_path.iter().any(|s| s.concept_id == "ORDER_BY"));
}

#[test]
fn test_aliases_after_keyword_values_run() {
    let fixture = TestFixture::new();
    for sql in [
        "SELECT first_name, CASE WHEN salary > 50000 THEN 'high' ELSE 'low' END band FROM employees ORDER BY first_name",
        "SELECT first_name, NULL n FROM employees ORDER BY first_name",
        "SELECT first_name, TRUE flag FROM employees ORDER BY first_name",
    ] {
        let result = fixture.analyze(sql);
        assert!(result.findings.is_empty(), "{}: {:?}", sql, result.findings);
    }
    assert_eq!(fixture.executor.call_count(), 3);
}

#[test]
fn test_rows_truncated_but_counted() {
    let fixture = TestFixture::with_rows(25);
    let result = fixture.analyze("SELECT department, salary FROM employees");

    match result.execution {
        Some(ExecutionOutcome::Rows {
            columns,
            rows,
            row_count,
        }) => {
            assert_eq!(columns.len(), 2);
            assert_eq!(rows.len(), 10);
            assert_eq!(row_count, 25);
        }
        other => panic!("expected rows, got {:?}", other),
    }
}

#[test]
fn test_execution_error_becomes_finding() {
    let executor = Arc::new(FailingExecutor::new(ExecutionError::Failed(
        "no such column: salary".to_string(),
    )));
    let engine = TutorEngine::with_default_knowledge().with_executor(executor.clone());
    let result = engine.analyze(
        "SELECT department, salary FROM employees ORDER BY salary",
        "company",
    );

    assert_eq!(executor.call_count(), 1);
    assert_eq!(result.findings.len(), 1);
    let finding = &result.findings[0];
    assert_eq!(finding.code, FindingCode::ExecutionError);
    assert!(finding.message.contains("no such column: salary"));
    assert!(matches!(
        result.execution,
        Some(ExecutionOutcome::Error { ref message }) if message.contains("no such column")
    ));
    assert_eq!(result.correctness(), Correctness::Incorrect);
    assert!(result
        .learning_path
        .iter()
        .any(|s| s.concept_id == "QUERY_DEBUGGING"));
}

#[test]
fn test_timeout_is_not_retried() {
    let executor = Arc::new(FailingExecutor::new(ExecutionError::Timeout(
        Duration::from_secs(5),
    )));
    let engine = TutorEngine::with_default_knowledge().with_executor(executor.clone());
    let result = engine.analyze("SELECT emp_id FROM employees", "company");

    assert_eq!(executor.call_count(), 1);
    assert!(result.execution.map(|e| e.is_error()).unwrap_or(false));
}

#[test]
fn test_without_executor_execution_is_skipped() {
    let engine = TutorEngine::new(
        Arc::new(KnowledgeStore::load_default()),
        EngineConfig::default(),
    );
    let result = engine.analyze("SELECT emp_id FROM employees ORDER BY emp_id", "company");

    assert!(result.findings.is_empty());
    assert_eq!(result.safety_verdict, SafetyVerdict::Allowed);
    assert!(result.execution.is_none());
}

#[test]
fn test_second_statement_is_rejected() {
    let fixture = TestFixture::new();
    let result = fixture.analyze("SELECT * FROM employees; DELETE FROM employees");

    assert_eq!(result.safety_verdict, SafetyVerdict::Rejected);
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].code, FindingCode::SafetyViolation);
    assert_eq!(fixture.executor.call_count(), 0);
}

#[test]
fn test_statement_hidden_in_parentheses_is_rejected() {
    let fixture = TestFixture::new();
    let result = fixture
        .analyze("SELECT emp_id FROM employees WHERE salary IN (1; DELETE FROM employees)");

    assert_eq!(result.safety_verdict, SafetyVerdict::Rejected);
    let codes: Vec<_> = result.findings.iter().map(|f| f.code).collect();
    assert_eq!(codes, vec![FindingCode::SafetyViolation]);
    assert_eq!(result.findings[0].fragment, "DELETE FROM employees)");
    assert_eq!(result.final_state, AnalysisState::Rejected);
    assert_eq!(fixture.executor.call_count(), 0);
}

#[test]
fn test_empty_query() {
    let fixture = TestFixture::new();
    let result = fixture.analyze("   ");

    assert_eq!(result.safety_verdict, SafetyVerdict::Rejected);
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].code, FindingCode::EmptyQuery);
    assert!(result.execution.is_none());
}

#[test]
fn test_result_serializes_to_json() {
    let fixture = TestFixture::new();
    let result = fixture.analyze("SELECT dept_name FROM departments HAVING budget > 100000;");
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["safety_verdict"], "ALLOWED");
    assert_eq!(json["findings"][0]["code"], "HAVING_WITHOUT_GROUPBY");
    assert_eq!(json["findings"][0]["severity"], "WARNING");
    assert_eq!(json["execution"]["status"], "rows");
    assert_eq!(json["final_state"], "REPORTED");
}
