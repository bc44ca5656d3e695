//! Test fixture for SQL Tutor integration tests
//!
//! Uses only the public crate API.

use sqltutor::session::ExecutionResult;
use sqltutor::{
    AnalysisResult, EngineConfig, ExecutionError, Executor, FindingCode, KnowledgeStore,
    QueryRows, TutorEngine, Value,
};
use std::sync::{Arc, Mutex};

/// Executor that records every call and returns a fixed result set
pub struct RecordingExecutor {
    calls: Mutex<Vec<(String, String)>>,
    rows: usize,
}

impl RecordingExecutor {
    pub fn new(rows: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            rows,
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, query_text: &str, schema_id: &str) -> ExecutionResult<QueryRows> {
        self.calls
            .lock()
            .unwrap()
            .push((query_text.to_string(), schema_id.to_string()));
        let rows = (0..self.rows)
            .map(|i| vec![Value::Text(format!("row{}", i)), Value::Float(i as f64)])
            .collect();
        Ok(QueryRows::new(
            vec!["department".to_string(), "avg_salary".to_string()],
            rows,
        ))
    }
}

/// Executor that always fails, counting its calls
pub struct FailingExecutor {
    calls: Mutex<usize>,
    error: ExecutionError,
}

impl FailingExecutor {
    pub fn new(error: ExecutionError) -> Self {
        Self {
            calls: Mutex::new(0),
            error,
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Executor for FailingExecutor {
    fn run(&self, _query_text: &str, _schema_id: &str) -> ExecutionResult<QueryRows> {
        *self.calls.lock().unwrap() += 1;
        Err(self.error.clone())
    }
}

/// Engine over the built-in knowledge graph with a recording executor
pub struct TestFixture {
    pub engine: TutorEngine,
    pub executor: Arc<RecordingExecutor>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_rows(3)
    }

    /// Fixture whose executor returns `rows` rows
    pub fn with_rows(rows: usize) -> Self {
        init_logging();
        let executor = Arc::new(RecordingExecutor::new(rows));
        let engine = TutorEngine::new(
            Arc::new(KnowledgeStore::load_default()),
            EngineConfig::default(),
        )
        .with_executor(executor.clone());
        Self { engine, executor }
    }

    pub fn analyze(&self, sql: &str) -> AnalysisResult {
        self.engine.analyze(sql, "company")
    }

    /// Codes of all findings for `sql`, in reporting order
    pub fn codes(&self, sql: &str) -> Vec<FindingCode> {
        self.analyze(sql).findings.iter().map(|f| f.code).collect()
    }

    pub fn count_of(&self, sql: &str, code: FindingCode) -> usize {
        self.codes(sql).into_iter().filter(|c| *c == code).count()
    }
}

/// Route library logs to the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
