//! SQL over a single catalog file
//!
//! The catalog only decides *what* is queried. Execution is behind the
//! [`QueryExecutor`] trait; [`DataFusionExecutor`] is the local engine.

mod datafusion_executor;

pub use datafusion_executor::DataFusionExecutor;

use async_trait::async_trait;
use dataset::{FormatOptions, QueryKind, Result};
use serde::{Deserialize, Serialize};

/// Name the bound file is registered under
pub const TABLE_NAME: &str = "dataset";

/// Rows returned by previews unless configured otherwise
pub const DEFAULT_PREVIEW_LIMIT: usize = 500;

/// The file a query reads, and how to parse it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBinding {
    pub location: String,
    pub options: FormatOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub sql: String,
    pub table: TableBinding,
    pub kind: QueryKind,
}

impl QueryRequest {
    /// `SELECT * FROM dataset LIMIT <limit>`, not counted as a job
    #[must_use]
    pub fn preview(table: TableBinding, limit: usize) -> Self {
        Self {
            sql: format!("SELECT * FROM {TABLE_NAME} LIMIT {limit}"),
            table,
            kind: QueryKind::Preview,
        }
    }

    /// Full scan of the bound table, counted as a job
    #[must_use]
    pub fn run(table: TableBinding) -> Self {
        Self {
            sql: format!("SELECT * FROM {TABLE_NAME}"),
            table,
            kind: QueryKind::Run,
        }
    }

    #[must_use]
    pub fn with_sql<S: Into<String>>(mut self, sql: S) -> Self {
        self.sql = sql.into();
        self
    }
}

/// Tabular result with every value rendered as text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// True when rows were dropped to stay within the row limit
    pub truncated: bool,
}

impl QueryResult {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, request: QueryRequest) -> Result<QueryResult>;
}
