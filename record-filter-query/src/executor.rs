//! The query executor collaborator.
//!
//! The executor owns the data store. It receives a compiled [`QuerySpec`]
//! together with the table of the filtered record type and returns records or
//! a count. Executor failures are passed through with the `Executor` code.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{FilterError, FilterResult};
use crate::spec::QuerySpec;

/// Runs compiled filters against a data store.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Record type produced by this executor.
    type Record: Send + Sync;

    /// Load the records matching `spec` from `table`.
    async fn find(&self, table: &str, spec: &QuerySpec) -> FilterResult<Vec<Self::Record>>;

    /// Count the records matching `spec` in `table`.
    async fn count(&self, table: &str, spec: &QuerySpec) -> FilterResult<u64>;
}

#[async_trait]
impl<E: QueryExecutor + ?Sized> QueryExecutor for std::sync::Arc<E> {
    type Record = E::Record;

    async fn find(&self, table: &str, spec: &QuerySpec) -> FilterResult<Vec<Self::Record>> {
        (**self).find(table, spec).await
    }

    async fn count(&self, table: &str, spec: &QuerySpec) -> FilterResult<u64> {
        (**self).count(table, spec).await
    }
}

/// Which executor method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `find`
    Find,
    /// `count`
    Count,
}

/// One recorded executor call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorCall {
    /// The method called.
    pub kind: CallKind,
    /// The table passed in.
    pub table: String,
    /// The spec passed in.
    pub spec: QuerySpec,
}

/// An in-memory executor that records every call and answers with fixed rows.
///
/// Useful for inspecting what a filter compiles to without a database.
#[derive(Debug, Default)]
pub struct RecordingExecutor<R> {
    rows: Vec<R>,
    count: Option<u64>,
    failure: Option<String>,
    calls: Mutex<Vec<ExecutorCall>>,
}

impl<R: Clone + Send + Sync> RecordingExecutor<R> {
    /// Create an executor answering every `find` with `rows`.
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            count: None,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer `count` with a fixed value instead of the number of rows.
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Fail every call with the given message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.calls.lock().clone()
    }

    /// The spec of the most recent `find` call.
    pub fn last_find(&self) -> Option<QuerySpec> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|c| c.kind == CallKind::Find)
            .map(|c| c.spec.clone())
    }

    fn record(&self, kind: CallKind, table: &str, spec: &QuerySpec) -> FilterResult<()> {
        self.calls.lock().push(ExecutorCall {
            kind,
            table: table.to_string(),
            spec: spec.clone(),
        });
        match &self.failure {
            Some(message) => Err(FilterError::executor(std::io::Error::other(message.clone()))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<R: Clone + Send + Sync> QueryExecutor for RecordingExecutor<R> {
    type Record = R;

    async fn find(&self, table: &str, spec: &QuerySpec) -> FilterResult<Vec<R>> {
        self.record(CallKind::Find, table, spec)?;
        Ok(self.rows.clone())
    }

    async fn count(&self, table: &str, spec: &QuerySpec) -> FilterResult<u64> {
        self.record(CallKind::Count, table, spec)?;
        Ok(self.count.unwrap_or(self.rows.len() as u64))
    }
}
