//! The seam between composition and a database driver.
//!
//! The composer never talks to a database. Drivers implement
//! [`StatementExecutor`] and receive finished statements.

use async_trait::async_trait;

use crate::error::QueryResult;
use crate::statement::Statement;

/// Executes composed statements against a database.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Row type returned by queries.
    type Row: Send;

    /// Run a statement and return its rows.
    async fn query(&self, statement: &Statement) -> QueryResult<Vec<Self::Row>>;

    /// Run a statement and return the number of affected rows.
    async fn execute(&self, statement: &Statement) -> QueryResult<u64>;

    /// Run a statement expected to return at most one row.
    async fn query_optional(&self, statement: &Statement) -> QueryResult<Option<Self::Row>> {
        Ok(self.query(statement).await?.into_iter().next())
    }
}
