//! [`StatementExecutor`] backed by a PostgreSQL pool.

use async_trait::async_trait;
use deadpool_postgres::Object;
use tagsql_query::{QueryError, QueryResult, Statement, StatementExecutor};
use tokio_postgres::Row;
use tracing::debug;

use crate::error::PgResult;
use crate::pool::PgPool;
use crate::row::FromPgRow;
use crate::types::{bind_params, param_refs};

/// Runs composed statements on pooled connections.
///
/// Named statements are prepared through the connection's statement cache
/// and reused on later calls. Unnamed statements are prepared once per call.
#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    /// Create an executor over `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run a query and decode every row.
    pub async fn query_as<T: FromPgRow>(&self, statement: &Statement) -> QueryResult<Vec<T>> {
        let rows = self.query(statement).await?;
        rows.iter()
            .map(T::from_row)
            .collect::<PgResult<Vec<T>>>()
            .map_err(|e| QueryError::from(e).with_sql(statement.text()))
    }

    async fn prepare(
        &self,
        client: &Object,
        statement: &Statement,
    ) -> PgResult<tokio_postgres::Statement> {
        match statement.name() {
            Some(name) => {
                debug!(name, "Using prepared statement cache");
                Ok(client.prepare_cached(statement.text()).await?)
            }
            None => Ok(client.prepare(statement.text()).await?),
        }
    }

    async fn run_query(&self, statement: &Statement) -> PgResult<Vec<Row>> {
        let client = self.pool.get().await?;
        let prepared = self.prepare(&client, statement).await?;
        let params = bind_params(statement.values(), prepared.params())?;
        Ok(client.query(&prepared, &param_refs(&params)).await?)
    }

    async fn run_execute(&self, statement: &Statement) -> PgResult<u64> {
        let client = self.pool.get().await?;
        let prepared = self.prepare(&client, statement).await?;
        let params = bind_params(statement.values(), prepared.params())?;
        Ok(client.execute(&prepared, &param_refs(&params)).await?)
    }
}

#[async_trait]
impl StatementExecutor for PgExecutor {
    type Row = Row;

    async fn query(&self, statement: &Statement) -> QueryResult<Vec<Row>> {
        debug!(
            param_count = statement.param_count(),
            name = statement.name(),
            "PgExecutor::query()"
        );
        self.run_query(statement)
            .await
            .map_err(|e| QueryError::from(e).with_sql(statement.text()))
    }

    async fn execute(&self, statement: &Statement) -> QueryResult<u64> {
        debug!(
            param_count = statement.param_count(),
            name = statement.name(),
            "PgExecutor::execute()"
        );
        self.run_execute(statement)
            .await
            .map_err(|e| QueryError::from(e).with_sql(statement.text()))
    }
}
