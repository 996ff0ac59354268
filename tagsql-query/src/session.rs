//! Request-scoped unit of work.
//!
//! A [`Session`] owns the [`MutationSet`] for one request or transaction. Every
//! statement it composes records its write targets there, and the set is handed
//! back by [`Session::finish`] so the caller can invalidate cached reads.
//!
//! ```rust,ignore
//! let mut session = Session::new(&composer, &executor);
//! session.execute(stmt!("UPDATE {} SET \"status\" = {} WHERE \"id\" = {}",
//!     Value::table("Order"), "paid", order_id)).await?;
//! let changed = session.finish();
//! cache.invalidate(changed.iter());
//! ```

use tracing::debug;

use crate::compose::Composer;
use crate::error::QueryResult;
use crate::executor::StatementExecutor;
use crate::mutation::MutationSet;
use crate::statement::Statement;
use crate::template::Template;

/// Composes and runs statements for one unit of work.
pub struct Session<'a, E: StatementExecutor> {
    composer: &'a Composer,
    executor: &'a E,
    changed: MutationSet,
    statements: usize,
}

impl<'a, E: StatementExecutor> Session<'a, E> {
    /// Start a unit of work.
    pub fn new(composer: &'a Composer, executor: &'a E) -> Self {
        Self {
            composer,
            executor,
            changed: MutationSet::new(),
            statements: 0,
        }
    }

    /// Compose a template, recording its write targets.
    pub fn compose(&mut self, template: Template) -> QueryResult<Statement> {
        self.statements += 1;
        self.composer.compose(template, Some(&mut self.changed))
    }

    /// Compose and run a query.
    pub async fn query(&mut self, template: Template) -> QueryResult<Vec<E::Row>> {
        let statement = self.compose(template)?;
        self.executor.query(&statement).await
    }

    /// Compose and run a query expected to return at most one row.
    pub async fn query_optional(&mut self, template: Template) -> QueryResult<Option<E::Row>> {
        let statement = self.compose(template)?;
        self.executor.query_optional(&statement).await
    }

    /// Compose and run a statement, returning the affected row count.
    pub async fn execute(&mut self, template: Template) -> QueryResult<u64> {
        let statement = self.compose(template)?;
        self.executor.execute(&statement).await
    }

    /// Tables written so far.
    pub fn changed_tables(&self) -> &MutationSet {
        &self.changed
    }

    /// End the unit of work and return the tables it wrote.
    ///
    /// A table is recorded once its statement composes successfully, whether or
    /// not the execution succeeded.
    pub fn finish(self) -> MutationSet {
        debug!(
            statements = self.statements,
            changed = ?self.changed.changed_tables(),
            "Session::finish()"
        );
        self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, QueryError};
    use crate::value::Value;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingExecutor {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl StatementExecutor for RecordingExecutor {
        type Row = String;

        async fn query(&self, statement: &Statement) -> QueryResult<Vec<String>> {
            self.seen.lock().push(statement.text().to_string());
            Ok(vec!["row".to_string()])
        }

        async fn execute(&self, statement: &Statement) -> QueryResult<u64> {
            self.seen.lock().push(statement.text().to_string());
            if self.fail {
                return Err(QueryError::database("boom"));
            }
            Ok(statement.param_count() as u64)
        }
    }

    #[tokio::test]
    async fn test_session_tracks_writes() {
        let composer = Composer::default();
        let executor = RecordingExecutor::default();
        let mut session = Session::new(&composer, &executor);

        session
            .query(Template::from_format("SELECT * FROM {}", vec![Value::table("Listing")]))
            .await
            .unwrap();
        let affected = session
            .execute(Template::from_format(
                "UPDATE {} SET \"price\" = {} WHERE \"id\" = {}",
                vec![Value::table("Listing"), 10i64.into(), 1i64.into()],
            ))
            .await
            .unwrap();
        assert_eq!(affected, 2);

        let changed = session.finish();
        assert_eq!(changed.changed_tables(), vec!["Listing"]);
        assert_eq!(
            executor.seen.lock().clone(),
            vec![
                "SELECT * FROM \"public\".\"Listing\"".to_string(),
                "UPDATE \"public\".\"Listing\" SET \"price\" = $1 WHERE \"id\" = $2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_execution_still_recorded() {
        let composer = Composer::default();
        let executor = RecordingExecutor {
            fail: true,
            ..Default::default()
        };
        let mut session = Session::new(&composer, &executor);

        let err = session
            .execute(Template::from_format("DELETE FROM {}", vec![Value::table("Cart")]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(session.changed_tables().contains("Cart"));
    }

    #[tokio::test]
    async fn test_composition_error_skips_executor() {
        let composer = Composer::default();
        let executor = RecordingExecutor::default();
        let mut session = Session::new(&composer, &executor);

        let err = session
            .execute(Template::from_format(
                "INSERT INTO {} VALUES {}",
                vec![Value::table("Score"), Value::Batch(Vec::new())],
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyBatch);
        assert!(executor.seen.lock().is_empty());
        assert!(session.finish().is_empty());
    }

    #[tokio::test]
    async fn test_query_optional_default() {
        let composer = Composer::default();
        let executor = RecordingExecutor::default();
        let mut session = Session::new(&composer, &executor);

        let row = session
            .query_optional(Template::literal("SELECT 1"))
            .await
            .unwrap();
        assert_eq!(row.as_deref(), Some("row"));
    }
}
