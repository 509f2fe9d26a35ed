//! Database repository for monotonic id counters.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};

/// Counter backing global user ids
pub const USER_COUNTER: &str = "user";

pub struct IdCounters<'c> {
    db: &'c mut PgConnection,
}

impl<'c> IdCounters<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Advance a counter and return the new value.
    ///
    /// The row stays locked until the surrounding transaction ends, so concurrent callers are
    /// serialized and never observe the same value.
    #[instrument(skip(self), err)]
    pub async fn next(&mut self, name: &str) -> Result<i64> {
        let value = sqlx::query_scalar::<_, i64>("UPDATE id_counters SET last_value = last_value + 1 WHERE name = $1 RETURNING last_value")
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        value.ok_or_else(|| DbError::Other(anyhow::anyhow!("unknown id counter '{name}'")))
    }

    /// Last value handed out by a counter (0 if none yet)
    #[cfg(test)]
    pub async fn current(&mut self, name: &str) -> Result<i64> {
        let value = sqlx::query_scalar::<_, i64>("SELECT last_value FROM id_counters WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        value.ok_or_else(|| DbError::Other(anyhow::anyhow!("unknown id counter '{name}'")))
    }
}
