//! Database access plumbing shared by the entity functions.
//!
//! Entity queries take `&mut impl DatabaseAccessor` so the same function runs
//! directly on the pool or inside an open transaction.

use sqlx::PgPool;

pub trait DatabaseAccessor {
    fn acquire(&mut self) -> impl sqlx::PgExecutor<'_>;
}

/// Pool-backed accessor. Also the entry point for read-only
/// [`kanau::processor::Processor`] queries and the production
/// [`LeadStore`](crate::store::LeadStore).
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

/// An open PostgreSQL transaction.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct TransactionProcessor<'b> {
    pub tx: sqlx::Transaction<'b, sqlx::Postgres>,
}

impl DatabaseAccessor for DatabaseProcessor {
    fn acquire(&mut self) -> impl sqlx::PgExecutor<'_> {
        &self.pool
    }
}

impl<'b> DatabaseAccessor for TransactionProcessor<'b> {
    fn acquire(&mut self) -> impl sqlx::PgExecutor<'_> {
        &mut *self.tx
    }
}
