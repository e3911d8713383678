use sqlx::PgPool;

/// Runs the SQL query structs in [`crate::entities`] against a pool.
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
