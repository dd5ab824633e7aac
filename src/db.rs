use crate::db::error::DbError;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

mod migrations;
mod pool;

pub mod error;
pub mod repo;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Clone, Debug)]
pub struct Db {
    pub(crate) pool: Pool,
}

impl Db {
    pub async fn get_client(&self) -> DbResult<deadpool_postgres::Client> {
        Ok(self.pool.get().await?)
    }
}

pub fn map_row<T, F>(row: &Row, f: F, ctx: &str) -> DbResult<T>
where
    F: FnOnce(&Row) -> DbResult<T>,
{
    match f(row) {
        Ok(v) => Ok(v),
        Err(e) => {
            tracing::error!(error = %e, context = %ctx, "row mapping failed");
            Err(e)
        }
    }
}

pub fn map_row_opt<T, F>(row_opt: Option<Row>, f: F, ctx: &str) -> DbResult<Option<T>>
where
    F: FnOnce(&Row) -> DbResult<T>,
{
    match row_opt {
        Some(row) => map_row(&row, f, ctx).map(Some),
        None => Ok(None),
    }
}

/// `row.try_get` with the column name in the error.
pub(crate) fn col<'a, T>(row: &'a Row, name: &str) -> DbResult<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name)
        .map_err(|e| DbError::Decode(format!("column {name}: {e}")))
}
