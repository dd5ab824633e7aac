use crate::db::repo::balance::BalanceRepo;
use crate::db::{Db, DbResult, col, map_row, map_row_opt};
use crate::models::balance::{Balance, DeltaOutcome};
use crate::models::types::UserId;
use std::sync::Arc;
use tokio_postgres::Row;

pub struct BalanceRepository {
    db: Arc<Db>,
}

impl BalanceRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

impl Balance {
    pub(crate) fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            user: col(row, "user_id")?,
            amount: col(row, "amount")?,
            created_at: col(row, "created_at")?,
            updated_at: col(row, "updated_at")?,
        })
    }
}

#[async_trait::async_trait]
impl BalanceRepo for BalanceRepository {
    async fn get(&self, user: UserId) -> DbResult<Option<Balance>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("SELECT user_id, amount, created_at, updated_at FROM balances WHERE user_id = $1")
            .await?;

        let row_opt = client.query_opt(&stmt, &[&user]).await?;
        map_row_opt(row_opt, Balance::try_from_row, &format!("BalanceRepo::get user={}", user))
    }

    async fn apply_delta(&self, user: UserId, delta: i64, floor: Option<i64>) -> DbResult<DeltaOutcome> {
        let client = self.db.get_client().await?;

        // Make sure the row exists, so the conditional UPDATE below has something to lock.
        let ensure = client
            .prepare_cached("INSERT INTO balances (user_id, amount) VALUES ($1, 0) ON CONFLICT (user_id) DO NOTHING")
            .await?;
        client.execute(&ensure, &[&user]).await?;

        // The floor check is part of the UPDATE's WHERE clause, so it is re-evaluated
        // against the latest row version when concurrent updates race.
        let stmt = client
            .prepare_cached(
                r#"
                UPDATE balances
                SET amount = amount + $2, updated_at = NOW()
                WHERE user_id = $1 AND ($3::BIGINT IS NULL OR amount + $2 >= $3::BIGINT)
                RETURNING user_id, amount, created_at, updated_at
                "#,
            )
            .await?;

        match client.query_opt(&stmt, &[&user, &delta, &floor]).await? {
            Some(row) => Ok(DeltaOutcome::Applied(map_row(
                &row,
                Balance::try_from_row,
                "BalanceRepo::apply_delta",
            )?)),
            None => {
                let current: i64 = client
                    .query_one("SELECT amount FROM balances WHERE user_id = $1", &[&user])
                    .await?
                    .get(0);
                Ok(DeltaOutcome::Rejected { current })
            }
        }
    }
}
