use crate::db::DbResult;
use crate::models::balance::{Balance, DeltaOutcome};
use crate::models::types::UserId;

#[async_trait::async_trait]
pub trait BalanceRepo: Send + Sync {
    async fn get(&self, user: UserId) -> DbResult<Option<Balance>>;

    /// Adds `delta` to the user's balance, creating the record on first use.
    ///
    /// When `floor` is set and the new amount would be below it, nothing is
    /// written and `Rejected` is returned. The check and the write are one
    /// atomic step with respect to other callers on the same user.
    async fn apply_delta(&self, user: UserId, delta: i64, floor: Option<i64>) -> DbResult<DeltaOutcome>;
}
