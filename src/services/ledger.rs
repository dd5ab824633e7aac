use crate::config::SettingsHandle;
use crate::db::repo::BalanceRepo;
use crate::error::{AppResult, DomainError};
use crate::models::balance::{Balance, DeltaOutcome};
use crate::models::types::UserId;
use crate::util::retry::RetryPolicy;
use std::sync::Arc;

/// Currency balances. Every mutation is a single atomic store operation;
/// nothing is cached in process.
pub struct LedgerService {
    repo: Arc<dyn BalanceRepo>,
    settings: SettingsHandle,
    retry: RetryPolicy,
}

impl LedgerService {
    pub fn new(repo: Arc<dyn BalanceRepo>, settings: SettingsHandle, retry: RetryPolicy) -> Self {
        Self { repo, settings, retry }
    }

    /// Current balance, 0 for users we have never seen
    pub async fn get(&self, user: UserId) -> AppResult<i64> {
        let balance = self.retry.run("balance.get", || self.repo.get(user)).await?;
        Ok(balance.map(|b| b.amount).unwrap_or(0))
    }

    pub async fn credit(&self, user: UserId, amount: i64) -> AppResult<Balance> {
        check_amount(amount)?;
        match self.apply(user, amount, None).await? {
            DeltaOutcome::Applied(balance) => Ok(balance),
            DeltaOutcome::Rejected { .. } => Err(DomainError::InternalError(
                "credit rejected without a floor".into(),
            )),
        }
    }

    /// Fails with `InsufficientBalance` when the debit would go below the floor.
    pub async fn debit(&self, user: UserId, amount: i64) -> AppResult<Balance> {
        check_amount(amount)?;
        let floor = self.settings.snapshot().balance_floor;
        match self.apply(user, -amount, Some(floor)).await? {
            DeltaOutcome::Applied(balance) => Ok(balance),
            DeltaOutcome::Rejected { current } => Err(DomainError::InsufficientBalance {
                have: current,
                need: amount,
            }),
        }
    }

    /// Moves `amount` from one user to another. The debit goes first; when the
    /// credit fails afterwards the debit is undone.
    pub async fn transfer(&self, from: UserId, to: UserId, amount: i64) -> AppResult<(Balance, Balance)> {
        if from == to {
            return Err(DomainError::Validation {
                field: "user",
                message: "cannot pay yourself".into(),
            });
        }

        let debited = self.debit(from, amount).await?;
        match self.credit(to, amount).await {
            Ok(credited) => {
                tracing::info!(from = %from, to = %to, amount, "transfer done");
                Ok((debited, credited))
            }
            Err(e) => {
                if let Err(undo) = self.apply(from, amount, None).await {
                    tracing::error!(user = %from, amount, error = %undo, "failed to refund debit after failed transfer");
                }
                Err(e)
            }
        }
    }

    async fn apply(&self, user: UserId, delta: i64, floor: Option<i64>) -> AppResult<DeltaOutcome> {
        let outcome = self
            .retry
            .run("balance.apply_delta", || self.repo.apply_delta(user, delta, floor))
            .await?;
        Ok(outcome)
    }
}

fn check_amount(amount: i64) -> AppResult<()> {
    if amount <= 0 {
        return Err(DomainError::Validation {
            field: "amount",
            message: "amount must be positive".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameSettings;
    use crate::db::repo::MemoryStore;

    fn ledger() -> LedgerService {
        LedgerService::new(
            Arc::new(MemoryStore::new()),
            SettingsHandle::new(GameSettings::default()),
            RetryPolicy::none(),
        )
    }

    #[tokio::test]
    async fn unknown_user_has_zero() {
        assert_eq!(ledger().get(UserId(99)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn debit_below_floor_is_rejected() {
        let ledger = ledger();
        ledger.credit(UserId(1), 30).await.unwrap();

        let err = ledger.debit(UserId(1), 50).await.unwrap_err();
        assert!(matches!(err, DomainError::InsufficientBalance { have: 30, need: 50 }));
        assert_eq!(ledger.get(UserId(1)).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn transfer_moves_funds() {
        let ledger = ledger();
        ledger.credit(UserId(1), 100).await.unwrap();

        let (from, to) = ledger.transfer(UserId(1), UserId(2), 40).await.unwrap();
        assert_eq!(from.amount, 60);
        assert_eq!(to.amount, 40);

        assert!(ledger.transfer(UserId(2), UserId(2), 1).await.is_err());
        assert!(ledger.credit(UserId(2), 0).await.is_err());
    }
}
