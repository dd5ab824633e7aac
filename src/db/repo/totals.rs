use crate::db::DbResult;
use crate::models::totals::{GroupTotal, UserTotal};
use crate::models::types::{ChatId, UserId};

#[async_trait::async_trait]
pub trait TotalsRepo: Send + Sync {
    async fn bump_user(&self, user: UserId, display_name: Option<&str>, by: i64) -> DbResult<UserTotal>;

    async fn bump_group(&self, chat: ChatId, user: UserId, display_name: Option<&str>, by: i64)
    -> DbResult<GroupTotal>;

    async fn top_users(&self, limit: i64) -> DbResult<Vec<UserTotal>>;

    async fn top_in_group(&self, chat: ChatId, limit: i64) -> DbResult<Vec<GroupTotal>>;
}
