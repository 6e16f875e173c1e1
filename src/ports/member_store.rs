use crate::domain::value_objects::{MemberId, MemberStatus};
use async_trait::async_trait;
use chrono::NaiveDate;

use super::UpdateOutcome;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 会員レコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub member_id: MemberId,
    /// 会員番号（自然キー、一意）
    pub member_code: String,
    pub name: String,
    /// メールアドレス（一意）
    pub email: String,
    pub phone: Option<String>,
    pub joined_date: NaiveDate,
    pub status: MemberStatus,
}

/// Member Store port for member context operations.
///
/// The lending core only needs identity and status from this port;
/// membership management itself is a collaborator concern.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Get a member by ID.
    async fn get_member(&self, member_id: MemberId) -> Result<Option<Member>>;

    /// List all members ordered by name.
    async fn list_members(&self) -> Result<Vec<Member>>;

    /// Register a new member.
    async fn insert_member(&self, member: &Member) -> Result<()>;

    /// Update a member record (including status changes).
    async fn update_member(&self, member: &Member) -> Result<UpdateOutcome>;

    /// Delete a member.
    ///
    /// The open-loan check happens in the application layer before this call.
    async fn delete_member(&self, member_id: MemberId) -> Result<UpdateOutcome>;

    /// Total member count for the dashboard.
    async fn count_members(&self) -> Result<u64>;
}
