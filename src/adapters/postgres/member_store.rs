use crate::domain::value_objects::{MemberId, MemberStatus};
use crate::ports::UpdateOutcome;
use crate::ports::member_store::{Member, MemberStore as MemberStoreTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

fn map_row_to_member(row: &PgRow) -> Result<Member> {
    let status_str: &str = row.get("status");
    let status = MemberStatus::from_str(status_str).map_err(|e| {
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Member {
        member_id: MemberId::from_uuid(row.get("member_id")),
        member_code: row.get("member_code"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        joined_date: row.get("joined_date"),
        status,
    })
}

/// MemberStoreのPostgreSQL実装
pub struct MemberStore {
    pool: PgPool,
}

impl MemberStore {
    /// PostgreSQLコネクションプールから新しいMemberStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MEMBER_COLUMNS: &str = r#"
    member_id,
    member_code,
    name,
    email,
    phone,
    joined_date,
    status
"#;

#[async_trait]
impl MemberStoreTrait for MemberStore {
    async fn get_member(&self, member_id: MemberId) -> Result<Option<Member>> {
        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = $1"
        ))
        .bind(member_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_member).transpose()
    }

    async fn list_members(&self) -> Result<Vec<Member>> {
        let rows = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_member).collect()
    }

    async fn insert_member(&self, member: &Member) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO members (
                member_id,
                member_code,
                name,
                email,
                phone,
                joined_date,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(member.member_id.value())
        .bind(&member.member_code)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(member.joined_date)
        .bind(member.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_member(&self, member: &Member) -> Result<UpdateOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET member_code = $2,
                name = $3,
                email = $4,
                phone = $5,
                status = $6
            WHERE member_id = $1
            "#,
        )
        .bind(member.member_id.value())
        .bind(&member.member_code)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(member.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(UpdateOutcome::from_rows_affected(result.rows_affected()))
    }

    async fn delete_member(&self, member_id: MemberId) -> Result<UpdateOutcome> {
        let result = sqlx::query("DELETE FROM members WHERE member_id = $1")
            .bind(member_id.value())
            .execute(&self.pool)
            .await?;

        Ok(UpdateOutcome::from_rows_affected(result.rows_affected()))
    }

    async fn count_members(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}
