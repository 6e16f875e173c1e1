use crate::domain::loan::{Loan, LoanStatus};
use crate::domain::value_objects::{BookId, LoanId, MemberId};
use crate::ports::UpdateOutcome;
use crate::ports::loan_store::{LoanFilter, LoanStore as LoanStoreTrait, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use std::str::FromStr;

fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let status_str: &str = row.get("status");
    let status = LoanStatus::from_str(status_str).map_err(|e| {
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Loan {
        loan_id: LoanId::from_uuid(row.get("loan_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        member_id: MemberId::from_uuid(row.get("member_id")),
        borrow_date: row.get("borrow_date"),
        due_date: row.get("due_date"),
        return_date: row.get("return_date"),
        status,
    })
}

/// LoanStoreのPostgreSQL実装
///
/// 返却と延滞スイープは条件付きの単一UPDATE文で実装し、
/// 同時返却の二重適用とスイープの重複再分類を排除する。
pub struct LoanStore {
    pool: PgPool,
}

impl LoanStore {
    /// PostgreSQLコネクションプールから新しいLoanStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn insert_loan(&self, loan: &Loan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                book_id,
                member_id,
                borrow_date,
                due_date,
                return_date,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.book_id.value())
        .bind(loan.member_id.value())
        .bind(loan.borrow_date)
        .bind(loan.due_date)
        .bind(loan.return_date)
        .bind(loan.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT loan_id, book_id, member_id, borrow_date, due_date, return_date, status
            FROM loans
            WHERE loan_id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    /// `status <> 'returned'` をWHERE句に含めることで、
    /// 同時返却の一方だけが適用される
    async fn mark_returned(
        &self,
        loan_id: LoanId,
        returned_on: NaiveDate,
    ) -> Result<UpdateOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = 'returned',
                return_date = $2
            WHERE loan_id = $1 AND status <> 'returned'
            "#,
        )
        .bind(loan_id.value())
        .bind(returned_on)
        .execute(&self.pool)
        .await?;

        Ok(UpdateOutcome::from_rows_affected(result.rows_affected()))
    }

    /// (status, due_date)の部分インデックスを使用する集合更新。
    /// Borrowedの行だけが対象なので冪等
    async fn mark_overdue_until(&self, today: NaiveDate) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = 'overdue'
            WHERE status = 'borrowed' AND due_date < $1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<Loan>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT loan_id, book_id, member_id, borrow_date, due_date, return_date, status
            FROM loans
            WHERE TRUE
            "#,
        );

        if let Some(member_id) = filter.member_id {
            builder.push(" AND member_id = ");
            builder.push_bind(member_id.value());
        }
        if let Some(book_id) = filter.book_id {
            builder.push(" AND book_id = ");
            builder.push_bind(book_id.value());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
        builder.push(" ORDER BY borrow_date DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn count_open_for_book(&self, book_id: BookId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM loans
            WHERE book_id = $1 AND status IN ('borrowed', 'overdue')
            "#,
        )
        .bind(book_id.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }

    async fn count_open_for_member(&self, member_id: MemberId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM loans
            WHERE member_id = $1 AND status IN ('borrowed', 'overdue')
            "#,
        )
        .bind(member_id.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }

    async fn count_by_status(&self, status: LoanStatus) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}
