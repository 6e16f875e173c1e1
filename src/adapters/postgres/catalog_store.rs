use crate::domain::value_objects::{BookId, CopyCounts};
use crate::ports::UpdateOutcome;
use crate::ports::catalog_store::{Book, BookDetails, CatalogStore as CatalogStoreTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQLの行データをBookに変換する
///
/// total_copies / available_copies のi32からu32への変換と
/// CopyCountsの不変条件チェックでエラーハンドリングを行う。
/// DBのCHECK制約が守られている限りここで失敗することはない。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let total: i32 = row.get("total_copies");
    let available: i32 = row.get("available_copies");
    let copies = CopyCounts::from_parts(total as u32, available as u32).map_err(|e| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("inconsistent copy counts in storage: {e:?}"),
        )) as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Book {
        book_id: BookId::from_uuid(row.get("book_id")),
        isbn: row.get("isbn"),
        title: row.get("title"),
        author: row.get("author"),
        genre: row.get("genre"),
        publication_year: row.get("publication_year"),
        copies,
        added_date: row.get("added_date"),
    })
}

/// CatalogStoreのPostgreSQL実装
///
/// 在庫数に触れる操作はすべて条件付きの単一UPDATE文で実装する。
/// 条件の評価と書き込みは行ロックの下で不可分に行われるため、
/// アプリケーション側のread-modify-writeに伴う競合は発生しない。
pub struct CatalogStore {
    pool: PgPool,
}

impl CatalogStore {
    /// PostgreSQLコネクションプールから新しいCatalogStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOK_COLUMNS: &str = r#"
    book_id,
    isbn,
    title,
    author,
    genre,
    publication_year,
    total_copies,
    available_copies,
    added_date
"#;

#[async_trait]
impl CatalogStoreTrait for CatalogStore {
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE book_id = $1"
        ))
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY title ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    async fn search_books(&self, query: &str) -> Result<Vec<Book>> {
        let pattern = format!("%{query}%");
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books
            WHERE title ILIKE $1
               OR author ILIKE $1
               OR isbn ILIKE $1
               OR genre ILIKE $1
            ORDER BY title ASC
            "#
        ))
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    async fn insert_book(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (
                book_id,
                isbn,
                title,
                author,
                genre,
                publication_year,
                total_copies,
                available_copies,
                added_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.publication_year)
        .bind(book.copies.total() as i32)
        .bind(book.copies.available() as i32)
        .bind(book.added_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_details(
        &self,
        book_id: BookId,
        details: &BookDetails,
    ) -> Result<UpdateOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET isbn = $2,
                title = $3,
                author = $4,
                genre = $5,
                publication_year = $6
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .bind(&details.isbn)
        .bind(&details.title)
        .bind(&details.author)
        .bind(&details.genre)
        .bind(details.publication_year)
        .execute(&self.pool)
        .await?;

        Ok(UpdateOutcome::from_rows_affected(result.rows_affected()))
    }

    /// `available_copies > 0` をWHERE句に含めることで、
    /// チェックと減算を1文の不可分な更新にする
    async fn checkout_copy(&self, book_id: BookId) -> Result<UpdateOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1
            WHERE book_id = $1 AND available_copies > 0
            "#,
        )
        .bind(book_id.value())
        .execute(&self.pool)
        .await?;

        Ok(UpdateOutcome::from_rows_affected(result.rows_affected()))
    }

    async fn checkin_copy(&self, book_id: BookId) -> Result<UpdateOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1
            WHERE book_id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(book_id.value())
        .execute(&self.pool)
        .await?;

        Ok(UpdateOutcome::from_rows_affected(result.rows_affected()))
    }

    /// SET句は両方とも更新前の行の値で評価されるため、
    /// 貸出可能数は総数と同じ差分で1文内で調整される
    async fn resize_copies(&self, book_id: BookId, new_total: u32) -> Result<UpdateOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET total_copies = $2,
                available_copies = available_copies + ($2 - total_copies)
            WHERE book_id = $1
              AND $2 >= 1
              AND available_copies + ($2 - total_copies) >= 0
            "#,
        )
        .bind(book_id.value())
        .bind(new_total as i32)
        .execute(&self.pool)
        .await?;

        Ok(UpdateOutcome::from_rows_affected(result.rows_affected()))
    }

    async fn delete_book(&self, book_id: BookId) -> Result<UpdateOutcome> {
        let result = sqlx::query("DELETE FROM books WHERE book_id = $1")
            .bind(book_id.value())
            .execute(&self.pool)
            .await?;

        Ok(UpdateOutcome::from_rows_affected(result.rows_affected()))
    }

    async fn count_books(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}
