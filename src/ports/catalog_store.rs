use crate::domain::value_objects::{BookId, CopyCounts};
use async_trait::async_trait;
use chrono::NaiveDate;

use super::UpdateOutcome;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 蔵書レコード
///
/// 不変条件：`copies.available == copies.total - 未返却貸出数`。
/// 冊数の更新は必ず台帳（InventoryLedger）経由で行われ、
/// このストアの条件付き更新メソッド以外が冊数を書き換えることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub book_id: BookId,
    /// ISBN（自然キー、一意）
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    pub copies: CopyCounts,
    pub added_date: NaiveDate,
}

/// 書誌情報の更新内容（冊数は含まない）
///
/// 冊数の変更は`resize_copies`に分離されており、
/// 書誌編集が在庫不変条件に触れることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetails {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
}

/// 蔵書カタログストアポート
///
/// カタログは外部コラボレーターであり、コアはこのポート越しにのみ
/// 蔵書を読み書きする。在庫数に触れる3つの操作
/// （checkout_copy / checkin_copy / resize_copies）は
/// ストレージ層でアトミックな条件付き更新として実装されなければならない。
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// IDで蔵書を取得する
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 全蔵書をタイトル順で取得する
    async fn list_books(&self) -> Result<Vec<Book>>;

    /// タイトル・著者・ISBN・ジャンルの部分一致で蔵書を検索する
    async fn search_books(&self, query: &str) -> Result<Vec<Book>>;

    /// 蔵書を新規登録する
    async fn insert_book(&self, book: &Book) -> Result<()>;

    /// 書誌情報を更新する（冊数は対象外）
    async fn update_details(&self, book_id: BookId, details: &BookDetails)
    -> Result<UpdateOutcome>;

    /// 1冊の貸出可能数を減らす（条件付き更新）
    ///
    /// `available_copies > 0` の場合のみ適用される。
    /// チェックと書き込みは1つの不可分な操作であり、同じ蔵書への
    /// 同時実行は最後の1冊を重複して貸し出せない。
    async fn checkout_copy(&self, book_id: BookId) -> Result<UpdateOutcome>;

    /// 1冊の貸出可能数を増やす（条件付き更新）
    ///
    /// `available_copies < total_copies` の場合のみ適用される。
    /// 総数を超える増加（二重返却の兆候）は適用されない。
    async fn checkin_copy(&self, book_id: BookId) -> Result<UpdateOutcome>;

    /// 総冊数を変更し、貸出可能数を同じ差分で調整する（条件付き更新）
    ///
    /// 貸出中の冊数が新しい総数を超える場合は適用されない
    /// （編集の拒否。暗黙の切り捨てはしない）。
    async fn resize_copies(&self, book_id: BookId, new_total: u32) -> Result<UpdateOutcome>;

    /// 蔵書を削除する
    ///
    /// 未返却貸出の有無チェックは呼び出し側（アプリケーション層）の責務。
    async fn delete_book(&self, book_id: BookId) -> Result<UpdateOutcome>;

    /// 蔵書の総数（ダッシュボード用）
    async fn count_books(&self) -> Result<u64>;
}
