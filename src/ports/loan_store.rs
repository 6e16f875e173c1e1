use crate::domain::loan::{Loan, LoanStatus};
use crate::domain::value_objects::{BookId, LoanId, MemberId};
use async_trait::async_trait;
use chrono::NaiveDate;

use super::UpdateOutcome;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出一覧の絞り込み条件
///
/// すべて`None`なら全件（貸出日の降順）。
#[derive(Debug, Clone, Copy, Default)]
pub struct LoanFilter {
    pub member_id: Option<MemberId>,
    pub book_id: Option<BookId>,
    pub status: Option<LoanStatus>,
}

/// 貸出ストアポート
///
/// 貸出記録の永続化を抽象化する。記録は追記と状態遷移のみで、
/// 削除されることはない。
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// 貸出記録を新規作成する
    async fn insert_loan(&self, loan: &Loan) -> Result<()>;

    /// IDで貸出を取得する
    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 貸出を返却済みに更新する（条件付き更新）
    ///
    /// `status != 'returned'` の場合のみ適用される。
    /// 同時返却の一方は`NotApplied`を観測し、二重返却が在庫に
    /// 反映されることはない。
    async fn mark_returned(&self, loan_id: LoanId, returned_on: NaiveDate)
    -> Result<UpdateOutcome>;

    /// 延滞スイープ：期限切れのBorrowed貸出をOverdueに一括再分類する
    ///
    /// `status = 'borrowed' AND due_date < today` の全行を1文で更新する。
    /// 冪等であり、ReturnedやOverdueの行には触れない。
    /// 再分類した件数を返す。
    async fn mark_overdue_until(&self, today: NaiveDate) -> Result<u64>;

    /// 条件に合う貸出を貸出日の降順で取得する
    async fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<Loan>>;

    /// 蔵書ごとの未返却（Borrowed/Overdue）貸出数
    ///
    /// 蔵書削除前のガードに使用される。
    async fn count_open_for_book(&self, book_id: BookId) -> Result<u64>;

    /// 会員ごとの未返却貸出数
    ///
    /// 会員削除前のガードに使用される。
    async fn count_open_for_member(&self, member_id: MemberId) -> Result<u64>;

    /// ステータスごとの貸出数（ダッシュボード用）
    async fn count_by_status(&self, status: LoanStatus) -> Result<u64>;
}
