use crate::domain::{self, commands::*, loan::Loan, value_objects::MemberStatus};
use crate::ports::*;
use chrono::NaiveDate;
use std::sync::Arc;

use super::errors::{LendingError, Result};
use super::{ledger, overdue_sweep};

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
/// すべての変更はこの3つのポート経由で行われ、
/// `available_copies`・`status`・`return_date`を直接書き換える
/// コンポーネントは他に存在しない。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub catalog_store: Arc<dyn CatalogStore>,
    pub member_store: Arc<dyn MemberStore>,
    pub loan_store: Arc<dyn LoanStore>,
}

/// ダッシュボード用の集計値
///
/// 元の管理画面の4枚のカード（蔵書・会員・貸出中・延滞）に対応する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_books: u64,
    pub total_members: u64,
    pub borrowed_loans: u64,
    pub overdue_loans: u64,
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 会員が存在し、Activeであること
/// - 蔵書が存在し、貸出可能数が1以上であること
/// - 返却期限が貸出日以降であること
///
/// all-or-nothing：どの検証に失敗しても貸出記録は作られず、
/// 台帳も変更されない。台帳の減算後に記録の保存が失敗した場合は
/// 補償として減算を取り消す。
///
/// # 戻り値
/// 成功時は作成された貸出（状態はBorrowed）
pub async fn issue_loan(deps: &ServiceDependencies, cmd: IssueLoan) -> Result<Loan> {
    // 1. 会員の存在とステータスの確認
    let member = deps
        .member_store
        .get_member(cmd.member_id)
        .await
        .map_err(LendingError::MemberStoreError)?
        .ok_or(LendingError::MemberNotFound)?;

    if member.status == MemberStatus::Suspended {
        return Err(LendingError::MemberSuspended);
    }

    // 2. ドメイン層の純粋関数で貸出を作成（期限の検証を含む）
    //    台帳に触れる前に行うことで、失敗時に在庫が変わらないことを保証する
    let loan = domain::loan::issue_loan(cmd.book_id, cmd.member_id, cmd.issued_on, cmd.due_date)
        .map_err(|_| LendingError::InvalidDueDate)?;

    // 3. 台帳から1冊確保する（蔵書の存在確認と在庫チェックを兼ねる）
    ledger::decrement_available(&deps.catalog_store, cmd.book_id).await?;

    // 4. 貸出記録を保存。失敗したら確保した1冊を台帳に戻す
    if let Err(e) = deps.loan_store.insert_loan(&loan).await {
        if let Err(comp) = ledger::increment_available(&deps.catalog_store, cmd.book_id).await {
            tracing::error!(
                book_id = %cmd.book_id.value(),
                error = %comp,
                "failed to compensate ledger after loan insert failure"
            );
        }
        return Err(LendingError::LoanStoreError(e));
    }

    tracing::info!(
        loan_id = %loan.loan_id.value(),
        book_id = %cmd.book_id.value(),
        member_id = %cmd.member_id.value(),
        due_date = %cmd.due_date,
        "loan issued"
    );

    Ok(loan)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 既に返却済みでないこと（`AlreadyReturned`として明示的に報告する）
/// - 延滞していても返却は受け付ける
///
/// # 戻り値
/// 成功時は返却済みに遷移した貸出
pub async fn return_loan(deps: &ServiceDependencies, cmd: ReturnLoan) -> Result<Loan> {
    // 1. 貸出の取得
    let loan = deps
        .loan_store
        .get_loan(cmd.loan_id)
        .await
        .map_err(LendingError::LoanStoreError)?
        .ok_or(LendingError::LoanNotFound)?;

    // 2. ドメイン層の純粋関数で遷移（AlreadyReturnedの検証を含む）
    let returned = domain::loan::mark_returned(&loan, cmd.returned_on)
        .map_err(|_| LendingError::AlreadyReturned)?;

    // 3. 条件付き更新で永続化。適用されなければ同時返却に敗れたので、
    //    台帳には触れずにAlreadyReturnedを報告する
    let outcome = deps
        .loan_store
        .mark_returned(cmd.loan_id, cmd.returned_on)
        .await
        .map_err(LendingError::LoanStoreError)?;

    if !outcome.is_applied() {
        return Err(LendingError::AlreadyReturned);
    }

    // 4. 台帳に1冊返す
    ledger::increment_available(&deps.catalog_store, loan.book_id).await?;

    tracing::info!(
        loan_id = %cmd.loan_id.value(),
        book_id = %loan.book_id.value(),
        returned_on = %cmd.returned_on,
        "loan returned"
    );

    Ok(returned)
}

/// 貸出一覧を取得する
///
/// 表示されるステータスが日付に対して古くならないよう、
/// 一覧の読み取りの前に必ず延滞スイープを実行する。
pub async fn list_loans(
    deps: &ServiceDependencies,
    filter: &LoanFilter,
    today: NaiveDate,
) -> Result<Vec<Loan>> {
    overdue_sweep::run_overdue_sweep(deps, today).await?;

    deps.loan_store
        .list_loans(filter)
        .await
        .map_err(LendingError::LoanStoreError)
}

/// IDで貸出を取得する
pub async fn get_loan(deps: &ServiceDependencies, loan_id: crate::domain::LoanId) -> Result<Loan> {
    deps.loan_store
        .get_loan(loan_id)
        .await
        .map_err(LendingError::LoanStoreError)?
        .ok_or(LendingError::LoanNotFound)
}

/// ダッシュボード用の集計を取得する
///
/// 集計の前に延滞スイープを実行し、貸出中・延滞の件数が
/// 当日の日付を反映していることを保証する。
pub async fn dashboard_summary(
    deps: &ServiceDependencies,
    today: NaiveDate,
) -> Result<DashboardSummary> {
    overdue_sweep::run_overdue_sweep(deps, today).await?;

    let total_books = deps
        .catalog_store
        .count_books()
        .await
        .map_err(LendingError::CatalogStoreError)?;
    let total_members = deps
        .member_store
        .count_members()
        .await
        .map_err(LendingError::MemberStoreError)?;
    let borrowed_loans = deps
        .loan_store
        .count_by_status(domain::LoanStatus::Borrowed)
        .await
        .map_err(LendingError::LoanStoreError)?;
    let overdue_loans = deps
        .loan_store
        .count_by_status(domain::LoanStatus::Overdue)
        .await
        .map_err(LendingError::LoanStoreError)?;

    Ok(DashboardSummary {
        total_books,
        total_members,
        borrowed_loans,
        overdue_loans,
    })
}
