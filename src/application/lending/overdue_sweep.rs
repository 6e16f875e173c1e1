use chrono::NaiveDate;

use super::errors::{LendingError, Result};
use super::lending_service::ServiceDependencies;

/// 延滞スイープ
///
/// `status = Borrowed` かつ `due_date < today` の貸出を
/// Overdueに一括再分類する。1文の集合更新としてストアに委譲する。
///
/// 性質：
/// - 冪等：同じ日に何度実行しても結果は変わらない
/// - 単調：OverdueからBorrowedへ戻す書き込みはしない
///   （Overdueを抜けるのは`return_loan`だけ）
/// - Returnedの貸出には期限に関係なく触れない
///
/// 一覧・集計のどの読み取りよりも先に実行されるため、
/// 表示されるステータスの鮮度はスイープの呼び出し粒度に一致する。
///
/// # 戻り値
/// 再分類した貸出の件数
pub async fn run_overdue_sweep(deps: &ServiceDependencies, today: NaiveDate) -> Result<u64> {
    let reclassified = deps
        .loan_store
        .mark_overdue_until(today)
        .await
        .map_err(LendingError::LoanStoreError)?;

    if reclassified > 0 {
        tracing::info!(count = reclassified, %today, "loans reclassified as overdue");
    }

    Ok(reclassified)
}
