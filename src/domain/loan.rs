use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookId, IssueLoanError, LoanId, MemberId, ReturnLoanError};

/// 貸出ステータス
///
/// 状態遷移：
/// - Borrowed → Returned（返却）
/// - Borrowed → Overdue（スイープによる再分類）
/// - Overdue → Returned（返却）
///
/// Returnedは終端状態。OverdueからBorrowedに戻る遷移はない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Borrowed,
    Overdue,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
        }
    }

    pub fn is_returned(&self) -> bool {
        matches!(self, LoanStatus::Returned)
    }

    /// 未返却（Borrowed または Overdue）
    pub fn is_open(&self) -> bool {
        !self.is_returned()
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(LoanStatus::Borrowed),
            "overdue" => Ok(LoanStatus::Overdue),
            "returned" => Ok(LoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// Loan集約 - 1冊の書籍の1回の貸出
///
/// 不変条件：`status == Returned` と `return_date.is_some()` は同値。
/// 貸出記録は削除されず、状態遷移のみが行われる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ）
    pub book_id: BookId,
    pub member_id: MemberId,

    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

/// 純粋関数：貸出を作成する
///
/// ビジネスルール：
/// - 返却期限は貸出日以降であること
/// - 初期状態はBorrowed
///
/// 副作用なし。在庫や会員の検証はアプリケーション層の責務。
pub fn issue_loan(
    book_id: BookId,
    member_id: MemberId,
    borrow_date: NaiveDate,
    due_date: NaiveDate,
) -> Result<Loan, IssueLoanError> {
    if due_date < borrow_date {
        return Err(IssueLoanError::InvalidDueDate);
    }

    Ok(Loan {
        loan_id: LoanId::new(),
        book_id,
        member_id,
        borrow_date,
        due_date,
        return_date: None,
        status: LoanStatus::Borrowed,
    })
}

/// 純粋関数：貸出を返却済みにする
///
/// ビジネスルール：
/// - 延滞していても返却は受け付ける
/// - 既に返却済みの貸出は受け付けない（呼び出し側に明示的に報告する）
///
/// 副作用なし。新しいLoanを返す。
pub fn mark_returned(loan: &Loan, returned_on: NaiveDate) -> Result<Loan, ReturnLoanError> {
    if loan.status.is_returned() {
        return Err(ReturnLoanError::AlreadyReturned);
    }

    Ok(Loan {
        return_date: Some(returned_on),
        status: LoanStatus::Returned,
        ..loan.clone()
    })
}

/// 純粋関数：延滞判定
///
/// 未返却かつ返却期限が当日より前の場合に延滞とみなす。
/// 期限当日はまだ延滞ではない。
pub fn is_overdue(loan: &Loan, today: NaiveDate) -> bool {
    loan.status.is_open() && loan.due_date < today
}

/// 純粋関数：延滞への再分類
///
/// Borrowedかつ期限切れの場合のみ、Overdueに遷移した新しいLoanを返す。
/// それ以外（既にOverdue、Returned、期限内）は`None`（変更不要）。
/// スイープが冪等になるのはこの関数が冪等であるため。
pub fn classify_overdue(loan: &Loan, today: NaiveDate) -> Option<Loan> {
    match loan.status {
        LoanStatus::Borrowed if loan.due_date < today => Some(Loan {
            status: LoanStatus::Overdue,
            ..loan.clone()
        }),
        _ => None,
    }
}
