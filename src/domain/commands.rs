use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, MemberId};

/// コマンド：書籍を貸し出す
///
/// `issued_on`は呼び出し側が与える「今日」。コアは時計を持たない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLoan {
    pub book_id: BookId,
    pub member_id: MemberId,
    pub issued_on: NaiveDate,
    pub due_date: NaiveDate,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub returned_on: NaiveDate,
}
