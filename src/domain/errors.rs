/// 冊数操作のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyCountError {
    /// 貸出可能な冊数が残っていない
    OutOfCopies,
    /// 返却により貸出可能数が総数を超える（二重返却の兆候）
    ExceedsTotal,
    /// 総数が0、または貸出中の冊数を下回る
    InvalidTotal,
}

/// 貸出作成のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueLoanError {
    /// 返却期限が貸出日より前
    InvalidDueDate,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnLoanError {
    /// 既に返却済み
    AlreadyReturned,
}
