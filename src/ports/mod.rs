pub mod catalog_store;
pub mod loan_store;
pub mod member_store;

pub use catalog_store::*;
pub use loan_store::*;
pub use member_store::*;

/// 条件付き単一行更新の結果
///
/// ストレージ層で「チェックと書き込み」を1文で行う更新
/// （例：`UPDATE ... WHERE available_copies > 0`）が、
/// 実際に行へ適用されたかどうかを表す。
/// `NotApplied`は対象行が存在しないか、条件を満たさなかったことを意味する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    NotApplied,
}

impl UpdateOutcome {
    /// `rows_affected`からの変換
    pub fn from_rows_affected(rows: u64) -> Self {
        if rows > 0 {
            UpdateOutcome::Applied
        } else {
            UpdateOutcome::NotApplied
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied)
    }
}
