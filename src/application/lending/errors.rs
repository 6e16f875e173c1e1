use thiserror::Error;

/// 貸出・在庫管理アプリケーション層のエラー
///
/// バリデーション系のエラー（NotFound、BookUnavailableなど）は
/// 呼び出し側に返される想定内の結果であり、握りつぶされることはない。
/// `InvariantViolation`だけは上流のバグを示すシグナルで、
/// ログに記録した上で内部エラーとして区別して扱われる。
#[derive(Debug, Error)]
pub enum LendingError {
    /// 蔵書が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 会員が存在しない
    #[error("Member not found")]
    MemberNotFound,

    /// 貸出が見つからない
    #[error("Loan not found")]
    LoanNotFound,

    /// 貸出可能な冊数がない
    #[error("No copies available for loan")]
    BookUnavailable,

    /// 会員が利用停止中
    #[error("Member is suspended")]
    MemberSuspended,

    /// 返却期限が貸出日より前
    #[error("Due date must not be before the borrow date")]
    InvalidDueDate,

    /// 既に返却済み（操作は何も変更しなかった）
    #[error("Loan has already been returned")]
    AlreadyReturned,

    /// 未返却の貸出が残っているため削除できない
    #[error("Open loans still reference this record")]
    HasOpenLoans,

    /// 総冊数の変更が在庫不変条件を満たさない
    #[error("Copy count is invalid for the current loans")]
    InvalidCopyCount,

    /// 在庫不変条件が破られかけた（上流のバグを示す）
    #[error("Inventory invariant violated: {0}")]
    InvariantViolation(String),

    /// CatalogStoreのエラー
    #[error("Catalog store error")]
    CatalogStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// MemberStoreのエラー
    #[error("Member store error")]
    MemberStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// LoanStoreのエラー
    #[error("Loan store error")]
    LoanStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LendingError>;
