//! PostgreSQLアダプター
//!
//! 全ストアポートのsqlx実装。在庫数と貸出ステータスの更新は
//! 条件付きの単一UPDATE文で行い、`rows_affected`を
//! [`crate::ports::UpdateOutcome`]に変換して返す。

mod catalog_store;
mod loan_store;
mod member_store;

pub use catalog_store::CatalogStore;
pub use loan_store::LoanStore;
pub use member_store::MemberStore;
