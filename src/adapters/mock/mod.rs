//! インメモリアダプター
//!
//! 全ストアポートのMutexベース実装。統合テストとDBなしの
//! ローカル起動で使用する。条件付き更新の意味論は
//! PostgreSQL実装と等価になるよう、チェックと書き込みを
//! 同一ロック内で行う。

mod catalog_store;
mod loan_store;
mod member_store;

pub use catalog_store::CatalogStore;
pub use loan_store::LoanStore;
pub use member_store::MemberStore;
