//! 図書館の貸出・在庫整合性エンジン
//!
//! ヘキサゴナルアーキテクチャで構成される:
//! - `domain`: 純粋なドメインモデル（貸出の状態機械と冊数の値オブジェクト）
//! - `ports`: ストアの抽象（カタログ・会員・貸出）
//! - `application`: ユースケース（貸出・返却・延滞スイープ・台帳）
//! - `adapters`: PostgreSQLとインメモリのストア実装
//! - `api`: axumベースのHTTPインターフェース

pub mod adapters;
pub mod api;
pub mod application;
pub mod domain;
pub mod ports;
