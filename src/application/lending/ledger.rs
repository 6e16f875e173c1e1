//! 在庫台帳（Inventory Ledger）
//!
//! `available_copies`の増減をすべて引き受ける唯一のモジュール。
//! チェックと書き込みの不可分性はストアの条件付き更新
//! （`UPDATE ... WHERE available_copies > 0` 等）が保証するため、
//! ここでは適用されなかった更新の解釈だけを行う：
//!
//! - 事前読み取りで前提を検証し、型付きエラーに変換する
//! - 読み取りと書き込みの間に前提が変わって条件付き更新が
//!   適用されなかった場合は、新しい読み取りで1回だけ再試行する
//! - 再試行後も適用されなければ、前提違反として呼び出し側に返す

use crate::domain::value_objects::BookId;
use crate::ports::{CatalogStore, UpdateOutcome};
use std::sync::Arc;

use super::errors::{LendingError, Result};

/// 貸出可能数を減らす
///
/// 事前条件：蔵書が存在し、`available_copies > 0`。
/// 条件を満たさない場合は`BookUnavailable`。最後の1冊を同時に
/// 取り合った敗者もここで`BookUnavailable`に落ちる。
pub(super) async fn decrement_available(
    catalog_store: &Arc<dyn CatalogStore>,
    book_id: BookId,
) -> Result<()> {
    let mut retried = false;
    loop {
        let book = catalog_store
            .get_book(book_id)
            .await
            .map_err(LendingError::CatalogStoreError)?
            .ok_or(LendingError::BookNotFound)?;

        if book.copies.available() == 0 {
            return Err(LendingError::BookUnavailable);
        }

        let outcome = catalog_store
            .checkout_copy(book_id)
            .await
            .map_err(LendingError::CatalogStoreError)?;

        match outcome {
            UpdateOutcome::Applied => return Ok(()),
            UpdateOutcome::NotApplied if !retried => {
                // 読み取りと書き込みの間に別の貸出が先行した。
                // 新しい読み取りで1回だけやり直す。
                tracing::debug!(book_id = %book_id.value(), "checkout lost a race, retrying once");
                retried = true;
            }
            UpdateOutcome::NotApplied => return Err(LendingError::BookUnavailable),
        }
    }
}

/// 貸出可能数を増やす
///
/// 事前条件：蔵書が存在し、`available_copies < total_copies`。
/// 総数を超える増加は二重返却など上流のバグを意味するため、
/// `InvariantViolation`としてログに記録した上で返す。
pub(super) async fn increment_available(
    catalog_store: &Arc<dyn CatalogStore>,
    book_id: BookId,
) -> Result<()> {
    let mut retried = false;
    loop {
        let book = catalog_store
            .get_book(book_id)
            .await
            .map_err(LendingError::CatalogStoreError)?
            .ok_or(LendingError::BookNotFound)?;

        if book.copies.available() >= book.copies.total() {
            let msg = format!(
                "return would exceed total copies for book {}",
                book_id.value()
            );
            tracing::error!("{}", msg);
            return Err(LendingError::InvariantViolation(msg));
        }

        let outcome = catalog_store
            .checkin_copy(book_id)
            .await
            .map_err(LendingError::CatalogStoreError)?;

        match outcome {
            UpdateOutcome::Applied => return Ok(()),
            UpdateOutcome::NotApplied if !retried => {
                tracing::debug!(book_id = %book_id.value(), "checkin lost a race, retrying once");
                retried = true;
            }
            UpdateOutcome::NotApplied => {
                let msg = format!(
                    "conditional checkin failed twice for book {}",
                    book_id.value()
                );
                tracing::error!("{}", msg);
                return Err(LendingError::InvariantViolation(msg));
            }
        }
    }
}

/// 総冊数を変更する
///
/// 貸出可能数も同じ差分で調整される（ストアの条件付き更新）。
/// 貸出中の冊数が新しい総数を超える編集は`InvalidCopyCount`で拒否する。
/// 暗黙の切り捨ては行わない。
pub(super) async fn set_total_copies(
    catalog_store: &Arc<dyn CatalogStore>,
    book_id: BookId,
    new_total: u32,
) -> Result<()> {
    let mut retried = false;
    loop {
        let book = catalog_store
            .get_book(book_id)
            .await
            .map_err(LendingError::CatalogStoreError)?
            .ok_or(LendingError::BookNotFound)?;

        // 事前検証。ストア側の条件付き更新と同じ規則を適用する。
        if book.copies.resize(new_total).is_err() {
            return Err(LendingError::InvalidCopyCount);
        }

        let outcome = catalog_store
            .resize_copies(book_id, new_total)
            .await
            .map_err(LendingError::CatalogStoreError)?;

        match outcome {
            UpdateOutcome::Applied => return Ok(()),
            UpdateOutcome::NotApplied if !retried => {
                tracing::debug!(book_id = %book_id.value(), "resize lost a race, retrying once");
                retried = true;
            }
            UpdateOutcome::NotApplied => return Err(LendingError::InvalidCopyCount),
        }
    }
}
