use crate::application::lending::LendingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(LendingError);

impl From<LendingError> for ApiError {
    fn from(err: LendingError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self.0 {
            // 404 Not Found - リクエストされたリソースが存在しない
            LendingError::BookNotFound => {
                (StatusCode::NOT_FOUND, "BOOK_NOT_FOUND", "Book not found")
            }
            LendingError::MemberNotFound => (
                StatusCode::NOT_FOUND,
                "MEMBER_NOT_FOUND",
                "Member not found",
            ),
            LendingError::LoanNotFound => {
                (StatusCode::NOT_FOUND, "LOAN_NOT_FOUND", "Loan not found")
            }

            // 422 Unprocessable Entity - ビジネスルール違反
            LendingError::BookUnavailable => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BOOK_UNAVAILABLE",
                "No copies of this book are available",
            ),
            LendingError::MemberSuspended => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MEMBER_SUSPENDED",
                "Member is suspended and cannot borrow books",
            ),
            LendingError::InvalidDueDate => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_DUE_DATE",
                "Due date must not be before the borrow date",
            ),
            LendingError::HasOpenLoans => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "HAS_OPEN_LOANS",
                "Cannot delete while open loans reference this record",
            ),
            LendingError::InvalidCopyCount => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_COPY_COUNT",
                "Copy count must be at least 1 and not below the number on loan",
            ),

            // 409 Conflict - 既に返却済み
            LendingError::AlreadyReturned => (
                StatusCode::CONFLICT,
                "ALREADY_RETURNED",
                "Loan has already been returned",
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            LendingError::InvariantViolation(ref msg) => {
                tracing::error!("Inventory invariant violation: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INVARIANT_VIOLATION",
                    "Inventory state is inconsistent",
                )
            }
            LendingError::CatalogStoreError(ref e) => {
                tracing::error!("Catalog store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CATALOG_STORE_ERROR",
                    "Catalog store error",
                )
            }
            LendingError::MemberStoreError(ref e) => {
                tracing::error!("Member store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MEMBER_STORE_ERROR",
                    "Member store error",
                )
            }
            LendingError::LoanStoreError(ref e) => {
                tracing::error!("Loan store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LOAN_STORE_ERROR",
                    "Loan store error",
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
