use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_book, create_loan, create_member, delete_book, delete_member, get_book_by_id,
    get_loan_by_id, get_member_by_id, get_summary, list_books, list_loans, list_members,
    return_loan, set_book_copies, sweep_overdue, update_book, update_member,
};

/// Creates the API router with all circulation endpoints
///
/// Loan endpoints:
/// - POST /loans - Issue a new loan
/// - POST /loans/:id/return - Return a book
/// - POST /loans/sweep - Reclassify overdue loans
/// - GET /loans - List loans with filters
/// - GET /loans/:id - Get loan details
///
/// Catalog and member maintenance:
/// - POST/GET/PUT/DELETE /books, PUT /books/:id/copies
/// - POST/GET/PUT/DELETE /members
///
/// Dashboard:
/// - GET /summary - Book, member, borrowed and overdue counts
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Loan endpoints
        .route("/loans", post(create_loan).get(list_loans))
        .route("/loans/sweep", post(sweep_overdue))
        .route("/loans/:id", get(get_loan_by_id))
        .route("/loans/:id/return", post(return_loan))
        // Catalog endpoints
        .route("/books", post(create_book).get(list_books))
        .route(
            "/books/:id",
            get(get_book_by_id).put(update_book).delete(delete_book),
        )
        .route("/books/:id/copies", put(set_book_copies))
        // Member endpoints
        .route("/members", post(create_member).get(list_members))
        .route(
            "/members/:id",
            get(get_member_by_id)
                .put(update_member)
                .delete(delete_member),
        )
        // Dashboard endpoint
        .route("/summary", get(get_summary))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
