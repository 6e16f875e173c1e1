use crate::application::lending::{self, ServiceDependencies};
use crate::domain::commands::{IssueLoan, ReturnLoan};
use crate::domain::value_objects::{BookId, LoanId, MemberId, MemberStatus};
use crate::ports::loan_store::LoanFilter;
use crate::ports::member_store::Member;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        BookResponse, CreateBookRequest, CreateMemberRequest, IssueLoanRequest, ListBooksQuery,
        ListLoansQuery, LoanResponse, MemberResponse, SetCopiesRequest, SummaryResponse,
        SweepResponse, UpdateBookRequest, UpdateMemberRequest,
    },
};

/// 期限を省略した場合の貸出期間（2週間）
const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

/// サーバーの現在日付
///
/// ドメイン層とアプリケーション層は時計を持たず、日付は
/// すべてこの境界で決まる。
fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ============================================================================
// Loan handlers
// ============================================================================

/// POST /loans - 新しい貸出を作成
///
/// 強制されるビジネスルール:
/// - 会員が存在し、利用停止中でないこと
/// - 蔵書の貸出可能数が1以上であること
/// - 返却期限が貸出日以降であること
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IssueLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let issued_on = today();
    let cmd = IssueLoan {
        book_id: BookId::from_uuid(req.book_id),
        member_id: MemberId::from_uuid(req.member_id),
        issued_on,
        due_date: req
            .due_date
            .unwrap_or(issued_on + Duration::days(DEFAULT_LOAN_PERIOD_DAYS)),
    };

    let loan = lending::issue_loan(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(LoanResponse::from(loan))))
}

/// POST /loans/:id/return - 書籍を返却
///
/// 延滞中の貸出も返却できる。既に返却済みの場合は409を返す。
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ReturnLoan {
        loan_id: LoanId::from_uuid(loan_id),
        returned_on: today(),
    };

    let loan = lending::return_loan(&state.service_deps, cmd).await?;

    Ok(Json(LoanResponse::from(loan)))
}

/// POST /loans/sweep - 延滞スイープを明示的に実行
///
/// 一覧と集計の読み取りは暗黙にスイープするため通常は不要だが、
/// バッチからの定期実行のために公開している。
pub async fn sweep_overdue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SweepResponse>, ApiError> {
    let reclassified = lending::run_overdue_sweep(&state.service_deps, today()).await?;

    Ok(Json(SweepResponse { reclassified }))
}

/// GET /loans - オプションフィルタ付き貸出一覧取得
///
/// クエリパラメータ:
/// - member_id: 会員IDでフィルタリング
/// - book_id: 蔵書IDでフィルタリング
/// - status: ステータスでフィルタリング（borrowed, overdue, returned）
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<Vec<LoanResponse>>, QueryError> {
    let status = query
        .status
        .as_deref()
        .map(super::types::parse_status_filter)
        .transpose()
        .map_err(QueryError::BadRequest)?;

    let filter = LoanFilter {
        member_id: query.member_id.map(MemberId::from_uuid),
        book_id: query.book_id.map(BookId::from_uuid),
        status,
    };

    let loans = lending::list_loans(&state.service_deps, &filter, today())
        .await
        .map_err(|e| QueryError::InternalError(e.to_string()))?;

    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}

/// GET /loans/:id - 貸出詳細をIDで取得
pub async fn get_loan_by_id(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = lending::get_loan(&state.service_deps, LoanId::from_uuid(loan_id)).await?;

    Ok(Json(LoanResponse::from(loan)))
}

/// GET /summary - ダッシュボード用の集計
///
/// 蔵書数・会員数・貸出中・延滞の4つの件数を返す。
/// 集計の前に延滞スイープが実行される。
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = lending::dashboard_summary(&state.service_deps, today()).await?;

    Ok(Json(SummaryResponse::from(summary)))
}

// ============================================================================
// Book handlers
// ============================================================================

/// POST /books - 蔵書を登録
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = lending::add_book(&state.service_deps, req.into_new_book(), today()).await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// GET /books - 蔵書一覧取得（?q=で部分一致検索）
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = match query.q.as_deref() {
        Some(q) => lending::search_books(&state.service_deps, q).await?,
        None => lending::list_books(&state.service_deps).await?,
    };

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /books/:id - 蔵書詳細をIDで取得
pub async fn get_book_by_id(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = lending::get_book(&state.service_deps, BookId::from_uuid(book_id)).await?;

    Ok(Json(BookResponse::from(book)))
}

/// PUT /books/:id - 書誌情報を更新
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book_id = BookId::from_uuid(book_id);

    lending::update_book_details(&state.service_deps, book_id, req.into_details()).await?;

    let book = lending::get_book(&state.service_deps, book_id).await?;
    Ok(Json(BookResponse::from(book)))
}

/// PUT /books/:id/copies - 総冊数を変更
///
/// 貸出可能数は台帳が同じ差分で調整する。貸出中の冊数を
/// 下回る縮小は422で拒否される。
pub async fn set_book_copies(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<SetCopiesRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book_id = BookId::from_uuid(book_id);

    lending::set_total_copies(&state.service_deps, book_id, req.total_copies).await?;

    let book = lending::get_book(&state.service_deps, book_id).await?;
    Ok(Json(BookResponse::from(book)))
}

/// DELETE /books/:id - 蔵書を削除
///
/// 未返却の貸出が参照している蔵書は422で拒否される。
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    lending::remove_book(&state.service_deps, BookId::from_uuid(book_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Member handlers
// ============================================================================

/// POST /members - 会員を登録
///
/// 新規会員はActiveで開始する。
pub async fn create_member(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let member =
        lending::register_member(&state.service_deps, req.into_new_member(), today()).await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

/// GET /members - 会員一覧取得（名前順）
pub async fn list_members(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let members = lending::list_members(&state.service_deps).await?;

    Ok(Json(
        members.into_iter().map(MemberResponse::from).collect(),
    ))
}

/// GET /members/:id - 会員詳細をIDで取得
pub async fn get_member_by_id(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = lending::get_member(&state.service_deps, MemberId::from_uuid(member_id)).await?;

    Ok(Json(MemberResponse::from(member)))
}

/// PUT /members/:id - 会員情報を更新（利用停止への変更を含む）
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, QueryError> {
    let member_id = MemberId::from_uuid(member_id);

    let status = req
        .status
        .parse::<MemberStatus>()
        .map_err(QueryError::BadRequest)?;

    // 加入日は不変なので既存レコードから引き継ぐ
    let existing = lending::get_member(&state.service_deps, member_id)
        .await
        .map_err(QueryError::from_lending)?;

    let member = Member {
        member_id,
        member_code: req.member_code,
        name: req.name,
        email: req.email,
        phone: req.phone,
        joined_date: existing.joined_date,
        status,
    };

    lending::update_member(&state.service_deps, member.clone())
        .await
        .map_err(QueryError::from_lending)?;

    Ok(Json(MemberResponse::from(member)))
}

/// DELETE /members/:id - 会員を削除
///
/// 未返却の貸出を持つ会員は422で拒否される。
pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    lending::remove_member(&state.service_deps, MemberId::from_uuid(member_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Error types
// ============================================================================

/// クエリパラメータの検証を伴うハンドラー用のエラー型
#[derive(Debug)]
pub enum QueryError {
    BadRequest(String),
    Lending(ApiError),
    InternalError(String),
}

impl QueryError {
    fn from_lending(err: crate::application::lending::LendingError) -> Self {
        QueryError::Lending(ApiError::from(err))
    }
}

impl axum::response::IntoResponse for QueryError {
    fn into_response(self) -> axum::response::Response {
        match self {
            QueryError::BadRequest(msg) => {
                let body = Json(super::types::ErrorResponse::new("BAD_REQUEST", msg));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            QueryError::Lending(err) => err.into_response(),
            QueryError::InternalError(msg) => {
                // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
                tracing::error!("Internal error in query handler: {}", msg);
                let body = Json(super::types::ErrorResponse::new(
                    "INTERNAL_ERROR",
                    "An unexpected error occurred",
                ));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
