use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::lending::{DashboardSummary, NewBook, NewMember};
use crate::domain::loan::{Loan, LoanStatus};
use crate::ports::catalog_store::{Book, BookDetails};
use crate::ports::member_store::Member;

/// 貸出作成リクエスト（POST /loans）
///
/// due_dateを省略した場合は貸出日の2週間後が期限になる。
#[derive(Debug, Deserialize)]
pub struct IssueLoanRequest {
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub due_date: Option<NaiveDate>,
}

/// 貸出一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    /// 会員IDでフィルタリング
    pub member_id: Option<Uuid>,
    /// 蔵書IDでフィルタリング
    pub book_id: Option<Uuid>,
    /// ステータスでフィルタリング（borrowed, overdue, returned）
    pub status: Option<String>,
}

/// 貸出レスポンス（GET /loans/:id と GET /loans）
#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: String,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            loan_id: loan.loan_id.value(),
            book_id: loan.book_id.value(),
            member_id: loan.member_id.value(),
            borrow_date: loan.borrow_date,
            due_date: loan.due_date,
            return_date: loan.return_date,
            status: loan.status.as_str().to_string(),
        }
    }
}

/// 延滞スイープの結果（POST /loans/sweep）
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    /// Overdueに再分類した貸出の件数
    pub reclassified: u64,
}

/// 蔵書登録リクエスト（POST /books）
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    pub total_copies: u32,
}

impl CreateBookRequest {
    pub fn into_new_book(self) -> NewBook {
        NewBook {
            isbn: self.isbn,
            title: self.title,
            author: self.author,
            genre: self.genre,
            publication_year: self.publication_year,
            total_copies: self.total_copies,
        }
    }
}

/// 書誌情報更新リクエスト（PUT /books/:id）
///
/// 冊数はここでは変更できない。冊数はPUT /books/:id/copiesで
/// 台帳経由で変更する。
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
}

impl UpdateBookRequest {
    pub fn into_details(self) -> BookDetails {
        BookDetails {
            isbn: self.isbn,
            title: self.title,
            author: self.author,
            genre: self.genre,
            publication_year: self.publication_year,
        }
    }
}

/// 冊数変更リクエスト（PUT /books/:id/copies）
#[derive(Debug, Deserialize)]
pub struct SetCopiesRequest {
    pub total_copies: u32,
}

/// 蔵書一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    /// タイトル・著者・ISBN・ジャンルの部分一致検索
    pub q: Option<String>,
}

/// 蔵書レスポンス
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub book_id: Uuid,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    pub total_copies: u32,
    pub available_copies: u32,
    pub added_date: NaiveDate,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.book_id.value(),
            isbn: book.isbn,
            title: book.title,
            author: book.author,
            genre: book.genre,
            publication_year: book.publication_year,
            total_copies: book.copies.total(),
            available_copies: book.copies.available(),
            added_date: book.added_date,
        }
    }
}

/// 会員登録リクエスト（POST /members）
#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub member_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl CreateMemberRequest {
    pub fn into_new_member(self) -> NewMember {
        NewMember {
            member_code: self.member_code,
            name: self.name,
            email: self.email,
            phone: self.phone,
        }
    }
}

/// 会員更新リクエスト（PUT /members/:id）
///
/// statusに"suspended"を指定すると利用停止になる。
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub member_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: String,
}

/// 会員レスポンス
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub member_id: Uuid,
    pub member_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub joined_date: NaiveDate,
    pub status: String,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            member_id: member.member_id.value(),
            member_code: member.member_code,
            name: member.name,
            email: member.email,
            phone: member.phone,
            joined_date: member.joined_date,
            status: member.status.as_str().to_string(),
        }
    }
}

/// ダッシュボードレスポンス（GET /summary）
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_books: u64,
    pub total_members: u64,
    pub borrowed_loans: u64,
    pub overdue_loans: u64,
}

impl From<DashboardSummary> for SummaryResponse {
    fn from(summary: DashboardSummary) -> Self {
        Self {
            total_books: summary.total_books,
            total_members: summary.total_members,
            borrowed_loans: summary.borrowed_loans,
            overdue_loans: summary.overdue_loans,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error_type.into(),
            message: message.into(),
        }
    }
}

/// ステータスクエリパラメータのパースとバリデーション
pub fn parse_status_filter(status: &str) -> Result<LoanStatus, String> {
    status.parse::<LoanStatus>()
}
