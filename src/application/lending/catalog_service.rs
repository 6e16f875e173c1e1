use crate::domain::value_objects::{BookId, CopyCounts, MemberId};
use crate::ports::*;
use chrono::NaiveDate;

use super::errors::{LendingError, Result};
use super::{ledger, lending_service::ServiceDependencies};

/// 蔵書の新規登録内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    pub total_copies: u32,
}

/// 会員の新規登録内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub member_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// 蔵書を登録する
///
/// 登録時は全冊が貸出可能。総冊数0は`InvalidCopyCount`で拒否する。
pub async fn add_book(deps: &ServiceDependencies, new_book: NewBook, today: NaiveDate) -> Result<Book> {
    let copies =
        CopyCounts::new(new_book.total_copies).map_err(|_| LendingError::InvalidCopyCount)?;

    let book = Book {
        book_id: BookId::new(),
        isbn: new_book.isbn,
        title: new_book.title,
        author: new_book.author,
        genre: new_book.genre,
        publication_year: new_book.publication_year,
        copies,
        added_date: today,
    };

    deps.catalog_store
        .insert_book(&book)
        .await
        .map_err(LendingError::CatalogStoreError)?;

    tracing::info!(book_id = %book.book_id.value(), isbn = %book.isbn, "book added to catalog");
    Ok(book)
}

/// 書誌情報を更新する（冊数は対象外）
pub async fn update_book_details(
    deps: &ServiceDependencies,
    book_id: BookId,
    details: BookDetails,
) -> Result<()> {
    let outcome = deps
        .catalog_store
        .update_details(book_id, &details)
        .await
        .map_err(LendingError::CatalogStoreError)?;

    if !outcome.is_applied() {
        return Err(LendingError::BookNotFound);
    }
    Ok(())
}

/// 総冊数を変更する
///
/// 貸出可能数は台帳が同じ差分で調整する。貸出中の冊数を下回る
/// 縮小は`InvalidCopyCount`で拒否される。
pub async fn set_total_copies(
    deps: &ServiceDependencies,
    book_id: BookId,
    new_total: u32,
) -> Result<()> {
    ledger::set_total_copies(&deps.catalog_store, book_id, new_total).await
}

/// 蔵書を削除する
///
/// 未返却の貸出が参照している蔵書は削除できない（`HasOpenLoans`）。
/// 黙って孤児の貸出記録を作るのではなく、削除自体を拒否する。
pub async fn remove_book(deps: &ServiceDependencies, book_id: BookId) -> Result<()> {
    let open = deps
        .loan_store
        .count_open_for_book(book_id)
        .await
        .map_err(LendingError::LoanStoreError)?;

    if open > 0 {
        return Err(LendingError::HasOpenLoans);
    }

    let outcome = deps
        .catalog_store
        .delete_book(book_id)
        .await
        .map_err(LendingError::CatalogStoreError)?;

    if !outcome.is_applied() {
        return Err(LendingError::BookNotFound);
    }

    tracing::info!(book_id = %book_id.value(), "book removed from catalog");
    Ok(())
}

/// IDで蔵書を取得する
pub async fn get_book(deps: &ServiceDependencies, book_id: BookId) -> Result<Book> {
    deps.catalog_store
        .get_book(book_id)
        .await
        .map_err(LendingError::CatalogStoreError)?
        .ok_or(LendingError::BookNotFound)
}

/// 蔵書一覧を取得する（タイトル順）
pub async fn list_books(deps: &ServiceDependencies) -> Result<Vec<Book>> {
    deps.catalog_store
        .list_books()
        .await
        .map_err(LendingError::CatalogStoreError)
}

/// 蔵書を検索する（タイトル・著者・ISBN・ジャンルの部分一致）
pub async fn search_books(deps: &ServiceDependencies, query: &str) -> Result<Vec<Book>> {
    deps.catalog_store
        .search_books(query)
        .await
        .map_err(LendingError::CatalogStoreError)
}

/// 会員を登録する
///
/// 新規会員はActiveで開始する。
pub async fn register_member(
    deps: &ServiceDependencies,
    new_member: NewMember,
    today: NaiveDate,
) -> Result<Member> {
    let member = Member {
        member_id: MemberId::new(),
        member_code: new_member.member_code,
        name: new_member.name,
        email: new_member.email,
        phone: new_member.phone,
        joined_date: today,
        status: crate::domain::MemberStatus::Active,
    };

    deps.member_store
        .insert_member(&member)
        .await
        .map_err(LendingError::MemberStoreError)?;

    tracing::info!(
        member_id = %member.member_id.value(),
        member_code = %member.member_code,
        "member registered"
    );
    Ok(member)
}

/// 会員情報を更新する（利用停止への変更を含む）
pub async fn update_member(deps: &ServiceDependencies, member: Member) -> Result<()> {
    let outcome = deps
        .member_store
        .update_member(&member)
        .await
        .map_err(LendingError::MemberStoreError)?;

    if !outcome.is_applied() {
        return Err(LendingError::MemberNotFound);
    }
    Ok(())
}

/// 会員を削除する
///
/// 未返却の貸出を持つ会員は削除できない（`HasOpenLoans`）。
pub async fn remove_member(deps: &ServiceDependencies, member_id: MemberId) -> Result<()> {
    let open = deps
        .loan_store
        .count_open_for_member(member_id)
        .await
        .map_err(LendingError::LoanStoreError)?;

    if open > 0 {
        return Err(LendingError::HasOpenLoans);
    }

    let outcome = deps
        .member_store
        .delete_member(member_id)
        .await
        .map_err(LendingError::MemberStoreError)?;

    if !outcome.is_applied() {
        return Err(LendingError::MemberNotFound);
    }

    tracing::info!(member_id = %member_id.value(), "member removed");
    Ok(())
}

/// IDで会員を取得する
pub async fn get_member(deps: &ServiceDependencies, member_id: MemberId) -> Result<Member> {
    deps.member_store
        .get_member(member_id)
        .await
        .map_err(LendingError::MemberStoreError)?
        .ok_or(LendingError::MemberNotFound)
}

/// 会員一覧を取得する（名前順）
pub async fn list_members(deps: &ServiceDependencies) -> Result<Vec<Member>> {
    deps.member_store
        .list_members()
        .await
        .map_err(LendingError::MemberStoreError)
}
