use crate::domain::value_objects::BookId;
use crate::ports::UpdateOutcome;
use crate::ports::catalog_store::{Book, BookDetails, CatalogStore as CatalogStoreTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// CatalogStoreのインメモリ実装
///
/// 蔵書テーブル全体を1つのMutexで守ることで、条件付き更新の
/// 「チェックと書き込み」の不可分性をPostgreSQL実装と同じ強さで
/// 提供する。テストとローカル起動で使用される。
pub struct CatalogStore {
    books: Mutex<HashMap<BookId, Book>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStoreTrait for CatalogStore {
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.books.lock().unwrap().get(&book_id).cloned())
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        let mut books: Vec<Book> = self.books.lock().unwrap().values().cloned().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn search_books(&self, query: &str) -> Result<Vec<Book>> {
        let needle = query.to_lowercase();
        let matches_field = |field: &str| field.to_lowercase().contains(&needle);

        let mut books: Vec<Book> = self
            .books
            .lock()
            .unwrap()
            .values()
            .filter(|b| {
                matches_field(&b.title)
                    || matches_field(&b.author)
                    || matches_field(&b.isbn)
                    || b.genre.as_deref().is_some_and(matches_field)
            })
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn insert_book(&self, book: &Book) -> Result<()> {
        self.books
            .lock()
            .unwrap()
            .insert(book.book_id, book.clone());
        Ok(())
    }

    async fn update_details(
        &self,
        book_id: BookId,
        details: &BookDetails,
    ) -> Result<UpdateOutcome> {
        let mut books = self.books.lock().unwrap();
        match books.get_mut(&book_id) {
            Some(book) => {
                book.isbn = details.isbn.clone();
                book.title = details.title.clone();
                book.author = details.author.clone();
                book.genre = details.genre.clone();
                book.publication_year = details.publication_year;
                Ok(UpdateOutcome::Applied)
            }
            None => Ok(UpdateOutcome::NotApplied),
        }
    }

    /// ロック中にチェックと書き込みを両方行うため、
    /// 同時実行でも最後の1冊が重複して確保されることはない
    async fn checkout_copy(&self, book_id: BookId) -> Result<UpdateOutcome> {
        let mut books = self.books.lock().unwrap();
        match books.get_mut(&book_id) {
            Some(book) => match book.copies.checkout() {
                Ok(copies) => {
                    book.copies = copies;
                    Ok(UpdateOutcome::Applied)
                }
                Err(_) => Ok(UpdateOutcome::NotApplied),
            },
            None => Ok(UpdateOutcome::NotApplied),
        }
    }

    async fn checkin_copy(&self, book_id: BookId) -> Result<UpdateOutcome> {
        let mut books = self.books.lock().unwrap();
        match books.get_mut(&book_id) {
            Some(book) => match book.copies.checkin() {
                Ok(copies) => {
                    book.copies = copies;
                    Ok(UpdateOutcome::Applied)
                }
                Err(_) => Ok(UpdateOutcome::NotApplied),
            },
            None => Ok(UpdateOutcome::NotApplied),
        }
    }

    async fn resize_copies(&self, book_id: BookId, new_total: u32) -> Result<UpdateOutcome> {
        let mut books = self.books.lock().unwrap();
        match books.get_mut(&book_id) {
            Some(book) => match book.copies.resize(new_total) {
                Ok(copies) => {
                    book.copies = copies;
                    Ok(UpdateOutcome::Applied)
                }
                Err(_) => Ok(UpdateOutcome::NotApplied),
            },
            None => Ok(UpdateOutcome::NotApplied),
        }
    }

    async fn delete_book(&self, book_id: BookId) -> Result<UpdateOutcome> {
        let removed = self.books.lock().unwrap().remove(&book_id);
        Ok(if removed.is_some() {
            UpdateOutcome::Applied
        } else {
            UpdateOutcome::NotApplied
        })
    }

    async fn count_books(&self) -> Result<u64> {
        Ok(self.books.lock().unwrap().len() as u64)
    }
}
