//! Catalog management service

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorQuery, CreateAuthor},
        book::{Book, BookQuery, BookWithAuthorName, CreateBook, UpdateBook},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a new author
    pub async fn insert_author(&self, author: CreateAuthor) -> AppResult<Author> {
        author.validate()?;
        let created = self.repository.authors.create(&author).await?;
        tracing::info!("Catalog: created author id={} name={}", created.id, created.name);
        Ok(created)
    }

    /// Get an author by id, as a one-element list
    pub async fn get_author(&self, id: i32) -> AppResult<Vec<Author>> {
        Ok(vec![self.repository.authors.get_by_id(id).await?])
    }

    /// Search authors by name; a missing or empty name lists all of them
    pub async fn search_authors(&self, query: &AuthorQuery) -> AppResult<Vec<Author>> {
        let name = query.name.as_deref().filter(|n| !n.is_empty());
        self.repository.authors.search(name).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book after checking its category and author
    pub async fn insert_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!(
            "Catalog: created book id={} title={} author_id={}",
            created.id,
            created.title,
            created.author_id
        );
        Ok(created)
    }

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<BookWithAuthorName>> {
        self.repository.books.search(query).await
    }

    /// Apply a partial update; an empty change set is rejected before any I/O
    pub async fn update_book(&self, id: i32, changes: UpdateBook) -> AppResult<Book> {
        let updated = self.repository.books.update(id, &changes).await?;
        tracing::info!("Catalog: updated book id={}", updated.id);
        Ok(updated)
    }

    pub async fn list_categories(&self) -> AppResult<Vec<String>> {
        self.repository.categories.list().await
    }
}
