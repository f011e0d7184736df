//! Books repository for database operations.
//!
//! Partial updates and filtered searches are compiled into SQL by
//! [`UpdateStatement`] and [`SearchStatement`] before anything touches the
//! pool, so placeholder numbering can be checked without a database.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use super::{contains_pattern, is_foreign_key_violation, QueryBudget, QueryCost};
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookWithAuthorName, CreateBook, UpdateBook},
};

/// Columns of `book` in [`Book`] field order
const BOOK_COLUMNS: &str = "id, title, category, publisher, book_count, price, fine_per_day, \
                            author_id, created_at, updated_at, archive";

/// Value bound to one positional placeholder of a book statement
#[derive(Debug, Clone, PartialEq)]
pub enum BookValue {
    Text(String),
    Integer(i32),
    Amount(Decimal),
}

/// Compiled partial update.
///
/// `values` bind to `$1..$n` in the fixed column order title, category,
/// publisher, book_count, price, fine_per_day, author_id. `$n+1` is the
/// `updated_at` timestamp and `$n+2` the book id.
#[derive(Debug)]
pub struct UpdateStatement {
    pub sql: String,
    pub values: Vec<BookValue>,
}

impl UpdateStatement {
    pub fn build(id: i32, changes: &UpdateBook) -> AppResult<Self> {
        let mut assignments = Vec::new();
        let mut values = Vec::new();
        let mut placeholder = 0;

        macro_rules! add_field {
            ($field:expr, $column:expr, $variant:ident) => {
                if let Some(ref value) = $field {
                    placeholder += 1;
                    assignments.push(format!("{} = ${}", $column, placeholder));
                    values.push(BookValue::$variant(value.clone()));
                }
            };
        }

        add_field!(changes.title, "title", Text);
        add_field!(changes.category, "category", Text);
        add_field!(changes.publisher, "publisher", Text);
        add_field!(changes.book_count, "book_count", Integer);
        add_field!(changes.price, "price", Amount);
        add_field!(changes.fine_per_day, "fine_per_day", Amount);
        add_field!(changes.author_id, "author_id", Integer);

        if values.is_empty() {
            return Err(AppError::Validation(format!(
                "Nothing to update for book with id {}",
                id
            )));
        }

        let sql = format!(
            "UPDATE book SET {}, updated_at = ${} WHERE id = ${} RETURNING {}",
            assignments.join(", "),
            placeholder + 1,
            placeholder + 2,
            BOOK_COLUMNS
        );

        Ok(Self { sql, values })
    }
}

/// Compiled book search; `values` are `%pattern%` strings bound to `$1..$n`
#[derive(Debug)]
pub struct SearchStatement {
    pub sql: String,
    pub values: Vec<String>,
}

impl SearchStatement {
    pub fn build(query: &BookQuery) -> Self {
        let filters = [
            ("b.title", query.title.as_deref()),
            ("b.category", query.category.as_deref()),
            ("b.publisher", query.publisher.as_deref()),
            ("a.name", query.author_name.as_deref()),
        ];

        let mut conditions = Vec::new();
        let mut values = Vec::new();

        for (column, value) in filters {
            if let Some(value) = value {
                values.push(contains_pattern(value));
                conditions.push(format!("{} ILIKE ${}", column, values.len()));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT b.id, b.title, b.category, b.publisher, b.price, b.fine_per_day,
                   b.book_count, a.name AS author_name, b.created_at, b.updated_at
            FROM book b
            INNER JOIN author a ON b.author_id = a.id
            {}
            ORDER BY b.created_at DESC, b.id DESC
            "#,
            where_clause
        );

        Self { sql, values }
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
    budget: QueryBudget,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>, budget: QueryBudget) -> Self {
        Self { pool, budget }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.budget
            .run(QueryCost::Lookup, "book lookup", async {
                sqlx::query_as::<_, Book>(&format!(
                    "SELECT {} FROM book WHERE id = $1",
                    BOOK_COLUMNS
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
            })
            .await
    }

    /// Search books joined with their author's name, newest first
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<BookWithAuthorName>> {
        let SearchStatement { sql, values } = SearchStatement::build(query);

        self.budget
            .run(QueryCost::Scan, "book search", async {
                let mut builder = sqlx::query_as::<_, BookWithAuthorName>(&sql);
                for value in values {
                    builder = builder.bind(value);
                }
                Ok(builder.fetch_all(&self.pool).await?)
            })
            .await
    }

    /// Create a new book after checking its category and author exist
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let now = Utc::now();

        self.budget
            .run(QueryCost::ValidatedWrite, "book insert", async {
                self.ensure_category(&book.category).await?;
                self.ensure_author(book.author_id).await?;

                sqlx::query_as::<_, Book>(&format!(
                    r#"
                    INSERT INTO book (
                        title, category, publisher, book_count, price, fine_per_day,
                        author_id, created_at, updated_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
                    RETURNING {}
                    "#,
                    BOOK_COLUMNS
                ))
                .bind(&book.title)
                .bind(&book.category)
                .bind(&book.publisher)
                .bind(book.book_count)
                .bind(book.price)
                .bind(book.fine_per_day)
                .bind(book.author_id)
                .bind(now)
                .fetch_one(&self.pool)
                .await
                .map_err(reference_vanished)
            })
            .await
    }

    /// Apply a partial update and return the updated row
    pub async fn update(&self, id: i32, changes: &UpdateBook) -> AppResult<Book> {
        // Fails on an empty change set before any statement is issued
        let UpdateStatement { sql, values } = UpdateStatement::build(id, changes)?;
        let now = Utc::now();

        self.budget
            .run(QueryCost::ValidatedWrite, "book update", async {
                if let Some(ref category) = changes.category {
                    self.ensure_category(category).await?;
                }
                if let Some(author_id) = changes.author_id {
                    self.ensure_author(author_id).await?;
                }

                let mut builder = sqlx::query_as::<_, Book>(&sql);
                for value in values {
                    builder = match value {
                        BookValue::Text(s) => builder.bind(s),
                        BookValue::Integer(i) => builder.bind(i),
                        BookValue::Amount(d) => builder.bind(d),
                    };
                }

                builder
                    .bind(now)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(reference_vanished)?
                    .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
            })
            .await
    }

    async fn ensure_category(&self, category: &str) -> AppResult<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM category WHERE category_name = $1)")
                .bind(category)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(AppError::NotFound(format!(
                "Category '{}' does not exist",
                category
            )));
        }
        Ok(())
    }

    async fn ensure_author(&self, author_id: i32) -> AppResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM author WHERE id = $1)")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!(
                "Author with id {} does not exist",
                author_id
            )));
        }
        Ok(())
    }
}

/// A referenced author or category deleted between the check and the write
fn reference_vanished(error: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&error) {
        tracing::warn!("Book reference vanished during write: {}", error);
        AppError::NotFound("Referenced category or author no longer exists".to_string())
    } else {
        AppError::Database(error)
    }
}
