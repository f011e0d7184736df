//! Authors repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use super::{contains_pattern, QueryBudget, QueryCost};
use crate::{
    error::{AppError, AppResult},
    models::author::{Author, CreateAuthor},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
    budget: QueryBudget,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>, budget: QueryBudget) -> Self {
        Self { pool, budget }
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        self.budget
            .run(QueryCost::Lookup, "author lookup", async {
                sqlx::query_as::<_, Author>(
                    "SELECT id, name, about, created_at, updated_at FROM author WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
            })
            .await
    }

    /// Search authors by name substring, newest first; no name lists every author
    pub async fn search(&self, name: Option<&str>) -> AppResult<Vec<Author>> {
        self.budget
            .run(QueryCost::Scan, "author search", async {
                let authors = match name {
                    Some(name) => {
                        sqlx::query_as::<_, Author>(
                            r#"
                            SELECT id, name, about, created_at, updated_at
                            FROM author
                            WHERE name ILIKE $1
                            ORDER BY created_at DESC, id DESC
                            "#,
                        )
                        .bind(contains_pattern(name))
                        .fetch_all(&self.pool)
                        .await?
                    }
                    None => {
                        sqlx::query_as::<_, Author>(
                            r#"
                            SELECT id, name, about, created_at, updated_at
                            FROM author
                            ORDER BY created_at DESC, id DESC
                            "#,
                        )
                        .fetch_all(&self.pool)
                        .await?
                    }
                };
                Ok(authors)
            })
            .await
    }

    /// Create a new author
    pub async fn create(&self, author: &CreateAuthor) -> AppResult<Author> {
        let now = Utc::now();

        self.budget
            .run(QueryCost::Lookup, "author insert", async {
                let created = sqlx::query_as::<_, Author>(
                    r#"
                    INSERT INTO author (name, about, created_at, updated_at)
                    VALUES ($1, $2, $3, $3)
                    RETURNING id, name, about, created_at, updated_at
                    "#,
                )
                .bind(&author.name)
                .bind(&author.about)
                .bind(now)
                .fetch_one(&self.pool)
                .await?;
                Ok(created)
            })
            .await
    }
}
