//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use super::{is_unique_violation, QueryBudget, QueryCost};
use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, User},
};

const USER_COLUMNS: &str =
    "id, name, email, password, phone_number, is_active, is_admin, created_at, updated_at";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
    budget: QueryBudget,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>, budget: QueryBudget) -> Self {
        Self { pool, budget }
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.budget
            .run(QueryCost::Lookup, "user lookup", async {
                let user = sqlx::query_as::<_, User>(&format!(
                    "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
                    USER_COLUMNS
                ))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
                Ok(user)
            })
            .await
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        self.budget
            .run(QueryCost::Lookup, "email existence check", async {
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
                )
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
                Ok(exists)
            })
            .await
    }

    /// Create a new user; a concurrent registration of the same email is a conflict
    pub async fn create(&self, user: &NewUser) -> AppResult<User> {
        let now = Utc::now();

        self.budget
            .run(QueryCost::Lookup, "user insert", async {
                sqlx::query_as::<_, User>(&format!(
                    r#"
                    INSERT INTO users (
                        name, email, password, phone_number, is_active, is_admin,
                        created_at, updated_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
                    RETURNING {}
                    "#,
                    USER_COLUMNS
                ))
                .bind(&user.name)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(&user.phone_number)
                .bind(user.is_active)
                .bind(user.is_admin)
                .bind(now)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AppError::Conflict(format!(
                            "User with email {} already exists",
                            user.email
                        ))
                    } else {
                        AppError::Database(e)
                    }
                })
            })
            .await
    }
}
