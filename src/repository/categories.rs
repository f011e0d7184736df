//! Categories repository

use sqlx::{Pool, Postgres};

use super::{QueryBudget, QueryCost};
use crate::error::AppResult;

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
    budget: QueryBudget,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>, budget: QueryBudget) -> Self {
        Self { pool, budget }
    }

    /// List category labels alphabetically
    pub async fn list(&self) -> AppResult<Vec<String>> {
        self.budget
            .run(QueryCost::Scan, "category listing", async {
                let names: Vec<String> =
                    sqlx::query_scalar("SELECT category_name FROM category ORDER BY category_name")
                        .fetch_all(&self.pool)
                        .await?;
                Ok(names)
            })
            .await
    }
}
