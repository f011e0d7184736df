//! Borrow list model.
//!
//! Only the persisted shape exists for now: there is no lending workflow, due
//! date computation or fine accrual behind these types yet.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A set of books lent to one user under a common due date
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowList {
    pub id: i32,
    pub user_id: i32,
    pub due_date: DateTime<Utc>,
    pub closed: bool,
    pub fine_paid: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(rename = "lended_books", default)]
    pub entries: Vec<BorrowEntry>,
}

/// One borrowed book inside a borrow list
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowEntry {
    pub id: i32,
    pub book_id: i32,
    pub list_id: i32,
    pub returned: bool,
    pub extended: bool,
}
