//! Book model and related types.
//!
//! Partial updates arrive as untyped JSON objects. [`UpdateBook::from_json`]
//! narrows them into an explicit optional-field struct so that the repository
//! never has to guess at types: strings must be strings, counts and ids must be
//! whole numbers that fit an `INTEGER`, and amounts must fit `NUMERIC(10,2)`
//! without rounding.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub publisher: String,
    pub book_count: i32,
    pub price: Decimal,
    pub fine_per_day: Decimal,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Withdrawn from circulation
    pub archive: bool,
}

/// Book joined with its author's display name (search results)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookWithAuthorName {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub publisher: String,
    pub price: Decimal,
    pub fine_per_day: Decimal,
    pub book_count: i32,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(custom(function = "validate_category"))]
    pub category: String,
    #[serde(default)]
    #[validate(custom(function = "validate_publisher"))]
    pub publisher: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "book_count must not be negative"))]
    pub book_count: i32,
    #[serde(default)]
    #[validate(custom(function = "validate_amount"))]
    pub price: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_amount"))]
    pub fine_per_day: Decimal,
    pub author_id: i32,
}

/// Partial book update; `None` leaves the column untouched
#[derive(Debug, Default, Clone, PartialEq, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub book_count: Option<i32>,
    pub price: Option<Decimal>,
    pub fine_per_day: Option<Decimal>,
    pub author_id: Option<i32>,
}

impl UpdateBook {
    /// Narrow an untyped JSON object into typed changes.
    /// Keys other than the seven updatable columns are ignored.
    pub fn from_json(fields: &Map<String, Value>) -> AppResult<Self> {
        Ok(Self {
            title: fields
                .get("title")
                .map(|v| required_text("title", v, TITLE_MAX))
                .transpose()?,
            category: fields
                .get("category")
                .map(|v| required_text("category", v, CATEGORY_MAX))
                .transpose()?,
            publisher: fields
                .get("publisher")
                .map(|v| required_text("publisher", v, PUBLISHER_MAX))
                .transpose()?,
            book_count: fields
                .get("book_count")
                .map(|v| whole_number("book_count", v, 0))
                .transpose()?,
            price: fields.get("price").map(|v| amount("price", v)).transpose()?,
            fine_per_day: fields
                .get("fine_per_day")
                .map(|v| amount("fine_per_day", v))
                .transpose()?,
            author_id: fields
                .get("author_id")
                .map(|v| whole_number("author_id", v, 1))
                .transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.publisher.is_none()
            && self.book_count.is_none()
            && self.price.is_none()
            && self.fine_per_day.is_none()
            && self.author_id.is_none()
    }
}

/// Book search filters; every present filter is a case-insensitive substring
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    pub title: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub author_name: Option<String>,
}

// --- JSON coercion helpers ---

fn invalid(key: &str, reason: &str) -> AppError {
    AppError::Validation(format!("{} {}", key, reason))
}

fn required_text(key: &str, value: &Value, max: usize) -> AppResult<String> {
    let s = value
        .as_str()
        .ok_or_else(|| invalid(key, "must be a string"))?;
    check_text(s, max).map_err(|reason| invalid(key, &reason))?;
    Ok(s.to_owned())
}

fn whole_number(key: &str, value: &Value, min: i32) -> AppResult<i32> {
    let number = value
        .as_number()
        .ok_or_else(|| invalid(key, "must be a number"))?;

    let wide = if let Some(i) = number.as_i64() {
        i
    } else if number.is_u64() {
        return Err(invalid(key, "is out of range"));
    } else {
        let f = number
            .as_f64()
            .ok_or_else(|| invalid(key, "must be a number"))?;
        if !f.is_finite() || f.fract() != 0.0 {
            return Err(invalid(key, "must be a whole number"));
        }
        if f < i32::MIN as f64 || f > i32::MAX as f64 {
            return Err(invalid(key, "is out of range"));
        }
        f as i64
    };

    let narrow = i32::try_from(wide).map_err(|_| invalid(key, "is out of range"))?;
    if narrow < min {
        return Err(invalid(key, &format!("must be at least {}", min)));
    }
    Ok(narrow)
}

fn amount(key: &str, value: &Value) -> AppResult<Decimal> {
    let number = value
        .as_number()
        .ok_or_else(|| invalid(key, "must be a number"))?;
    // serde_json prints the shortest round-tripping form, so 12.5 stays "12.5"
    let repr = number.to_string();
    let decimal = Decimal::from_str(&repr)
        .or_else(|_| Decimal::from_scientific(&repr))
        .map_err(|_| invalid(key, "is not a representable amount"))?;
    check_amount(&decimal).map_err(|reason| invalid(key, reason))?;
    Ok(decimal)
}

// Widths of the VARCHAR columns of `book`
const TITLE_MAX: usize = 255;
const CATEGORY_MAX: usize = 100;
const PUBLISHER_MAX: usize = 255;

/// Non-blank and no wider than the column, counted in characters like Postgres
fn check_text(value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    if value.chars().count() > max {
        return Err(format!("must be at most {} characters", max));
    }
    Ok(())
}

fn validate_text(key: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    check_text(value, max).map_err(|reason| {
        let mut error = ValidationError::new("text");
        error.message = Some(format!("{} {}", key, reason).into());
        error
    })
}

fn validate_title(value: &str) -> Result<(), ValidationError> {
    validate_text("title", value, TITLE_MAX)
}

fn validate_category(value: &str) -> Result<(), ValidationError> {
    validate_text("category", value, CATEGORY_MAX)
}

fn validate_publisher(value: &str) -> Result<(), ValidationError> {
    validate_text("publisher", value, PUBLISHER_MAX)
}

/// Largest value of a NUMERIC(10,2) column
fn max_amount() -> Decimal {
    Decimal::new(99_999_999_99, 2)
}

fn check_amount(value: &Decimal) -> Result<(), &'static str> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err("must not be negative");
    }
    if value.normalize().scale() > 2 {
        return Err("must have at most two decimal places");
    }
    if *value > max_amount() {
        return Err("must not exceed 99999999.99");
    }
    Ok(())
}

fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    check_amount(value).map_err(|reason| {
        let mut error = ValidationError::new("amount");
        error.message = Some(format!("amounts {}", reason).into());
        error
    })
}
