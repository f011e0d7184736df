//! Data models for the library server

pub mod author;
pub mod book;
pub mod borrow;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookWithAuthorName};
pub use borrow::{BorrowEntry, BorrowList};
pub use user::{User, UserClaims};
