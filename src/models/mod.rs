//! Data models for Libris

pub mod book;
pub mod borrow;
pub mod copy;
pub mod fine;
pub mod member;
pub mod user;

// Re-export commonly used types
pub use borrow::{BorrowRecord, BorrowRequest, BorrowTransaction, LatestBorrow, ReturnRecord, ReturnRequest};
pub use copy::{CopyInfo, CopyStatus};
pub use fine::{Fine, FineDetails, Payment};
pub use member::Member;
pub use user::{Librarian, RequestContext, Role, User, UserClaims};
