//! Repositories over the SQLite pool. Each repo is a unit struct with
//! associated functions taking `&DbPool`.

pub mod history;
pub mod questions;
pub mod users;

pub use history::{HistoryRepo, NewHistoryEntry};
pub use questions::{QuestionRepo, QuestionFields};
pub use users::UserRepo;
