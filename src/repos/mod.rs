/*
 * Responsibility
 * - 永続化層の公開インターフェース (re-export)
 */
pub mod error;
#[cfg(test)]
pub mod memory;
pub mod user_repo;

pub use error::RepoError;
pub use user_repo::{PgUserRepo, UserStore};
