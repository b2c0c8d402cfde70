/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (読み取りのみ)
 * - account の作成・更新は管理画面側の責務
 * - DB エラーは RepoError として返す (呼び出し側は fail-closed で扱う)
 *
 * Schema
 *   users (
 *     username TEXT PRIMARY KEY,
 *     digest   TEXT NOT NULL,   -- hex(sha256("<username>:<realm>:<password>"))
 *     enabled  BOOLEAN NOT NULL DEFAULT TRUE
 *   )
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoResult;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub username: String,
    pub digest: String,
    pub enabled: bool,
}

/// Account lookup used by both the password backend and the trusted path.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>>;
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepo {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT username, digest, enabled
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
