/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - basic auth middleware が AuthGate の結果を request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - whitelist 経由かパスワード経由かはここに載せない (handler 側で区別しない)
 */

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `principal` は user store に存在する有効な username
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub principal: String,
}

impl AuthCtx {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
        }
    }
}
