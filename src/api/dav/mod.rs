/*
 * Responsibility
 * - DAV プロトコル側の公開ポイント (routes() の re-export など)
 * - プロトコル処理そのものは対象外。認証済み principal を確認できる最小の dispatch のみ
 */
mod handlers;
mod routes;

pub use routes::routes;
