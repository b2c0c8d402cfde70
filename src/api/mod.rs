/*
 * Responsibility
 * - HTTP surface の公開ポイント
 *   - dav: 認証が必要なプロトコル側 (whitelist/auth hook の内側)
 *   - health: 認証なし
 */
pub mod dav;
pub mod extractors;
pub mod health;
