/*
 * Responsibility
 * - ドメインロジック層 (HTTP/axum の配線は middleware 側)
 */
pub mod auth;
pub mod whitelist;
