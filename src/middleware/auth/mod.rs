/*
 * Responsibility
 * - 認証フェーズの middleware (HTTP Basic → AuthGate → AuthCtx)
 */
pub mod basic;
