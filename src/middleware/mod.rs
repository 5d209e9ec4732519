/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: credential 検証 + enforcement / http: request id, trace, timeout
 */
pub mod auth;
pub mod http;
