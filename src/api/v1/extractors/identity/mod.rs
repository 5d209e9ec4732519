/*!
 * Identity context carrier
 *
 * Responsibility:
 * - 検証済み主体 (Identity) を request extensions に載せる / 取り出す
 * - 型定義は types に、axum 依存は core に閉じ込める
 *
 * Public API:
 * - Identity
 * - Authenticated
 * - attach / current
 */

mod core;
mod types;

pub use self::core::{Authenticated, attach, current};
pub use types::Identity;
