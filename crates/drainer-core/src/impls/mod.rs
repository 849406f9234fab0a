//! Impls - `BatchExecutor` の実装
//!
//! # 含まれる実装
//! - **IdentityExecutor**: デフォルト（payload をそのまま返す）
//! - **FnExecutor**: async closure をそのまま executor として使う
//! - **RetryingExecutor**: 任意の executor をバックオフ付きリトライで包む

pub mod fn_executor;
pub mod identity;
pub mod retrying;

pub use self::fn_executor::{FnExecutor, executor_fn};
pub use self::identity::IdentityExecutor;
pub use self::retrying::RetryingExecutor;
