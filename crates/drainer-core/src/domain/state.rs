//! Drain state - queue ごとの drain loop の状態

use serde::{Deserialize, Serialize};

/// drain loop が動いているかどうか。
///
/// 状態遷移:
/// - Idle -> Draining（Idle 中の最初の submit）
/// - Draining -> Draining（バッチ後もまだ溜まっている）
/// - Draining -> Idle（空になった）
///
/// 終端状態はない。queue は何度でも使い回せる。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainState {
    #[default]
    Idle,
    Draining,
}

impl DrainState {
    pub fn is_idle(self) -> bool {
        matches!(self, DrainState::Idle)
    }
}
