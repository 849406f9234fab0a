//! Domain identifiers（型付き ID）
//!
//! タスクとバッチは phantom 型付きの `Id<T>` で包んだ ULID で識別する。
//! `BatchId` が必要な場所に `TaskId` を渡すとコンパイルエラーになる。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: 生成順序でソートできる（ログを読むときに便利）
//! - **調整不要**: 複数の queue インスタンスが独立に生成できる

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// ID の種類ごとのマーカー trait
///
/// `Display` で使う接頭辞（"task-", "batch-"）を持つ。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// 汎用 ID 型
///
/// `T` はコンパイル時のマーカーだけで、実行時の中身はただの ULID。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// submit されたタスク
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// drain loop が組んだバッチ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Batch {}

impl IdMarker for Batch {
    fn prefix() -> &'static str {
        "batch-"
    }
}

/// submit 1 件分の ID
pub type TaskId = Id<Task>;

/// executor 呼び出し 1 回分の ID
pub type BatchId = Id<Batch>;
