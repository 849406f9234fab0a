//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use ulid::Ulid;

use crate::domain::{BatchId, TaskId};
use crate::ports::Clock;

/// タスク ID とバッチ ID を払い出す。
///
/// # スレッド安全性
/// - `Send + Sync` を要求（submit はどのスレッドからでも呼べる）
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;

    fn generate_batch_id(&self) -> BatchId;
}

/// タイムスタンプ部分を `Clock` から取る ULID 生成器。
///
/// `FixedClock` を渡すと全 ID が同じタイムスタンプになり、ランダム部分だけが異なる。
#[derive(Debug, Clone, Default)]
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        TaskId::from(self.next_ulid())
    }

    fn generate_batch_id(&self) -> BatchId {
        BatchId::from(self.next_ulid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_task_id();
        let id2 = id_gen.generate_task_id();
        let id3 = id_gen.generate_task_id();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn ulid_generator_with_fixed_clock_shares_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.generate_task_id();
        let id2 = id_gen.generate_batch_id();

        // ランダム部分があるので ID 自体は異なる
        assert_ne!(id1.as_ulid(), id2.as_ulid());

        assert_eq!(id1.as_ulid().timestamp_ms(), id2.as_ulid().timestamp_ms());
        assert_eq!(
            id1.as_ulid().timestamp_ms(),
            fixed_time.timestamp_millis() as u64
        );
    }

    #[test]
    fn different_id_kinds_have_different_prefixes() {
        let id_gen = UlidGenerator::new(SystemClock);

        assert!(id_gen.generate_task_id().to_string().starts_with("task-"));
        assert!(id_gen.generate_batch_id().to_string().starts_with("batch-"));
    }
}
