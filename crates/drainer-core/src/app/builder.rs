//! BatchQueueBuilder - queue の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - build() 時に Tokio runtime を捕まえる
//! - runtime の外で build すると BuildError を返す（submit 時に panic しない）

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::BatchWindowConfig;
use crate::error::ConfigError;
use crate::ports::{BatchExecutor, IdGenerator, SystemClock, UlidGenerator};
use crate::queue::{BatchQueue, BatchWindow};

/// queue 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no Tokio runtime available; build the queue inside a runtime or pass one with `runtime()`")]
    NoRuntime,
}

/// [`BatchQueue`] を組み立てる。
///
/// # 使用例
/// ```ignore
/// let queue = BatchQueueBuilder::new(IdentityExecutor)
///     .window(BatchWindow::new(3, Duration::ZERO)?)
///     .build()?;
/// ```
pub struct BatchQueueBuilder<T, X> {
    executor: X,
    window: BatchWindow,
    ids: Option<Arc<dyn IdGenerator>>,
    runtime: Option<Handle>,
    _payload: PhantomData<fn(T)>,
}

impl<T, X> BatchQueueBuilder<T, X>
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    pub fn new(executor: X) -> Self {
        Self {
            executor,
            window: BatchWindow::default(),
            ids: None,
            runtime: None,
            _payload: PhantomData,
        }
    }

    pub fn window(mut self, window: BatchWindow) -> Self {
        self.window = window;
        self
    }

    /// 設定ファイル由来の window を使う。
    pub fn window_config(self, config: &BatchWindowConfig) -> Result<Self, ConfigError> {
        let window = config.to_window()?;
        Ok(self.window(window))
    }

    /// ID 生成を差し替える（デフォルト: システム時刻の ULID）
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    /// 現在の runtime ではなく `runtime` 上で drain loop を動かす。
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<BatchQueue<T, X>, BuildError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| BuildError::NoRuntime)?,
        };
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));

        Ok(BatchQueue::from_parts(self.window, self.executor, ids, runtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::IdentityExecutor;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn build_outside_runtime_fails() {
        let result = BatchQueueBuilder::<u32, _>::new(IdentityExecutor).build();
        assert!(matches!(result, Err(BuildError::NoRuntime)));
    }

    #[test]
    fn build_with_explicit_runtime() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let queue = BatchQueueBuilder::<u32, _>::new(IdentityExecutor)
            .runtime(rt.handle().clone())
            .build()
            .unwrap();

        let value = rt.block_on(queue.submit(5)).unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn build_uses_configured_window() {
        let config = BatchWindowConfig {
            batch_size: 4,
            inter_batch_delay_ms: 0,
        };
        let queue = BatchQueueBuilder::<u32, _>::new(IdentityExecutor)
            .window_config(&config)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(queue.window().batch_size(), 4);
        assert_eq!(queue.window().inter_batch_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn custom_id_generator_is_used() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let queue = BatchQueueBuilder::<u32, _>::new(IdentityExecutor)
            .id_generator(UlidGenerator::new(FixedClock::new(fixed_time)))
            .build()
            .unwrap();

        let handle = queue.submit(1);
        assert_eq!(
            handle.id().as_ulid().timestamp_ms(),
            fixed_time.timestamp_millis() as u64
        );
        assert_eq!(handle.await.unwrap(), 1);
    }
}
