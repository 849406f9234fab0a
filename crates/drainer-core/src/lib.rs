//! drainer-core
//!
//! 計算処理の非同期ジョブをまとめて流すためのバッチキューとリトライ。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, drain state）
//! - **ports**: 抽象化レイヤー（BatchExecutor, Clock, IdGenerator）
//! - **impls**: executor の実装（Identity, Fn, Retrying）
//! - **queue**: BatchQueue と drain loop
//! - **retry**: RetryPolicy と RetryExecutor
//! - **app**: BatchQueueBuilder
//! - **config**: serde で読める設定
//! - observability: QueueStats
//! - error: 設定・構築エラー

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod retry;

pub use app::{BatchQueueBuilder, BuildError};
pub use config::{BatchWindowConfig, DrainerConfig, RetryConfig};
pub use domain::{BatchId, DrainState, TaskError, TaskHandle, TaskId};
pub use error::{ConfigError, DrainerError};
pub use impls::{FnExecutor, IdentityExecutor, RetryingExecutor, executor_fn};
pub use observability::QueueStats;
pub use ports::BatchExecutor;
pub use queue::{BatchQueue, BatchWindow};
pub use retry::{RetryExecutor, RetryExhausted, RetryPolicy, with_retry};
