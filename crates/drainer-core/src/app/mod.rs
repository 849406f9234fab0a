//! App - queue の組み立て
//!
//! # 主要コンポーネント
//! - **BatchQueueBuilder**: executor / window / id generator / runtime のワイヤリング

pub mod builder;

pub use self::builder::{BatchQueueBuilder, BuildError};
