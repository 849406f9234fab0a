//! Ports - 抽象化レイヤー
//!
//! queue が自前で持たないものとの境界:
//! - **BatchExecutor**: バッチで実際に何をするか
//! - **Clock**: 現在時刻
//! - **IdGenerator**: ID 生成

pub mod clock;
pub mod executor;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::executor::BatchExecutor;
pub use self::id_generator::{IdGenerator, UlidGenerator};
