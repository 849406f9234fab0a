//! Domain model (ids, tasks, drain state).

pub mod ids;
pub mod state;
pub mod task;

pub use ids::{BatchId, TaskId};
pub use state::DrainState;
pub use task::{TaskError, TaskHandle};
pub(crate) use task::Task;
