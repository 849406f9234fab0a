//! Queue module: batch window, the queue handle, and its drain loop.
//!
//! # Design
//! - `submit` only appends to the pending deque and, if no drain loop is
//!   running, spawns one. It never waits.
//! - The drain loop is the only consumer. It takes up to `batch_size` tasks from
//!   the head, runs the executor, settles every task of the batch, then pauses
//!   for `inter_batch_delay` if more work is pending.
//! - The pending deque and the `draining` flag live behind one mutex, so the
//!   "queue is empty, go idle" decision cannot race with a concurrent submit.
//!   The lock is never held across an `.await`.

mod drain;
mod window;

pub use window::BatchWindow;

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::debug;

use crate::app::{BatchQueueBuilder, BuildError};
use crate::domain::{DrainState, Task, TaskHandle};
use crate::impls::IdentityExecutor;
use crate::observability::{QueueStats, StatsCounters};
use crate::ports::{BatchExecutor, IdGenerator};

type QueuedTask<T, X> =
    Task<T, <X as BatchExecutor<T>>::Output, <X as BatchExecutor<T>>::Error>;

/// Mutable state behind the queue's mutex.
struct QueueState<T, X>
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    /// Pending tasks in submission order.
    pending: VecDeque<QueuedTask<T, X>>,

    /// Whether a drain loop is currently active.
    draining: bool,
}

/// State shared between queue handles and the drain loop.
struct Shared<T, X>
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    window: BatchWindow,
    executor: Arc<X>,
    ids: Arc<dyn IdGenerator>,
    state: Mutex<QueueState<T, X>>,
    drain_tx: watch::Sender<DrainState>,
    stats: StatsCounters,
    runtime: Handle,
}

impl<T, X> Shared<T, X>
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    /// Draining -> Idle. Caller must hold the state lock.
    fn go_idle(&self, state: &mut QueueState<T, X>) {
        state.draining = false;
        self.drain_tx.send_replace(DrainState::Idle);
    }
}

/// Coalesces individually submitted payloads into batches.
///
/// Cloning a `BatchQueue` yields another handle to the same queue. Separately
/// built queues share nothing.
///
/// # Example
/// ```ignore
/// let queue = BatchQueue::builder(executor_fn(|xs: Vec<u32>| async move {
///     Ok::<_, std::convert::Infallible>(xs.into_iter().map(|x| x * 2).collect())
/// }))
/// .window(BatchWindow::new(3, Duration::ZERO)?)
/// .build()?;
///
/// assert_eq!(queue.submit(21).await?, 42);
/// ```
pub struct BatchQueue<T, X>
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    shared: Arc<Shared<T, X>>,
}

impl<T, X> Clone for BatchQueue<T, X>
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> BatchQueue<T, IdentityExecutor>
where
    T: Send + 'static,
{
    /// Queue whose executor hands every payload back unchanged.
    pub fn identity(window: BatchWindow) -> Result<Self, BuildError> {
        BatchQueueBuilder::new(IdentityExecutor).window(window).build()
    }
}

impl<T, X> BatchQueue<T, X>
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    pub fn builder(executor: X) -> BatchQueueBuilder<T, X> {
        BatchQueueBuilder::new(executor)
    }

    pub(crate) fn from_parts(
        window: BatchWindow,
        executor: X,
        ids: Arc<dyn IdGenerator>,
        runtime: Handle,
    ) -> Self {
        let (drain_tx, _) = watch::channel(DrainState::Idle);
        Self {
            shared: Arc::new(Shared {
                window,
                executor: Arc::new(executor),
                ids,
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    draining: false,
                }),
                drain_tx,
                stats: StatsCounters::default(),
                runtime,
            }),
        }
    }

    /// Enqueue `payload` and return a handle to its eventual result.
    ///
    /// Never blocks and never fails; starts a drain loop if none is running.
    pub fn submit(&self, payload: T) -> TaskHandle<X::Output, X::Error> {
        let id = self.shared.ids.generate_task_id();
        let (task, handle) = Task::new(id, payload);
        self.shared.stats.record_submit();

        let start_drain = {
            let mut state = self.shared.state.lock();
            state.pending.push_back(task);
            if state.draining {
                false
            } else {
                state.draining = true;
                self.shared.drain_tx.send_replace(DrainState::Draining);
                true
            }
        };

        if start_drain {
            debug!(task_id = %id, "queue idle, starting drain loop");
            // a runtime that has shut down drops the loop unpolled; the guard
            // then abandons the pending tasks instead of leaving them stuck
            let guard = drain::DrainGuard::new(Arc::clone(&self.shared));
            self.shared.runtime.spawn(drain::drain_loop(guard));
        }

        handle
    }

    pub fn window(&self) -> BatchWindow {
        self.shared.window
    }

    pub fn drain_state(&self) -> DrainState {
        if self.shared.state.lock().draining {
            DrainState::Draining
        } else {
            DrainState::Idle
        }
    }

    /// Number of tasks waiting for a batch (excludes the batch in flight).
    pub fn len(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> QueueStats {
        let (state, pending) = {
            let state = self.shared.state.lock();
            let drain_state = if state.draining {
                DrainState::Draining
            } else {
                DrainState::Idle
            };
            (drain_state, state.pending.len())
        };
        self.shared.stats.snapshot(state, pending)
    }

    /// Resolve once the queue has no active drain loop.
    ///
    /// Returns immediately if the queue is already idle.
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.drain_tx.subscribe();
        let _ = rx.wait_for(|state| state.is_idle()).await;
    }
}
