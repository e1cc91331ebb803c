//! Implements the per-stage worker: a queue, a lock, a wait condition, a thread, an error slot
//! and the drain protocol that ties them together.
use {
    crate::{ConveyorError, Forwarder},
    fehler::{throw, throws},
    std::{
        collections::VecDeque,
        error::Error,
        fmt::{self, Debug, Formatter},
        panic::{catch_unwind, AssertUnwindSafe},
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, Condvar, Mutex, PoisonError,
        },
        thread::JoinHandle,
    },
};

/// The polymorphic half of a downstream [`Stage`]: only `finish` and `check_error` need to cross
/// an item-type boundary, so everything else about a chain stays monomorphic.
pub(crate) trait ChainLink: Send + Sync {
    fn finish(&self);
    fn check_error(&self) -> Result<(), ConveyorError>;
}

impl<T> ChainLink for Stage<T>
where
    T: Send + 'static,
{
    #[inline]
    fn finish(&self) {
        Stage::finish(self);
    }

    #[inline]
    fn check_error(&self) -> Result<(), ConveyorError> {
        Stage::check_error(self)
    }
}

/// Shared state of a [`Stage`]: the FIFO, the lock and wait condition guarding it, the shutdown
/// flag, the error slot, the worker's join handle, and (if this is not the tail stage) the
/// downstream link used only for drain and error propagation.
struct Inner<T> {
    queue: Mutex<VecDeque<T>>,
    condvar: Condvar,
    shutdown: AtomicBool,
    error: Mutex<Option<ConveyorError>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    downstream: Option<Box<dyn ChainLink>>,
}

/// A single-worker pipeline cell: a dedicated thread serializes a stream of `T` to one consumer
/// callable.
///
/// Cloning a [`Stage`] shares the same queue, worker and error state — the clone handed to an
/// adapter closure (for pushing) and the handle retained by the stage upstream of it (for
/// `finish`/`check_error`) address the same underlying worker.
pub struct Stage<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Stage<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Stage<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage").finish_non_exhaustive()
    }
}

impl<T> Stage<T>
where
    T: Send + 'static,
{
    /// Creates a new [`Stage`] owning `consumer`, with no downstream link, and spawns its
    /// worker thread immediately.
    pub fn new<F, E>(consumer: F) -> Self
    where
        F: FnMut(T) -> Result<(), E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::with_downstream(consumer, None)
    }

    /// Creates a new [`Stage`] owning `consumer`, linking `downstream` for drain/error
    /// propagation.
    pub(crate) fn with_downstream<F, E>(
        mut consumer: F,
        downstream: Option<Box<dyn ChainLink>>,
    ) -> Self
    where
        F: FnMut(T) -> Result<(), E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        let inner = Arc::new(Inner {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
            error: Mutex::new(None),
            worker: Mutex::new(None),
            downstream,
        });

        let worker_inner = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name("conveyor-stage".to_string())
            .spawn(move || drain(&worker_inner, &mut consumer))
            .expect("failed to spawn conveyor worker thread");
        log::trace!("spawned conveyor worker thread {:?}", handle.thread().id());

        *inner.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        Self { inner }
    }

    /// Appends `item` to the queue (by move) and wakes the worker.
    ///
    /// # Errors
    ///
    /// Returns the error already captured by this stage, leaving the queue unchanged, without
    /// enqueuing `item`.
    #[throws(ConveyorError)]
    pub fn push(&self, item: T) {
        if let Some(error) = self.captured_error() {
            throw!(error);
        }

        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
        self.inner.condvar.notify_one();
    }

    /// Copies `item` and pushes the copy, as [`Stage::push`].
    #[inline]
    pub fn push_copy(&self, item: &T) -> Result<(), ConveyorError>
    where
        T: Clone,
    {
        self.push(item.clone())
    }

    /// Returns a [`Forwarder`] bound to this stage.
    #[inline]
    pub fn forwarder(&self) -> Forwarder<'_, T> {
        Forwarder::new(self)
    }

    /// Sets the shutdown flag, wakes the worker, waits for it to terminate, then (if a
    /// downstream stage is linked) recursively finishes it. Idempotent.
    pub fn finish(&self) {
        // Set `shutdown` while holding the queue lock: the worker's `wait_while` predicate reads
        // `shutdown` under this same lock, so setting it outside the lock could race between the
        // worker's predicate check and it parking on the condvar, losing the wakeup.
        let guard = self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.shutdown.store(true, Ordering::Release);
        drop(guard);
        self.inner.condvar.notify_one();

        let handle = self
            .inner
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            log::trace!("joining conveyor worker thread {:?}", handle.thread().id());
            let _ = handle.join();
        }

        if let Some(downstream) = &self.inner.downstream {
            downstream.finish();
        }
    }

    /// Re-raises this stage's captured failure, or (if none) recurses to the downstream stage.
    ///
    /// # Errors
    ///
    /// Returns the first failure captured anywhere in the remainder of the chain starting at
    /// this stage.
    #[throws(ConveyorError)]
    pub fn check_error(&self) {
        if let Some(error) = self.captured_error() {
            throw!(error);
        }

        if let Some(downstream) = &self.inner.downstream {
            downstream.check_error()?;
        }
    }

    /// Reads (without clearing) this stage's own error slot.
    fn captured_error(&self) -> Option<ConveyorError> {
        self.inner
            .error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// The drain loop: pop items under the lock, run `consumer` outside it, and stop — capturing
/// whatever failure ended the loop — on the first error or panic, or once the queue is empty
/// and `shutdown` has been set.
fn drain<T, F, E>(inner: &Inner<T>, consumer: &mut F)
where
    F: FnMut(T) -> Result<(), E>,
    E: Error + Send + Sync + 'static,
{
    loop {
        let mut guard = inner.queue.lock().unwrap_or_else(PoisonError::into_inner);
        guard = inner
            .condvar
            .wait_while(guard, |queue| {
                queue.is_empty() && !inner.shutdown.load(Ordering::Acquire)
            })
            .unwrap_or_else(PoisonError::into_inner);
        let item = guard.pop_front();
        drop(guard);

        let item = match item {
            Some(item) => item,
            None => {
                debug_assert!(inner.shutdown.load(Ordering::Acquire));
                return;
            }
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| consumer(item)));
        let failure = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(error)) => ConveyorError::new(error),
            Err(panic) => {
                log::warn!("conveyor stage consumer panicked");
                ConveyorError::from_panic(panic)
            }
        };

        log::debug!("conveyor stage captured a failure and is stopping");
        *inner.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(failure);
        return;
    }
}
