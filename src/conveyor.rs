//! Implements `conveyor<T>`, a thin object wrapper around a single [`Stage`].
use {
    crate::{ConveyorError, Stage},
    std::error::Error,
};

/// A single-stage conveyor: owns one worker thread plus an unbounded FIFO, and exposes `push` to
/// transfer an item to the worker for processing.
///
/// Finishes (drains and joins its worker) on [`Drop`]. Any error the worker captured but that
/// was never observed via [`Conveyor::push`] by the time `self` is dropped is logged at `warn`
/// and discarded — the destructor never panics or propagates a failure, so callers that care
/// about a stage's outcome must observe it (via `push`, or by calling [`Conveyor::finish`]
/// and [`Conveyor::check_error`] explicitly) before `self` goes out of scope.
pub struct Conveyor<T: Send + 'static> {
    stage: Stage<T>,
}

impl<T> Conveyor<T>
where
    T: Send + 'static,
{
    /// Creates a new [`Conveyor`] owning `consumer` and spawns its worker thread immediately.
    pub fn new<F, E>(consumer: F) -> Self
    where
        F: FnMut(T) -> Result<(), E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self {
            stage: Stage::new(consumer),
        }
    }

    /// Moves `item` to the worker for processing.
    ///
    /// # Errors
    ///
    /// Returns the worker's captured failure, if one has already occurred.
    #[inline]
    pub fn push(&self, item: T) -> Result<(), ConveyorError> {
        self.stage.push(item)
    }

    /// Copies `item` and pushes the copy, as [`Conveyor::push`].
    #[inline]
    pub fn push_copy(&self, item: &T) -> Result<(), ConveyorError>
    where
        T: Clone,
    {
        self.stage.push_copy(item)
    }

    /// Sets shutdown, wakes the worker and waits for it to terminate. Idempotent; safe to call
    /// before `self` is dropped in order to observe the worker's outcome via
    /// [`Conveyor::check_error`].
    #[inline]
    pub fn finish(&self) {
        self.stage.finish();
    }

    /// Re-raises the worker's captured failure, if any.
    ///
    /// # Errors
    ///
    /// Returns the worker's captured failure, if one occurred.
    #[inline]
    pub fn check_error(&self) -> Result<(), ConveyorError> {
        self.stage.check_error()
    }
}

impl<T: Send + 'static> Drop for Conveyor<T> {
    fn drop(&mut self) {
        self.stage.finish();
        if let Err(error) = self.stage.check_error() {
            log::warn!("conveyor dropped with an unobserved failure: {error}");
        }
    }
}
