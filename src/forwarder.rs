//! Implements the push-only handle given to a producer or converter.
use {
    crate::{ConveyorError, Stage},
    std::fmt::{self, Debug, Formatter},
};

/// A push-only handle bound to a single [`Stage`], handed by reference to the producer or
/// converter callable that runs upstream of that stage.
///
/// A [`Forwarder`] carries no state beyond the reference to its [`Stage`]; it is not shared
/// across threads (exactly one upstream callable drives it during that callable's invocation)
/// and is valid only for the duration of that call.
pub struct Forwarder<'stage, T> {
    stage: &'stage Stage<T>,
}

// Written by hand rather than derived: `#[derive(Debug)]` would add a spurious `T: Debug` bound,
// even though `Stage<T>`'s own `Debug` impl does not require one.
impl<T> Debug for Forwarder<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forwarder").finish_non_exhaustive()
    }
}

impl<'stage, T> Forwarder<'stage, T>
where
    T: Send + 'static,
{
    /// Creates a [`Forwarder`] bound to `stage`.
    pub(crate) fn new(stage: &'stage Stage<T>) -> Self {
        Self { stage }
    }

    /// Moves `item` onto the bound stage's queue, waking its worker.
    ///
    /// # Errors
    ///
    /// Returns the stage's captured failure if one has already been observed; `item` is not
    /// enqueued in that case.
    #[inline]
    pub fn push(&self, item: T) -> Result<(), ConveyorError> {
        self.stage.push(item)
    }

    /// Copies `item` and pushes the copy, as [`Forwarder::push`].
    ///
    /// Only available when `T` is [`Clone`]; a non-cloneable item type must be moved instead.
    #[inline]
    pub fn push_copy(&self, item: &T) -> Result<(), ConveyorError>
    where
        T: Clone,
    {
        self.stage.push(item.clone())
    }
}

// `Forwarder` holds only a shared reference, so it is `Copy`/`Clone` regardless of `T`.
impl<T> Clone for Forwarder<'_, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Forwarder<'_, T> {}
