//! Defines the error type raised when a stage of a pipeline fails.
use {
    core::{
        any::Any,
        fmt::{self, Debug, Display, Formatter},
    },
    std::{error::Error, sync::Arc},
};

/// The error surfaced by a [`crate::Stage`] or a [`crate::conveyor`] when a producer, converter
/// or consumer fails.
///
/// This is the moral equivalent of the `std::exception_ptr` the pipeline this crate is modeled
/// on uses to carry an arbitrary thrown value across threads: Rust has no unchecked-throw
/// mechanism, so every captured failure — whether a callable returned `Err` or panicked — is
/// type-erased into this single type behind an [`Arc`], which keeps it cheap to clone when the
/// same failure is read by more than one caller (a later `push`, and `check_error`).
#[derive(Clone)]
pub struct ConveyorError(Arc<dyn Error + Send + Sync + 'static>);

impl ConveyorError {
    /// Wraps `error` as a [`ConveyorError`].
    pub(crate) fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Wraps the payload caught by [`std::panic::catch_unwind`] as a [`ConveyorError`].
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::new(PanicError(panic_message(&payload)))
    }
}

impl Debug for ConveyorError {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for ConveyorError {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for ConveyorError {
    #[inline]
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

/// The failure captured when a producer, converter or consumer panics instead of returning
/// `Err`.
///
/// A panicking callable does not crash the process; the worker thread catches the unwind, the
/// panic message is preserved here, and the failure flows through the same error slot a returned
/// `Err` would have used.
#[derive(Clone, Debug, thiserror::Error)]
#[error("stage panicked: {0}")]
pub struct PanicError(String);

/// Extracts a human-readable message from a caught panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
