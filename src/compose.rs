//! Implements the composer: folding a list of callables, tail-first, into a chain of linked
//! [`Stage`]s with correctly typed adapters.
//!
//! Callables are classified by the generic bounds on [`compose_consumer`] and
//! [`compose_converter`] rather than by a runtime-reflective trait: a callable passed where it
//! does not satisfy `FnMut(S) -> Result<(), E>` (consumer position) or
//! `FnMut(S, Forwarder<'_, T>) -> Result<(), E>` (converter position) fails to type-check there,
//! and a type mismatch between `compose_converter`'s `T` and the next stage's `S` fails to
//! type-check at the call site that chains them — `rustc` reports these as ordinary trait-bound
//! and type-mismatch errors against the bounds below rather than as the named diagnostics a
//! bespoke classifier could raise.
use {
    crate::{stage::ChainLink, Forwarder, Stage},
    std::error::Error,
};

/// Wraps `consumer` as the tail [`Stage`] of a chain.
///
/// This is the base case of [`compose!`]: the consumer classifies as `FnMut(S) -> Result<(),
/// E>` and needs no downstream link.
pub fn compose_consumer<S, C, E>(consumer: C) -> Stage<S>
where
    S: Send + 'static,
    C: FnMut(S) -> Result<(), E> + Send + 'static,
    E: Error + Send + Sync + 'static,
{
    Stage::with_downstream(consumer, None)
}

/// Wraps `converter` as a new [`Stage`] upstream of `downstream`.
///
/// The converter classifies as `FnMut(S, &Forwarder<T>) -> Result<(), E>`; it is adapted into a
/// plain `FnMut(S) -> Result<(), ConveyorError>` by capturing a clone of `downstream` and
/// building a fresh [`Forwarder`] on every call rather than storing one.
pub fn compose_converter<S, T, Conv, E>(mut converter: Conv, downstream: Stage<T>) -> Stage<S>
where
    S: Send + 'static,
    T: Send + 'static,
    Conv: FnMut(S, Forwarder<'_, T>) -> Result<(), E> + Send + 'static,
    E: Error + Send + Sync + 'static,
{
    let link: Box<dyn ChainLink> = Box::new(downstream.clone());
    let adapter = move |item: S| -> Result<(), crate::ConveyorError> {
        converter(item, downstream.forwarder()).map_err(crate::ConveyorError::new)
    };
    Stage::with_downstream(adapter, Some(link))
}

/// Folds a tail of callables into a linked chain of [`Stage`]s, leaves first.
///
/// `compose!(consumer)` wraps `consumer` as the tail stage. `compose!(converter, rest...)`
/// recurses on `rest...`, then wraps `converter` upstream of the resulting stage — a
/// `macro_rules!` recursion standing in for the variadic generics Rust doesn't have.
#[macro_export]
macro_rules! compose {
    ($consumer:expr) => {
        $crate::compose_consumer($consumer)
    };
    ($converter:expr, $($rest:expr),+ $(,)?) => {
        $crate::compose_converter($converter, $crate::compose!($($rest),+))
    };
}
