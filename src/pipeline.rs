//! Implements the variadic top-level entry point: drives the producer on the calling thread,
//! triggers drain, and surfaces the first error observed anywhere in the chain.
use {
    crate::{ConveyorError, Forwarder, Stage},
    std::error::Error,
};

/// Runs `producer` against the head of `chain` on the calling thread, then drains and surfaces
/// the first failure of the chain.
///
/// This is the function [`conveyor_function!`] expands into after building the chain with
/// [`compose!`]. If `producer` fails, `chain` is still finished (so every worker thread is
/// joined) before `producer`'s own failure is returned; a downstream failure discovered only
/// during that drain is not consulted in that case — the producer's own failure always wins over
/// a (likely identical) downstream failure walking upstream.
///
/// # Errors
///
/// Returns the first failure captured by `producer` or by any stage of `chain`.
#[doc(hidden)]
pub fn run_pipeline<T, P, E>(chain: &Stage<T>, mut producer: P) -> Result<(), ConveyorError>
where
    T: Send + 'static,
    P: FnMut(Forwarder<'_, T>) -> Result<(), E>,
    E: Error + Send + Sync + 'static,
{
    let producer_result = producer(chain.forwarder());
    chain.finish();

    match producer_result {
        Ok(()) => chain.check_error(),
        Err(error) => Err(ConveyorError::new(error)),
    }
}

/// Composes `producer, c1, .., cN` (`N >= 1`) into a pipeline and runs it to completion.
///
/// `producer` classifies as a producer (`FnMut(Forwarder<T>) -> Result<(), E>`), runs on the
/// calling thread. Every other callable classifies as a converter (`FnMut(S, Forwarder<T>) ->
/// Result<(), E>`) or, for the last one, a consumer (`FnMut(S) -> Result<(), E>`); each runs on
/// its own worker thread. The call returns once every stage has drained, and surfaces the first
/// error observed in any stage — see [`run_pipeline`].
///
/// # Errors
///
/// Returns the first failure captured by the producer or by any stage of the pipeline.
#[macro_export]
macro_rules! conveyor_function {
    ($producer:expr, $($rest:expr),+ $(,)?) => {{
        let chain = $crate::compose!($($rest),+);
        $crate::run_pipeline(&chain, $producer)
    }};
}
