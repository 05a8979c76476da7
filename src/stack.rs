//! Stack growth for the recursive parser and evaluator.
//!
//! Nested expressions and interpreted recursion both map onto native recursion.
//! Every recursive step runs through [`ensure_sufficient_stack`], which moves onto a
//! freshly allocated segment when the remaining stack drops below the red zone.
//! Runaway interpreted recursion is stopped by the evaluator's depth limit rather
//! than by the process aborting.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
