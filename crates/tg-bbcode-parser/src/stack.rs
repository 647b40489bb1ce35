/// Minimum stack space left before growing, 100KB.
const RED_ZONE: usize = 100 * 1024;

/// Stack space allocated on each growth, 1MB.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f` on a grown stack if less than [`RED_ZONE`] is left.
///
/// Wrap every recursion that follows token links with it.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
