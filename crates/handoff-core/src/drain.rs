//! Drain helpers shared by every FIFO consumer.
//!
//! Both helpers take the pop operation as a closure so the same code drains
//! an [`AsyncFifo`](crate::AsyncFifo), a [`FifoConsumer`](crate::FifoConsumer)
//! or any other try-pop source (the loader's finished-object queue uses them
//! too). They never block: draining stops at the first empty pop.

/// Pop until empty, invoking `callback` on each value in FIFO order.
///
/// Returns the number of values drained.
#[inline]
pub fn drain_all<T>(mut pop: impl FnMut() -> Option<T>, mut callback: impl FnMut(T)) -> usize {
    let mut count = 0;
    while let Some(value) = pop() {
        callback(value);
        count += 1;
    }
    count
}

/// Pop until empty, then invoke `callback` once on the last value popped.
///
/// Earlier values are dropped in order. Returns `true` if the callback ran,
/// `false` if the source was already empty.
#[inline]
pub fn drain_keep_last<T>(mut pop: impl FnMut() -> Option<T>, callback: impl FnOnce(T)) -> bool {
    let mut last = None;
    while let Some(value) = pop() {
        last = Some(value);
    }

    match last {
        Some(value) => {
            callback(value);
            true
        }
        None => false,
    }
}
