//! Bounded SPSC FIFO shared between one producer and one consumer thread.
//!
//! Backed by a `ringbuf` heap ring buffer. Both halves live in `UnsafeCell`s
//! so the FIFO can be shared by reference (usually behind an `Arc`) between
//! the audio thread and a UI or loader thread. Safety rests on the SPSC
//! invariant: one pushing thread, one popping thread.

use crate::drain;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use std::cell::UnsafeCell;
use std::fmt;
use std::sync::Arc;

/// Default capacity used by [`AsyncFifo::default`].
const DEFAULT_CAPACITY: usize = 1024;

/// Capacity needed to hold one refresh period of values produced at `rate`.
///
/// E.g. `capacity_for_rate(48000.0, 60.0) == 800` for a waveform view that
/// drains once per frame. Never returns zero.
pub fn capacity_for_rate(rate: f64, refresh_hz: f64) -> usize {
    if !(rate.is_finite() && refresh_hz.is_finite()) || refresh_hz <= 0.0 {
        return 1;
    }
    ((rate / refresh_hz) as usize).max(1)
}

fn make_ring<T>(capacity: usize) -> (Arc<HeapRb<T>>, HeapProd<T>, HeapCons<T>) {
    let rb = Arc::new(HeapRb::<T>::new(capacity.max(1)));
    let (producer, consumer) = Arc::clone(&rb).split();
    (rb, producer, consumer)
}

/// Lock-free single-producer/single-consumer FIFO.
///
/// `push` and `pop` take `&self` and never block or allocate. They are
/// wait-free as long as the SPSC contract holds:
///
/// - only one thread ever calls the push family (`push`, `try_push`, `push_with`)
/// - only one thread ever calls the pop family (`pop`, `drain_all`, `drain_keep_last`)
///
/// Violating this is a silent data race, not a detected error.
///
/// `resize` and `clear` replace the backing storage and discard everything
/// buffered. The safe versions need `&mut self`; the `_unchecked` versions
/// work through a shared reference and require the caller to guarantee that
/// neither side is pushing or popping while they run.
pub struct AsyncFifo<T> {
    rb: UnsafeCell<Arc<HeapRb<T>>>,
    producer: UnsafeCell<HeapProd<T>>,
    consumer: UnsafeCell<HeapCons<T>>,
}

// SAFETY: the halves are Send when T is Send. Moving the FIFO moves both.
unsafe impl<T: Send> Send for AsyncFifo<T> {}

// SAFETY: the producer cell is only touched by the push family and the
// consumer cell only by the pop family. With one pushing and one popping
// thread (the SPSC contract documented above) the two cells are never
// aliased mutably from two threads. The `rb` cell is only written by
// `resize_unchecked`/`clear_unchecked`, whose callers guarantee exclusivity.
unsafe impl<T: Send> Sync for AsyncFifo<T> {}

impl<T> AsyncFifo<T> {
    /// Allocate a FIFO holding up to `capacity` values (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (rb, producer, consumer) = make_ring(capacity);
        Self {
            rb: UnsafeCell::new(rb),
            producer: UnsafeCell::new(producer),
            consumer: UnsafeCell::new(consumer),
        }
    }

    #[inline]
    fn ring(&self) -> &HeapRb<T> {
        // SAFETY: `rb` is only replaced under the exclusivity contract of
        // `resize_unchecked`, never concurrently with observers.
        unsafe { &*self.rb.get() }
    }

    /// Maximum number of buffered values.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring().capacity().get()
    }

    /// Number of values currently buffered. Approximate while the other side runs.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring().occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring().is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring().is_full()
    }

    /// Push a value, returning `false` if the FIFO is full.
    ///
    /// The rejected value is dropped on the calling thread. Use
    /// [`try_push`](Self::try_push) to get it back instead.
    #[inline]
    pub fn push(&self, value: T) -> bool {
        self.try_push(value).is_ok()
    }

    /// Push a value, handing it back in `Err` if the FIFO is full.
    #[inline]
    pub fn try_push(&self, value: T) -> Result<(), T> {
        // SAFETY: single producer (SPSC contract).
        let producer = unsafe { &mut *self.producer.get() };
        producer.try_push(value)
    }

    /// Build and push a value only if a slot is free.
    ///
    /// `make` is not called when the FIFO is full.
    #[inline]
    pub fn push_with(&self, make: impl FnOnce() -> T) -> bool {
        if self.is_full() {
            return false;
        }
        // `make` may push to this FIFO itself, so no producer borrow may be
        // live while it runs.
        let value = make();
        self.try_push(value).is_ok()
    }

    /// Pop the oldest value, or `None` if the FIFO is empty.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        // SAFETY: single consumer (SPSC contract).
        let consumer = unsafe { &mut *self.consumer.get() };
        consumer.try_pop()
    }

    /// Pop every buffered value into `callback`, oldest first.
    ///
    /// Consumer side only. Returns how many values were drained.
    #[inline]
    pub fn drain_all(&self, callback: impl FnMut(T)) -> usize {
        drain::drain_all(|| self.pop(), callback)
    }

    /// Pop every buffered value and call `callback` once with the newest.
    ///
    /// Consumer side only. Returns `false` without calling `callback` if the
    /// FIFO was empty.
    #[inline]
    pub fn drain_keep_last(&self, callback: impl FnOnce(T)) -> bool {
        drain::drain_keep_last(|| self.pop(), callback)
    }

    /// Replace the backing storage with room for `capacity` values.
    ///
    /// Everything buffered is dropped.
    pub fn resize(&mut self, capacity: usize) {
        *self = Self::new(capacity);
    }

    /// Drop everything buffered, keeping the current capacity.
    pub fn clear(&mut self) {
        let capacity = self.capacity();
        self.resize(capacity);
    }

    /// [`resize`](Self::resize) through a shared reference.
    ///
    /// # Safety
    ///
    /// No push, pop or observer call may run on any thread while this executes.
    /// Typically called during a setup phase when both the producer and the
    /// consumer thread are known to be idle.
    pub unsafe fn resize_unchecked(&self, capacity: usize) {
        let (rb, producer, consumer) = make_ring(capacity);
        *self.producer.get() = producer;
        *self.consumer.get() = consumer;
        *self.rb.get() = rb;
    }

    /// [`clear`](Self::clear) through a shared reference.
    ///
    /// # Safety
    ///
    /// Same contract as [`resize_unchecked`](Self::resize_unchecked).
    pub unsafe fn clear_unchecked(&self) {
        let capacity = self.capacity();
        self.resize_unchecked(capacity);
    }

    /// Split into owned producer and consumer halves.
    ///
    /// Each half is `Send` but neither is `Clone` or `Sync`, so the SPSC
    /// contract is enforced by the compiler from here on.
    pub fn split(self) -> (FifoProducer<T>, FifoConsumer<T>) {
        let Self {
            producer, consumer, ..
        } = self;
        (
            FifoProducer {
                inner: producer.into_inner(),
            },
            FifoConsumer {
                inner: consumer.into_inner(),
            },
        )
    }
}

impl<T> Default for AsyncFifo<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> fmt::Debug for AsyncFifo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFifo")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

/// Push half of a split [`AsyncFifo`].
pub struct FifoProducer<T> {
    inner: HeapProd<T>,
}

impl<T> FifoProducer<T> {
    #[inline]
    pub fn push(&mut self, value: T) -> bool {
        self.inner.try_push(value).is_ok()
    }

    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        self.inner.try_push(value)
    }

    #[inline]
    pub fn push_with(&mut self, make: impl FnOnce() -> T) -> bool {
        if self.inner.is_full() {
            return false;
        }
        self.inner.try_push(make()).is_ok()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity().get()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }
}

/// Pop half of a split [`AsyncFifo`].
pub struct FifoConsumer<T> {
    inner: HeapCons<T>,
}

impl<T> FifoConsumer<T> {
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.inner.try_pop()
    }

    #[inline]
    pub fn drain_all(&mut self, callback: impl FnMut(T)) -> usize {
        drain::drain_all(|| self.inner.try_pop(), callback)
    }

    #[inline]
    pub fn drain_keep_last(&mut self, callback: impl FnOnce(T)) -> bool {
        drain::drain_keep_last(|| self.inner.try_pop(), callback)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity().get()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_with_reentrant_push() {
        let fifo = AsyncFifo::<u32>::new(4);
        assert!(fifo.push_with(|| {
            assert!(fifo.push(1));
            2
        }));
        assert_eq!(fifo.len(), 2);
        assert_eq!(fifo.pop(), Some(1));
        assert_eq!(fifo.pop(), Some(2));
    }

    #[test]
    fn test_push_with_reentrant_fill_rejects_value() {
        let fifo = AsyncFifo::<u32>::new(1);
        assert!(!fifo.push_with(|| {
            assert!(fifo.push(1));
            2
        }));
        assert_eq!(fifo.pop(), Some(1));
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn test_pop_returns_push_order() {
        let fifo = AsyncFifo::<f32>::new(4);
        assert!(fifo.push(1.0));
        assert!(fifo.push(2.0));
        assert!(fifo.push(3.0));

        assert_eq!(fifo.pop(), Some(1.0));
        assert_eq!(fifo.pop(), Some(2.0));
        assert_eq!(fifo.pop(), Some(3.0));
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn test_full_fifo_rejects_until_pop() {
        let fifo = AsyncFifo::<f32>::new(4);
        for v in [1.0, 2.0, 3.0, 4.0] {
            assert!(fifo.push(v));
        }
        assert!(fifo.is_full());
        assert!(!fifo.push(5.0));

        assert_eq!(fifo.pop(), Some(1.0));
        assert!(fifo.push(5.0));
        assert!(!fifo.push(6.0));

        let mut rest = Vec::new();
        fifo.drain_all(|v| rest.push(v));
        assert_eq!(rest, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_try_push_hands_back_rejected_value() {
        let fifo = AsyncFifo::<String>::new(1);
        assert!(fifo.try_push("a".to_string()).is_ok());
        assert_eq!(fifo.try_push("b".to_string()), Err("b".to_string()));
    }

    #[test]
    fn test_push_with_skips_builder_when_full() {
        let fifo = AsyncFifo::<u32>::new(1);
        assert!(fifo.push_with(|| 7));
        assert!(!fifo.push_with(|| panic!("must not build into a full fifo")));
        assert_eq!(fifo.pop(), Some(7));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let fifo = AsyncFifo::<u8>::new(0);
        assert_eq!(fifo.capacity(), 1);
        assert!(fifo.push(1));
        assert!(!fifo.push(2));
    }

    #[test]
    fn test_resize_discards_content() {
        let mut fifo = AsyncFifo::<i32>::new(2);
        fifo.push(1);
        fifo.push(2);

        fifo.resize(8);

        assert_eq!(fifo.capacity(), 8);
        assert!(fifo.is_empty());
        for v in 0..8 {
            assert!(fifo.push(v));
        }
        assert!(!fifo.push(8));
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut fifo = AsyncFifo::<i32>::new(3);
        fifo.push(1);
        fifo.push(2);

        fifo.clear();

        assert_eq!(fifo.capacity(), 3);
        assert_eq!(fifo.len(), 0);
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn test_resize_unchecked_through_shared_reference() {
        let fifo = Arc::new(AsyncFifo::<i32>::new(2));
        fifo.push(1);

        // SAFETY: no other thread holds the fifo.
        unsafe { fifo.resize_unchecked(5) };

        assert_eq!(fifo.capacity(), 5);
        assert_eq!(fifo.pop(), None);

        fifo.push(9);
        // SAFETY: as above.
        unsafe { fifo.clear_unchecked() };
        assert_eq!(fifo.capacity(), 5);
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_drain_keep_last_on_fifo() {
        let fifo = AsyncFifo::<u32>::new(8);
        assert!(!fifo.drain_keep_last(|_| panic!("empty fifo")));

        for v in 1..=5 {
            fifo.push(v);
        }
        let mut last = None;
        assert!(fifo.drain_keep_last(|v| last = Some(v)));
        assert_eq!(last, Some(5));
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_split_halves() {
        let fifo = AsyncFifo::<u8>::new(2);
        fifo.push(1);

        let (mut producer, mut consumer) = fifo.split();
        assert_eq!(producer.capacity(), 2);
        assert_eq!(consumer.len(), 1);

        assert!(producer.push(2));
        assert!(producer.is_full());
        assert!(!producer.push(3));

        let mut seen = Vec::new();
        assert_eq!(consumer.drain_all(|v| seen.push(v)), 2);
        assert_eq!(seen, vec![1, 2]);
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_capacity_for_rate() {
        assert_eq!(capacity_for_rate(48000.0, 60.0), 800);
        assert_eq!(capacity_for_rate(44100.0, 60.0), 735);
        assert_eq!(capacity_for_rate(10.0, 60.0), 1);
        assert_eq!(capacity_for_rate(48000.0, 0.0), 1);
        assert_eq!(capacity_for_rate(f64::NAN, 60.0), 1);
    }

    #[test]
    fn test_default_capacity() {
        let fifo = AsyncFifo::<f32>::default();
        assert_eq!(fifo.capacity(), 1024);
    }

    proptest! {
        #[test]
        fn prop_fifo_order_up_to_capacity(
            capacity in 1usize..64,
            values in proptest::collection::vec(any::<i32>(), 0..64),
        ) {
            let fifo = AsyncFifo::<i32>::new(capacity);
            let accepted: Vec<i32> = values
                .iter()
                .copied()
                .filter(|&v| fifo.push(v))
                .collect();

            prop_assert_eq!(accepted.len(), values.len().min(capacity));
            prop_assert_eq!(&accepted[..], &values[..accepted.len()]);

            let mut popped = Vec::new();
            while let Some(v) = fifo.pop() {
                popped.push(v);
            }
            prop_assert_eq!(popped, accepted);
            prop_assert!(fifo.pop().is_none());
        }
    }
}
