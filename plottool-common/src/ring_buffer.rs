//! Fixed-capacity sample ring shared between one collector thread (writer)
//! and the render loop (reader).
//!
//! Writers serialize on a mutex and bump a sequence counter to an odd value
//! while they mutate the ring. Readers never lock the writers out: they copy
//! optimistically and retry when the sequence or the `(count, head, tail)`
//! triple moved under them.

use crate::error::Error;
use std::sync::{
    atomic::{fence, AtomicU64, AtomicUsize, Ordering},
    Arc, Mutex, RwLock,
};

/// Value pushed in place of a sample when the source failed or is missing.
pub const UNAVAILABLE: f64 = -1.0;

/// Maximum number of optimistic copies before a snapshot gives up.
pub const SNAPSHOT_ATTEMPTS: u32 = 10;

type Slots = Arc<[AtomicU64]>;

/// Cheap identity of the buffer contents, used to detect whether a chart
/// has to be redrawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub count: usize,
    pub head: usize,
    pub sequence: u64,
}

/// Result of a successful [`RingBuffer::snapshot`].
///
/// `count` is the number of values copied into the destination, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub count: usize,
    pub head: usize,
    pub tail: usize,
}

#[derive(Debug)]
pub struct RingBuffer {
    slots: RwLock<Slots>,
    capacity: AtomicUsize,
    head: AtomicUsize,
    tail: AtomicUsize,
    count: AtomicUsize,
    sequence: AtomicU64,
    write_mutex: Mutex<()>,
    resize_mutex: Mutex<()>,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::invalid_capacity(capacity));
        }
        let slots = Self::allocate(capacity)?;
        Ok(Self {
            slots: RwLock::new(slots),
            capacity: AtomicUsize::new(capacity),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
            sequence: AtomicU64::new(0),
            write_mutex: Mutex::new(()),
            resize_mutex: Mutex::new(()),
        })
    }

    fn allocate(capacity: usize) -> Result<Slots, Error> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| Error::allocation(capacity))?;
        slots.extend((0..capacity).map(|_| AtomicU64::new(0f64.to_bits())));
        Ok(slots.into())
    }

    fn slots(&self) -> Slots {
        self.slots.read().expect("ring buffer slots lock").clone()
    }

    fn begin_write(&self) {
        self.sequence.fetch_add(1, Ordering::Relaxed);
        fence(Ordering::Release);
    }

    fn end_write(&self) {
        self.sequence.fetch_add(1, Ordering::Release);
    }

    /// Appends a value, evicting the oldest one when the ring is full.
    pub fn push(&self, value: f64) {
        let _write = self.write_mutex.lock().expect("ring buffer write mutex");
        let slots = self.slots();
        let capacity = slots.len();
        let head = self.head.load(Ordering::Relaxed);
        let count = self.count.load(Ordering::Relaxed);

        self.begin_write();
        slots[head].store(value.to_bits(), Ordering::Relaxed);
        self.head.store((head + 1) % capacity, Ordering::Relaxed);
        if count < capacity {
            self.count.store(count + 1, Ordering::Relaxed);
        } else {
            let tail = self.tail.load(Ordering::Relaxed);
            self.tail.store((tail + 1) % capacity, Ordering::Relaxed);
        }
        self.end_write();
    }

    /// Removes and returns the oldest value.
    pub fn pop(&self) -> Option<f64> {
        let _write = self.write_mutex.lock().expect("ring buffer write mutex");
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return None;
        }
        let slots = self.slots();
        let tail = self.tail.load(Ordering::Relaxed);

        self.begin_write();
        let value = f64::from_bits(slots[tail].load(Ordering::Relaxed));
        self.tail.store((tail + 1) % slots.len(), Ordering::Relaxed);
        self.count.store(count - 1, Ordering::Relaxed);
        self.end_write();
        Some(value)
    }

    /// Changes the capacity keeping the most recent `min(count, new_capacity)`
    /// values in chronological order.
    ///
    /// On error the buffer is left untouched.
    pub fn resize(&self, new_capacity: usize) -> Result<(), Error> {
        if new_capacity == 0 {
            return Err(Error::invalid_capacity(new_capacity));
        }
        let _resize = self.resize_mutex.lock().expect("ring buffer resize mutex");
        let _write = self.write_mutex.lock().expect("ring buffer write mutex");
        let old = self.slots();
        let old_capacity = old.len();
        if new_capacity == old_capacity {
            return Ok(());
        }

        let count = self.count.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        let copied = count.min(new_capacity);
        let fresh = Self::allocate(new_capacity)?;
        let start = if copied < count {
            (head + old_capacity - copied) % old_capacity
        } else {
            tail
        };
        for (i, slot) in fresh.iter().take(copied).enumerate() {
            slot.store(
                old[(start + i) % old_capacity].load(Ordering::Relaxed),
                Ordering::Relaxed,
            );
        }

        self.begin_write();
        *self.slots.write().expect("ring buffer slots lock") = fresh;
        self.capacity.store(new_capacity, Ordering::Relaxed);
        self.head.store(copied % new_capacity, Ordering::Relaxed);
        self.tail.store(0, Ordering::Relaxed);
        self.count.store(copied, Ordering::Relaxed);
        self.end_write();
        debug!(
            "ring buffer resized {} -> {}, kept {} samples",
            old_capacity, new_capacity, copied
        );
        Ok(())
    }

    /// Copies up to `out.len()` values, oldest first, from a single consistent
    /// state of the ring.
    ///
    /// Never blocks a concurrent writer. Fails after [`SNAPSHOT_ATTEMPTS`]
    /// copies were invalidated by concurrent writes; `out` may then hold
    /// partial data and must be discarded.
    pub fn snapshot(&self, out: &mut [f64]) -> Result<Snapshot, Error> {
        for _ in 0..SNAPSHOT_ATTEMPTS {
            let sequence = self.sequence.load(Ordering::Acquire);
            if sequence % 2 == 1 {
                std::hint::spin_loop();
                continue;
            }
            let count = self.count.load(Ordering::Relaxed);
            let head = self.head.load(Ordering::Relaxed);
            let tail = self.tail.load(Ordering::Relaxed);
            if count == 0 {
                return Ok(Snapshot {
                    count: 0,
                    head,
                    tail,
                });
            }

            let slots = self.slots();
            let capacity = slots.len();
            let copied = count.min(out.len());
            for (i, dst) in out.iter_mut().take(copied).enumerate() {
                *dst = f64::from_bits(slots[(tail + i) % capacity].load(Ordering::Relaxed));
            }

            fence(Ordering::Acquire);
            let unchanged = self.sequence.load(Ordering::Relaxed) == sequence
                && self.count.load(Ordering::Relaxed) == count
                && self.head.load(Ordering::Relaxed) == head
                && self.tail.load(Ordering::Relaxed) == tail;
            if unchanged {
                return Ok(Snapshot {
                    count: copied,
                    head,
                    tail,
                });
            }
        }
        Err(Error::snapshot_inconsistent(SNAPSHOT_ATTEMPTS))
    }

    /// Snapshot into a freshly allocated vector sized to the current capacity.
    pub fn to_vec(&self) -> Result<Vec<f64>, Error> {
        let mut values = vec![0.0; self.capacity()];
        let snapshot = self.snapshot(&mut values)?;
        values.truncate(snapshot.count);
        Ok(values)
    }

    pub fn position(&self) -> Position {
        Position {
            count: self.count.load(Ordering::Acquire),
            head: self.head.load(Ordering::Acquire),
            sequence: self.sequence.load(Ordering::Acquire),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn head(&self) -> usize {
        self.head.load(Ordering::Acquire)
    }

    pub fn tail(&self) -> usize {
        self.tail.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn is_full(&self) -> bool {
        self.count() == self.capacity()
    }
}
