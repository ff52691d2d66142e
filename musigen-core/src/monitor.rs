//! Lock-free "last rendered samples" ring for visualization.
//!
//! One writer (the audio callback) publishes every rendered block; any number
//! of readers copy out the most recent `N` samples, oldest first.
//!
//! Synchronization is a sequence lock over atomic slots:
//! - the writer bumps `seq` to an odd value, stores the samples and the new
//!   write index, then bumps `seq` back to even. It never waits.
//! - a reader loads `seq`, copies, and accepts the copy only if `seq` was even
//!   and unchanged, i.e. no publish overlapped the copy.
//!
//! Samples are stored as `f32` bit patterns in `AtomicU32`, so a torn read can
//! only ever be detected and retried, never observed.
//!
//! Publishing costs O(block) and never touches the rest of the ring.

use core::sync::atomic::{fence, AtomicU32, AtomicUsize, Ordering};

use alloc::vec::Vec;

/// Capacity used by the engine.
pub const MONITOR_LEN: usize = 1024;

/// Fixed-capacity single-writer ring of recent output samples.
pub struct MonitorBuffer<const N: usize> {
    slots: [AtomicU32; N],
    /// Next slot to be written; equals the oldest sample once the ring is full.
    head: AtomicUsize,
    seq: AtomicUsize,
}

impl<const N: usize> MonitorBuffer<N> {
    /// Zero-filled ring.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| AtomicU32::new(0.0_f32.to_bits())),
            head: AtomicUsize::new(0),
            seq: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of completed publishes so far.
    #[inline]
    pub fn generation(&self) -> usize {
        self.seq.load(Ordering::Acquire) / 2
    }

    /// Append `block`, overwriting the oldest samples. Only the last `N`
    /// samples of an oversized block are kept.
    ///
    /// Must only be called from one thread at a time.
    pub fn publish(&self, block: &[f32]) {
        if N == 0 {
            return;
        }
        let tail = if block.len() > N { &block[block.len() - N..] } else { block };

        let s = self.seq.load(Ordering::Relaxed);
        self.seq.store(s.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        let mut head = self.head.load(Ordering::Relaxed);
        for &x in tail {
            self.slots[head].store(x.to_bits(), Ordering::Relaxed);
            head += 1;
            if head == N {
                head = 0;
            }
        }
        self.head.store(head, Ordering::Relaxed);

        self.seq.store(s.wrapping_add(2), Ordering::Release);
    }

    /// Copy the last `N` samples, oldest first, into `out`.
    ///
    /// Spins only while a publish is in flight; publishes are short and
    /// periodic, so this settles after at most a few retries.
    pub fn snapshot_into(&self, out: &mut [f32; N]) {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before % 2 == 1 {
                core::hint::spin_loop();
                continue;
            }

            let head = self.head.load(Ordering::Relaxed);
            for (i, y) in out.iter_mut().enumerate() {
                let mut j = head + i;
                if j >= N {
                    j -= N;
                }
                *y = f32::from_bits(self.slots[j].load(Ordering::Relaxed));
            }

            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return;
            }
            core::hint::spin_loop();
        }
    }

    /// Owned copy of the last `N` samples, oldest first.
    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = [0.0_f32; N];
        self.snapshot_into(&mut out);
        out.to_vec()
    }
}

impl<const N: usize> Default for MonitorBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for MonitorBuffer<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MonitorBuffer")
            .field("capacity", &N)
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
