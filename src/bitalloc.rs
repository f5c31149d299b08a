//! # Bitmap Allocator
//!
//! Fixed-capacity allocator tracking slot occupancy as bits packed into
//! unsigned words ("buckets"). It hands out *variable-length contiguous*
//! runs of slots: the search tree stores one ply of sibling nodes as one
//! run, so the allocator's contiguity guarantee is what keeps a parent's
//! `branches` link a single index plus a count.
//!
//! ## Bit layout
//! Slot `i` lives in bucket `i / BITS`, counted from the bucket's
//! most-significant end (slot 0 of a bucket is its MSB). A bucket's free
//! tail is therefore its run of low-order zero bits, measured with a
//! trailing-zero count. Runs inside a bucket are only discovered when they
//! reach the bucket's low end; longer runs start on bucket boundaries and
//! span entirely-free buckets plus a partial tail bucket. A stricter
//! policy admitting partially occupied boundary buckets would find more
//! runs at a higher scan cost; this allocator does not attempt it.

/// A packed occupancy word.
///
/// The saturating [`BitWord::shl`] is load-bearing: mask construction for
/// ranges that touch a word boundary shifts by the full word width, which
/// must yield zero rather than wrapping. Freeing a range whose end lies
/// exactly on a word boundary therefore cannot clear bits of the following
/// word.
pub trait BitWord:
    Copy
    + Eq
    + std::fmt::Debug
    + std::ops::BitOr<Output = Self>
    + std::ops::BitAnd<Output = Self>
    + std::ops::Not<Output = Self>
{
    /// Width of the word in bits.
    const BITS: usize;
    /// All bits clear (every slot free).
    const ZERO: Self;
    /// All bits set (every slot occupied).
    const ALL: Self;

    /// Number of low-order zero bits; `Self::BITS` for an empty word.
    fn trailing_zeros(self) -> usize;
    /// Bitwise rotation towards the MSB.
    fn rotate_left(self, n: u32) -> Self;
    /// Left shift that saturates to [`BitWord::ZERO`] when `n >= BITS`.
    fn shl(self, n: usize) -> Self;
}

macro_rules! impl_bit_word {
    ($($t:ty),*) => {$(
        impl BitWord for $t {
            const BITS: usize = <$t>::BITS as usize;
            const ZERO: Self = 0;
            const ALL: Self = <$t>::MAX;

            #[inline]
            fn trailing_zeros(self) -> usize {
                <$t>::trailing_zeros(self) as usize
            }

            #[inline]
            fn rotate_left(self, n: u32) -> Self {
                <$t>::rotate_left(self, n)
            }

            #[inline]
            fn shl(self, n: usize) -> Self {
                if n >= <Self as BitWord>::BITS { 0 } else { self << n }
            }
        }
    )*};
}

impl_bit_word!(u8, u16, u32, u64);

/// A contiguous run of slots reserved by [`BitAlloc::largest_avail_chunk`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Chunk {
    /// First slot of the run.
    pub pos: usize,
    /// Number of slots in the run. May be smaller than requested when the
    /// allocator degraded to the largest run it could find.
    pub len: usize,
}

/// Bitmap-backed allocator over `size` slots.
///
/// Collaborators must track ownership precisely: freeing a range that was
/// never allocated, or freeing one twice, corrupts the occupancy map and is
/// only caught by debug assertions.
#[derive(Clone, Debug)]
pub struct BitAlloc<W: BitWord = u64> {
    buckets: Vec<W>,
}

impl<W: BitWord> BitAlloc<W> {
    /// Creates an allocator covering at least `size` slots, all free.
    pub fn new(size: usize) -> Self {
        BitAlloc {
            buckets: vec![W::ZERO; (size / W::BITS) + 1],
        }
    }

    /// Total number of slots the bitmap covers (rounded up to whole words).
    pub fn capacity(&self) -> usize {
        self.buckets.len() * W::BITS
    }

    /// Finds and reserves a contiguous free run of up to `desired` slots.
    ///
    /// The search degrades gracefully: if no run of `desired` slots exists
    /// the attempted size is decremented until something fits, so the
    /// returned [`Chunk`] may be shorter than requested and the caller must
    /// adapt to the returned `len`. Total exhaustion returns `None`,
    /// distinct from any legitimate allocation.
    ///
    /// Reservation happens atomically with the search: the returned run is
    /// already marked occupied.
    pub fn largest_avail_chunk(&mut self, desired: usize) -> Option<Chunk> {
        let bits = W::BITS;
        let mut discovered = desired.min(self.capacity());

        while discovered > 0 {
            // A run that fits inside one bucket: any bucket whose free low
            // tail covers the attempt.
            if discovered < bits {
                for b in 0..self.buckets.len() {
                    let avail_tail = self.buckets[b].trailing_zeros();
                    if avail_tail >= discovered {
                        let mask = W::ALL
                            .shl(discovered)
                            .rotate_left((avail_tail - discovered) as u32);
                        self.buckets[b] = self.buckets[b] | !mask;
                        return Some(Chunk {
                            pos: b * bits + (bits - avail_tail),
                            len: discovered,
                        });
                    }
                }
            }

            // Multi-bucket run starting on a bucket boundary. Every
            // touched bucket, the partial tail included, must be fully free.
            let required = discovered / bits;
            let rem = discovered % bits;
            let span = if rem == 0 { required } else { required + 1 };
            if span >= 1 && span <= self.buckets.len() {
                for b in 0..=(self.buckets.len() - span) {
                    if self.buckets[b..b + span].iter().all(|&w| w == W::ZERO) {
                        for w in &mut self.buckets[b..b + span - 1] {
                            *w = W::ALL;
                        }
                        let last = b + span - 1;
                        self.buckets[last] = if rem == 0 {
                            W::ALL
                        } else {
                            W::ALL.shl(bits - rem)
                        };
                        return Some(Chunk {
                            pos: b * bits,
                            len: discovered,
                        });
                    }
                }
            }

            discovered -= 1;
        }

        None
    }

    /// Clears exactly the slots in `[pos, pos + len)`.
    pub fn free(&mut self, pos: usize, len: usize) {
        debug_assert!(len > 0, "freeing an empty range");
        debug_assert!(pos + len <= self.capacity(), "free range out of bounds");

        let bits = W::BITS;
        let start = pos / bits;
        let end = (pos + len) / bits;
        // Saturating shifts make both masks collapse to zero when the
        // range starts or ends exactly on a word boundary.
        let mask_head = W::ALL.shl(bits - pos % bits);
        let mask_tail = W::ALL.shl(bits - (pos + len) % bits);

        if start == end {
            self.buckets[start] = self.buckets[start] & (mask_head | !mask_tail);
        } else {
            self.buckets[start] = self.buckets[start] & mask_head;
            let hi = end.min(self.buckets.len());
            if end < self.buckets.len() {
                self.buckets[end] = self.buckets[end] & !mask_tail;
            }
            for w in &mut self.buckets[start + 1..hi] {
                *w = W::ZERO;
            }
        }
    }

    /// Resets every slot to free. Called once per independent search.
    pub fn clear_all(&mut self) {
        for w in &mut self.buckets {
            *w = W::ZERO;
        }
    }

    /// Whether slot `pos` is currently part of a reserved run.
    pub fn is_occupied(&self, pos: usize) -> bool {
        let bits = W::BITS;
        let mask = W::ALL.shl(bits - 1).rotate_left((bits - pos % bits) as u32);
        (self.buckets[pos / bits] & mask) != W::ZERO
    }
}
