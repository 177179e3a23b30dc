// SIGNAL WINDOW ---------------------------------------------------------------

/// One intensity reading and its position in the input stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub value: f64,
    pub seq: u64,
}

/// Fixed-capacity window of raw samples, oldest first.
///
/// Every value is written twice, at `i` and `i + capacity`, so the live
/// window is always the contiguous slice `buffer[start..start + len]`.
/// Pushing into a full window overwrites the oldest sample.
#[derive(Debug, Clone)]
pub struct SignalWindow {
    buffer: Vec<f64>,
    capacity: usize,
    start: usize,
    len: usize,
    next_seq: u64,
}

impl SignalWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity * 2],
            capacity,
            start: 0,
            len: 0,
            next_seq: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            self.next_seq += 1;
            return;
        }

        let slot = if self.len < self.capacity {
            let slot = (self.start + self.len) % self.capacity;
            self.len += 1;
            slot
        } else {
            let slot = self.start;
            self.start = (self.start + 1) % self.capacity; // Overwrite oldest if full
            slot
        };

        self.buffer[slot] = value;
        self.buffer[slot + self.capacity] = value;
        self.next_seq += 1;
    }

    /// Current samples, oldest to newest.
    pub fn snapshot(&self) -> &[f64] {
        &self.buffer[self.start..self.start + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples pushed since construction or the last `clear`.
    pub fn total_pushed(&self) -> u64 {
        self.next_seq
    }

    pub fn latest(&self) -> Option<RawSample> {
        self.snapshot().last().map(|&value| RawSample {
            value,
            seq: self.next_seq - 1,
        })
    }

    pub fn samples(&self) -> impl Iterator<Item = RawSample> + '_ {
        let first_seq = self.next_seq - self.len as u64;
        self.snapshot()
            .iter()
            .enumerate()
            .map(move |(offset, &value)| RawSample {
                value,
                seq: first_seq + offset as u64,
            })
    }

    pub fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
        self.next_seq = 0;
    }
}
