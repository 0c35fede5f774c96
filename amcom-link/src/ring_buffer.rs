//! Fixed-capacity byte FIFO
//!
//! Sits between the UART interrupt and the main loop in each direction.
//! Writers never overwrite: a full buffer rejects new bytes.

use heapless::Deque;

/// Byte FIFO holding at most `N` bytes
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    data: Deque<u8, N>,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        Self { data: Deque::new() }
    }

    /// Drop all buffered bytes
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.is_full()
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Space left, in bytes
    pub fn free(&self) -> usize {
        N - self.data.len()
    }

    /// Append one byte; returns false if the buffer is full
    pub fn put(&mut self, byte: u8) -> bool {
        self.data.push_back(byte).is_ok()
    }

    /// Take the oldest byte
    pub fn get(&mut self) -> Option<u8> {
        self.data.pop_front()
    }

    /// Append as many leading bytes of `bytes` as fit, returning the count
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let count = bytes.len().min(self.free());
        for &byte in &bytes[..count] {
            // Cannot fail: count is bounded by free space
            let _ = self.data.push_back(byte);
        }
        count
    }

    /// Move buffered bytes into `buf`, returning the count
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        while count < buf.len() {
            match self.data.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    /// Buffered bytes in FIFO order, as at most two contiguous runs
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        self.data.as_slices()
    }

    /// Drop up to `count` of the oldest bytes, returning how many went
    pub fn consume(&mut self, count: usize) -> usize {
        let count = count.min(self.data.len());
        for _ in 0..count {
            self.data.pop_front();
        }
        count
    }
}
