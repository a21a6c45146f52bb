//! Bounded FIFO byte queue used for both directions of a connection.

/// Capacity of each per-connection buffer.
pub const BUFFER_SIZE: usize = 1024;

/// Fixed-capacity byte queue. Data is appended at the back and consumed from
/// the front; consuming compacts the remainder to the start of the storage.
#[derive(Debug)]
pub struct ByteQueue {
    data: Vec<u8>,
    capacity: usize,
}

impl ByteQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// The number of queued bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Free space left before the queue is full.
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// Appends `bytes` in full, or leaves the queue untouched and returns
    /// false when they do not fit.
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.remaining() {
            return false;
        }
        self.data.extend_from_slice(bytes);
        true
    }

    /// Queued bytes, oldest first.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Drops `count` bytes from the front.
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.data.len());
        self.data.drain(..count);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl Default for ByteQueue {
    fn default() -> Self {
        Self::new(BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut queue = ByteQueue::new(8);
        assert!(queue.push(&[1, 2, 3, 4, 5]));
        assert_eq!(queue.remaining(), 3);

        // Rejected pushes leave the queue as it was
        assert!(!queue.push(&[6, 7, 8, 9]));
        assert_eq!(queue.as_slice(), &[1, 2, 3, 4, 5]);

        assert!(queue.push(&[6, 7, 8]));
        assert_eq!(queue.remaining(), 0);
        assert!(!queue.push(&[9]));
    }

    #[test]
    fn test_consume_compacts() {
        let mut queue = ByteQueue::new(8);
        queue.push(&[1, 2, 3, 4, 5, 6]);
        queue.consume(4);

        assert_eq!(queue.as_slice(), &[5, 6]);
        assert_eq!(queue.remaining(), 6);
        assert!(queue.push(&[7, 8, 9, 10, 11, 12]));
        assert_eq!(queue.as_slice(), &[5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_consume_more_than_queued() {
        let mut queue = ByteQueue::default();
        queue.push(&[1, 2]);
        queue.consume(10);
        assert!(queue.is_empty());
        assert_eq!(queue.remaining(), BUFFER_SIZE);
    }
}
