//! Fixed-capacity circular store of decoded samples.
//!
//! The storage is allocated once and never grows. Reads are bounded by the
//! occupancy count, so a slot that has never been written can not be observed.

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec;

use super::{Sample, StorageError};

/// Ring buffer for sensor samples
///
/// `write_index` is the next slot to overwrite and `read_index` the oldest
/// valid slot. Valid samples are `read_index..write_index` (mod capacity). Once
/// the buffer is full every push advances both indices together, so the
/// occupancy never exceeds the capacity.
#[derive(Debug, Clone)]
pub struct SampleRingBuffer {
    slots: Box<[Sample]>,
    write_index: usize,
    read_index: usize,
    len: usize,
}

impl SampleRingBuffer {
    /// Create an empty ring buffer holding at most `capacity` samples
    pub fn new(capacity: usize) -> Result<Self, StorageError> {
        if capacity == 0 {
            return Err(StorageError::ZeroCapacity);
        }
        Ok(Self {
            slots: vec![Sample::default(); capacity].into_boxed_slice(),
            write_index: 0,
            read_index: 0,
            len: 0,
        })
    }

    /// Maximum number of samples held
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of valid samples
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Append a sample, overwriting the oldest one when full
    pub fn push(&mut self, sample: Sample) {
        let capacity = self.capacity();
        self.slots[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % capacity;

        if self.len == capacity {
            self.read_index = (self.read_index + 1) % capacity;
        } else {
            self.len += 1;
        }
    }

    /// The `index`-th valid sample counted from the oldest
    pub fn at(&self, index: usize) -> Option<&Sample> {
        if index >= self.len {
            return None;
        }
        Some(&self.slots[(self.read_index + index) % self.capacity()])
    }

    /// The `back`-th most recent sample (`0` is the newest)
    pub fn recent(&self, back: usize) -> Option<&Sample> {
        if back >= self.len {
            return None;
        }
        self.at(self.len - 1 - back)
    }

    /// Newest sample, if any
    pub fn latest(&self) -> Option<&Sample> {
        self.recent(0)
    }

    /// Iterate all valid samples, oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Sample> + '_ {
        (0..self.len).filter_map(move |i| self.at(i))
    }

    /// Iterate the most recent `count` samples (or fewer), oldest to newest
    pub fn window(&self, count: usize) -> impl Iterator<Item = &Sample> + '_ {
        let start = self.len.saturating_sub(count);
        (start..self.len).filter_map(move |i| self.at(i))
    }

    /// Drop all samples without releasing storage
    pub fn clear(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: u32) -> Sample {
        Sample::new(n, n * 10, n * 100)
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            SampleRingBuffer::new(0).unwrap_err(),
            StorageError::ZeroCapacity
        );
    }

    #[test]
    fn test_empty_buffer_exposes_nothing() {
        let buffer = SampleRingBuffer::new(4).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.at(0), None, "unwritten slot must not be readable");
        assert_eq!(buffer.recent(0), None);
        assert_eq!(buffer.iter().count(), 0);
    }

    #[test]
    fn test_insertion_order_before_wrap() {
        let mut buffer = SampleRingBuffer::new(5).unwrap();
        for n in 1..=3 {
            buffer.push(sample(n));
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.at(0), Some(&sample(1)));
        assert_eq!(buffer.at(2), Some(&sample(3)));
        assert_eq!(buffer.at(3), None);
        assert_eq!(buffer.latest(), Some(&sample(3)));
        assert_eq!(buffer.recent(2), Some(&sample(1)));
    }

    #[test]
    fn test_wraparound_keeps_newest_in_order() {
        let mut buffer = SampleRingBuffer::new(4).unwrap();
        for n in 1..=10 {
            buffer.push(sample(n));
            assert!(buffer.len() <= 4, "occupancy exceeded capacity");
        }

        assert!(buffer.is_full());
        let temps: alloc::vec::Vec<u32> = buffer.iter().map(|s| s.temp).collect();
        assert_eq!(temps, [7, 8, 9, 10]);
        assert_eq!(buffer.at(4), None);
    }

    #[test]
    fn test_every_push_sequence_reads_back_in_order() {
        for capacity in 1..6 {
            for pushes in 0..15u32 {
                let mut buffer = SampleRingBuffer::new(capacity).unwrap();
                for n in 0..pushes {
                    buffer.push(sample(n));
                }
                let expected_len = (pushes as usize).min(capacity);
                assert_eq!(buffer.len(), expected_len);

                let first = pushes - expected_len as u32;
                for k in 0..expected_len {
                    assert_eq!(
                        buffer.at(k).map(|s| s.temp),
                        Some(first + k as u32),
                        "capacity {capacity}, pushes {pushes}, index {k}"
                    );
                }
                assert_eq!(buffer.at(expected_len), None);
            }
        }
    }

    #[test]
    fn test_window_returns_most_recent() {
        let mut buffer = SampleRingBuffer::new(6).unwrap();
        for n in 0..9 {
            buffer.push(sample(n));
        }

        let temps: alloc::vec::Vec<u32> = buffer.window(3).map(|s| s.temp).collect();
        assert_eq!(temps, [6, 7, 8]);

        let all: alloc::vec::Vec<u32> = buffer.window(100).map(|s| s.temp).collect();
        assert_eq!(all, [3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_clear_resets_occupancy() {
        let mut buffer = SampleRingBuffer::new(3).unwrap();
        buffer.push(sample(1));
        buffer.push(sample(2));
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.at(0), None);
        buffer.push(sample(9));
        assert_eq!(buffer.at(0), Some(&sample(9)));
    }
}
