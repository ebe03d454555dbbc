//! Bounded replay buffer of recent telemetry readings.

use std::collections::VecDeque;

use rover_types::TelemetryReading;

/// Fixed-capacity FIFO of readings; the oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<TelemetryReading>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` readings.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest if the buffer is full.
    ///
    /// Returns the evicted reading, if any.
    pub fn push(&mut self, reading: TelemetryReading) -> Option<TelemetryReading> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(reading);
        evicted
    }

    /// Copy of the retained readings, oldest first.
    pub fn to_vec(&self) -> Vec<TelemetryReading> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained readings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds no readings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained readings.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every retained reading.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
