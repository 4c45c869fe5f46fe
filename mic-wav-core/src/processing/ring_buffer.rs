use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Circular buffer of 16-bit PCM samples.
///
/// Overflow behavior: drops oldest samples and counts them, so an overrun is
/// visible to whoever drains the buffer.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<i16>,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
    dropped: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![0; capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
            capacity,
            dropped: 0,
        }
    }

    /// Write samples into the ring buffer.
    ///
    /// If the buffer overflows, the oldest samples are dropped.
    /// If `samples` is larger than capacity, only the last `capacity` samples are kept.
    pub fn write(&mut self, samples: &[i16]) {
        if samples.is_empty() {
            return;
        }

        let samples = if samples.len() > self.capacity {
            self.dropped += (samples.len() - self.capacity) as u64;
            &samples[samples.len() - self.capacity..]
        } else {
            samples
        };

        let overflow = (self.available + samples.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % self.capacity;
            self.available -= overflow;
            self.dropped += overflow as u64;
        }

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % self.capacity;
        }
        self.available += samples.len();
    }

    /// Move up to `out.len()` samples into `out`. Returns the number moved.
    pub fn read_into(&mut self, out: &mut [i16]) -> usize {
        let to_read = out.len().min(self.available);
        for (i, slot) in out.iter_mut().take(to_read).enumerate() {
            *slot = self.buffer[(self.read_index + i) % self.capacity];
        }
        self.read_index = (self.read_index + to_read) % self.capacity;
        self.available -= to_read;
        to_read
    }

    /// Read and remove up to `count` samples from the buffer.
    pub fn read(&mut self, count: usize) -> Vec<i16> {
        let mut result = vec![0; count.min(self.available)];
        let read = self.read_into(&mut result);
        result.truncate(read);
        result
    }

    /// Number of samples currently available for reading.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Total samples discarded by overflow since creation or the last reset.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
        self.dropped = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

struct QueueState {
    buffer: RingBuffer,
    closed: bool,
}

/// A `RingBuffer` with blocking reads.
///
/// Bridges callback-driven audio APIs to the blocking-read contract of
/// `InputHandle`: the audio callback pushes, the drain loop blocks in
/// `read_timeout` until samples arrive.
pub struct BlockingSampleQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl BlockingSampleQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                buffer: RingBuffer::new(capacity),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Called from the audio callback. Never blocks on readers.
    pub fn push(&self, samples: &[i16]) {
        if samples.is_empty() {
            return;
        }
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.buffer.write(samples);
        }
        self.ready.notify_one();
    }

    /// Block until at least one sample is available, the queue is closed, or
    /// `timeout` elapses. Returns the number of samples copied into `out`;
    /// 0 means nothing arrived in time.
    pub fn read_timeout(&self, out: &mut [i16], timeout: Duration) -> usize {
        if out.is_empty() {
            return 0;
        }
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.buffer.is_empty() && !state.closed {
            if self.ready.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.buffer.read_into(out)
    }

    /// Stop accepting samples and wake every blocked reader. Samples already
    /// queued can still be read.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn available(&self) -> usize {
        self.state.lock().buffer.count()
    }

    pub fn dropped_samples(&self) -> u64 {
        self.state.lock().buffer.dropped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn basic_write_read() {
        let mut buf = RingBuffer::new(10);
        buf.write(&[1, 2, 3]);

        assert_eq!(buf.count(), 3);
        assert_eq!(buf.read(3), vec![1, 2, 3]);
        assert!(buf.is_empty());
    }

    #[test]
    fn read_partial() {
        let mut buf = RingBuffer::new(10);
        buf.write(&[1, 2, 3, 4, 5]);

        assert_eq!(buf.read(3), vec![1, 2, 3]);
        assert_eq!(buf.count(), 2);

        assert_eq!(buf.read(10), vec![4, 5]);
        assert!(buf.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut buf = RingBuffer::new(4);
        buf.write(&[1, 2, 3, 4]);
        buf.write(&[5, 6]);

        assert_eq!(buf.count(), 4);
        assert_eq!(buf.dropped(), 2);
        assert_eq!(buf.read(4), vec![3, 4, 5, 6]);
    }

    #[test]
    fn write_larger_than_capacity() {
        let mut buf = RingBuffer::new(3);
        buf.write(&[1, 2, 3, 4, 5]);

        assert_eq!(buf.count(), 3);
        assert_eq!(buf.dropped(), 2);
        assert_eq!(buf.read(3), vec![3, 4, 5]);
    }

    #[test]
    fn wraparound() {
        let mut buf = RingBuffer::new(4);

        buf.write(&[1, 2, 3]);
        buf.read(2);

        buf.write(&[4, 5, 6]);

        assert_eq!(buf.count(), 4);
        assert_eq!(buf.dropped(), 0);
        assert_eq!(buf.read(4), vec![3, 4, 5, 6]);
    }

    #[test]
    fn read_into_partial_slice() {
        let mut buf = RingBuffer::new(8);
        buf.write(&[7, 8]);

        let mut out = [0i16; 4];
        assert_eq!(buf.read_into(&mut out), 2);
        assert_eq!(out, [7, 8, 0, 0]);
    }

    #[test]
    fn reset_clears_buffer() {
        let mut buf = RingBuffer::new(2);
        buf.write(&[1, 2, 3]);
        buf.reset();

        assert!(buf.is_empty());
        assert_eq!(buf.dropped(), 0);
        assert!(buf.read(10).is_empty());
    }

    #[test]
    fn queue_read_times_out_when_empty() {
        let queue = BlockingSampleQueue::new(16);
        let mut out = [0i16; 4];
        let started = Instant::now();
        assert_eq!(queue.read_timeout(&mut out, Duration::from_millis(20)), 0);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn queue_wakes_reader_on_push() {
        let queue = Arc::new(BlockingSampleQueue::new(16));
        let producer = Arc::clone(&queue);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            producer.push(&[10, 20, 30]);
        });

        let mut out = [0i16; 8];
        let read = queue.read_timeout(&mut out, Duration::from_secs(5));
        handle.join().unwrap();

        assert_eq!(read, 3);
        assert_eq!(&out[..3], &[10, 20, 30]);
    }

    #[test]
    fn close_wakes_reader_and_rejects_pushes() {
        let queue = Arc::new(BlockingSampleQueue::new(16));
        queue.push(&[1]);
        queue.close();
        queue.push(&[2, 3]);

        assert!(queue.is_closed());
        assert_eq!(queue.available(), 1);

        let mut out = [0i16; 4];
        assert_eq!(queue.read_timeout(&mut out, Duration::from_secs(5)), 1);
        let started = Instant::now();
        assert_eq!(queue.read_timeout(&mut out, Duration::from_secs(5)), 0);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn queue_reports_overruns() {
        let queue = BlockingSampleQueue::new(2);
        queue.push(&[1, 2, 3]);
        assert_eq!(queue.dropped_samples(), 1);
    }
}
