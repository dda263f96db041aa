//! Pooled flate codecs
//!
//! Inflate/deflate state objects are expensive to build, so the decode
//! context owns a bounded pool of them. Checkout blocks with a timeout
//! when every codec is loaned out; a returned codec is reset, not
//! destroyed — teardown happens only when the pool itself is dropped.

use crate::parser::filters::FilterError;
use flate2::{Compress, Compression, Decompress};
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Default number of codecs of each kind.
pub const DEFAULT_POOL_CAPACITY: usize = 4;
/// Default checkout timeout.
pub const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct PoolState {
    inflaters: Vec<Decompress>,
    deflaters: Vec<Compress>,
    inflaters_created: usize,
    deflaters_created: usize,
}

/// Bounded pool of zlib codec objects.
pub struct CodecPool {
    state: Mutex<PoolState>,
    returned: Condvar,
    capacity: usize,
    timeout: Duration,
}

impl Default for CodecPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY, DEFAULT_CHECKOUT_TIMEOUT)
    }
}

impl CodecPool {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            returned: Condvar::new(),
            capacity: capacity.max(1),
            timeout,
        }
    }

    /// Borrow an inflater, blocking up to the pool timeout.
    pub fn checkout_inflate(&self) -> Result<InflateGuard<'_>, FilterError> {
        let deadline = Instant::now() + self.timeout;
        let mut state = self.state.lock().expect("codec pool poisoned");
        loop {
            if let Some(codec) = state.inflaters.pop() {
                return Ok(InflateGuard {
                    pool: self,
                    codec: Some(codec),
                });
            }
            if state.inflaters_created < self.capacity {
                state.inflaters_created += 1;
                return Ok(InflateGuard {
                    pool: self,
                    codec: Some(Decompress::new(true)),
                });
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(FilterError::PoolTimeout);
            }
            let (next, result) = self
                .returned
                .wait_timeout(state, remaining)
                .expect("codec pool poisoned");
            state = next;
            if result.timed_out() && state.inflaters.is_empty() {
                return Err(FilterError::PoolTimeout);
            }
        }
    }

    /// Borrow a deflater, blocking up to the pool timeout.
    pub fn checkout_deflate(&self) -> Result<DeflateGuard<'_>, FilterError> {
        let deadline = Instant::now() + self.timeout;
        let mut state = self.state.lock().expect("codec pool poisoned");
        loop {
            if let Some(codec) = state.deflaters.pop() {
                return Ok(DeflateGuard {
                    pool: self,
                    codec: Some(codec),
                });
            }
            if state.deflaters_created < self.capacity {
                state.deflaters_created += 1;
                return Ok(DeflateGuard {
                    pool: self,
                    codec: Some(Compress::new(Compression::default(), true)),
                });
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(FilterError::PoolTimeout);
            }
            let (next, result) = self
                .returned
                .wait_timeout(state, remaining)
                .expect("codec pool poisoned");
            state = next;
            if result.timed_out() && state.deflaters.is_empty() {
                return Err(FilterError::PoolTimeout);
            }
        }
    }

    fn checkin_inflate(&self, mut codec: Decompress) {
        codec.reset(true);
        self.state
            .lock()
            .expect("codec pool poisoned")
            .inflaters
            .push(codec);
        self.returned.notify_one();
    }

    fn checkin_deflate(&self, mut codec: Compress) {
        codec.reset();
        self.state
            .lock()
            .expect("codec pool poisoned")
            .deflaters
            .push(codec);
        self.returned.notify_one();
    }
}

/// Loaned inflater; resets and returns itself on drop.
pub struct InflateGuard<'a> {
    pool: &'a CodecPool,
    codec: Option<Decompress>,
}

impl Deref for InflateGuard<'_> {
    type Target = Decompress;
    fn deref(&self) -> &Decompress {
        self.codec.as_ref().expect("codec taken")
    }
}

impl DerefMut for InflateGuard<'_> {
    fn deref_mut(&mut self) -> &mut Decompress {
        self.codec.as_mut().expect("codec taken")
    }
}

impl Drop for InflateGuard<'_> {
    fn drop(&mut self) {
        if let Some(codec) = self.codec.take() {
            self.pool.checkin_inflate(codec);
        }
    }
}

/// Loaned deflater; resets and returns itself on drop.
pub struct DeflateGuard<'a> {
    pool: &'a CodecPool,
    codec: Option<Compress>,
}

impl Deref for DeflateGuard<'_> {
    type Target = Compress;
    fn deref(&self) -> &Compress {
        self.codec.as_ref().expect("codec taken")
    }
}

impl DerefMut for DeflateGuard<'_> {
    fn deref_mut(&mut self) -> &mut Compress {
        self.codec.as_mut().expect("codec taken")
    }
}

impl Drop for DeflateGuard<'_> {
    fn drop(&mut self) {
        if let Some(codec) = self.codec.take() {
            self.pool.checkin_deflate(codec);
        }
    }
}
