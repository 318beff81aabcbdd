// Trace Ids
//
// 32 lower-case hex characters (128 bits), derived with blake3 from a
// per-generator seed and a monotonically increasing counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of a trace id in hex characters
pub const TRACE_ID_LEN: usize = 32;

/// Produces unique trace ids; safe to share across tasks
#[derive(Debug)]
pub struct TraceIdGenerator {
    seed: u128,
    counter: AtomicU64,
}

impl TraceIdGenerator {
    /// Generator seeded from the wall clock
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Self::with_seed(seed)
    }

    /// Generator with a fixed seed, for reproducible ids
    pub fn with_seed(seed: u128) -> Self {
        Self {
            seed,
            counter: AtomicU64::new(0),
        }
    }

    /// Next trace id
    pub fn next_id(&self) -> String {
        loop {
            let n = self.counter.fetch_add(1, Ordering::Relaxed);
            let mut hasher = blake3::Hasher::new();
            hasher.update(&self.seed.to_le_bytes());
            hasher.update(&n.to_le_bytes());
            let hex = hasher.finalize().to_hex();
            let id = hex[..TRACE_ID_LEN].to_string();
            if is_valid_trace_id(&id) {
                return id;
            }
        }
    }
}

impl Default for TraceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 32 lower-case hex characters, not all zero
pub fn is_valid_trace_id(id: &str) -> bool {
    id.len() == TRACE_ID_LEN
        && id.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        && id.bytes().any(|b| b != b'0')
}
