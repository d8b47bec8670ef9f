//! Identity generation
//!
//! All persisted records use opaque i64 identities assigned by the service,
//! not by the storage engine. Identities are snowflake-style: milliseconds
//! since a custom epoch shifted left 12 bits, plus a process-local sequence.
//! An aggregate create allocates a dozen ids within the same millisecond;
//! the sequence keeps them strictly ascending and collision-free.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};

use rand::Rng;

// Custom epoch: 2024-01-01 00:00:00 UTC
const EPOCH_MS: i64 = 1_704_067_200_000;

// Seeded randomly at process start, incremented per id.
static SEQUENCE: OnceLock<AtomicI64> = OnceLock::new();

/// Generate a new opaque identity. Strictly ascending within a process.
pub fn snowflake_id() -> i64 {
    let seq = SEQUENCE.get_or_init(|| AtomicI64::new(rand::thread_rng().gen_range(0..0x1000)));
    let now = chrono::Utc::now().timestamp_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    (ts << 12) + seq.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ascending_in_a_burst() {
        let ids: Vec<i64> = (0..256).map(|_| snowflake_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids must ascend");
        assert!(ids.iter().all(|id| *id > 0));
    }
}
