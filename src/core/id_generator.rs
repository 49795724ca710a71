// Snowflake-style id generation with embedded shard information
// 64-bit layout: [timestamp:42][shard_id:10][sequence:12]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const SEQUENCE_BITS: u64 = 12;
const SHARD_BITS: u64 = 10;
const MAX_SEQUENCE: u64 = 1 << SEQUENCE_BITS;
const MAX_SHARDS: u16 = 1 << SHARD_BITS;

/// Generates unique, time-ordered 64-bit ids. Because the millisecond
/// timestamp occupies the high bits, ids compare in insertion order, which
/// the feed merge relies on for tie-breaking.
#[derive(Debug)]
pub struct IdGenerator {
    shard_id: u16,
    sequence: AtomicU64,
    last_timestamp: AtomicU64,
}

impl IdGenerator {
    pub fn new(shard_id: u16) -> Self {
        assert!(shard_id < MAX_SHARDS, "shard id must fit in 10 bits");

        Self {
            shard_id,
            sequence: AtomicU64::new(0),
            last_timestamp: AtomicU64::new(0),
        }
    }

    /// Generate the next unique id for this shard.
    pub fn next_id(&self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        let last = self.last_timestamp.load(Ordering::Relaxed);

        let sequence = if now == last {
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            if seq >= MAX_SEQUENCE {
                // Sequence exhausted for this millisecond; wait out the tick
                std::thread::sleep(std::time::Duration::from_millis(1));
                self.sequence.store(0, Ordering::Relaxed);
                return self.next_id();
            }
            seq
        } else {
            self.last_timestamp.store(now, Ordering::Relaxed);
            self.sequence.store(1, Ordering::Relaxed);
            0
        };

        let id = ((now & 0x3FF_FFFF_FFFF) << (SHARD_BITS + SEQUENCE_BITS))
            | ((self.shard_id as u64) << SEQUENCE_BITS)
            | (sequence & (MAX_SEQUENCE - 1));

        id as i64
    }

    /// Shard portion of an id.
    pub fn extract_shard_id(id: i64) -> u16 {
        (((id as u64) >> SEQUENCE_BITS) & (MAX_SHARDS as u64 - 1)) as u16
    }

    /// Millisecond timestamp portion of an id.
    pub fn extract_timestamp(id: i64) -> u64 {
        (id as u64) >> (SHARD_BITS + SEQUENCE_BITS)
    }

    pub fn shard_id(&self) -> u16 {
        self.shard_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let generator = IdGenerator::new(7);

        let a = generator.next_id();
        let b = generator.next_id();
        let c = generator.next_id();

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn shard_id_round_trips() {
        let generator = IdGenerator::new(300);
        let id = generator.next_id();

        assert_eq!(IdGenerator::extract_shard_id(id), 300);
    }

    #[test]
    fn timestamp_is_embedded() {
        let generator = IdGenerator::new(0);
        let before = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let id = generator.next_id();

        assert!(IdGenerator::extract_timestamp(id) >= before);
    }
}
