//! ID generation utilities for Tourney
//!
//! Provides functions for generating identifiers for queued operations.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU16, Ordering};

use chrono::Utc;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

fn sequence() -> &'static AtomicU16 {
    static SEQUENCE: OnceLock<AtomicU16> = OnceLock::new();
    // Seeded from the clock so ids from separate runs in the same millisecond differ.
    SEQUENCE.get_or_init(|| AtomicU16::new(Utc::now().timestamp_subsec_nanos() as u16))
}

/// Generate a queue item ID
///
/// Format: `q-{timestamp_ms}-{sequence_hex}`
/// Example: `q-1738300800123-a1b2`
pub fn generate_queue_item_id() -> String {
    let seq = sequence().fetch_add(1, Ordering::Relaxed);
    format!("q-{}-{:04x}", now_ms(), seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_returns_reasonable_timestamp() {
        let ts = now_ms();
        // Should be after 2020-01-01 and before 2100-01-01
        assert!(ts > 1577836800000);
        assert!(ts < 4102444800000);
    }

    #[test]
    fn test_generate_queue_item_id_format() {
        let id = generate_queue_item_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "q");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_queue_item_id_uniqueness() {
        let ids: std::collections::HashSet<String> = (0..100).map(|_| generate_queue_item_id()).collect();
        assert_eq!(ids.len(), 100);
    }
}
