pub mod error;
pub mod identity;
pub mod listener;
pub mod protocol;
pub mod selector;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as Unix-epoch milliseconds. All protocol timestamps use this.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
