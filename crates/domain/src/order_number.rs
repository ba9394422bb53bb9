//! Human-readable order numbers: `ORD` + epoch millis + 5 uppercase base36 chars.

use chrono::{DateTime, Utc};
use rand::Rng;

pub const ORDER_NUMBER_PREFIX: &str = "ORD";

const SUFFIX_LEN: usize = 5;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates an order number for an order placed at `at`.
pub fn generate(at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{ORDER_NUMBER_PREFIX}{}{suffix}", at.timestamp_millis())
}
