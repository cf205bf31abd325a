//! Transaction number generation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generates a human-readable transaction number.
///
/// Format: `TXN-<yyyyMMddHHmmss>-<6 uppercase hex>`. The random suffix makes
/// collisions unlikely, but uniqueness is enforced by the transaction store,
/// not assumed here; callers must be prepared to regenerate on a duplicate.
#[must_use]
pub fn transaction_number(now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y%m%d%H%M%S");
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("TXN-{timestamp}-{suffix}")
}
