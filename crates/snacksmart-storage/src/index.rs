//! Secondary index helpers.
//!
//! Indexes are plain `&str -> &str` tables whose keys start with the owner ID
//! followed by `:`. The rest of the key encodes the listing order, so a prefix
//! range scan returns document IDs already sorted.

use anyhow::Result;
use redb::ReadableTable;

/// Calculate the exclusive end bound for a prefix range query.
///
/// Given prefix "chat-001:", returns "chat-001;" (next ASCII char after ':').
pub fn prefix_end_bound(prefix: &str) -> String {
    if prefix.is_empty() {
        return String::new();
    }

    let mut bytes = prefix.as_bytes().to_vec();
    if let Some(last) = bytes.last_mut() {
        *last = last.saturating_add(1);
    }

    String::from_utf8(bytes).unwrap_or_else(|_| format!("{}\x7F", prefix))
}

/// Create a prefix range for redb queries.
pub fn prefix_range(prefix: &str) -> (String, String) {
    (prefix.to_string(), prefix_end_bound(prefix))
}

/// Index key that sorts the newest document first within an owner.
pub fn newest_first_key(owner_id: &str, created_at_ms: i64, id: &str) -> String {
    let created_at_ms = created_at_ms.max(0) as u64;
    let reverse_ts = u64::MAX - created_at_ms;
    format!("{owner_id}:{reverse_ts:020}:{id}")
}

/// Index key that sorts the oldest document first within an owner.
///
/// `sequence` breaks ties between documents created in the same millisecond.
pub fn oldest_first_key(owner_id: &str, created_at_ms: i64, sequence: u64) -> String {
    let created_at_ms = created_at_ms.max(0) as u64;
    format!("{owner_id}:{created_at_ms:020}:{sequence:020}")
}

/// Collect the document IDs indexed under `owner_id`, in key order.
pub fn scan_owner<T>(index: &T, owner_id: &str) -> Result<Vec<String>>
where
    T: ReadableTable<&'static str, &'static str>,
{
    let prefix = format!("{owner_id}:");
    let (start, end) = prefix_range(&prefix);

    let mut ids = Vec::new();
    for item in index.range(start.as_str()..end.as_str())? {
        let (_, value) = item?;
        ids.push(value.value().to_string());
    }

    Ok(ids)
}

/// Find the index key pointing at `id` under `owner_id`.
pub fn find_key<T>(index: &T, owner_id: &str, id: &str) -> Result<Option<String>>
where
    T: ReadableTable<&'static str, &'static str>,
{
    let prefix = format!("{owner_id}:");
    let (start, end) = prefix_range(&prefix);

    for item in index.range(start.as_str()..end.as_str())? {
        let (key, value) = item?;
        if value.value() == id {
            return Ok(Some(key.value().to_string()));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_end_bound() {
        assert_eq!(prefix_end_bound("chat:"), "chat;");
        assert_eq!(prefix_end_bound("user-1:"), "user-1;");
        assert_eq!(prefix_end_bound(""), "");
    }

    #[test]
    fn test_newest_first_key_orders_descending() {
        let older = newest_first_key("user", 1_000, "a");
        let newer = newest_first_key("user", 2_000, "b");
        assert!(newer < older);
    }

    #[test]
    fn test_oldest_first_key_orders_ascending_with_tie_break() {
        let first = oldest_first_key("chat", 1_000, 1);
        let second = oldest_first_key("chat", 1_000, 2);
        let later = oldest_first_key("chat", 1_001, 0);
        assert!(first < second);
        assert!(second < later);
    }
}
