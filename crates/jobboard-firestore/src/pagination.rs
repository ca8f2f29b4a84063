//! Cursor-based pagination for the active-jobs listing.

use chrono::{DateTime, Utc};

use crate::codec::fields;
use crate::types::{
    format_timestamp, Filter, StructuredQuery, ToFirestoreValue, Value, DESCENDING, NAME_FIELD,
};

/// Pagination limits.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Separator used in cursor encoding.
const CURSOR_SEPARATOR: &str = "|";

/// Normalize page size to valid range.
pub fn normalize_page_size(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
}

// ============================================================================
// Pagination Cursor
// ============================================================================

/// Position of a job in `postedAt DESC, __name__ DESC` order.
///
/// Callers only ever see the encoded form.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    /// `postedAt` of the job at the cursor position.
    pub posted_at: String,
    /// Full document name of the job.
    pub doc_path: String,
}

impl PageCursor {
    pub fn new(posted_at: &DateTime<Utc>, doc_path: impl Into<String>) -> Self {
        Self {
            posted_at: format_timestamp(posted_at),
            doc_path: doc_path.into(),
        }
    }

    /// Encode cursor to a URL-safe string.
    pub fn encode(&self) -> String {
        let raw = format!("{}{}{}", self.posted_at, CURSOR_SEPARATOR, self.doc_path);
        urlencoding::encode(&raw).into_owned()
    }

    /// Decode cursor from URL-encoded string.
    pub fn decode(encoded: &str) -> Option<Self> {
        let decoded = urlencoding::decode(encoded).ok()?;
        let (posted_at, doc_path) = decoded.split_once(CURSOR_SEPARATOR)?;

        // Must be a document reference and a parseable timestamp
        if !doc_path.contains("/documents/") {
            return None;
        }
        DateTime::parse_from_rfc3339(posted_at).ok()?;

        Some(Self {
            posted_at: posted_at.to_string(),
            doc_path: doc_path.to_string(),
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::TimestampValue(self.posted_at.clone()),
            Value::ReferenceValue(self.doc_path.clone()),
        ]
    }
}

// ============================================================================
// Query Builder
// ============================================================================

/// Query for one page of active jobs, fetching one extra document so the
/// caller can tell whether another page exists.
pub fn active_jobs_query(
    collection_id: &str,
    page_size: u32,
    cursor: Option<&PageCursor>,
) -> StructuredQuery {
    let mut query = StructuredQuery::collection(collection_id)
        .filter(Filter::equal(fields::STATUS, "active".to_firestore_value()))
        .order_by(fields::POSTED_AT, DESCENDING)
        // Secondary sort by document name for stable pagination
        .order_by(NAME_FIELD, DESCENDING)
        .limit(page_size as i32 + 1);

    if let Some(c) = cursor {
        query = query.start_after(c.values());
    }

    query
}

/// Split an over-fetched result into the page and whether more remain.
pub fn split_page<T>(mut items: Vec<T>, page_size: u32) -> (Vec<T>, bool) {
    let has_more = items.len() > page_size as usize;
    items.truncate(page_size as usize);
    (items, has_more)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "projects/test/databases/(default)/documents/jobs/abc";

    #[test]
    fn test_normalize_page_size() {
        assert_eq!(normalize_page_size(None), 10);
        assert_eq!(normalize_page_size(Some(0)), 1);
        assert_eq!(normalize_page_size(Some(500)), 100);
        assert_eq!(normalize_page_size(Some(25)), 25);
    }

    #[test]
    fn test_cursor_encode_decode() {
        let cursor = PageCursor::new(&Utc::now(), DOC);
        let encoded = cursor.encode();
        assert!(!encoded.contains('/'));
        assert_eq!(PageCursor::decode(&encoded), Some(cursor));
    }

    #[test]
    fn test_cursor_decode_invalid() {
        assert!(PageCursor::decode("invalid").is_none());
        assert!(PageCursor::decode("2024-01-01T00:00:00Z|invalid_path").is_none());
        assert!(PageCursor::decode(&urlencoding::encode(&format!("yesterday|{}", DOC))).is_none());
    }

    #[test]
    fn test_active_jobs_query_shape() {
        let cursor = PageCursor::new(&Utc::now(), DOC);
        let query = active_jobs_query("jobs", 2, Some(&cursor));

        assert_eq!(query.limit, Some(3));
        let orders = query.order_by.as_ref().unwrap();
        assert_eq!(orders[0].field.field_path, "postedAt");
        assert_eq!(orders[1].field.field_path, "__name__");
        let start = query.start_at.as_ref().unwrap();
        assert_eq!(start.before, Some(false));
        assert_eq!(start.values[1], Value::ReferenceValue(DOC.to_string()));
    }

    #[test]
    fn test_split_page() {
        assert_eq!(split_page(vec![1, 2], 2), (vec![1, 2], false));
        assert_eq!(split_page(vec![1, 2, 3], 2), (vec![1, 2], true));
        assert_eq!(split_page(Vec::<i32>::new(), 2), (vec![], false));
    }
}
