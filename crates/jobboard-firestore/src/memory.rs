//! In-process document store.
//!
//! Evaluates the structured-query subset the repositories use and applies
//! commits atomically with the same precondition and transform semantics as
//! Firestore. Used by tests and by local development (`DOCUMENT_STORE=memory`).

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{FirestoreError, FirestoreResult};
use crate::store::DocumentStore;
use crate::types::{
    format_timestamp, ops, Document, FieldTransform, Filter, StructuredQuery, Value, Write,
    DESCENDING, NAME_FIELD, REQUEST_TIME,
};

const MEMORY_PROJECT: &str = "memory";
const GENERATED_ID_LEN: usize = 20;

#[derive(Debug, Clone)]
struct StoredDoc {
    fields: HashMap<String, Value>,
    create_time: String,
    update_time: String,
}

#[derive(Default)]
struct State {
    docs: BTreeMap<String, StoredDoc>,
    last_tick_micros: i64,
}

impl State {
    /// Strictly increasing write time at the precision update times are compared with.
    fn tick(&mut self) -> DateTime<Utc> {
        let micros = Utc::now().timestamp_micros().max(self.last_tick_micros + 1);
        self.last_tick_micros = micros;
        DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
    }
}

/// Document store held in memory.
pub struct MemoryStore {
    root: String,
    state: RwLock<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: format!("projects/{}/databases/(default)/documents", MEMORY_PROJECT),
            state: RwLock::new(State::default()),
        }
    }

    fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()[..GENERATED_ID_LEN].to_string()
    }

    fn to_document(name: &str, stored: &StoredDoc) -> Document {
        Document {
            name: Some(name.to_string()),
            fields: Some(stored.fields.clone()),
            create_time: Some(stored.create_time.clone()),
            update_time: Some(stored.update_time.clone()),
        }
    }

    /// Prefix of direct children of the queried collection.
    fn collection_prefix(&self, parent: &str, collection_id: &str) -> String {
        if parent.is_empty() {
            format!("{}/{}/", self.root, collection_id)
        } else {
            format!("{}/{}/{}/", self.root, parent, collection_id)
        }
    }

    fn evaluate(
        docs: &BTreeMap<String, StoredDoc>,
        prefix: &str,
        query: &StructuredQuery,
    ) -> FirestoreResult<Vec<Document>> {
        let mut orders: Vec<(String, bool)> = query
            .order_by
            .iter()
            .flatten()
            .map(|o| (o.field.field_path.clone(), o.direction == DESCENDING))
            .collect();
        if !orders.iter().any(|(path, _)| path == NAME_FIELD) {
            let descending = orders.last().map(|(_, d)| *d).unwrap_or(false);
            orders.push((NAME_FIELD.to_string(), descending));
        }

        let mut matched = Vec::new();
        for (name, stored) in docs.range(prefix.to_string()..) {
            if !name.starts_with(prefix) {
                break;
            }
            if name[prefix.len()..].contains('/') {
                continue;
            }
            let doc = Self::to_document(name, stored);
            if let Some(filter) = &query.r#where {
                if !matches_filter(&doc, filter)? {
                    continue;
                }
            }
            // Documents without an ordered field are excluded, as Firestore does.
            if orders
                .iter()
                .any(|(path, _)| lookup(&doc, path).is_none())
            {
                continue;
            }
            matched.push(doc);
        }

        matched.sort_by(|a, b| compare_positions(a, b, &orders));

        if let Some(cursor) = &query.start_at {
            let inclusive = cursor.before.unwrap_or(false);
            matched.retain(|doc| {
                let ord = compare_to_cursor(doc, &cursor.values, &orders);
                ord == Ordering::Greater || (inclusive && ord == Ordering::Equal)
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit.max(0) as usize);
        }

        Ok(matched)
    }

    /// Apply one write to the staged view of the commit.
    fn stage_write(
        &self,
        docs: &BTreeMap<String, StoredDoc>,
        staged: &mut BTreeMap<String, Option<StoredDoc>>,
        write: &Write,
        commit_time: &DateTime<Utc>,
    ) -> FirestoreResult<()> {
        let name = write
            .target()
            .ok_or_else(|| FirestoreError::invalid_argument("Write has no target document"))?
            .to_string();
        if !name.starts_with(&self.root) {
            return Err(FirestoreError::invalid_argument(format!(
                "Document {} is outside this database",
                name
            )));
        }

        let existing = match staged.get(&name) {
            Some(doc) => doc.clone(),
            None => docs.get(&name).cloned(),
        };

        if let Some(pre) = &write.current_document {
            match (pre.exists, &existing) {
                (Some(true), None) => {
                    return Err(FirestoreError::not_found(format!("No document to update: {}", name)))
                }
                (Some(false), Some(_)) => return Err(FirestoreError::AlreadyExists(name)),
                _ => {}
            }
            if let Some(expected) = &pre.update_time {
                let actual = existing.as_ref().map(|d| d.update_time.as_str());
                if actual != Some(expected.as_str()) {
                    return Err(FirestoreError::PreconditionFailed(format!(
                        "{} was modified (expected updateTime {})",
                        name, expected
                    )));
                }
            }
        }

        if write.delete.is_some() {
            staged.insert(name, None);
            return Ok(());
        }

        let update = write.update.as_ref().ok_or_else(|| {
            FirestoreError::invalid_argument("Write must update or delete a document")
        })?;
        let incoming = update.fields.clone().unwrap_or_default();

        let mut fields = match &write.update_mask {
            None => incoming,
            Some(mask) => {
                let mut fields = existing
                    .as_ref()
                    .map(|d| d.fields.clone())
                    .unwrap_or_default();
                for path in &mask.field_paths {
                    match lookup_in(&incoming, path) {
                        Some(value) => set_path(&mut fields, path, value.clone()),
                        None => remove_path(&mut fields, path),
                    }
                }
                fields
            }
        };

        for transform in write.update_transforms.iter().flatten() {
            apply_transform(&mut fields, transform, commit_time)?;
        }

        let timestamp = format_timestamp(commit_time);
        staged.insert(
            name,
            Some(StoredDoc {
                fields,
                create_time: existing
                    .map(|d| d.create_time)
                    .unwrap_or_else(|| timestamp.clone()),
                update_time: timestamp,
            }),
        );
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let name = self.document_name(collection, doc_id);
        let state = self.state.read().await;
        Ok(state.docs.get(&name).map(|d| Self::to_document(&name, d)))
    }

    async fn create_document(
        &self,
        collection: &str,
        doc_id: Option<&str>,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let id = doc_id.map(str::to_string).unwrap_or_else(Self::generate_id);
        let name = self.document_name(collection, &id);

        let mut state = self.state.write().await;
        if state.docs.contains_key(&name) {
            return Err(FirestoreError::AlreadyExists(format!("{}/{}", collection, id)));
        }
        let ts = format_timestamp(&state.tick());
        let stored = StoredDoc {
            fields,
            create_time: ts.clone(),
            update_time: ts,
        };
        let doc = Self::to_document(&name, &stored);
        state.docs.insert(name, stored);
        Ok(doc)
    }

    async fn set_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let name = self.document_name(collection, doc_id);

        let mut state = self.state.write().await;
        let ts = format_timestamp(&state.tick());
        let create_time = state
            .docs
            .get(&name)
            .map(|d| d.create_time.clone())
            .unwrap_or_else(|| ts.clone());
        let stored = StoredDoc {
            fields,
            create_time,
            update_time: ts,
        };
        let doc = Self::to_document(&name, &stored);
        state.docs.insert(name, stored);
        Ok(doc)
    }

    async fn run_query(
        &self,
        parent: &str,
        query: StructuredQuery,
    ) -> FirestoreResult<Vec<Document>> {
        let prefix = self.collection_prefix(parent, query.collection_id());
        let state = self.state.read().await;
        Self::evaluate(&state.docs, &prefix, &query)
    }

    async fn count(&self, parent: &str, query: StructuredQuery) -> FirestoreResult<u64> {
        Ok(self.run_query(parent, query).await?.len() as u64)
    }

    async fn commit(&self, writes: Vec<Write>) -> FirestoreResult<()> {
        let mut state = self.state.write().await;
        let commit_time = state.tick();

        let mut staged = BTreeMap::new();
        for write in &writes {
            self.stage_write(&state.docs, &mut staged, write, &commit_time)?;
        }

        debug!(writes = writes.len(), "Applying in-memory commit");
        for (name, doc) in staged {
            match doc {
                Some(doc) => {
                    state.docs.insert(name, doc);
                }
                None => {
                    state.docs.remove(&name);
                }
            }
        }
        Ok(())
    }

    fn document_name(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.root, collection, doc_id)
    }
}

// =============================================================================
// Field Paths
// =============================================================================

fn lookup<'a>(doc: &'a Document, path: &str) -> Option<std::borrow::Cow<'a, Value>> {
    if path == NAME_FIELD {
        return doc
            .name
            .clone()
            .map(|n| std::borrow::Cow::Owned(Value::ReferenceValue(n)));
    }
    doc.fields
        .as_ref()
        .and_then(|f| lookup_in(f, path))
        .map(std::borrow::Cow::Borrowed)
}

fn lookup_in<'a>(fields: &'a HashMap<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = current.as_map()?.get(segment)?;
    }
    Some(current)
}

fn set_path(fields: &mut HashMap<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            fields.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = fields
                .entry(head.to_string())
                .or_insert_with(|| Value::map(HashMap::new()));
            if entry.as_map().is_none() {
                *entry = Value::map(HashMap::new());
            }
            if let Value::MapValue(map) = entry {
                set_path(map.fields.get_or_insert_with(HashMap::new), rest, value);
            }
        }
    }
}

fn remove_path(fields: &mut HashMap<String, Value>, path: &str) {
    match path.split_once('.') {
        None => {
            fields.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Value::MapValue(map)) = fields.get_mut(head) {
                if let Some(inner) = map.fields.as_mut() {
                    remove_path(inner, rest);
                }
            }
        }
    }
}

// =============================================================================
// Transforms
// =============================================================================

fn apply_transform(
    fields: &mut HashMap<String, Value>,
    transform: &FieldTransform,
    commit_time: &DateTime<Utc>,
) -> FirestoreResult<()> {
    let path = transform.field_path.as_str();
    let current = lookup_in(fields, path).cloned();

    let next = if let Some(by) = &transform.increment {
        add_numbers(current.as_ref(), by)?
    } else if let Some(elements) = &transform.append_missing_elements {
        let mut items = current.map(|v| v.as_array().to_vec()).unwrap_or_default();
        for element in elements.values.iter().flatten() {
            if !items.iter().any(|i| values_equal(i, element)) {
                items.push(element.clone());
            }
        }
        Value::array(items)
    } else if let Some(elements) = &transform.remove_all_from_array {
        let mut items = current.map(|v| v.as_array().to_vec()).unwrap_or_default();
        let remove = elements.values.as_deref().unwrap_or(&[]);
        items.retain(|i| !remove.iter().any(|r| values_equal(i, r)));
        Value::array(items)
    } else if transform.set_to_server_value.as_deref() == Some(REQUEST_TIME) {
        Value::TimestampValue(format_timestamp(commit_time))
    } else {
        return Err(FirestoreError::invalid_argument(format!(
            "Unsupported transform on {}",
            path
        )));
    };

    set_path(fields, path, next);
    Ok(())
}

fn add_numbers(current: Option<&Value>, by: &Value) -> FirestoreResult<Value> {
    let as_int = |v: &Value| match v {
        Value::IntegerValue(s) => s.parse::<i64>().ok(),
        _ => None,
    };
    let as_f64 = |v: &Value| match v {
        Value::IntegerValue(s) => s.parse::<f64>().ok(),
        Value::DoubleValue(f) => Some(*f),
        _ => None,
    };

    // A missing or non-numeric field is treated as zero.
    let current = current.filter(|v| as_f64(v).is_some());
    match (current.map(as_int), as_int(by)) {
        (None, Some(b)) => Ok(Value::IntegerValue(b.to_string())),
        (Some(Some(a)), Some(b)) => Ok(Value::IntegerValue(a.saturating_add(b).to_string())),
        _ => {
            let b = as_f64(by).ok_or_else(|| {
                FirestoreError::invalid_argument("Increment operand must be numeric")
            })?;
            let a = current.and_then(as_f64).unwrap_or(0.0);
            Ok(Value::DoubleValue(a + b))
        }
    }
}

// =============================================================================
// Filters and Ordering
// =============================================================================

fn matches_filter(doc: &Document, filter: &Filter) -> FirestoreResult<bool> {
    if let Some(composite) = &filter.composite_filter {
        if composite.op != ops::AND {
            return Err(FirestoreError::invalid_argument(format!(
                "Unsupported composite operator {}",
                composite.op
            )));
        }
        for inner in &composite.filters {
            if !matches_filter(doc, inner)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    let Some(field_filter) = &filter.field_filter else {
        return Ok(true);
    };
    let Some(actual) = lookup(doc, &field_filter.field.field_path) else {
        return Ok(false);
    };
    let expected = &field_filter.value;

    let same_kind = type_rank(&actual) == type_rank(expected);
    let ord = compare_values(&actual, expected);

    Ok(match field_filter.op.as_str() {
        ops::EQUAL => same_kind && ord == Ordering::Equal,
        ops::ARRAY_CONTAINS => actual.as_array().iter().any(|v| values_equal(v, expected)),
        ops::GREATER_THAN => same_kind && ord == Ordering::Greater,
        ops::GREATER_THAN_OR_EQUAL => same_kind && ord != Ordering::Less,
        ops::LESS_THAN => same_kind && ord == Ordering::Less,
        ops::LESS_THAN_OR_EQUAL => same_kind && ord != Ordering::Greater,
        other => {
            return Err(FirestoreError::invalid_argument(format!(
                "Unsupported filter operator {}",
                other
            )))
        }
    })
}

fn compare_positions(a: &Document, b: &Document, orders: &[(String, bool)]) -> Ordering {
    for (path, descending) in orders {
        let ord = match (lookup(a, path), lookup(b, path)) {
            (Some(x), Some(y)) => compare_values(&x, &y),
            _ => Ordering::Equal,
        };
        let ord = if *descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Position of `doc` relative to the cursor, in query order.
fn compare_to_cursor(doc: &Document, values: &[Value], orders: &[(String, bool)]) -> Ordering {
    for ((path, descending), cursor_value) in orders.iter().zip(values) {
        let ord = match lookup(doc, path) {
            Some(v) => compare_values(&v, cursor_value),
            None => Ordering::Less,
        };
        let ord = if *descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Firestore's cross-type ordering.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::NullValue(_) => 0,
        Value::BooleanValue(_) => 1,
        Value::IntegerValue(_) | Value::DoubleValue(_) => 2,
        Value::TimestampValue(_) => 3,
        Value::StringValue(_) => 4,
        Value::BytesValue(_) => 5,
        Value::ReferenceValue(_) => 6,
        Value::GeoPointValue(_) => 7,
        Value::ArrayValue(_) => 8,
        Value::MapValue(_) => 9,
    }
}

fn numeric(value: &Value) -> f64 {
    match value {
        Value::IntegerValue(s) => s.parse().unwrap_or(0.0),
        Value::DoubleValue(f) => *f,
        _ => 0.0,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Value::BooleanValue(x), Value::BooleanValue(y)) => x.cmp(y),
        (Value::IntegerValue(x), Value::IntegerValue(y)) => {
            match (x.parse::<i64>(), y.parse::<i64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (x @ (Value::IntegerValue(_) | Value::DoubleValue(_)), y) => numeric(x)
            .partial_cmp(&numeric(y))
            .unwrap_or(Ordering::Equal),
        (Value::TimestampValue(x), Value::TimestampValue(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::StringValue(x), Value::StringValue(y))
        | (Value::BytesValue(x), Value::BytesValue(y))
        | (Value::ReferenceValue(x), Value::ReferenceValue(y)) => x.cmp(y),
        (Value::ArrayValue(_), Value::ArrayValue(_)) => {
            let (xs, ys) = (a.as_array(), b.as_array());
            xs.iter()
                .zip(ys)
                .map(|(x, y)| compare_values(x, y))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| xs.len().cmp(&ys.len()))
        }
        _ => Ordering::Equal,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::MapValue(_), Value::MapValue(_)) => a == b,
        _ => type_rank(a) == type_rank(b) && compare_values(a, b) == Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Precondition, ToFirestoreValue, ASCENDING};

    fn fields(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let store = MemoryStore::new();
        store
            .create_document("jobs", Some("a"), HashMap::new())
            .await
            .unwrap();
        let err = store
            .create_document("jobs", Some("a"), HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FirestoreError::AlreadyExists(_)));

        let generated = store
            .create_document("jobs", None, HashMap::new())
            .await
            .unwrap();
        assert_eq!(generated.id().unwrap().len(), GENERATED_ID_LEN);
    }

    #[tokio::test]
    async fn test_query_filters_orders_and_limits() {
        let store = MemoryStore::new();
        for (id, status, rank) in [("a", "active", 1i64), ("b", "closed", 2), ("c", "active", 3)] {
            store
                .set_document(
                    "jobs",
                    id,
                    fields(&[
                        ("status", status.to_firestore_value()),
                        ("rank", rank.to_firestore_value()),
                    ]),
                )
                .await
                .unwrap();
        }
        // Subcollection documents are not direct children of `jobs`.
        store
            .set_document(
                "jobs/a/applications",
                "x",
                fields(&[("status", "active".to_firestore_value())]),
            )
            .await
            .unwrap();

        let query = StructuredQuery::collection("jobs")
            .filter(Filter::equal("status", "active".to_firestore_value()))
            .order_by("rank", DESCENDING);
        let docs = store.run_query("", query.clone()).await.unwrap();
        let ids: Vec<_> = docs.iter().filter_map(|d| d.id()).collect();
        assert_eq!(ids, vec!["c", "a"]);

        assert_eq!(store.count("", query.clone()).await.unwrap(), 2);
        assert_eq!(store.run_query("", query.limit(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_start_after_cursor() {
        let store = MemoryStore::new();
        for (id, rank) in [("a", 1i64), ("b", 2), ("c", 2), ("d", 3)] {
            store
                .set_document("items", id, fields(&[("rank", rank.to_firestore_value())]))
                .await
                .unwrap();
        }

        let query = StructuredQuery::collection("items")
            .order_by("rank", ASCENDING)
            .order_by(NAME_FIELD, ASCENDING)
            .start_after(vec![
                2i64.to_firestore_value(),
                Value::ReferenceValue(store.document_name("items", "b")),
            ]);
        let docs = store.run_query("", query).await.unwrap();
        let ids: Vec<_> = docs.iter().filter_map(|d| d.id()).collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        store
            .set_document("jobs", "j", fields(&[("n", 0i64.to_firestore_value())]))
            .await
            .unwrap();
        store
            .set_document("jobs/j/applications", "u1", HashMap::new())
            .await
            .unwrap();

        let writes = vec![
            Write::transform(
                store.document_name("jobs", "j"),
                vec![FieldTransform::increment("n", 1)],
            ),
            Write::update(store.document_name("jobs/j/applications", "u1"), HashMap::new(), None)
                .with_precondition(Precondition::exists(false)),
        ];
        let err = store.commit(writes).await.unwrap_err();
        assert!(matches!(err, FirestoreError::AlreadyExists(_)));

        let job = store.get_document("jobs", "j").await.unwrap().unwrap();
        assert_eq!(job.field("n"), Some(&0i64.to_firestore_value()));
    }

    #[tokio::test]
    async fn test_transforms_and_update_time_precondition() {
        let store = MemoryStore::new();
        let created = store
            .set_document("jobs", "j", HashMap::new())
            .await
            .unwrap();
        let name = store.document_name("jobs", "j");
        let stale = created.update_time.clone().unwrap();

        store
            .commit(vec![Write::transform(
                name.clone(),
                vec![
                    FieldTransform::append_missing("tags", vec!["a".to_firestore_value()]),
                    FieldTransform::append_missing(
                        "tags",
                        vec!["a".to_firestore_value(), "b".to_firestore_value()],
                    ),
                    FieldTransform::remove_all("tags", vec!["a".to_firestore_value()]),
                    FieldTransform::increment("views", 2),
                    FieldTransform::request_time("touchedAt"),
                ],
            )])
            .await
            .unwrap();

        let doc = store.get_document("jobs", "j").await.unwrap().unwrap();
        assert_eq!(doc.field("tags").unwrap().as_array(), &["b".to_firestore_value()]);
        assert_eq!(doc.field("views"), Some(&2i64.to_firestore_value()));
        assert!(matches!(doc.field("touchedAt"), Some(Value::TimestampValue(_))));
        assert_ne!(doc.update_time.as_deref(), Some(stale.as_str()));

        let err = store
            .commit(vec![Write::update(name, HashMap::new(), Some(vec![]))
                .with_precondition(Precondition::update_time(stale))])
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
    }

    #[tokio::test]
    async fn test_exists_precondition_on_missing_document() {
        let store = MemoryStore::new();
        let err = store
            .commit(vec![Write::transform(
                store.document_name("jobs", "missing"),
                vec![FieldTransform::increment("views", 1)],
            )])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_nested_paths() {
        let mut map = HashMap::new();
        set_path(&mut map, "location.remote", true.to_firestore_value());
        assert_eq!(
            lookup_in(&map, "location.remote"),
            Some(&Value::BooleanValue(true))
        );
        remove_path(&mut map, "location.remote");
        assert!(lookup_in(&map, "location.remote").is_none());
    }
}
