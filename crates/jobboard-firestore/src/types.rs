//! Firestore REST API types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Firestore document value types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

impl Value {
    pub fn array(values: Vec<Value>) -> Self {
        Value::ArrayValue(ArrayValue {
            values: Some(values),
        })
    }

    pub fn map(fields: HashMap<String, Value>) -> Self {
        Value::MapValue(MapValue {
            fields: Some(fields),
        })
    }

    /// Array elements; empty for non-arrays.
    pub fn as_array(&self) -> &[Value] {
        match self {
            Value::ArrayValue(a) => a.values.as_deref().unwrap_or(&[]),
            _ => &[],
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::MapValue(m) => m.fields.as_ref(),
            _ => None,
        }
    }

    /// Convert arbitrary JSON into a Firestore value. Whole numbers become integers.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::NullValue(()),
            serde_json::Value::Bool(b) => Value::BooleanValue(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::IntegerValue(i.to_string()),
                None => Value::DoubleValue(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::StringValue(s.clone()),
            serde_json::Value::Array(items) => {
                Value::array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(obj) => Value::map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Firestore document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Document fields
    pub fields: Option<HashMap<String, Value>>,
    /// Create time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// Update time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document with the given fields.
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            name: None,
            fields: Some(fields),
            create_time: None,
            update_time: None,
        }
    }

    /// Create a document addressed by its full resource name.
    pub fn named(name: impl Into<String>, fields: HashMap<String, Value>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(fields)
        }
    }

    /// Last segment of the resource name.
    pub fn id(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.rsplit('/').next())
    }

    pub fn field(&self, path: &str) -> Option<&Value> {
        self.fields.as_ref().and_then(|f| f.get(path))
    }
}

// ============================================================================
// Structured Query Types
// ============================================================================

/// Field filter operators.
pub mod ops {
    pub const EQUAL: &str = "EQUAL";
    pub const ARRAY_CONTAINS: &str = "ARRAY_CONTAINS";
    pub const GREATER_THAN: &str = "GREATER_THAN";
    pub const GREATER_THAN_OR_EQUAL: &str = "GREATER_THAN_OR_EQUAL";
    pub const LESS_THAN: &str = "LESS_THAN";
    pub const LESS_THAN_OR_EQUAL: &str = "LESS_THAN_OR_EQUAL";
    pub const AND: &str = "AND";
}

pub const ASCENDING: &str = "ASCENDING";
pub const DESCENDING: &str = "DESCENDING";

/// Field path that orders by document name.
pub const NAME_FIELD: &str = "__name__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#where: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<Order>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<Cursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

impl StructuredQuery {
    /// Query over the collection with this ID under the request parent.
    pub fn collection(collection_id: impl Into<String>) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: collection_id.into(),
                all_descendants: None,
            }],
            r#where: None,
            order_by: None,
            start_at: None,
            limit: None,
        }
    }

    /// AND a filter onto the existing `where` clause.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.r#where = Some(match self.r#where.take() {
            None => filter,
            Some(Filter {
                composite_filter: Some(mut composite),
                field_filter: None,
            }) if composite.op == ops::AND => {
                composite.filters.push(filter);
                Filter {
                    composite_filter: Some(composite),
                    field_filter: None,
                }
            }
            Some(existing) => Filter::and(vec![existing, filter]),
        });
        self
    }

    pub fn order_by(mut self, field_path: &str, direction: &str) -> Self {
        self.order_by.get_or_insert_with(Vec::new).push(Order {
            field: FieldReference::new(field_path),
            direction: direction.to_string(),
        });
        self
    }

    /// Resume just after the position described by `values`.
    pub fn start_after(mut self, values: Vec<Value>) -> Self {
        self.start_at = Some(Cursor {
            values,
            before: Some(false),
        });
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn collection_id(&self) -> &str {
        self.from
            .first()
            .map(|c| c.collection_id.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_descendants: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite_filter: Option<CompositeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_filter: Option<FieldFilter>,
}

impl Filter {
    pub fn field(field_path: &str, op: &str, value: Value) -> Self {
        Self {
            composite_filter: None,
            field_filter: Some(FieldFilter {
                field: FieldReference::new(field_path),
                op: op.to_string(),
                value,
            }),
        }
    }

    pub fn equal(field_path: &str, value: Value) -> Self {
        Self::field(field_path, ops::EQUAL, value)
    }

    pub fn array_contains(field_path: &str, value: Value) -> Self {
        Self::field(field_path, ops::ARRAY_CONTAINS, value)
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Self {
            composite_filter: Some(CompositeFilter {
                op: ops::AND.to_string(),
                filters,
            }),
            field_filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeFilter {
    pub op: String,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

impl FieldReference {
    pub fn new(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub field: FieldReference,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

/// One element of the runQuery response stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    pub document: Option<Document>,
    pub read_time: Option<String>,
}

// ============================================================================
// Aggregation Types
// ============================================================================

/// Alias under which the count aggregate is requested and returned.
pub const COUNT_ALIAS: &str = "count";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAggregationQueryRequest {
    pub structured_aggregation_query: StructuredAggregationQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAggregationQuery {
    pub structured_query: StructuredQuery,
    pub aggregations: Vec<Aggregation>,
}

impl StructuredAggregationQuery {
    pub fn count(structured_query: StructuredQuery) -> Self {
        Self {
            structured_query,
            aggregations: vec![Aggregation {
                alias: COUNT_ALIAS.to_string(),
                count: Some(CountAggregation {}),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    pub alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<CountAggregation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountAggregation {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAggregationQueryResponse {
    pub result: Option<AggregationResult>,
    pub read_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub aggregate_fields: Option<HashMap<String, Value>>,
}

// ============================================================================
// Commit Types (atomic multi-document writes)
// ============================================================================

/// A single write operation in a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// Update or insert a document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Document>,

    /// Delete a document by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,

    /// Field mask for partial updates. `None` replaces the whole document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,

    /// Server-side transforms applied after the update, in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_transforms: Option<Vec<FieldTransform>>,

    /// Precondition for the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<Precondition>,
}

impl Write {
    /// Write the given fields to the named document, limited to `mask` when set.
    pub fn update(
        name: impl Into<String>,
        fields: HashMap<String, Value>,
        mask: Option<Vec<String>>,
    ) -> Self {
        Self {
            update: Some(Document::named(name, fields)),
            delete: None,
            update_mask: mask.map(|field_paths| DocumentMask { field_paths }),
            update_transforms: None,
            current_document: None,
        }
    }

    /// Apply only transforms to an existing document.
    pub fn transform(name: impl Into<String>, transforms: Vec<FieldTransform>) -> Self {
        Self::update(name, HashMap::new(), Some(Vec::new()))
            .with_transforms(transforms)
            .with_precondition(Precondition::exists(true))
    }

    pub fn with_transforms(mut self, transforms: Vec<FieldTransform>) -> Self {
        self.update_transforms = Some(transforms);
        self
    }

    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.current_document = Some(precondition);
        self
    }

    /// Name of the document this write targets.
    pub fn target(&self) -> Option<&str> {
        self.update
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .or(self.delete.as_deref())
    }
}

/// Document field mask for partial updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

/// Precondition for a write operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Precondition {
    /// Document must exist (or must not).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,

    /// Document must have this update time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Precondition {
    pub fn exists(exists: bool) -> Self {
        Self {
            exists: Some(exists),
            update_time: None,
        }
    }

    pub fn update_time(update_time: impl Into<String>) -> Self {
        Self {
            exists: None,
            update_time: Some(update_time.into()),
        }
    }
}

/// Server value for `setToServerValue`.
pub const REQUEST_TIME: &str = "REQUEST_TIME";

/// Server-side field transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    pub field_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_to_server_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append_missing_elements: Option<ArrayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_all_from_array: Option<ArrayValue>,
}

impl FieldTransform {
    fn empty(field_path: &str) -> Self {
        Self {
            field_path: field_path.to_string(),
            set_to_server_value: None,
            increment: None,
            append_missing_elements: None,
            remove_all_from_array: None,
        }
    }

    pub fn increment(field_path: &str, by: i64) -> Self {
        Self {
            increment: Some(Value::IntegerValue(by.to_string())),
            ..Self::empty(field_path)
        }
    }

    /// Set-add: append each element not already present.
    pub fn append_missing(field_path: &str, values: Vec<Value>) -> Self {
        Self {
            append_missing_elements: Some(ArrayValue {
                values: Some(values),
            }),
            ..Self::empty(field_path)
        }
    }

    /// Set-remove: remove every occurrence of each element.
    pub fn remove_all(field_path: &str, values: Vec<Value>) -> Self {
        Self {
            remove_all_from_array: Some(ArrayValue {
                values: Some(values),
            }),
            ..Self::empty(field_path)
        }
    }

    pub fn request_time(field_path: &str) -> Self {
        Self {
            set_to_server_value: Some(REQUEST_TIME.to_string()),
            ..Self::empty(field_path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

/// Result of a single write in a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    /// Update time of the written document.
    pub update_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// Results for each write, in order.
    pub write_results: Option<Vec<WriteResult>>,
    pub commit_time: Option<String>,
}

// ============================================================================
// Value Conversions
// ============================================================================

/// Canonical timestamp form: UTC, microsecond precision, `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Convert a Rust value to Firestore Value.
pub trait ToFirestoreValue {
    fn to_firestore_value(&self) -> Value;
}

impl ToFirestoreValue for String {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.clone())
    }
}

impl ToFirestoreValue for &str {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.to_string())
    }
}

impl ToFirestoreValue for i64 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for u8 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for u32 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for u64 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue((*self as i64).to_string())
    }
}

impl ToFirestoreValue for f64 {
    fn to_firestore_value(&self) -> Value {
        Value::DoubleValue(*self)
    }
}

impl ToFirestoreValue for bool {
    fn to_firestore_value(&self) -> Value {
        Value::BooleanValue(*self)
    }
}

impl ToFirestoreValue for DateTime<Utc> {
    fn to_firestore_value(&self) -> Value {
        Value::TimestampValue(format_timestamp(self))
    }
}

impl<T: ToFirestoreValue> ToFirestoreValue for Option<T> {
    fn to_firestore_value(&self) -> Value {
        match self {
            Some(v) => v.to_firestore_value(),
            None => Value::NullValue(()),
        }
    }
}

impl<T: ToFirestoreValue> ToFirestoreValue for Vec<T> {
    fn to_firestore_value(&self) -> Value {
        Value::array(self.iter().map(|v| v.to_firestore_value()).collect())
    }
}

/// Convert Firestore Value to Rust type.
pub trait FromFirestoreValue: Sized {
    fn from_firestore_value(value: &Value) -> Option<Self>;
}

impl FromFirestoreValue for String {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromFirestoreValue for i64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) => Some(*f as i64),
            _ => None,
        }
    }
}

impl FromFirestoreValue for u8 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        i64::from_firestore_value(value).and_then(|i| u8::try_from(i).ok())
    }
}

impl FromFirestoreValue for u32 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        i64::from_firestore_value(value).map(|i| i.clamp(0, u32::MAX as i64) as u32)
    }
}

impl FromFirestoreValue for u64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        i64::from_firestore_value(value).map(|i| i.max(0) as u64)
    }
}

impl FromFirestoreValue for f64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::DoubleValue(f) => Some(*f),
            Value::IntegerValue(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromFirestoreValue for bool {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromFirestoreValue for DateTime<Utc> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            // Documents written by older clients carry ISO strings instead of timestamps.
            Value::TimestampValue(s) | Value::StringValue(s) => {
                DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.into())
            }
            _ => None,
        }
    }
}

impl<T: FromFirestoreValue> FromFirestoreValue for Vec<T> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::ArrayValue(_) => Some(
                value
                    .as_array()
                    .iter()
                    .filter_map(T::from_firestore_value)
                    .collect(),
            ),
            _ => None,
        }
    }
}
