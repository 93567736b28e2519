use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{Entity, QueryResponse, ShapeTag, ToJsonValue};

/// Correlation field present on every batch item, request and response alike.
pub const BATCH_ID_FIELD: &str = "bId";

/// Shape key QuickBooks uses for a failed batch item.
const FAULT: &str = "Fault";

/// An entity returned as one item of a batch response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchEntity {
    entity: Entity,
    #[serde(skip)]
    batch_id: String,
    #[serde(skip)]
    entity_name: Option<String>,
}

impl BatchEntity {
    #[must_use]
    pub fn new(data: Map<String, Value>, batch_id: impl Into<String>) -> Self {
        Self {
            entity: Entity::new(data),
            batch_id: batch_id.into(),
            entity_name: None,
        }
    }

    #[must_use]
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// The key the payload was found under, e.g. `Customer` or `Fault`.
    #[must_use]
    pub fn entity_name(&self) -> Option<&str> {
        self.entity_name.as_deref()
    }

    /// Whether QuickBooks rejected this item. The fault details are the raw data.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        self.entity_name.as_deref() == Some(FAULT)
    }

    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.entity.id()
    }

    #[must_use]
    pub fn rate_value(&self) -> Option<i64> {
        self.entity.rate_value()
    }

    #[must_use]
    pub fn raw_data(&self) -> &Map<String, Value> {
        self.entity.raw_data()
    }

    #[must_use]
    pub fn as_entity(&self) -> &Entity {
        &self.entity
    }

    #[must_use]
    pub fn into_entity(self) -> Entity {
        self.entity
    }
}

impl ToJsonValue for BatchEntity {
    fn to_json_value(&self) -> Value {
        self.entity.to_json_value()
    }
}

/// The decoded result of one batch item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchItem {
    Query(QueryResponse),
    Entity(BatchEntity),
}

impl BatchItem {
    /// Decodes one `{"bId": ..., "<ShapeKey>": payload}` item. Returns the
    /// correlation id together with the decoded payload.
    fn decode(fields: Map<String, Value>) -> (String, Self) {
        let mut batch_id = None;
        let mut shape = None;

        for (key, value) in fields {
            if key == BATCH_ID_FIELD {
                batch_id = Some(value);
            } else if shape.is_none() {
                shape = Some((key, value));
            }
        }

        let batch_id = match batch_id {
            Some(Value::String(id)) => id,
            Some(other) => other.to_string(),
            None => {
                warn!("batch item has no {BATCH_ID_FIELD}, keying it by an empty id");
                String::new()
            }
        };

        let (key, payload) = shape.unwrap_or_default();
        let item = match ShapeTag::from_key(&key) {
            ShapeTag::QueryResponse => Self::Query(QueryResponse::from_payload(payload)),
            // batch items never nest
            ShapeTag::BatchItemResponse | ShapeTag::Entity => Self::Entity(BatchEntity {
                entity: Entity::from_payload(payload),
                batch_id: batch_id.clone(),
                entity_name: (!key.is_empty()).then_some(key),
            }),
        };

        (batch_id, item)
    }

    #[must_use]
    pub fn as_query(&self) -> Option<&QueryResponse> {
        match self {
            Self::Query(query) => Some(query),
            Self::Entity(_) => None,
        }
    }

    #[must_use]
    pub fn as_entity(&self) -> Option<&BatchEntity> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Query(_) => None,
        }
    }

    #[must_use]
    pub fn into_query(self) -> Option<QueryResponse> {
        match self {
            Self::Query(query) => Some(query),
            Self::Entity(_) => None,
        }
    }

    #[must_use]
    pub fn into_entity(self) -> Option<BatchEntity> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Query(_) => None,
        }
    }
}

impl ToJsonValue for BatchItem {
    fn to_json_value(&self) -> Value {
        match self {
            Self::Query(query) => query.to_json_value(),
            Self::Entity(entity) => entity.to_json_value(),
        }
    }
}

/// Per-item results of a batch request, keyed by `bId`.
///
/// Items are decoded independently and iterate in the order they arrived.
/// When two items share a `bId` the later one replaces the earlier one but
/// keeps the earlier one's position (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchResponse {
    items: IndexMap<String, BatchItem>,
}

impl BatchResponse {
    pub(crate) fn from_payload(payload: Value) -> Self {
        match payload {
            Value::Array(items) => items.into_iter().collect(),
            Value::Null => Self::default(),
            other => {
                warn!(payload = ?other, "batch payload is not an array, using empty response");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, batch_id: &str) -> Option<&BatchItem> {
        self.items.get(batch_id)
    }

    /// Iterates `(bId, item)` pairs in arrival order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, BatchItem> {
        self.items.iter()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, BatchItem> {
        self.items.values()
    }

    pub fn batch_ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Items QuickBooks rejected.
    pub fn faults(&self) -> impl Iterator<Item = &BatchEntity> {
        self.values()
            .filter_map(BatchItem::as_entity)
            .filter(|entity| entity.is_fault())
    }
}

impl FromIterator<Value> for BatchResponse {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut items = IndexMap::new();

        for raw in iter {
            let fields = match raw {
                Value::Object(fields) => fields,
                other => {
                    warn!(item = ?other, "skipping batch item that is not an object");
                    continue;
                }
            };
            let (batch_id, item) = BatchItem::decode(fields);
            if items.insert(batch_id.clone(), item).is_some() {
                debug!(%batch_id, "duplicate batch id, keeping the later item");
            }
        }

        Self { items }
    }
}

impl IntoIterator for BatchResponse {
    type Item = (String, BatchItem);
    type IntoIter = indexmap::map::IntoIter<String, BatchItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResponse {
    type Item = (&'a String, &'a BatchItem);
    type IntoIter = indexmap::map::Iter<'a, String, BatchItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl ToJsonValue for BatchResponse {
    fn to_json_value(&self) -> Value {
        Value::Object(
            self.items
                .iter()
                .map(|(batch_id, item)| (batch_id.clone(), item.to_json_value()))
                .collect(),
        )
    }
}
