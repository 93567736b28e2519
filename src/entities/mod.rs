use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub mod batch;
pub mod batch_request;
pub mod entity;
pub mod query;

pub use self::{
    batch::{BatchEntity, BatchItem, BatchResponse},
    batch_request::{BatchItemRequest, BatchRequest, Operation},
    entity::Entity,
    query::QueryResponse,
};

/// Emits the JSON form of a decoded response object.
///
/// Entities emit their raw mapping, query responses an array of raw mappings
/// and batch responses a mapping from `bId` to the emitted item.
pub trait ToJsonValue {
    fn to_json_value(&self) -> Value;
}

/// The top-level key of a response envelope, which decides how its payload
/// is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeTag {
    QueryResponse,
    BatchItemResponse,
    /// Any other key, typically the entity name such as `Customer`.
    Entity,
}

impl ShapeTag {
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key {
            "QueryResponse" => Self::QueryResponse,
            "BatchItemResponse" => Self::BatchItemResponse,
            _ => Self::Entity,
        }
    }
}

/// A decoded QuickBooks response.
///
/// The first key of the envelope, in the order it arrived on the wire, selects
/// the variant and its value is the payload:
///
/// * `{"QueryResponse": {...}}` becomes [`Response::Query`],
/// * `{"BatchItemResponse": [...]}` becomes [`Response::Batch`],
/// * anything else, e.g. `{"Customer": {...}}`, becomes [`Response::Entity`].
///
/// Trailing envelope fields such as `time` are ignored. An envelope with no
/// keys decodes to an empty entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Entity(Entity),
    Query(QueryResponse),
    Batch(BatchResponse),
}

impl Response {
    #[must_use]
    pub fn from_map(envelope: Map<String, Value>) -> Self {
        let Some((key, data)) = envelope.into_iter().next() else {
            return Self::Entity(Entity::default());
        };

        trace!(shape = %key, "dispatching response");
        match ShapeTag::from_key(&key) {
            ShapeTag::QueryResponse => Self::Query(QueryResponse::from_payload(data)),
            ShapeTag::BatchItemResponse => Self::Batch(BatchResponse::from_payload(data)),
            ShapeTag::Entity => Self::Entity(Entity::from_payload(data)),
        }
    }

    /// Like [`Response::from_map`]; a body that is not a JSON object is treated
    /// as an envelope without keys.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(envelope) => Self::from_map(envelope),
            other => {
                warn!(body = ?other, "response body is not an object, using empty entity");
                Self::Entity(Entity::default())
            }
        }
    }

    #[must_use]
    pub fn as_entity(&self) -> Option<&Entity> {
        if let Self::Entity(entity) = self {
            Some(entity)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_query(&self) -> Option<&QueryResponse> {
        if let Self::Query(query) = self {
            Some(query)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_batch(&self) -> Option<&BatchResponse> {
        if let Self::Batch(batch) = self {
            Some(batch)
        } else {
            None
        }
    }

    #[must_use]
    pub fn into_entity(self) -> Option<Entity> {
        if let Self::Entity(entity) = self {
            Some(entity)
        } else {
            None
        }
    }

    #[must_use]
    pub fn into_query(self) -> Option<QueryResponse> {
        if let Self::Query(query) = self {
            Some(query)
        } else {
            None
        }
    }

    #[must_use]
    pub fn into_batch(self) -> Option<BatchResponse> {
        if let Self::Batch(batch) = self {
            Some(batch)
        } else {
            None
        }
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl ToJsonValue for Response {
    fn to_json_value(&self) -> Value {
        match self {
            Self::Entity(entity) => entity.to_json_value(),
            Self::Query(query) => query.to_json_value(),
            Self::Batch(batch) => batch.to_json_value(),
        }
    }
}
