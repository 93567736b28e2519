use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::utils::serde_helpers::lenient_integer;

use super::{Entity, ToJsonValue};

/// Pagination fields QuickBooks places beside the record array.
const START_POSITION: &str = "startPosition";
const MAX_RESULTS: &str = "maxResults";
const TOTAL_COUNT: &str = "totalCount";

/// The records returned by a query, in the order the API returned them.
///
/// Built from the body of a `QueryResponse` envelope such as
/// `{"Customer": [...], "startPosition": 1, "maxResults": 2}`. The record array
/// is the first array-valued field that is not pagination metadata; a payload
/// without one yields an empty response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    entity_name: Option<String>,
    entities: Vec<Entity>,
    start_position: Option<i64>,
    max_results: Option<i64>,
    total_count: Option<i64>,
}

impl QueryResponse {
    pub(crate) fn from_payload(payload: Value) -> Self {
        match payload {
            Value::Object(fields) => Self::from_map(fields),
            Value::Null => Self::default(),
            other => {
                warn!(payload = ?other, "query payload is not an object, using empty response");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        let mut response = Self::default();

        for (key, value) in fields {
            match key.as_str() {
                START_POSITION => response.start_position = lenient_integer(&value),
                MAX_RESULTS => response.max_results = lenient_integer(&value),
                TOTAL_COUNT => response.total_count = lenient_integer(&value),
                _ if response.entity_name.is_some() => {}
                _ => {
                    if let Value::Array(records) = value {
                        response.entities = records.into_iter().map(Entity::from_payload).collect();
                        response.entity_name = Some(key);
                    }
                }
            }
        }

        response
    }

    /// Name of the queried entity type, e.g. `Customer`.
    #[must_use]
    pub fn entity_name(&self) -> Option<&str> {
        self.entity_name.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }

    #[must_use]
    pub fn start_position(&self) -> Option<i64> {
        self.start_position
    }

    #[must_use]
    pub fn max_results(&self) -> Option<i64> {
        self.max_results
    }

    /// Only present when the query was a `select count(*)`.
    #[must_use]
    pub fn total_count(&self) -> Option<i64> {
        self.total_count
    }
}

impl IntoIterator for QueryResponse {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResponse {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

// Only the records are emitted; the wrapping key and pagination are dropped.
impl Serialize for QueryResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entities)
    }
}

impl ToJsonValue for QueryResponse {
    fn to_json_value(&self) -> Value {
        Value::Array(self.entities.iter().map(ToJsonValue::to_json_value).collect())
    }
}
