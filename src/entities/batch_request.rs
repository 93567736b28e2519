use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::Entity;

/// QuickBooks rejects batches with more items than this.
pub const MAX_BATCH_ITEMS: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// One item of a batch request. The payload holds exactly one entry, either
/// `"<EntityName>": {...}` for an operation or `"Query": "..."`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItemRequest {
    #[serde(rename = "bId")]
    pub batch_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl BatchItemRequest {
    #[must_use]
    pub fn operation(
        batch_id: impl Into<String>,
        operation: Operation,
        entity_name: impl Into<String>,
        entity: impl Into<Entity>,
    ) -> Self {
        let mut payload = Map::new();
        payload.insert(
            entity_name.into(),
            Value::Object(entity.into().into_raw_data()),
        );
        Self {
            batch_id: batch_id.into(),
            operation: Some(operation),
            payload,
        }
    }

    #[must_use]
    pub fn query(batch_id: impl Into<String>, query: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("Query".to_string(), Value::String(query.into()));
        Self {
            batch_id: batch_id.into(),
            operation: None,
            payload,
        }
    }
}

/// Builds the body of a batch call:
/// `{"BatchItemRequest": [{"bId": "...", "operation": "create", "Customer": {...}}, ...]}`.
///
/// The `create`/`update`/`delete`/`query` helpers generate a unique `bId` and
/// return it so the caller can find the item again in the `BatchResponse`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchRequest {
    #[serde(rename = "BatchItemRequest")]
    items: Vec<BatchItemRequest>,
}

impl BatchRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: BatchItemRequest) -> &mut Self {
        self.items.push(item);
        if self.exceeds_limit() {
            warn!("batch request exceeds {MAX_BATCH_ITEMS} items, QuickBooks will reject it");
        }
        self
    }

    pub fn create(&mut self, entity_name: impl Into<String>, entity: impl Into<Entity>) -> String {
        self.push_operation(Operation::Create, entity_name.into(), entity.into())
    }

    pub fn update(&mut self, entity_name: impl Into<String>, entity: impl Into<Entity>) -> String {
        self.push_operation(Operation::Update, entity_name.into(), entity.into())
    }

    pub fn delete(&mut self, entity_name: impl Into<String>, entity: impl Into<Entity>) -> String {
        self.push_operation(Operation::Delete, entity_name.into(), entity.into())
    }

    pub fn query(&mut self, query: impl Into<String>) -> String {
        let batch_id = Uuid::new_v4().to_string();
        self.push(BatchItemRequest::query(batch_id.clone(), query));
        batch_id
    }

    #[must_use]
    pub fn items(&self) -> &[BatchItemRequest] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether QuickBooks would reject this batch for its size.
    #[must_use]
    pub fn exceeds_limit(&self) -> bool {
        self.items.len() > MAX_BATCH_ITEMS
    }

    fn push_operation(
        &mut self,
        operation: Operation,
        entity_name: String,
        entity: Entity,
    ) -> String {
        let batch_id = Uuid::new_v4().to_string();
        self.push(BatchItemRequest::operation(
            batch_id.clone(),
            operation,
            entity_name,
            entity,
        ));
        batch_id
    }
}
