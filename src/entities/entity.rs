use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::utils::{
    date_format::parse_datetime,
    serde_helpers::{lenient_decimal, lenient_integer},
};

use super::ToJsonValue;

/// A single QuickBooks record.
///
/// The raw field mapping is kept exactly as received (including field order)
/// and is never modified after construction. Field names are opaque; only a
/// handful of fields common to every entity get typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    data: Map<String, Value>,
}

impl Entity {
    #[must_use]
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Builds an entity from a decoded payload. Anything other than a JSON
    /// object degrades to an empty entity.
    pub(crate) fn from_payload(payload: Value) -> Self {
        match payload {
            Value::Object(data) => Self::new(data),
            Value::Null => Self::default(),
            other => {
                warn!(payload = ?other, "entity payload is not an object, using empty entity");
                Self::default()
            }
        }
    }

    /// The `Id` field as an integer.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.get_integer("Id")
    }

    /// The `RateValue` field as an integer.
    #[must_use]
    pub fn rate_value(&self) -> Option<i64> {
        self.get_integer("RateValue")
    }

    /// The `SyncToken` QuickBooks requires on update and delete payloads.
    #[must_use]
    pub fn sync_token(&self) -> Option<&str> {
        self.get_str("SyncToken")
    }

    /// When the record was created, from `MetaData.CreateTime`.
    #[must_use]
    pub fn create_time(&self) -> Option<OffsetDateTime> {
        self.meta_data_time("CreateTime")
    }

    /// When the record was last changed, from `MetaData.LastUpdatedTime`.
    #[must_use]
    pub fn last_updated_time(&self) -> Option<OffsetDateTime> {
        self.meta_data_time("LastUpdatedTime")
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Reads any field as an integer. Missing or non-numeric fields are `None`.
    #[must_use]
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(lenient_integer)
    }

    /// Reads an amount field such as `TotalAmt` or `Balance` without losing
    /// precision.
    #[must_use]
    pub fn get_decimal(&self, key: &str) -> Option<Decimal> {
        self.data.get(key).and_then(lenient_decimal)
    }

    #[must_use]
    pub fn raw_data(&self) -> &Map<String, Value> {
        &self.data
    }

    #[must_use]
    pub fn into_raw_data(self) -> Map<String, Value> {
        self.data
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn meta_data_time(&self, key: &str) -> Option<OffsetDateTime> {
        let raw = self.data.get("MetaData")?.get(key)?.as_str()?;
        parse_datetime(raw)
            .inspect_err(|e| debug!("ignoring unparseable {key}: {e}"))
            .ok()
    }
}

impl From<Map<String, Value>> for Entity {
    fn from(data: Map<String, Value>) -> Self {
        Self::new(data)
    }
}

impl ToJsonValue for Entity {
    fn to_json_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}
