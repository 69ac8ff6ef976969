use crate::{HashMap, HashSet};
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Deserialize, Deserializer, Serialize, Serializer
};
use serde_json::{Map, Value};
use std::fmt;

/// The key of a normalized record, e.g. `Film:abc`, `Query` or `Query.films.0`.
pub type EntityKey = String;
/// The key of one field of a record: the field name, plus its arguments if it has any.
pub type FieldKey = String;
pub type Record = HashMap<FieldKey, StoreValue>;

/// The field slots written by a merge.
pub type ChangedKeys = HashSet<FieldRef>;
/// The field slots read by a denormalization.
pub type Footprint = HashSet<FieldRef>;

const REF: &str = "__ref";

fn is_link(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.get(REF).map_or(false, Value::is_string)
}

/// The value of one field in a record.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    /// A scalar, or a list that contains no links.
    Scalar(Value),
    /// A reference to another record.
    Link(EntityKey),
    /// A list containing at least one link, possibly nested.
    List(Vec<StoreValue>)
}

impl StoreValue {
    /// Build a list value. Lists without any links are collapsed into a single scalar array.
    pub fn list(items: Vec<StoreValue>) -> Self {
        if items.iter().all(StoreValue::is_scalar) {
            StoreValue::Scalar(Value::Array(
                items.into_iter().filter_map(StoreValue::into_scalar).collect()
            ))
        } else {
            StoreValue::List(items)
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, StoreValue::Scalar(_))
    }

    pub fn into_scalar(self) -> Option<Value> {
        match self {
            StoreValue::Scalar(value) => Some(value),
            _ => None
        }
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Object(mut map) if is_link(&map) => match map.remove(REF) {
                Some(Value::String(key)) => StoreValue::Link(key),
                _ => StoreValue::Scalar(Value::Object(map))
            },
            Value::Array(items) => {
                StoreValue::list(items.into_iter().map(StoreValue::from_json).collect())
            }
            other => StoreValue::Scalar(other)
        }
    }
}

impl Serialize for StoreValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StoreValue::Scalar(value) => value.serialize(serializer),
            StoreValue::Link(key) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(REF, key)?;
                map.end()
            }
            StoreValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for StoreValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(StoreValue::from_json)
    }
}

impl From<Value> for StoreValue {
    fn from(value: Value) -> Self {
        StoreValue::Scalar(value)
    }
}

/// Names one field slot in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRef {
    pub entity: EntityKey,
    pub field: FieldKey
}

impl FieldRef {
    pub fn new<E: Into<EntityKey>, F: Into<FieldKey>>(entity: E, field: F) -> Self {
        FieldRef {
            entity: entity.into(),
            field: field.into()
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.field)
    }
}

/// A flat map of records, either the whole cache or a fragment produced by the normalizer.
///
/// Serializes as `{ entityKey: { fieldKey: value } }` with links written as `{ "__ref": key }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    pub(crate) records: HashMap<EntityKey, Record>
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity: &str, field: &str) -> Option<&StoreValue> {
        self.records.get(entity).and_then(|record| record.get(field))
    }

    pub fn record(&self, entity: &str) -> Option<&Record> {
        self.records.get(entity)
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.records.contains_key(entity)
    }

    /// Write a single slot, creating the record if necessary.
    pub fn write<E, F>(&mut self, entity: E, field: F, value: StoreValue)
    where
        E: Into<EntityKey>,
        F: Into<FieldKey>
    {
        self.records
            .entry(entity.into())
            .or_default()
            .insert(field.into(), value);
    }

    /// Overlay `fragment` onto this store. See [`merge`](fn.merge.html).
    pub fn merge(&mut self, fragment: Store) -> ChangedKeys {
        super::merge(self, fragment)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityKey> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The store as plain JSON, with links as `{ "__ref": key }`.
    pub fn to_json(&self) -> Value {
        let mut entities = Map::new();
        for (entity, record) in &self.records {
            let fields = record
                .iter()
                .map(|(field, value)| (field.clone(), value.to_json()))
                .collect();
            entities.insert(entity.clone(), Value::Object(fields));
        }
        Value::Object(entities)
    }
}

impl StoreValue {
    fn to_json(&self) -> Value {
        match self {
            StoreValue::Scalar(value) => value.clone(),
            StoreValue::Link(key) => {
                let mut map = Map::new();
                map.insert(REF.to_string(), Value::String(key.clone()));
                Value::Object(map)
            }
            StoreValue::List(items) => Value::Array(items.iter().map(StoreValue::to_json).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collapses_lists_without_links() {
        let list = StoreValue::list(vec![json!(1).into(), Value::Null.into()]);
        assert_eq!(list, StoreValue::Scalar(json!([1, null])));

        let list = StoreValue::list(vec![StoreValue::Link("Film:1".into()), Value::Null.into()]);
        assert!(matches!(list, StoreValue::List(_)));
    }

    #[test]
    fn serializes_links_as_refs() {
        let mut store = Store::new();
        store.write("Query", "film", StoreValue::Link("Film:1".into()));
        store.write(
            "Query",
            "films",
            StoreValue::List(vec![
                StoreValue::Link("Film:1".into()),
                StoreValue::Scalar(Value::Null)
            ])
        );
        store.write("Film:1", "title", json!("A New Hope").into());

        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(
            json,
            json!({
                "Query": {
                    "film": { "__ref": "Film:1" },
                    "films": [{ "__ref": "Film:1" }, null]
                },
                "Film:1": { "title": "A New Hope" }
            })
        );
        assert_eq!(store.to_json(), json);

        let restored: Store = serde_json::from_value(json).unwrap();
        assert_eq!(restored, store);
    }
}
