use super::{field_key, FieldRef, Footprint, Store, StoreValue};
use micrograph::{
    query::{should_include, Selection, SelectionSet, TYPENAME},
    Query, Variables
};
use serde_json::{Map, Value};

/// The result of reading a query from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct Denormalized {
    /// The data for the query, or `None` if any part of it is missing.
    pub data: Option<Value>,
    /// Every slot that was looked up, including the one that missed.
    pub footprint: Footprint
}

struct Denormalizer<'a> {
    query: &'a Query,
    variables: &'a Variables,
    store: &'a Store,
    footprint: Footprint
}

/// Rebuild the response to `query` from `store`.
///
/// There are no partial results: if any field is missing, `data` is `None`. The footprint is
/// filled in either way so a subscription can wait for the missing data.
pub fn denormalize(query: &Query, variables: &Variables, store: &Store) -> Denormalized {
    let variables = query.with_defaults(variables);
    let mut denormalizer = Denormalizer {
        query,
        variables: &variables,
        store,
        footprint: Footprint::default()
    };

    let root = query.operation.root_typename();
    let data = denormalizer
        .read_selection_set(root, &query.selection_set)
        .map(Value::Object);

    Denormalized {
        data,
        footprint: denormalizer.footprint
    }
}

impl<'a> Denormalizer<'a> {
    fn read_selection_set(
        &mut self,
        entity: &str,
        selection_set: &SelectionSet
    ) -> Option<Map<String, Value>> {
        let mut object = Map::new();
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    if !should_include(&field.directives, self.variables) {
                        continue;
                    }
                    let key = field_key(field, self.variables);
                    self.footprint.insert(FieldRef::new(entity, key.as_str()));
                    let store = self.store;
                    let value = self.read_value(store.get(entity, &key)?, &field.selection_set)?;
                    insert_merged(&mut object, field.response_key().to_string(), value);
                }
                Selection::InlineFragment(fragment) => {
                    if should_include(&fragment.directives, self.variables) {
                        self.read_fragment(
                            entity,
                            fragment.type_condition.as_deref(),
                            &fragment.selection_set,
                            &mut object
                        )?;
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !should_include(&spread.directives, self.variables) {
                        continue;
                    }
                    let query = self.query;
                    match query.fragment(&spread.fragment_name) {
                        Some(fragment) => self.read_fragment(
                            entity,
                            Some(&fragment.type_condition),
                            &fragment.selection_set,
                            &mut object
                        )?,
                        None => tracing::debug!(
                            fragment = spread.fragment_name.as_str(),
                            "unknown fragment, skipping it"
                        )
                    }
                }
            }
        }
        Some(object)
    }

    /// A fragment that certainly applies must be complete. One whose type condition doesn't
    /// match the stored typename (an interface or union) is only used if all of its fields are
    /// there.
    fn read_fragment(
        &mut self,
        entity: &str,
        type_condition: Option<&str>,
        selection_set: &SelectionSet,
        object: &mut Map<String, Value>
    ) -> Option<()> {
        if self.is_strict(entity, type_condition) {
            let fields = self.read_selection_set(entity, selection_set)?;
            merge_objects(object, fields);
        } else if let Some(fields) = self.read_selection_set(entity, selection_set) {
            merge_objects(object, fields);
        }
        Some(())
    }

    fn is_strict(&mut self, entity: &str, type_condition: Option<&str>) -> bool {
        let type_condition = match type_condition {
            Some(type_condition) => type_condition,
            None => return true
        };
        self.footprint.insert(FieldRef::new(entity, TYPENAME));
        match self.store.get(entity, TYPENAME) {
            Some(StoreValue::Scalar(Value::String(typename))) => typename == type_condition,
            _ => true
        }
    }

    fn read_value(&mut self, value: &StoreValue, selection_set: &SelectionSet) -> Option<Value> {
        match value {
            StoreValue::Scalar(value) => Some(value.clone()),
            StoreValue::Link(_) if selection_set.is_empty() => None,
            StoreValue::Link(key) => {
                // read even when the record is missing so its first slot lands in the footprint
                let object = self.read_selection_set(key, selection_set);
                if !self.store.contains(key) {
                    return None;
                }
                object.map(Value::Object)
            }
            StoreValue::List(items) => items
                .iter()
                .map(|item| self.read_value(item, selection_set))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        }
    }
}

/// Insert a field, merging it into an object or list that's already there. The same field can
/// be selected more than once with different sub-selections, e.g. directly and in a fragment.
fn insert_merged(object: &mut Map<String, Value>, key: String, value: Value) {
    match object.get_mut(&key) {
        Some(existing) => merge_values(existing, value),
        None => {
            object.insert(key, value);
        }
    }
}

fn merge_objects(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        insert_merged(target, key, value);
    }
}

fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_objects(target, source),
        (Value::Array(target), Value::Array(source)) if target.len() == source.len() => {
            for (target, source) in target.iter_mut().zip(source) {
                merge_values(target, source);
            }
        }
        (target, source) => *target = source
    }
}
