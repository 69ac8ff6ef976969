use super::{field_key, Store, StoreValue};
use crate::KeyOptions;
use micrograph::{
    query::{should_include, Selection, SelectionSet},
    Query, Variables
};
use serde_json::{Map, Value};

struct Normalizer<'a> {
    query: &'a Query,
    variables: &'a Variables,
    keys: &'a KeyOptions,
    store: Store
}

/// Split `data`, the response to `query`, into flat records keyed by entity.
///
/// Objects that can be identified (see [`KeyOptions`](struct.KeyOptions.html)) are stored under
/// their own key, everything else under the key of its parent plus the field key. The result is
/// a fragment meant to be [`merge`](fn.merge.html)d into a store.
pub fn normalize(query: &Query, variables: &Variables, data: &Value, keys: &KeyOptions) -> Store {
    let variables = query.with_defaults(variables);
    let mut normalizer = Normalizer {
        query,
        variables: &variables,
        keys,
        store: Store::new()
    };

    match data {
        Value::Object(data) => {
            let root = query.operation.root_typename();
            normalizer.write_selection_set(root, &query.selection_set, data);
        }
        _ => tracing::debug!("response data is not an object, nothing to normalize")
    }

    normalizer.store
}

impl<'a> Normalizer<'a> {
    fn write_selection_set(
        &mut self,
        entity: &str,
        selection_set: &SelectionSet,
        object: &Map<String, Value>
    ) {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    if !should_include(&field.directives, self.variables) {
                        continue;
                    }
                    let value = match object.get(field.response_key()) {
                        Some(value) => value,
                        None => {
                            tracing::debug!(
                                entity,
                                field = field.response_key(),
                                "field missing from response, not writing it"
                            );
                            continue;
                        }
                    };
                    let key = field_key(field, self.variables);
                    let path = format!("{}.{}", entity, key);
                    let value = self.normalize_value(&path, &field.selection_set, value);
                    self.store.write(entity, key, value);
                }
                Selection::InlineFragment(fragment) => {
                    if should_include(&fragment.directives, self.variables) {
                        self.write_selection_set(entity, &fragment.selection_set, object);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !should_include(&spread.directives, self.variables) {
                        continue;
                    }
                    let query = self.query;
                    match query.fragment(&spread.fragment_name) {
                        Some(fragment) => {
                            self.write_selection_set(entity, &fragment.selection_set, object)
                        }
                        None => tracing::debug!(
                            fragment = spread.fragment_name.as_str(),
                            "unknown fragment, skipping it"
                        )
                    }
                }
            }
        }
    }

    /// `path` is the synthetic key used for objects that can't be identified.
    fn normalize_value(
        &mut self,
        path: &str,
        selection_set: &SelectionSet,
        value: &Value
    ) -> StoreValue {
        if selection_set.is_empty() {
            return StoreValue::Scalar(value.clone());
        }

        match value {
            Value::Object(object) => {
                let key = self
                    .keys
                    .key_of_entity(object)
                    .unwrap_or_else(|| path.to_string());
                self.write_selection_set(&key, selection_set, object);
                StoreValue::Link(key)
            }
            Value::Array(items) => {
                let items = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let path = format!("{}.{}", path, i);
                        self.normalize_value(&path, selection_set, item)
                    })
                    .collect();
                StoreValue::list(items)
            }
            other => StoreValue::Scalar(other.clone())
        }
    }
}
