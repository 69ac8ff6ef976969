mod data;
mod denormalize;
mod merge;
mod normalize;

pub use data::{ChangedKeys, EntityKey, FieldKey, FieldRef, Footprint, Record, Store, StoreValue};
pub use denormalize::{denormalize, Denormalized};
pub use merge::merge;
pub use normalize::normalize;

use micrograph::{query::Field, utils::sort_keys, Variables};
use serde_json::Value;

/// The key a field is stored under: its name, followed by the stable key of its resolved
/// arguments if it takes any. `film(id: $id)` with `{ "id": "abc" }` is stored as
/// `film({"id":"abc"})`.
pub fn field_key(field: &Field, variables: &Variables) -> FieldKey {
    match field.resolve_arguments(variables) {
        // `Value` always encodes, so this is `stable_key` without the error path.
        Some(arguments) => format!("{}({})", field.name, sort_keys(Value::Object(arguments))),
        None => field.name.clone()
    }
}
