use super::{ChangedKeys, FieldRef, Store};

/// Overlay `fragment` onto `store` one field at a time. Fields the fragment doesn't mention are
/// left alone. Returns every slot that was created or got a different value.
pub fn merge(store: &mut Store, fragment: Store) -> ChangedKeys {
    let mut changed = ChangedKeys::default();
    for (entity, fields) in fragment.records {
        let record = store.records.entry(entity.clone()).or_default();
        for (field, value) in fields {
            if record.get(&field) == Some(&value) {
                continue;
            }
            changed.insert(FieldRef::new(entity.as_str(), field.as_str()));
            record.insert(field, value);
        }
    }
    changed
}
