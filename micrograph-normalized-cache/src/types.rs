use crate::HashMap;
use micrograph::query::TYPENAME;
use serde_json::{Map, Value};

/// The root type names. Records for these are keyed by the type name alone.
pub const ROOT_TYPES: [&str; 3] = ["Query", "Mutation", "Subscription"];

pub fn is_root(typename: &str) -> bool {
    ROOT_TYPES.contains(&typename)
}

/// Options to pass to the normalized cache.
#[derive(Debug, Clone)]
pub struct NormalizedCacheOptions {
    /// A `HashMap` of typenames to unique ID keys.
    /// The keys are the names of the fields, not the IDs themselves.
    /// So if your `User` has a unique ID called `ident`, you should
    /// set `"User" => "ident"`.
    /// The default ID keys are `id` and `_id`, so those don't need to be mapped.
    pub custom_keys: HashMap<String, String>,
    /// Subscriptions that read fewer slots than this on their last run are recomputed on every
    /// write, whether or not the write touched them. Defaults to 2.
    pub eager_refresh_threshold: usize
}

impl Default for NormalizedCacheOptions {
    fn default() -> Self {
        NormalizedCacheOptions {
            custom_keys: HashMap::default(),
            eager_refresh_threshold: 2
        }
    }
}

impl NormalizedCacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identify entities of type `typename` by the field `key` instead of `id`/`_id`.
    pub fn with_custom_key<T, K>(mut self, typename: T, key: K) -> Self
    where
        T: Into<String>,
        K: Into<String>
    {
        self.custom_keys.insert(typename.into(), key.into());
        self
    }

    pub fn with_eager_refresh_threshold(mut self, threshold: usize) -> Self {
        self.eager_refresh_threshold = threshold;
        self
    }

    pub(crate) fn key_options(&self) -> KeyOptions {
        KeyOptions {
            custom_keys: self.custom_keys.clone()
        }
    }
}

/// Decides which key an object is stored under.
#[derive(Debug, Clone, Default)]
pub struct KeyOptions {
    pub custom_keys: HashMap<String, String>
}

impl KeyOptions {
    /// The entity key for `entity`, or `None` if it can't be identified.
    ///
    /// ```
    /// # use micrograph_normalized_cache::KeyOptions;
    /// # use serde_json::json;
    /// let keys = KeyOptions::default();
    /// let film = json!({ "__typename": "Film", "id": "abc" });
    /// assert_eq!(keys.key_of_entity(film.as_object().unwrap()), Some("Film:abc".to_string()));
    /// ```
    pub fn key_of_entity(&self, entity: &Map<String, Value>) -> Option<String> {
        let typename = entity.get(TYPENAME).and_then(Value::as_str)?;
        if is_root(typename) {
            return Some(typename.to_string());
        }

        let id = match self.custom_keys.get(typename) {
            Some(custom_key) => entity.get(custom_key),
            None => entity.get("id").or_else(|| entity.get("_id"))
        };
        let id = match id? {
            Value::String(id) => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return None
        };

        let mut key = String::with_capacity(typename.len() + id.len() + 1);
        key.push_str(typename);
        key.push(':');
        key.push_str(&id);
        Some(key)
    }
}
