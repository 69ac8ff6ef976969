//! A lightweight GraphQL client with pluggable caching.
//!
//! # Getting Started
//!
//! ```no_run
//! # tokio_test::block_on(async {
//! use micrograph::{Client, QueryOptions, QueryResult};
//! use serde_json::{json, Value};
//!
//! let client = Client::builder("https://swapi-graphql.netlify.app/.netlify/functions/index").build();
//!
//! let query = r#"
//!     query TestQuery($id: ID) {
//!         film(filmID: $id) {
//!             title
//!         }
//!     }
//! "#;
//! let result: QueryResult<Value> = client
//!     .query(query, QueryOptions::with_variables(json!({ "id": 1 })))
//!     .await
//!     .unwrap();
//! assert!(result.data.is_some());
//! # });
//! ```
//!
//! # Caches
//!
//! Every client has a [`Cache`](cache/trait.Cache.html). Queries are answered from the cache if
//! possible, and results from the network are written back into it.
//!
//! The default [`MemoryCache`](cache/struct.MemoryCache.html) is a very basic, un-normalized
//! cache keyed by the query and its variables. For a normalized cache that shares entities
//! between queries and can notify subscribers of changes, see the
//! `micrograph-normalized-cache` crate.
//!
//! # Deduplication
//!
//! Identical queries issued while one is already in flight wait for the in-flight request
//! instead of firing off another one.
//!
//! # Server-side rendering
//!
//! With `with_ssr(true)` the client keeps track of every request, and
//! [`Client::resolve_queries`](client/struct.Client.html#method.resolve_queries) waits for all
//! of them. Combined with `Cache::stringify` this lets a server embed the cache in its output
//! for the browser to `restore`.
//!
//! # Features
//!
//! * `default-transport` **(default)** - Include the `reqwest` based `FetchTransport` and use
//! it when no other transport is configured.

#[macro_use]
extern crate serde;
#[macro_use]
extern crate async_trait;

use std::{collections::HashMap, fmt, fmt::Display};

pub mod cache;
pub mod client;
mod error;
pub mod gql;
pub mod query;
pub mod transport;
mod types;
pub mod utils;

pub use cache::{Cache, MemoryCache};
pub use client::{Client, ClientBuilder, ClientSubscription, ToQuery};
pub use error::{CacheError, KeyError, QueryError, QUERY_KEY_ERROR};
pub use query::{OperationType, Query};
#[cfg(feature = "default-transport")]
pub use transport::FetchTransport;
pub use transport::Transport;
pub use types::{to_variables, HeaderFn, HeaderPair, QueryOptions, QueryResult, Variables};

/// The form in which queries are sent over HTTP in most implementations.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QueryBody {
    /// The GraphQL query, as a string.
    pub query: String,
    /// The values for the variables declared in the query.
    pub variables: Variables,
    /// The GraphQL operation name, if the operation is named.
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>
}

/// The generic shape taken by the responses of GraphQL APIs.
///
/// [GraphQL response format](https://github.com/facebook/graphql/blob/master/spec/Section%207%20--%20Response.md)
///
/// ```
/// # use serde_json::json;
/// # use serde::Deserialize;
/// #
/// # #[derive(Debug, Deserialize, PartialEq, Clone)]
/// # struct Film {
/// #     title: String,
/// # }
/// #
/// # #[derive(Debug, Deserialize, PartialEq, Clone)]
/// # struct ResponseData {
/// #     film: Film,
/// # }
/// #
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use micrograph::Response;
///
/// let body: Response<ResponseData> = serde_json::from_value(json!({
///     "data": {
///         "film": { "title": "A New Hope" },
///     },
///     "errors": [],
/// }))?;
///
/// let expected: Response<ResponseData> = Response {
///     data: Some(ResponseData {
///         film: Film { title: "A New Hope".to_owned() },
///     }),
///     errors: Some(vec![])
/// };
///
/// assert_eq!(body, expected);
///
/// #     Ok(())
/// # }
/// ```
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Response<Data> {
    /// The absent, partial or complete response data.
    pub data: Option<Data>,
    /// The top-level errors returned by the server.
    pub errors: Option<Vec<Error>>
}

/// An element in the top-level `errors` array of a response body.
///
/// [GraphQL response format](https://github.com/facebook/graphql/blob/master/spec/Section%207%20--%20Response.md)
///
/// ```
/// # use serde_json::json;
/// # use serde::Deserialize;
/// #
/// # #[derive(Debug, Deserialize, PartialEq, Clone)]
/// # struct ResponseData {
/// #     something: i32
/// # }
/// #
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use micrograph::*;
///
/// let body: Response<ResponseData> = serde_json::from_value(json!({
///     "data": null,
///     "errors": [
///         {
///             "message": "The server crashed. Sorry.",
///             "locations": [{ "line": 1, "column": 1 }]
///         },
///         {
///             "message": "Seismic activity detected",
///             "path": ["underground", 20]
///         },
///      ],
/// }))?;
///
/// let expected: Response<ResponseData> = Response {
///     data: None,
///     errors: Some(vec![
///         Error {
///             message: "The server crashed. Sorry.".to_owned(),
///             locations: Some(vec![
///                 Location {
///                     line: 1,
///                     column: 1,
///                 }
///             ]),
///             path: None,
///             extensions: None,
///         },
///         Error {
///             message: "Seismic activity detected".to_owned(),
///             locations: None,
///             path: Some(vec![
///                 PathFragment::Key("underground".into()),
///                 PathFragment::Index(20),
///             ]),
///             extensions: None,
///         },
///     ])
/// };
///
/// assert_eq!(body, expected);
///
/// #     Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Error {
    /// The human-readable error message. This is the only required field.
    pub message: String,
    /// Which locations in the query the error applies to.
    pub locations: Option<Vec<Location>>,
    /// Which path in the query the error applies to, e.g. `["users", 0, "email"]`.
    pub path: Option<Vec<PathFragment>>,
    /// Additional errors. Their exact format is defined by the server.
    pub extensions: Option<HashMap<String, serde_json::Value>>
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Use `/` as a separator like JSON Pointer.
        let path = self
            .path
            .as_ref()
            .map(|fragments| {
                fragments
                    .iter()
                    .map(|fragment| fragment.to_string())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_else(|| "<query>".to_string());

        // Get the location of the error. We'll use just the first location for this.
        let loc = self
            .locations
            .as_ref()
            .and_then(|locations| locations.iter().next())
            .cloned()
            .unwrap_or_default();

        write!(f, "{}:{}:{}: {}", path, loc.line, loc.column, self.message)
    }
}

/// Part of a path in a query. It can be an object key or an array index. See [Error](./struct.Error.html).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PathFragment {
    /// A key inside an object
    Key(String),
    /// An index inside an array
    Index(i32)
}

/// Represents a location inside a query string. Used in errors. See [Error](./struct.Error.html).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// The line number in the query string where the error originated (starting from 1).
    pub line: i32,
    /// The column number in the query string where the error originated (starting from 1).
    pub column: i32
}

impl Display for PathFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PathFragment::Key(ref key) => write!(f, "{}", key),
            PathFragment::Index(ref idx) => write!(f, "{}", idx)
        }
    }
}
