//! Helpers for composing query documents out of reusable fragments.

use crate::QueryError;
use graphql_parser::query::Definition;

/// A named fragment definition that can be spread into queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    definition: String,
    name: String
}

impl Fragment {
    /// Parse a fragment definition like `fragment FilmFields on Film { title }`.
    ///
    /// Fails with [`QueryError::NoFragmentName`](../enum.QueryError.html) if the definition
    /// isn't a named fragment.
    pub fn new(definition: &str) -> Result<Self, QueryError> {
        let definition = definition.trim();
        let document =
            graphql_parser::parse_query(definition).map_err(|_| QueryError::NoFragmentName)?;
        let name = document
            .definitions
            .iter()
            .find_map(|definition| match definition {
                Definition::Fragment(fragment) => Some(fragment.name.clone()),
                _ => None
            })
            .ok_or(QueryError::NoFragmentName)?;

        Ok(Fragment {
            definition: definition.to_string(),
            name
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// The spread to use inside a selection set, e.g. `...FilmFields`.
    pub fn spread(&self) -> String {
        format!("...{}", self.name)
    }
}

/// Append the definitions of `fragments` to `query`.
///
/// ```
/// # use micrograph::gql::{gql, Fragment};
/// let fragment = Fragment::new("fragment TestFrag on Film { title }").unwrap();
/// let query = gql(
///     &format!("query {{ film {{ id {} }} }}", fragment.spread()),
///     &[&fragment]
/// );
/// assert_eq!(query, "query { film { id ...TestFrag } }\nfragment TestFrag on Film { title }");
/// ```
pub fn gql(query: &str, fragments: &[&Fragment]) -> String {
    let definitions = fragments
        .iter()
        .map(|fragment| fragment.definition.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let definitions = definitions.trim();
    let query = query.trim();

    if definitions.is_empty() {
        query.to_string()
    } else {
        format!("{}\n{}", query, definitions)
    }
}
