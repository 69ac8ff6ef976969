use micrograph::{
    query::{Field, Selection, SelectionSet, TYPENAME},
    Query
};

/// Fields whose objects are connection plumbing rather than entities.
const CONNECTION_FIELDS: [&str; 2] = ["edges", "pageInfo"];

/// Add `__typename` to every selection set that needs it to identify its objects.
///
/// The operation's own selection set is left alone, as are sets containing an inline fragment,
/// sets containing an `edges` field, and the sets of fields named `edges` or `pageInfo`.
/// Running it twice gives the same query.
///
/// ```
/// # use micrograph::Query;
/// # use micrograph_normalized_cache::prepare_query;
/// let query = Query::parse("{ film { title } }").unwrap();
/// let prepared = prepare_query(&query);
/// assert_eq!(prepared.to_string(), "query {\n  film {\n    __typename\n    title\n  }\n}");
/// ```
pub fn prepare_query(query: &Query) -> Query {
    let mut query = query.clone();
    annotate_children(&mut query.selection_set);
    for fragment in query.fragments.values_mut() {
        annotate(&mut fragment.selection_set, false);
    }
    query
}

fn annotate(selection_set: &mut SelectionSet, connection_field: bool) {
    let exempt = connection_field
        || selection_set.has_inline_fragment()
        || selection_set.has_field("edges");
    if !exempt && !selection_set.has_field(TYPENAME) {
        selection_set
            .items
            .insert(0, Selection::Field(Field::leaf(TYPENAME)));
    }
    annotate_children(selection_set);
}

fn annotate_children(selection_set: &mut SelectionSet) {
    for selection in &mut selection_set.items {
        match selection {
            Selection::Field(Field {
                name,
                selection_set,
                ..
            }) => {
                if !selection_set.is_empty() {
                    annotate(selection_set, CONNECTION_FIELDS.contains(&name.as_str()));
                }
            }
            Selection::InlineFragment(fragment) => annotate(&mut fragment.selection_set, false),
            Selection::FragmentSpread(_) => {}
        }
    }
}
