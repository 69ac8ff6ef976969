//! An owned, runtime representation of a GraphQL operation.
//!
//! Documents are parsed with `graphql-parser` and converted into the types in this module,
//! which only keep what the caches and the client need: the operation, its variable
//! definitions, the selection tree and the fragment definitions it references.

use crate::{QueryError, Variables};
use graphql_parser::query as ast;
use serde_json::Value;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr
};

mod display;

pub const TYPENAME: &str = "__typename";

/// The kind of operation a query document describes.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription
}

impl OperationType {
    /// The name of the root type this operation is executed against.
    /// This doubles as the entity key of the root record in the normalized cache.
    pub fn root_typename(&self) -> &'static str {
        match self {
            OperationType::Query => "Query",
            OperationType::Mutation => "Mutation",
            OperationType::Subscription => "Subscription"
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Query => write!(f, "query"),
            OperationType::Mutation => write!(f, "mutation"),
            OperationType::Subscription => write!(f, "subscription")
        }
    }
}

/// A GraphQL input literal as it appears in an argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Variable(String),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<InputValue>),
    Object(BTreeMap<String, InputValue>)
}

impl InputValue {
    /// Resolve this literal into JSON, substituting variables. Variables that aren't set
    /// resolve to `null`.
    pub fn resolve(&self, variables: &Variables) -> Value {
        match self {
            InputValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
            InputValue::Int(i) => Value::from(*i),
            InputValue::Float(f) => Value::from(*f),
            InputValue::String(s) | InputValue::Enum(s) => Value::String(s.clone()),
            InputValue::Boolean(b) => Value::Bool(*b),
            InputValue::Null => Value::Null,
            InputValue::List(items) => {
                Value::Array(items.iter().map(|item| item.resolve(variables)).collect())
            }
            InputValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.resolve(variables)))
                    .collect()
            )
        }
    }
}

impl From<&ast::Value> for InputValue {
    fn from(value: &ast::Value) -> Self {
        match value {
            ast::Value::Variable(name) => InputValue::Variable(name.clone()),
            // integers that don't fit an i64 have no faithful JSON form
            ast::Value::Int(number) => number.as_i64().map_or(InputValue::Null, InputValue::Int),
            ast::Value::Float(f) => InputValue::Float(*f),
            ast::Value::String(s) => InputValue::String(s.clone()),
            ast::Value::Boolean(b) => InputValue::Boolean(*b),
            ast::Value::Null => InputValue::Null,
            ast::Value::Enum(name) => InputValue::Enum(name.clone()),
            ast::Value::List(items) => InputValue::List(items.iter().map(Into::into).collect()),
            ast::Value::Object(fields) => InputValue::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.into()))
                    .collect()
            )
        }
    }
}

/// A directive attached to a selection, such as `@include(if: $flag)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<(String, InputValue)>
}

impl From<&ast::Directive> for Directive {
    fn from(directive: &ast::Directive) -> Self {
        Directive {
            name: directive.name.clone(),
            arguments: convert_arguments(&directive.arguments)
        }
    }
}

/// Evaluate `@skip` and `@include` against the variables.
pub fn should_include(directives: &[Directive], variables: &Variables) -> bool {
    directives.iter().all(|directive| {
        let condition = directive
            .arguments
            .iter()
            .find(|(name, _)| name == "if")
            .map(|(_, value)| value.resolve(variables) == Value::Bool(true));
        match (directive.name.as_str(), condition) {
            ("skip", Some(skip)) => !skip,
            ("include", Some(include)) => include,
            _ => true
        }
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<(String, InputValue)>,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet
}

impl Field {
    /// A field without alias, arguments or sub-selection.
    pub fn leaf<N: Into<String>>(name: N) -> Self {
        Field {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            directives: Vec::new(),
            selection_set: SelectionSet::default()
        }
    }

    /// The key this field is returned under in the response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// The arguments resolved against `variables`, or `None` if the field takes none.
    pub fn resolve_arguments(&self, variables: &Variables) -> Option<Variables> {
        if self.arguments.is_empty() {
            return None;
        }
        Some(
            self.arguments
                .iter()
                .map(|(name, value)| (name.clone(), value.resolve(variables)))
                .collect()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<String>,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread {
    pub fragment_name: String,
    pub directives: Vec<Directive>
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    InlineFragment(InlineFragment),
    FragmentSpread(FragmentSpread)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionSet {
    pub items: Vec<Selection>
}

impl SelectionSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a field is returned under `response_key` directly in this set.
    pub fn has_field(&self, response_key: &str) -> bool {
        self.items.iter().any(|selection| match selection {
            Selection::Field(field) => field.response_key() == response_key,
            _ => false
        })
    }

    pub fn has_inline_fragment(&self) -> bool {
        self.items
            .iter()
            .any(|selection| matches!(selection, Selection::InlineFragment(_)))
    }

    /// The names of every fragment spread in this set, including nested ones.
    fn collect_spreads<'a>(&'a self, spreads: &mut Vec<&'a str>) {
        for selection in &self.items {
            match selection {
                Selection::Field(field) => field.selection_set.collect_spreads(spreads),
                Selection::InlineFragment(fragment) => {
                    fragment.selection_set.collect_spreads(spreads)
                }
                Selection::FragmentSpread(spread) => spreads.push(&spread.fragment_name)
            }
        }
    }
}

impl From<&ast::SelectionSet> for SelectionSet {
    fn from(selection_set: &ast::SelectionSet) -> Self {
        let items = selection_set
            .items
            .iter()
            .map(|selection| match selection {
                ast::Selection::Field(field) => Selection::Field(Field {
                    alias: field.alias.clone(),
                    name: field.name.clone(),
                    arguments: convert_arguments(&field.arguments),
                    directives: field.directives.iter().map(Into::into).collect(),
                    selection_set: (&field.selection_set).into()
                }),
                ast::Selection::InlineFragment(fragment) => {
                    Selection::InlineFragment(InlineFragment {
                        type_condition: fragment
                            .type_condition
                            .as_ref()
                            .map(|ast::TypeCondition::On(on)| on.clone()),
                        directives: fragment.directives.iter().map(Into::into).collect(),
                        selection_set: (&fragment.selection_set).into()
                    })
                }
                ast::Selection::FragmentSpread(spread) => {
                    Selection::FragmentSpread(FragmentSpread {
                        fragment_name: spread.fragment_name.clone(),
                        directives: spread.directives.iter().map(Into::into).collect()
                    })
                }
            })
            .collect();
        SelectionSet { items }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDefinition {
    pub name: String,
    pub type_condition: String,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    /// The printed GraphQL type, e.g. `[ID!]!`
    pub var_type: String,
    pub default_value: Option<InputValue>
}

/// A parsed GraphQL operation along with the fragments defined next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub operation: OperationType,
    pub name: Option<String>,
    pub variable_definitions: Vec<VariableDefinition>,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet,
    pub fragments: BTreeMap<String, FragmentDefinition>
}

impl Query {
    /// Parse a query document. The first operation in the document is used.
    pub fn parse(source: &str) -> Result<Self, QueryError> {
        let document =
            graphql_parser::parse_query(source).map_err(|e| QueryError::Parse(e.to_string()))?;

        let mut operation = None;
        let mut fragments = BTreeMap::new();
        for definition in &document.definitions {
            match definition {
                ast::Definition::Operation(op) => {
                    if operation.is_none() {
                        operation = Some(op);
                    }
                }
                ast::Definition::Fragment(fragment) => {
                    let ast::TypeCondition::On(ref on) = fragment.type_condition;
                    fragments.insert(
                        fragment.name.clone(),
                        FragmentDefinition {
                            name: fragment.name.clone(),
                            type_condition: on.clone(),
                            directives: fragment.directives.iter().map(Into::into).collect(),
                            selection_set: (&fragment.selection_set).into()
                        }
                    );
                }
            }
        }

        let operation = operation.ok_or(QueryError::UnsupportedDocument)?;
        check_fragment_cycles(&fragments)?;
        let (operation, name, variable_definitions, directives, selection_set) = match operation {
            ast::OperationDefinition::SelectionSet(set) => {
                (OperationType::Query, None, &[][..], &[][..], set)
            }
            ast::OperationDefinition::Query(q) => (
                OperationType::Query,
                q.name.clone(),
                &q.variable_definitions[..],
                &q.directives[..],
                &q.selection_set
            ),
            ast::OperationDefinition::Mutation(m) => (
                OperationType::Mutation,
                m.name.clone(),
                &m.variable_definitions[..],
                &m.directives[..],
                &m.selection_set
            ),
            ast::OperationDefinition::Subscription(s) => (
                OperationType::Subscription,
                s.name.clone(),
                &s.variable_definitions[..],
                &s.directives[..],
                &s.selection_set
            )
        };

        Ok(Query {
            operation,
            name,
            variable_definitions: variable_definitions
                .iter()
                .map(|definition| VariableDefinition {
                    name: definition.name.clone(),
                    var_type: display::print_type(&definition.var_type),
                    default_value: definition.default_value.as_ref().map(Into::into)
                })
                .collect(),
            directives: directives.iter().map(Into::into).collect(),
            selection_set: selection_set.into(),
            fragments
        })
    }

    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.fragments.get(name)
    }

    /// Fill in the declared default values for any variables that weren't passed.
    pub fn with_defaults(&self, variables: &Variables) -> Variables {
        let mut variables = variables.clone();
        for definition in &self.variable_definitions {
            if let Some(ref default) = definition.default_value {
                if !variables.contains_key(&definition.name) {
                    variables.insert(definition.name.clone(), default.resolve(&Variables::new()));
                }
            }
        }
        variables
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Query::parse(s)
    }
}

/// Fail if a fragment spreads itself, directly or through other fragments. Walking such a
/// fragment would never end.
fn check_fragment_cycles(
    fragments: &BTreeMap<String, FragmentDefinition>
) -> Result<(), QueryError> {
    fn visit<'a>(
        name: &'a str,
        fragments: &'a BTreeMap<String, FragmentDefinition>,
        path: &mut Vec<&'a str>,
        checked: &mut BTreeSet<&'a str>
    ) -> Result<(), QueryError> {
        if checked.contains(name) {
            return Ok(());
        }
        if path.contains(&name) {
            return Err(QueryError::FragmentCycle(name.to_string()));
        }
        let fragment = match fragments.get(name) {
            Some(fragment) => fragment,
            None => return Ok(())
        };

        path.push(name);
        let mut spreads = Vec::new();
        fragment.selection_set.collect_spreads(&mut spreads);
        for spread in spreads {
            visit(spread, fragments, path, checked)?;
        }
        path.pop();
        checked.insert(name);
        Ok(())
    }

    let mut checked = BTreeSet::new();
    for name in fragments.keys() {
        visit(name, fragments, &mut Vec::new(), &mut checked)?;
    }
    Ok(())
}

fn convert_arguments(arguments: &[(String, ast::Value)]) -> Vec<(String, InputValue)> {
    arguments
        .iter()
        .map(|(name, value)| (name.clone(), value.into()))
        .collect()
}
