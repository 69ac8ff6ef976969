use super::{
    Directive, Field, FragmentDefinition, InlineFragment, InputValue, Query, Selection,
    SelectionSet
};
use graphql_parser::query::Type;
use std::fmt::{self, Write};

pub(super) fn print_type(ty: &Type) -> String {
    match ty {
        Type::NamedType(name) => name.clone(),
        Type::ListType(inner) => format!("[{}]", print_type(inner)),
        Type::NonNullType(inner) => format!("{}!", print_type(inner))
    }
}

fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    Ok(())
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?
        }
    }
    f.write_char('"')
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Variable(name) => write!(f, "${}", name),
            InputValue::Int(i) => write!(f, "{}", i),
            InputValue::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{:.1}", v),
            InputValue::Float(v) => write!(f, "{}", v),
            InputValue::String(s) => write_string(f, s),
            InputValue::Boolean(b) => write!(f, "{}", b),
            InputValue::Null => f.write_str("null"),
            InputValue::Enum(name) => f.write_str(name),
            InputValue::List(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_char(']')
            }
            InputValue::Object(fields) => {
                f.write_char('{')?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_char('}')
            }
        }
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[(String, InputValue)]) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }
    f.write_char('(')?;
    for (i, (name, value)) in arguments.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {}", name, value)?;
    }
    f.write_char(')')
}

fn write_directives(f: &mut fmt::Formatter<'_>, directives: &[Directive]) -> fmt::Result {
    for directive in directives {
        write!(f, " @{}", directive.name)?;
        write_arguments(f, &directive.arguments)?;
    }
    Ok(())
}

fn write_selection_set(
    f: &mut fmt::Formatter<'_>,
    selection_set: &SelectionSet,
    depth: usize
) -> fmt::Result {
    f.write_str("{\n")?;
    for selection in &selection_set.items {
        write_indent(f, depth + 1)?;
        match selection {
            Selection::Field(field) => write_field(f, field, depth + 1)?,
            Selection::InlineFragment(fragment) => write_inline_fragment(f, fragment, depth + 1)?,
            Selection::FragmentSpread(spread) => {
                write!(f, "...{}", spread.fragment_name)?;
                write_directives(f, &spread.directives)?;
            }
        }
        f.write_char('\n')?;
    }
    write_indent(f, depth)?;
    f.write_char('}')
}

fn write_field(f: &mut fmt::Formatter<'_>, field: &Field, depth: usize) -> fmt::Result {
    if let Some(ref alias) = field.alias {
        write!(f, "{}: ", alias)?;
    }
    f.write_str(&field.name)?;
    write_arguments(f, &field.arguments)?;
    write_directives(f, &field.directives)?;
    if !field.selection_set.is_empty() {
        f.write_char(' ')?;
        write_selection_set(f, &field.selection_set, depth)?;
    }
    Ok(())
}

fn write_inline_fragment(
    f: &mut fmt::Formatter<'_>,
    fragment: &InlineFragment,
    depth: usize
) -> fmt::Result {
    f.write_str("...")?;
    if let Some(ref on) = fragment.type_condition {
        write!(f, " on {}", on)?;
    }
    write_directives(f, &fragment.directives)?;
    f.write_char(' ')?;
    write_selection_set(f, &fragment.selection_set, depth)
}

impl fmt::Display for FragmentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fragment {} on {}", self.name, self.type_condition)?;
        write_directives(f, &self.directives)?;
        f.write_char(' ')?;
        write_selection_set(f, &self.selection_set, 0)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation)?;
        if let Some(ref name) = self.name {
            write!(f, " {}", name)?;
        }
        if !self.variable_definitions.is_empty() {
            f.write_char('(')?;
            for (i, definition) in self.variable_definitions.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "${}: {}", definition.name, definition.var_type)?;
                if let Some(ref default) = definition.default_value {
                    write!(f, " = {}", default)?;
                }
            }
            f.write_char(')')?;
        }
        write_directives(f, &self.directives)?;
        f.write_char(' ')?;
        write_selection_set(f, &self.selection_set, 0)?;

        for fragment in self.fragments.values() {
            write!(f, "\n\n{}", fragment)?;
        }
        Ok(())
    }
}
