//! Turns whatever a query returns into display lines.
//!
//! Every value is first classified into a [`Capability`] and rendered
//! according to that tag alone:
//!
//! | Capability       | Rendering                                     |
//! |------------------|-----------------------------------------------|
//! | `Absent`         | `null`                                        |
//! | `Scalar`         | natural form                                  |
//! | `TextSequence`   | as is at the top level, `[a, b]` when nested  |
//! | `OtherSequence`  | one line per element / `[a, b]` when nested   |
//! | `BuiltinDisplay` | `{ A = a, B = b }` using each member's text   |
//! | `CustomDisplay`  | output of the record type's `display` method  |
//! | `Structured`     | `{ A = a, B = b }`, members formatted again   |

use crate::{
    evaluator::{EvalError, Evaluator},
    value::{Record, RecordKind, Value},
};

/// Text emitted for an absent value.
pub const NULL_TEXT: &str = "null";

/// Deepest nesting the formatter descends into.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("result is nested more than {0} levels deep")]
    DepthExceeded(usize),

    #[error("display of `{type_name}` failed: {source}")]
    Display {
        type_name: String,
        source: EvalError,
    },
}

/// How a value knows how to present itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Absent,
    Scalar,
    /// Sequence whose elements are all strings
    TextSequence,
    OtherSequence,
    /// Anonymous record literal
    BuiltinDisplay,
    /// Declared record whose type defines `display`
    CustomDisplay,
    /// Any other record, rendered member by member
    Structured,
}

/// Access to `display` methods declared on record types.
pub trait RecordDisplay {
    fn has_display(&self, record: &Record) -> bool;

    fn display(&self, record: &Record) -> Result<String, EvalError>;
}

/// For values produced without a loaded unit; no record has a display method.
pub struct NoDisplay;

impl RecordDisplay for NoDisplay {
    fn has_display(&self, _record: &Record) -> bool {
        false
    }

    fn display(&self, record: &Record) -> Result<String, EvalError> {
        Ok(Value::Record(record.clone()).to_string())
    }
}

impl RecordDisplay for Evaluator<'_> {
    fn has_display(&self, record: &Record) -> bool {
        self.has_custom_display(record)
    }

    fn display(&self, record: &Record) -> Result<String, EvalError> {
        self.custom_display(record)
            .unwrap_or_else(|| Ok(Value::Record(record.clone()).to_string()))
    }
}

pub fn classify(value: &Value, displays: &dyn RecordDisplay) -> Capability {
    match value {
        Value::Null => Capability::Absent,
        Value::Boolean(_) | Value::Integer(_) | Value::Float(_) | Value::String(_) => {
            Capability::Scalar
        }
        Value::Array(items) if items.iter().all(|v| matches!(v, Value::String(_))) => {
            Capability::TextSequence
        }
        Value::Array(_) => Capability::OtherSequence,
        Value::Record(record) => match record.kind {
            RecordKind::Anonymous => Capability::BuiltinDisplay,
            RecordKind::Declared(_) if displays.has_display(record) => Capability::CustomDisplay,
            _ => Capability::Structured,
        },
    }
}

/// Format a query result into output lines.
///
/// A sequence yields one line per element (exactly one level of
/// flattening); anything else yields a single line.
///
/// # Examples
///
/// ```
/// use lineq::format::{NoDisplay, format};
/// use lineq::Value;
///
/// let lines = format(&Value::Integer(3), &NoDisplay).unwrap();
/// assert_eq!(lines, vec!["3"]);
///
/// let nested = Value::Array(vec![
///     Value::Array(vec![Value::Integer(1), Value::Integer(2)]),
///     Value::Null,
/// ]);
/// assert_eq!(format(&nested, &NoDisplay).unwrap(), vec!["[1, 2]", "null"]);
/// ```
pub fn format(value: &Value, displays: &dyn RecordDisplay) -> Result<Vec<String>, FormatError> {
    match (classify(value, displays), value) {
        (Capability::TextSequence, Value::Array(items)) => {
            Ok(items.iter().map(Value::as_string).collect())
        }
        (Capability::OtherSequence, Value::Array(items)) => items
            .iter()
            .map(|item| format_at(item, displays, 1))
            .collect(),
        _ => Ok(vec![format_at(value, displays, 0)?]),
    }
}

/// Text of a single element.
pub fn scalar_format(value: &Value, displays: &dyn RecordDisplay) -> Result<String, FormatError> {
    format_at(value, displays, 0)
}

fn format_at(
    value: &Value,
    displays: &dyn RecordDisplay,
    depth: usize,
) -> Result<String, FormatError> {
    if depth > MAX_DEPTH {
        return Err(FormatError::DepthExceeded(MAX_DEPTH));
    }

    match (classify(value, displays), value) {
        (Capability::Absent, _) => Ok(NULL_TEXT.to_string()),
        (Capability::TextSequence | Capability::OtherSequence, Value::Array(items)) => {
            let parts = items
                .iter()
                .map(|item| format_at(item, displays, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[{}]", parts.join(", ")))
        }
        (Capability::BuiltinDisplay, Value::Record(record)) => {
            render_members(record, |member| {
                member_text(member, displays, depth + 1)
            })
        }
        (Capability::CustomDisplay, Value::Record(record)) => display(record, displays),
        (Capability::Structured, Value::Record(record)) => {
            render_members(record, |member| format_at(member, displays, depth + 1))
        }
        _ => Ok(value.as_string()),
    }
}

/// "To string" text of an anonymous record member.
fn member_text(
    value: &Value,
    displays: &dyn RecordDisplay,
    depth: usize,
) -> Result<String, FormatError> {
    if depth > MAX_DEPTH {
        return Err(FormatError::DepthExceeded(MAX_DEPTH));
    }
    match value {
        Value::Record(record) if displays.has_display(record) => display(record, displays),
        Value::Record(record) if record.kind == RecordKind::Anonymous => {
            render_members(record, |member| member_text(member, displays, depth + 1))
        }
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| member_text(item, displays, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[{}]", parts.join(", ")))
        }
        other => Ok(other.as_string()),
    }
}

fn display(record: &Record, displays: &dyn RecordDisplay) -> Result<String, FormatError> {
    displays
        .display(record)
        .map_err(|source| FormatError::Display {
            type_name: record.type_name().unwrap_or("record").to_string(),
            source,
        })
}

fn render_members(
    record: &Record,
    mut render: impl FnMut(&Value) -> Result<String, FormatError>,
) -> Result<String, FormatError> {
    if record.fields.is_empty() {
        return Ok("{ }".to_string());
    }
    let mut parts = Vec::with_capacity(record.fields.len());
    for (name, value) in &record.fields {
        parts.push(format!("{} = {}", name, render(value)?));
    }
    Ok(format!("{{ {} }}", parts.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anon(fields: Vec<(&str, Value)>) -> Value {
        Value::Record(Record::anonymous(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        ))
    }

    #[test]
    fn text_sequences_pass_through() {
        let value = Value::Array(vec!["a".into(), "b".into()]);
        assert_eq!(classify(&value, &NoDisplay), Capability::TextSequence);
        assert_eq!(format(&value, &NoDisplay).unwrap(), vec!["a", "b"]);
        assert!(format(&Value::Array(vec![]), &NoDisplay).unwrap().is_empty());
    }

    #[test]
    fn records_use_builtin_or_structured_display() {
        let value = anon(vec![("Line", "x".into()), ("Len", Value::Integer(1))]);
        assert_eq!(classify(&value, &NoDisplay), Capability::BuiltinDisplay);
        assert_eq!(scalar_format(&value, &NoDisplay).unwrap(), "{ Line = x, Len = 1 }");

        let group = Value::Record(Record::grouping(Value::Integer(1), vec!["a".into()]));
        assert_eq!(classify(&group, &NoDisplay), Capability::Structured);
        assert_eq!(
            scalar_format(&group, &NoDisplay).unwrap(),
            "{ Key = 1, Elements = [a] }"
        );
    }

    #[test]
    fn null_uses_sentinel() {
        assert_eq!(format(&Value::Null, &NoDisplay).unwrap(), vec![NULL_TEXT]);
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let mut value = Value::Integer(0);
        for _ in 0..(MAX_DEPTH + 2) {
            value = Value::Array(vec![value]);
        }
        assert_eq!(
            format(&value, &NoDisplay),
            Err(FormatError::DepthExceeded(MAX_DEPTH))
        );
    }
}
