use std::fmt;

/// Name of the built-in record produced by `group ... by ...` and `group_by`.
pub const GROUPING: &str = "Grouping";

/// A runtime value of the query language.
///
/// Queries start from an array of strings (the lines) and may return any of
/// these shapes; the formatter turns whichever comes back into display lines.
///
/// # Examples
///
/// ```
/// use lineq::Value;
/// use lineq::value::Record;
///
/// // Scalar values
/// let null = Value::Null;
/// let boolean = Value::Boolean(true);
/// let integer = Value::Integer(42);
/// let float = Value::Float(3.14);
/// let string = Value::String("hello".to_string());
///
/// // Collections
/// let array = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
/// let record = Value::Record(Record::anonymous(vec![
///     ("Key".to_string(), Value::Integer(1)),
/// ]));
/// assert_eq!(record.to_string(), "{ Key = 1 }");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,

    /// Boolean (true/false)
    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// UTF-8 string
    String(String),

    /// Array of values (homogeneous or heterogeneous)
    Array(Vec<Value>),

    /// Record with ordered, named fields
    Record(Record),
}

/// Where a record's shape comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordKind {
    /// Built from a `{ Name: value }` literal; has a built-in display
    Anonymous,

    /// Produced by the engine itself, such as [`GROUPING`]
    Builtin(&'static str),

    /// Instance of a `record` type declared in the helper code
    Declared(String),
}

/// A record value: a kind plus fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn anonymous(fields: Vec<(String, Value)>) -> Self {
        Record {
            kind: RecordKind::Anonymous,
            fields,
        }
    }

    pub fn declared(type_name: &str, fields: Vec<(String, Value)>) -> Self {
        Record {
            kind: RecordKind::Declared(type_name.to_string()),
            fields,
        }
    }

    /// `{ Key, Elements }` record for one group of a grouping query.
    pub fn grouping(key: Value, elements: Vec<Value>) -> Self {
        Record {
            kind: RecordKind::Builtin(GROUPING),
            fields: vec![
                ("Key".to_string(), key),
                ("Elements".to_string(), Value::Array(elements)),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Type name shown in messages; anonymous records have none.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::Anonymous => None,
            RecordKind::Builtin(name) => Some(name),
            RecordKind::Declared(name) => Some(name),
        }
    }

    pub fn is_grouping(&self) -> bool {
        self.kind == RecordKind::Builtin(GROUPING)
    }
}

impl Value {
    /// Check if the value is truthy (for conditions)
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Null => false,
            Boolean(b) => *b,
            Float(n) => *n != 0.0,
            Integer(n) => *n != 0,
            String(s) => !s.is_empty(),
            Array(arr) => !arr.is_empty(),
            Record(_) => true,
        }
    }

    /// Convert to boolean for conditions
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            _ => self.is_truthy(),
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    /// Get as string (concatenation)
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Human-readable type name used in error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Record(r) => r.type_name().unwrap_or("record"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Default text of a value, used by `to_string()`, string concatenation and
/// the members of anonymous records.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Float(n) => write!(f, "{}", n),
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(record) => {
                if let Some(name) = record.type_name() {
                    write!(f, "{} ", name)?;
                }
                write!(f, "{{")?;
                for (i, (name, value)) in record.fields.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{}{} = {}", sep, name, value)?;
                }
                write!(f, " }}")
            }
        }
    }
}
