use std::{
    cell::Cell,
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    ast::{BinOp, Clause, Expr, FnDecl, Member, QueryExpr, RecordDecl, Terminal, UnaryOp, Unit},
    value::{Record, RecordKind, Value},
};

/// Nested helper calls allowed before evaluation gives up.
pub const MAX_CALL_DEPTH: usize = 64;

/// Name under which the implicit method-argument parameter is bound.
const IMPLICIT_PARAM: &str = "@";

/// Errors that can occur during query evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Type mismatch or invalid operation for the given type
    #[error("Type error: {0}")]
    TypeError(String),

    /// Invalid field access or index out of range
    #[error("Access error: {0}")]
    AccessError(String),

    /// Field access or method call on null
    #[error("Null reference: {0}")]
    NullReference(String),

    /// Reference to a name that is not bound
    #[error("Undefined name: `{0}` is not defined")]
    UndefinedName(String),

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// Invalid regular expression
    #[error("Regex error: {0}")]
    Regex(String),

    /// Text could not be converted to a number
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Helper recursion went deeper than [`MAX_CALL_DEPTH`]
    #[error("Recursion limit exceeded: more than {0} nested calls")]
    RecursionLimit(usize),
}

/// A name bound to a value for the duration of an evaluation.
struct Binding<'a> {
    name: &'a str,
    value: &'a Value,
    parent: Option<&'a Binding<'a>>,
}

/// Evaluation context: the chain of local bindings visible to an expression
/// (function parameters, lambda and comprehension variables, and `@`).
#[derive(Clone, Copy, Default)]
pub struct EvalContext<'a> {
    scope: Option<&'a Binding<'a>>,
}

impl<'a> EvalContext<'a> {
    pub fn new() -> Self {
        EvalContext { scope: None }
    }

    fn lookup(&self, name: &str) -> Option<&'a Value> {
        let mut scope = self.scope;
        while let Some(binding) = scope {
            if binding.name == name {
                return Some(binding.value);
            }
            scope = binding.parent;
        }
        None
    }

    /// Run `f` with `name` bound to `value` on top of this context.
    pub fn with_binding<R>(
        &self,
        name: &str,
        value: &Value,
        f: impl FnOnce(EvalContext<'_>) -> R,
    ) -> R {
        let binding = Binding {
            name,
            value,
            parent: self.scope,
        };
        f(EvalContext {
            scope: Some(&binding),
        })
    }
}

/// The query evaluator.
///
/// Holds the members of one loaded unit (functions, record types and the
/// values of its fields) and evaluates expressions against them.
#[derive(Default)]
pub struct Evaluator<'u> {
    functions: HashMap<&'u str, &'u FnDecl>,
    records: HashMap<&'u str, &'u RecordDecl>,
    field_names: HashSet<&'u str>,
    /// Field values, filled in declaration order by [`Evaluator::initialize_fields`]
    fields: HashMap<String, Value>,
    depth: Cell<usize>,
}

impl<'u> Evaluator<'u> {
    /// Creates an evaluator with no unit members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an evaluator for the members of `unit`; fields stay
    /// uninitialised until [`Evaluator::initialize_fields`] runs.
    pub fn for_unit(unit: &'u Unit) -> Self {
        let mut evaluator = Self::default();
        for member in &unit.members {
            match member {
                Member::Function(f) => {
                    evaluator.functions.insert(&f.name, f);
                }
                Member::Record(r) => {
                    evaluator.records.insert(&r.name, r);
                }
                Member::Field(f) => {
                    evaluator.field_names.insert(&f.name);
                }
            }
        }
        evaluator
    }

    /// Evaluates the unit's `let` fields in declaration order.
    pub fn initialize_fields(&mut self, unit: &'u Unit) -> Result<(), EvalError> {
        for member in &unit.members {
            if let Member::Field(field) = member {
                let value = self.eval_expr(&field.value, EvalContext::new())?;
                self.fields.insert(field.name.clone(), value);
            }
        }
        Ok(())
    }

    /// Evaluates a single expression with `bindings` as its only locals.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineq::{Evaluator, Lexer, Parser, Value};
    ///
    /// let mut parser = Parser::new(Lexer::new("lines.count()"));
    /// let expr = parser.parse().unwrap();
    ///
    /// let lines = Value::Array(vec!["a".into(), "b".into()]);
    /// let evaluator = Evaluator::new();
    /// let result = evaluator.eval_expression(&expr, &[("lines", &lines)]).unwrap();
    /// assert_eq!(result, Value::Integer(2));
    /// ```
    pub fn eval_expression(
        &self,
        expr: &Expr,
        bindings: &[(&str, &Value)],
    ) -> Result<Value, EvalError> {
        self.eval_with_bindings(expr, bindings, EvalContext::new())
    }

    /// Calls a unit function by name with already evaluated arguments.
    pub fn call_function(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let decl = self
            .functions
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UndefinedName(name.to_string()))?;
        self.invoke_decl(decl, args)
    }

    pub fn record_decl(&self, name: &str) -> Option<&'u RecordDecl> {
        self.records.get(name).copied()
    }

    pub fn has_custom_display(&self, record: &Record) -> bool {
        match &record.kind {
            RecordKind::Declared(type_name) => self
                .record_decl(type_name)
                .is_some_and(|decl| decl.method("display").is_some()),
            _ => false,
        }
    }

    /// Output of the record type's `display` method, if it declares one.
    pub fn custom_display(&self, record: &Record) -> Option<Result<String, EvalError>> {
        let RecordKind::Declared(type_name) = &record.kind else {
            return None;
        };
        let method = self.record_decl(type_name)?.method("display")?;
        let receiver = Value::Record(record.clone());
        Some(
            self.invoke_decl(method, std::slice::from_ref(&receiver))
                .map(|text| text.as_string()),
        )
    }

    /// The "to string" text of a value: a declared `display` when there is
    /// one, the built-in rendering otherwise. Nested records are shown the
    /// same way at any depth.
    pub fn display_text(&self, value: &Value) -> Result<String, EvalError> {
        match value {
            Value::Record(record) => {
                if let Some(text) = self.custom_display(record) {
                    return text;
                }
                let mut parts = Vec::with_capacity(record.fields.len());
                for (name, field) in &record.fields {
                    parts.push(format!("{} = {}", name, self.display_text(field)?));
                }
                let body = if parts.is_empty() {
                    "{ }".to_string()
                } else {
                    format!("{{ {} }}", parts.join(", "))
                };
                Ok(match record.type_name() {
                    Some(name) => format!("{} {}", name, body),
                    None => body,
                })
            }
            Value::Array(items) => {
                let parts = items
                    .iter()
                    .map(|item| self.display_text(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("[{}]", parts.join(", ")))
            }
            other => Ok(other.as_string()),
        }
    }

    pub(crate) fn invoke_decl(&self, decl: &FnDecl, args: &[Value]) -> Result<Value, EvalError> {
        if args.len() != decl.params.len() {
            return Err(EvalError::TypeError(format!(
                "`{}` expects {} argument(s), got {}",
                decl.name,
                decl.params.len(),
                args.len()
            )));
        }

        let depth = self.depth.get();
        if depth >= MAX_CALL_DEPTH {
            return Err(EvalError::RecursionLimit(MAX_CALL_DEPTH));
        }
        self.depth.set(depth + 1);

        let bindings: Vec<(&str, &Value)> = decl
            .params
            .iter()
            .map(String::as_str)
            .zip(args.iter())
            .collect();
        let result = self.eval_with_bindings(&decl.body, &bindings, EvalContext::new());

        self.depth.set(depth);
        result
    }

    fn eval_with_bindings(
        &self,
        expr: &Expr,
        bindings: &[(&str, &Value)],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        match bindings.split_first() {
            None => self.eval_expr(expr, ctx),
            Some(((name, value), rest)) => {
                ctx.with_binding(name, value, |inner| self.eval_with_bindings(expr, rest, inner))
            }
        }
    }

    /// Evaluates a method argument for one element: an explicit lambda binds
    /// its parameter, anything else sees the element as `@`.
    pub(crate) fn apply_lambda(
        &self,
        arg: &Expr,
        item: &Value,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        match arg {
            Expr::Lambda { param, body, .. } => {
                ctx.with_binding(param, item, |inner| self.eval_expr(body, inner))
            }
            other => ctx.with_binding(IMPLICIT_PARAM, item, |inner| self.eval_expr(other, inner)),
        }
    }

    pub(crate) fn eval_expr(&self, expr: &Expr, ctx: EvalContext<'_>) -> Result<Value, EvalError> {
        match expr {
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Ident { name, .. } => self.lookup(name, ctx),
            Expr::LambdaParam { .. } => ctx.lookup(IMPLICIT_PARAM).cloned().ok_or_else(|| {
                EvalError::TypeError("`@` used outside of a method argument".to_string())
            }),
            Expr::Member { object, name } => {
                let value = self.eval_expr(object, ctx)?;
                self.apply_member(&value, name)
            }
            Expr::Index { object, index } => {
                let value = self.eval_expr(object, ctx)?;
                let index = self.eval_expr(index, ctx)?;
                self.apply_index(&value, &index)
            }
            Expr::BinaryOp { op, left, right } => {
                let left_val = self.eval_expr(left, ctx)?;
                if op.short_circuits() {
                    match (op, left_val) {
                        (BinOp::NullCoalesce, Value::Null) => self.eval_expr(right, ctx),
                        (BinOp::NullCoalesce, v) => Ok(v),
                        (BinOp::And, v) if !v.as_bool() => Ok(Value::Boolean(false)),
                        (BinOp::Or, v) if v.as_bool() => Ok(Value::Boolean(true)),
                        _ => Ok(Value::Boolean(self.eval_expr(right, ctx)?.as_bool())),
                    }
                } else {
                    let right_val = self.eval_expr(right, ctx)?;
                    self.apply_binop(*op, &left_val, &right_val)
                }
            }
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand, ctx)?;
                match (op, value) {
                    (UnaryOp::Not, v) => Ok(Value::Boolean(!v.as_bool())),
                    (UnaryOp::Negate, Value::Integer(n)) => n
                        .checked_neg()
                        .map(Value::Integer)
                        .ok_or_else(|| EvalError::Overflow(format!("cannot negate {}", n))),
                    (UnaryOp::Negate, Value::Float(n)) => Ok(Value::Float(-n)),
                    (UnaryOp::Negate, v) => Err(EvalError::TypeError(format!(
                        "Cannot negate {}",
                        v.type_name()
                    ))),
                }
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(condition, ctx)?.as_bool() {
                    self.eval_expr(then_branch, ctx)
                } else {
                    self.eval_expr(else_branch, ctx)
                }
            }
            Expr::MethodCall {
                object,
                method,
                args,
                ..
            } => {
                let obj_value = self.eval_expr(object, ctx)?;
                self.eval_method_call(&obj_value, method, args, ctx)
            }
            Expr::Call { name, args, .. } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, ctx)?);
                }
                self.eval_call(name, values)
            }
            Expr::Lambda { .. } => Err(EvalError::TypeError(
                "a lambda can only be used as a method argument".to_string(),
            )),
            Expr::Query(query) => self.eval_comprehension(query, ctx),
            Expr::Object(items) => {
                let mut fields = Vec::with_capacity(items.len());
                for (key, expr) in items {
                    fields.push((key.clone(), self.eval_expr(expr, ctx)?));
                }
                Ok(Value::Record(Record::anonymous(fields)))
            }
            Expr::Array(exprs) => {
                let mut arr = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    arr.push(self.eval_expr(expr, ctx)?);
                }
                Ok(Value::Array(arr))
            }
        }
    }

    fn lookup(&self, name: &str, ctx: EvalContext<'_>) -> Result<Value, EvalError> {
        if let Some(value) = ctx.lookup(name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.fields.get(name) {
            return Ok(value.clone());
        }
        if self.field_names.contains(name) {
            return Err(EvalError::AccessError(format!(
                "field `{}` is used before it is initialized",
                name
            )));
        }
        Err(EvalError::UndefinedName(name.to_string()))
    }

    fn eval_call(&self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        if let Some(decl) = self.functions.get(name) {
            return self.invoke_decl(decl, &args);
        }

        if let Some(decl) = self.records.get(name) {
            if args.len() != decl.fields.len() {
                return Err(EvalError::TypeError(format!(
                    "record `{}` has {} field(s), got {} argument(s)",
                    name,
                    decl.fields.len(),
                    args.len()
                )));
            }
            let fields = decl.fields.iter().cloned().zip(args).collect();
            return Ok(Value::Record(Record::declared(name, fields)));
        }

        self.eval_builtin_function(name, args)
    }

    fn apply_member(&self, object: &Value, name: &str) -> Result<Value, EvalError> {
        match object {
            Value::Record(record) => record.get(name).cloned().ok_or_else(|| {
                EvalError::AccessError(format!(
                    "{} has no field `{}`",
                    record
                        .type_name()
                        .map(|t| format!("record `{}`", t))
                        .unwrap_or_else(|| "record".to_string()),
                    name
                ))
            }),
            Value::Null => Err(EvalError::NullReference(format!(
                "cannot read field `{}` of null",
                name
            ))),
            other => Err(EvalError::TypeError(format!(
                "Cannot read field `{}` of {}",
                name,
                other.type_name()
            ))),
        }
    }

    fn apply_index(&self, object: &Value, index: &Value) -> Result<Value, EvalError> {
        match (object, index) {
            (Value::Array(arr), Value::Integer(n)) => {
                let i = resolve_index(*n, arr.len()).ok_or_else(|| {
                    EvalError::AccessError(format!(
                        "index {} is out of range for array of length {}",
                        n,
                        arr.len()
                    ))
                })?;
                Ok(arr[i].clone())
            }
            (Value::String(s), Value::Integer(n)) => {
                let chars: Vec<char> = s.chars().collect();
                let i = resolve_index(*n, chars.len()).ok_or_else(|| {
                    EvalError::AccessError(format!(
                        "index {} is out of range for string of length {}",
                        n,
                        chars.len()
                    ))
                })?;
                Ok(Value::String(chars[i].to_string()))
            }
            (Value::Record(_), Value::String(key)) => self.apply_member(object, key),
            (Value::Record(record), Value::Integer(_)) if record.is_grouping() => {
                match record.get("Elements") {
                    Some(elements) => self.apply_index(elements, index),
                    None => Ok(Value::Null),
                }
            }
            (Value::Null, _) => Err(EvalError::NullReference(
                "cannot index into null".to_string(),
            )),
            _ => Err(EvalError::TypeError(format!(
                "Cannot index {} with {}",
                object.type_name(),
                index.type_name()
            ))),
        }
    }

    fn apply_binop(&self, op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        match op {
            BinOp::Add => match (left, right) {
                (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!(
                    "{}{}",
                    self.display_text(left)?,
                    self.display_text(right)?
                ))),
                (Value::Array(a), Value::Array(b)) => {
                    Ok(Value::Array(a.iter().chain(b.iter()).cloned().collect()))
                }
                _ => arithmetic(op, left, right),
            },
            BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Modulo => {
                arithmetic(op, left, right)
            }
            BinOp::Equal => Ok(Value::Boolean(values_equal(left, right))),
            BinOp::NotEqual => Ok(Value::Boolean(!values_equal(left, right))),
            BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
                let ordering = compare_values(left, right).ok_or_else(|| {
                    EvalError::TypeError(format!(
                        "Cannot compare {} with {}",
                        left.type_name(),
                        right.type_name()
                    ))
                })?;
                Ok(Value::Boolean(match op {
                    BinOp::LessThan => ordering == Ordering::Less,
                    BinOp::GreaterThan => ordering == Ordering::Greater,
                    BinOp::LessEqual => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }))
            }
            BinOp::And => Ok(Value::Boolean(left.as_bool() && right.as_bool())),
            BinOp::Or => Ok(Value::Boolean(left.as_bool() || right.as_bool())),
            BinOp::NullCoalesce => Ok(if left.is_null() {
                right.clone()
            } else {
                left.clone()
            }),
        }
    }

    /// Elements a comprehension or array method iterates over.
    pub(crate) fn iterable<'v>(&self, value: &'v Value, what: &str) -> Result<&'v [Value], EvalError> {
        match value {
            Value::Array(items) => Ok(items),
            Value::Record(record) if record.is_grouping() => match record.get("Elements") {
                Some(Value::Array(items)) => Ok(items),
                _ => Ok(&[]),
            },
            Value::Null => Err(EvalError::NullReference(format!(
                "{} requires a sequence, got null",
                what
            ))),
            other => Err(EvalError::TypeError(format!(
                "{} requires a sequence, got {}",
                what,
                other.type_name()
            ))),
        }
    }

    fn eval_in_row(
        &self,
        expr: &Expr,
        row: &[(String, Value)],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let bindings: Vec<(&str, &Value)> = row.iter().map(|(n, v)| (n.as_str(), v)).collect();
        self.eval_with_bindings(expr, &bindings, ctx)
    }

    fn eval_comprehension(&self, query: &QueryExpr, ctx: EvalContext<'_>) -> Result<Value, EvalError> {
        // Each row holds the range variables bound so far
        let mut rows: Vec<Vec<(String, Value)>> = vec![vec![]];

        for clause in &query.clauses {
            match clause {
                Clause::From { var, source } => {
                    let mut next = Vec::new();
                    for row in &rows {
                        let source_value = self.eval_in_row(source, row, ctx)?;
                        for item in self.iterable(&source_value, "`from`")? {
                            let mut extended = row.clone();
                            extended.push((var.clone(), item.clone()));
                            next.push(extended);
                        }
                    }
                    rows = next;
                }
                Clause::Where(condition) => {
                    let mut kept = Vec::with_capacity(rows.len());
                    for row in rows {
                        if self.eval_in_row(condition, &row, ctx)?.as_bool() {
                            kept.push(row);
                        }
                    }
                    rows = kept;
                }
                Clause::Let { name, value } => {
                    for row in rows.iter_mut() {
                        let v = self.eval_in_row(value, row, ctx)?;
                        row.push((name.clone(), v));
                    }
                }
                Clause::OrderBy(orderings) => {
                    let mut keyed = Vec::with_capacity(rows.len());
                    for row in rows {
                        let mut keys = Vec::with_capacity(orderings.len());
                        for ordering in orderings {
                            keys.push(self.eval_in_row(&ordering.key, &row, ctx)?);
                        }
                        keyed.push((keys, row));
                    }
                    keyed.sort_by(|(a, _), (b, _)| {
                        for (i, ordering) in orderings.iter().enumerate() {
                            let mut cmp = sort_order(&a[i], &b[i]);
                            if ordering.descending {
                                cmp = cmp.reverse();
                            }
                            if cmp != Ordering::Equal {
                                return cmp;
                            }
                        }
                        Ordering::Equal
                    });
                    rows = keyed.into_iter().map(|(_, row)| row).collect();
                }
            }
        }

        match &query.terminal {
            Terminal::Select(expr) => {
                let mut result = Vec::with_capacity(rows.len());
                for row in &rows {
                    result.push(self.eval_in_row(expr, row, ctx)?);
                }
                Ok(Value::Array(result))
            }
            Terminal::Group { element, key } => {
                let mut pairs = Vec::with_capacity(rows.len());
                for row in &rows {
                    let k = self.eval_in_row(key, row, ctx)?;
                    let e = self.eval_in_row(element, row, ctx)?;
                    pairs.push((k, e));
                }
                Ok(group_pairs(pairs))
            }
        }
    }
}

/// Groups `(key, element)` pairs into `Grouping` records, keeping keys in
/// order of first appearance.
pub(crate) fn group_pairs(pairs: Vec<(Value, Value)>) -> Value {
    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
    for (key, element) in pairs {
        match groups.iter_mut().find(|(k, _)| values_equal(k, &key)) {
            Some((_, elements)) => elements.push(element),
            None => groups.push((key, vec![element])),
        }
    }
    Value::Array(
        groups
            .into_iter()
            .map(|(key, elements)| Value::Record(Record::grouping(key, elements)))
            .collect(),
    )
}

/// Maps a possibly negative index onto `0..len`.
pub(crate) fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        // Negative index: count from end (-1 = last, -2 = second to last)
        let abs = index.unsigned_abs() as usize;
        if abs > len {
            return None;
        }
        len - abs
    } else {
        index as usize
    };
    (resolved < len).then_some(resolved)
}

/// Structural equality; integers and floats compare by numeric value.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Float(y)) | (Value::Float(y), Value::Integer(x)) => {
            (*x as f64) == *y
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Record(x), Value::Record(y)) => {
            x.kind == y.kind
                && x.fields.len() == y.fields.len()
                && x
                    .fields
                    .iter()
                    .zip(&y.fields)
                    .all(|((ln, lv), (rn, rv))| ln == rn && values_equal(lv, rv))
        }
        _ => a == b,
    }
}

/// Ordering between comparable values (numbers, strings, booleans).
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total order used for sorting: nulls first, incomparable values equal.
pub(crate) fn sort_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => compare_values(a, b).unwrap_or(Ordering::Equal),
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_arithmetic(op, *a, *b))),
        (Value::Integer(a), Value::Float(b)) => Ok(mixed_arithmetic(
            op,
            Decimal::from_i64(*a),
            Decimal::from_f64(*b),
            *a as f64,
            *b,
        )),
        (Value::Float(a), Value::Integer(b)) => Ok(mixed_arithmetic(
            op,
            Decimal::from_f64(*a),
            Decimal::from_i64(*b),
            *a,
            *b as f64,
        )),
        (a, b) => Err(EvalError::TypeError(format!(
            "Cannot apply {} to {} and {}",
            op.operation(),
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn integer_arithmetic(op: BinOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let overflow = || EvalError::Overflow(format!("{} of {} and {}", op.operation(), a, b));
    match op {
        BinOp::Add => a.checked_add(b).map(Value::Integer).ok_or_else(overflow),
        BinOp::Subtract => a.checked_sub(b).map(Value::Integer).ok_or_else(overflow),
        BinOp::Multiply => a.checked_mul(b).map(Value::Integer).ok_or_else(overflow),
        BinOp::Divide => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            // Exact division stays integral; otherwise return Float
            match a.checked_rem(b) {
                Some(0) => a.checked_div(b).map(Value::Integer).ok_or_else(overflow),
                Some(_) => Ok(Value::Float(a as f64 / b as f64)),
                None => Err(overflow()),
            }
        }
        _ => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_rem(b).map(Value::Integer).ok_or_else(overflow)
        }
    }
}

fn float_arithmetic(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide => a / b,
        _ => a % b,
    }
}

/// Integer/float mixes go through `Decimal` so that e.g. `3 * 0.1` is `0.3`
/// and whole results come back as integers.
fn mixed_arithmetic(
    op: BinOp,
    a: Option<Decimal>,
    b: Option<Decimal>,
    fa: f64,
    fb: f64,
) -> Value {
    if let (Some(ad), Some(bd)) = (a, b) {
        let rd = match op {
            BinOp::Add => ad.checked_add(bd),
            BinOp::Subtract => ad.checked_sub(bd),
            BinOp::Multiply => ad.checked_mul(bd),
            BinOp::Divide => ad.checked_div(bd),
            _ => ad.checked_rem(bd),
        };
        if let Some(rd) = rd {
            if rd.is_integer()
                && let Some(r) = rd.to_i64()
            {
                return Value::Integer(r);
            } else if let Some(r) = rd.to_f64() {
                return Value::Float(r);
            }
        }
    }
    Value::Float(float_arithmetic(op, fa, fb))
}
