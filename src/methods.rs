//! Built-in methods and functions.
//!
//! Method arguments are passed unevaluated so that selectors and predicates
//! can be applied per element, either as `x => ...` lambdas or through the
//! implicit `@` parameter.

use std::cmp::Ordering;

use regex::Regex;

use crate::{
    ast::Expr,
    evaluator::{
        EvalContext, EvalError, Evaluator, compare_values, group_pairs, resolve_index, sort_order,
        values_equal,
    },
    value::{Record, Value},
};

/// Name and accepted argument count of a built-in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signature {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
}

const fn sig(name: &'static str, min_args: usize, max_args: usize) -> Signature {
    Signature {
        name,
        min_args,
        max_args,
    }
}

/// Every built-in method, on any receiver type.
pub const METHODS: &[Signature] = &[
    // Sequences
    sig("filter", 1, 1),
    sig("where", 1, 1),
    sig("map", 1, 1),
    sig("select", 1, 1),
    sig("flat_map", 1, 1),
    sig("select_many", 1, 1),
    sig("any", 0, 1),
    sig("all", 1, 1),
    sig("count", 0, 1),
    sig("len", 0, 0),
    sig("length", 0, 0),
    sig("sum", 0, 1),
    sig("min", 0, 1),
    sig("max", 0, 1),
    sig("avg", 0, 1),
    sig("first", 0, 1),
    sig("last", 0, 1),
    sig("unique", 0, 0),
    sig("distinct", 0, 0),
    sig("sort", 0, 1),
    sig("order_by", 0, 1),
    sig("sort_desc", 0, 1),
    sig("order_by_desc", 0, 1),
    sig("reverse", 0, 0),
    sig("flatten", 0, 0),
    sig("take", 1, 1),
    sig("skip", 1, 1),
    sig("take_while", 1, 1),
    sig("skip_while", 1, 1),
    sig("group_by", 1, 2),
    sig("join", 0, 1),
    sig("contains", 1, 1),
    sig("index_of", 1, 1),
    sig("with_index", 0, 0),
    // Strings
    sig("upper", 0, 0),
    sig("lower", 0, 0),
    sig("trim", 0, 0),
    sig("trim_start", 0, 0),
    sig("trim_end", 0, 0),
    sig("split", 1, 1),
    sig("words", 0, 0),
    sig("chars", 0, 0),
    sig("startswith", 1, 1),
    sig("starts_with", 1, 1),
    sig("endswith", 1, 1),
    sig("ends_with", 1, 1),
    sig("matches", 1, 1),
    sig("replace", 2, 2),
    sig("re_replace", 2, 2),
    sig("captures", 1, 1),
    sig("find_all", 1, 1),
    sig("substring", 1, 2),
    sig("parse_int", 0, 0),
    sig("parse_float", 0, 0),
    sig("pad_left", 1, 2),
    sig("pad_right", 1, 2),
    // Records
    sig("keys", 0, 0),
    sig("values", 0, 0),
    // Any value
    sig("type", 0, 0),
    sig("to_string", 0, 0),
    sig("is_null", 0, 0),
];

/// Built-in free functions.
pub const FUNCTIONS: &[Signature] = &[
    sig("range", 2, 2),
    sig("repeat", 2, 2),
    sig("str", 1, 1),
    sig("int", 1, 1),
    sig("float", 1, 1),
];

pub fn method_signature(name: &str) -> Option<&'static Signature> {
    METHODS.iter().find(|s| s.name == name)
}

pub fn function_signature(name: &str) -> Option<&'static Signature> {
    FUNCTIONS.iter().find(|s| s.name == name)
}

impl<'u> Evaluator<'u> {
    pub(crate) fn eval_method_call(
        &self,
        object: &Value,
        method: &str,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        // Methods declared on a record type take precedence over built-ins
        if let Value::Record(record) = object
            && let Some(type_name) = record.type_name()
            && let Some(decl) = self.record_decl(type_name).and_then(|r| r.method(method))
        {
            let mut values = vec![object.clone()];
            for arg in args {
                values.push(self.eval_expr(arg, ctx)?);
            }
            return self.invoke_decl(decl, &values);
        }

        let signature = method_signature(method).ok_or_else(|| {
            EvalError::TypeError(format!(
                "Unknown method '{}' on {}",
                method,
                object.type_name()
            ))
        })?;
        if args.len() < signature.min_args || args.len() > signature.max_args {
            return Err(EvalError::TypeError(format!(
                "{}() takes {} argument(s), got {}",
                method,
                arity_text(signature),
                args.len()
            )));
        }

        match method {
            "type" => return Ok(Value::String(object.type_name().to_string())),
            "is_null" => return Ok(Value::Boolean(object.is_null())),
            _ => {}
        }
        if object.is_null() {
            return Err(EvalError::NullReference(format!(
                "cannot call {}() on null",
                method
            )));
        }

        match method {
            "to_string" => Ok(Value::String(self.display_text(object)?)),

            "filter" | "where" => self.method_filter(object, method, &args[0], ctx),
            "map" | "select" => self.method_map(object, method, &args[0], ctx),
            "flat_map" | "select_many" => self.method_flat_map(object, method, &args[0], ctx),
            "any" => self.method_any(object, args, ctx),
            "all" => self.method_all(object, &args[0], ctx),
            "count" => self.method_count(object, args, ctx),
            "len" | "length" => self.method_len(object, method),
            "sum" => self.method_sum(object, args, ctx),
            "min" => self.method_extreme(object, method, args, ctx, Ordering::Less),
            "max" => self.method_extreme(object, method, args, ctx, Ordering::Greater),
            "avg" => self.method_avg(object, args, ctx),
            "first" => self.method_first(object, args, ctx, false),
            "last" => self.method_first(object, args, ctx, true),
            "unique" | "distinct" => self.method_unique(object, method),
            "sort" | "order_by" => self.method_sort(object, method, args, ctx, false),
            "sort_desc" | "order_by_desc" => self.method_sort(object, method, args, ctx, true),
            "reverse" => self.method_reverse(object),
            "flatten" => self.method_flatten(object),
            "take" | "skip" => self.method_take_skip(object, method, &args[0], ctx),
            "take_while" | "skip_while" => self.method_while(object, method, &args[0], ctx),
            "group_by" => self.method_group_by(object, args, ctx),
            "join" => self.method_join(object, args, ctx),
            "contains" => self.method_contains(object, &args[0], ctx),
            "index_of" => self.method_index_of(object, &args[0], ctx),
            "with_index" => self.method_with_index(object),

            "upper" | "lower" | "trim" | "trim_start" | "trim_end" | "words" | "chars"
            | "parse_int" | "parse_float" => self.method_string_unary(object, method),
            "split" => self.method_split(object, &args[0], ctx),
            "startswith" | "starts_with" | "endswith" | "ends_with" => {
                self.method_affix(object, method, &args[0], ctx)
            }
            "matches" | "captures" | "find_all" => {
                self.method_regex(object, method, &args[0], ctx)
            }
            "replace" | "re_replace" => self.method_replace(object, method, args, ctx),
            "substring" => self.method_substring(object, args, ctx),
            "pad_left" | "pad_right" => self.method_pad(object, method, args, ctx),

            "keys" | "values" => self.method_keys_values(object, method),

            _ => Err(EvalError::TypeError(format!(
                "Unknown method '{}' on {}",
                method,
                object.type_name()
            ))),
        }
    }

    /// Built-in free functions: `range`, `repeat`, `str`, `int`, `float`.
    pub(crate) fn eval_builtin_function(
        &self,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        let signature =
            function_signature(name).ok_or_else(|| EvalError::UndefinedName(name.to_string()))?;
        if args.len() < signature.min_args || args.len() > signature.max_args {
            return Err(EvalError::TypeError(format!(
                "{}() takes {} argument(s), got {}",
                name,
                arity_text(signature),
                args.len()
            )));
        }

        match name {
            "range" => {
                let start = expect_int(&args[0], "range() start")?;
                let count = expect_count(&args[1], "range() count")?;
                let end = start.checked_add(count as i64).ok_or_else(|| {
                    EvalError::Overflow(format!("range({}, {})", start, count))
                })?;
                Ok(Value::Array((start..end).map(Value::Integer).collect()))
            }
            "repeat" => {
                let count = expect_count(&args[1], "repeat() count")?;
                Ok(Value::Array(vec![args[0].clone(); count]))
            }
            "str" => Ok(Value::String(self.display_text(&args[0])?)),
            "int" => match &args[0] {
                Value::Integer(n) => Ok(Value::Integer(*n)),
                Value::Float(n) if n.is_finite() => Ok(Value::Integer(n.trunc() as i64)),
                Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
                Value::String(s) => parse_int(s),
                other => Err(EvalError::Conversion(format!(
                    "cannot convert {} to an integer",
                    other.type_name()
                ))),
            },
            _ => match &args[0] {
                Value::Integer(n) => Ok(Value::Float(*n as f64)),
                Value::Float(n) => Ok(Value::Float(*n)),
                Value::String(s) => parse_float(s),
                other => Err(EvalError::Conversion(format!(
                    "cannot convert {} to a float",
                    other.type_name()
                ))),
            },
        }
    }

    fn sequence<'v>(&self, object: &'v Value, method: &str) -> Result<&'v [Value], EvalError> {
        self.iterable(object, &format!("{}()", method))
    }

    fn string_arg(
        &self,
        arg: &Expr,
        method: &str,
        ctx: EvalContext<'_>,
    ) -> Result<String, EvalError> {
        match self.eval_expr(arg, ctx)? {
            Value::String(s) => Ok(s),
            other => Err(EvalError::TypeError(format!(
                "{}() expects a string argument, got {}",
                method,
                other.type_name()
            ))),
        }
    }

    fn int_arg(&self, arg: &Expr, method: &str, ctx: EvalContext<'_>) -> Result<i64, EvalError> {
        let value = self.eval_expr(arg, ctx)?;
        expect_int(&value, &format!("{}() argument", method))
    }

    /// .filter(predicate) / .where(predicate)
    fn method_filter(
        &self,
        object: &Value,
        method: &str,
        predicate: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let mut result = Vec::new();
        for item in self.sequence(object, method)? {
            if self.apply_lambda(predicate, item, ctx)?.as_bool() {
                result.push(item.clone());
            }
        }
        Ok(Value::Array(result))
    }

    /// .map(selector) / .select(selector)
    fn method_map(
        &self,
        object: &Value,
        method: &str,
        selector: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let items = self.sequence(object, method)?;
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            result.push(self.apply_lambda(selector, item, ctx)?);
        }
        Ok(Value::Array(result))
    }

    /// .flat_map(selector) - selector results that are sequences are spliced in
    fn method_flat_map(
        &self,
        object: &Value,
        method: &str,
        selector: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let mut result = Vec::new();
        for item in self.sequence(object, method)? {
            match self.apply_lambda(selector, item, ctx)? {
                Value::Array(inner) => result.extend(inner),
                other => result.push(other),
            }
        }
        Ok(Value::Array(result))
    }

    /// .any() - non-empty; .any(predicate) - at least one element matches
    fn method_any(
        &self,
        object: &Value,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let items = self.sequence(object, "any")?;
        let Some(predicate) = args.first() else {
            return Ok(Value::Boolean(!items.is_empty()));
        };
        for item in items {
            if self.apply_lambda(predicate, item, ctx)?.as_bool() {
                return Ok(Value::Boolean(true));
            }
        }
        Ok(Value::Boolean(false))
    }

    /// .all(predicate) - true for an empty sequence
    fn method_all(
        &self,
        object: &Value,
        predicate: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        for item in self.sequence(object, "all")? {
            if !self.apply_lambda(predicate, item, ctx)?.as_bool() {
                return Ok(Value::Boolean(false));
            }
        }
        Ok(Value::Boolean(true))
    }

    fn method_count(
        &self,
        object: &Value,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        if let (Value::String(s), None) = (object, args.first()) {
            return Ok(Value::Integer(s.chars().count() as i64));
        }
        let items = self.sequence(object, "count")?;
        let Some(predicate) = args.first() else {
            return Ok(Value::Integer(items.len() as i64));
        };
        let mut count = 0;
        for item in items {
            if self.apply_lambda(predicate, item, ctx)?.as_bool() {
                count += 1;
            }
        }
        Ok(Value::Integer(count))
    }

    fn method_len(&self, object: &Value, method: &str) -> Result<Value, EvalError> {
        match object {
            Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
            Value::Record(record) if !record.is_grouping() => {
                Ok(Value::Integer(record.fields.len() as i64))
            }
            other => Ok(Value::Integer(self.sequence(other, method)?.len() as i64)),
        }
    }

    /// Elements, or the selector applied to each element when one is given.
    fn selected(
        &self,
        object: &Value,
        method: &str,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Vec<Value>, EvalError> {
        let items = self.sequence(object, method)?;
        match args.first() {
            None => Ok(items.to_vec()),
            Some(selector) => items
                .iter()
                .map(|item| self.apply_lambda(selector, item, ctx))
                .collect(),
        }
    }

    /// .sum() / .sum(selector) - integers stay integral, floats widen
    fn method_sum(
        &self,
        object: &Value,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let mut int_total: i64 = 0;
        let mut float_total: f64 = 0.0;
        let mut is_float = false;

        for value in self.selected(object, "sum", args, ctx)? {
            match value {
                Value::Integer(n) => {
                    int_total = int_total.checked_add(n).ok_or_else(|| {
                        EvalError::Overflow("sum() exceeded the integer range".to_string())
                    })?
                }
                Value::Float(n) => {
                    is_float = true;
                    float_total += n;
                }
                Value::Null => {}
                other => {
                    return Err(EvalError::TypeError(format!(
                        "sum() requires numbers, got {}",
                        other.type_name()
                    )));
                }
            }
        }

        if is_float {
            Ok(Value::Float(int_total as f64 + float_total))
        } else {
            Ok(Value::Integer(int_total))
        }
    }

    /// .min() / .max(), optionally by selector; null for an empty sequence
    fn method_extreme(
        &self,
        object: &Value,
        method: &str,
        args: &[Expr],
        ctx: EvalContext<'_>,
        wanted: Ordering,
    ) -> Result<Value, EvalError> {
        let mut best: Option<Value> = None;
        for value in self.selected(object, method, args, ctx)? {
            if value.is_null() {
                continue;
            }
            best = match best {
                None => Some(value),
                Some(current) => {
                    let ordering = compare_values(&value, &current)
                        .ok_or_else(|| {
                            EvalError::TypeError(format!(
                                "{}() cannot compare {} with {}",
                                method,
                                value.type_name(),
                                current.type_name()
                            ))
                        })?;
                    if ordering == wanted {
                        Some(value)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        Ok(best.unwrap_or(Value::Null))
    }

    fn method_avg(
        &self,
        object: &Value,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let values = self.selected(object, "avg", args, ctx)?;
        if values.is_empty() {
            return Ok(Value::Null);
        }
        let mut total = 0.0;
        for value in &values {
            total += value.as_float().ok_or_else(|| {
                EvalError::TypeError(format!(
                    "avg() requires numbers, got {}",
                    value.type_name()
                ))
            })?;
        }
        Ok(Value::Float(total / values.len() as f64))
    }

    /// .first() / .last(), optionally the first/last element matching a predicate
    fn method_first(
        &self,
        object: &Value,
        args: &[Expr],
        ctx: EvalContext<'_>,
        from_end: bool,
    ) -> Result<Value, EvalError> {
        let items = self.sequence(object, if from_end { "last" } else { "first" })?;
        let ordered: Box<dyn Iterator<Item = &Value>> = if from_end {
            Box::new(items.iter().rev())
        } else {
            Box::new(items.iter())
        };
        for item in ordered {
            match args.first() {
                None => return Ok(item.clone()),
                Some(predicate) => {
                    if self.apply_lambda(predicate, item, ctx)?.as_bool() {
                        return Ok(item.clone());
                    }
                }
            }
        }
        Ok(Value::Null)
    }

    fn method_unique(&self, object: &Value, method: &str) -> Result<Value, EvalError> {
        let mut result: Vec<Value> = Vec::new();
        for item in self.sequence(object, method)? {
            if !result.iter().any(|seen| values_equal(seen, item)) {
                result.push(item.clone());
            }
        }
        Ok(Value::Array(result))
    }

    /// Stable sort by the elements themselves or by a key selector.
    fn method_sort(
        &self,
        object: &Value,
        method: &str,
        args: &[Expr],
        ctx: EvalContext<'_>,
        descending: bool,
    ) -> Result<Value, EvalError> {
        let items = self.sequence(object, method)?;
        let keys = self.selected(object, method, args, ctx)?;
        let mut keyed: Vec<(Value, Value)> = keys.into_iter().zip(items.iter().cloned()).collect();
        keyed.sort_by(|(a, _), (b, _)| {
            let ordering = sort_order(a, b);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(Value::Array(keyed.into_iter().map(|(_, item)| item).collect()))
    }

    fn method_reverse(&self, object: &Value) -> Result<Value, EvalError> {
        match object {
            Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
            other => {
                let mut items = self.sequence(other, "reverse")?.to_vec();
                items.reverse();
                Ok(Value::Array(items))
            }
        }
    }

    /// .flatten() - one level
    fn method_flatten(&self, object: &Value) -> Result<Value, EvalError> {
        let mut result = Vec::new();
        for item in self.sequence(object, "flatten")? {
            match item {
                Value::Array(inner) => result.extend(inner.iter().cloned()),
                other => result.push(other.clone()),
            }
        }
        Ok(Value::Array(result))
    }

    fn method_take_skip(
        &self,
        object: &Value,
        method: &str,
        count: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let items = self.sequence(object, method)?;
        let n = (self.int_arg(count, method, ctx)?.max(0) as usize).min(items.len());
        let slice = if method == "take" {
            &items[..n]
        } else {
            &items[n..]
        };
        Ok(Value::Array(slice.to_vec()))
    }

    fn method_while(
        &self,
        object: &Value,
        method: &str,
        predicate: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let items = self.sequence(object, method)?;
        let mut boundary = items.len();
        for (i, item) in items.iter().enumerate() {
            if !self.apply_lambda(predicate, item, ctx)?.as_bool() {
                boundary = i;
                break;
            }
        }
        let slice = if method == "take_while" {
            &items[..boundary]
        } else {
            &items[boundary..]
        };
        Ok(Value::Array(slice.to_vec()))
    }

    /// .group_by(key) / .group_by(key, element) - `Grouping` records in order
    /// of first appearance
    fn method_group_by(
        &self,
        object: &Value,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let items = self.sequence(object, "group_by")?;
        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            let key = self.apply_lambda(&args[0], item, ctx)?;
            let element = match args.get(1) {
                Some(selector) => self.apply_lambda(selector, item, ctx)?,
                None => item.clone(),
            };
            pairs.push((key, element));
        }
        Ok(group_pairs(pairs))
    }

    fn method_join(
        &self,
        object: &Value,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let separator = match args.first() {
            Some(arg) => self.string_arg(arg, "join", ctx)?,
            None => String::new(),
        };
        let mut parts = Vec::new();
        for item in self.sequence(object, "join")? {
            parts.push(self.display_text(item)?);
        }
        Ok(Value::String(parts.join(&separator)))
    }

    fn method_contains(
        &self,
        object: &Value,
        needle: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let needle = self.eval_expr(needle, ctx)?;
        match (object, &needle) {
            (Value::String(s), Value::String(sub)) => Ok(Value::Boolean(s.contains(sub.as_str()))),
            (Value::String(_), other) => Err(EvalError::TypeError(format!(
                "contains() on a string expects a string, got {}",
                other.type_name()
            ))),
            (Value::Record(record), Value::String(key)) if !record.is_grouping() => {
                Ok(Value::Boolean(record.get(key).is_some()))
            }
            _ => {
                let items = self.sequence(object, "contains")?;
                Ok(Value::Boolean(items.iter().any(|item| values_equal(item, &needle))))
            }
        }
    }

    fn method_index_of(
        &self,
        object: &Value,
        needle: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let needle = self.eval_expr(needle, ctx)?;
        let index = match (object, &needle) {
            (Value::String(s), Value::String(sub)) => s
                .find(sub.as_str())
                .map(|byte| s[..byte].chars().count()),
            (Value::String(_), other) => {
                return Err(EvalError::TypeError(format!(
                    "index_of() on a string expects a string, got {}",
                    other.type_name()
                )));
            }
            _ => self
                .sequence(object, "index_of")?
                .iter()
                .position(|item| values_equal(item, &needle)),
        };
        Ok(Value::Integer(index.map(|i| i as i64).unwrap_or(-1)))
    }

    /// .with_index() - `{ Index, Value }` records
    fn method_with_index(&self, object: &Value) -> Result<Value, EvalError> {
        let items = self.sequence(object, "with_index")?;
        Ok(Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    Value::Record(Record::anonymous(vec![
                        ("Index".to_string(), Value::Integer(i as i64)),
                        ("Value".to_string(), item.clone()),
                    ]))
                })
                .collect(),
        ))
    }

    fn method_string_unary(&self, object: &Value, method: &str) -> Result<Value, EvalError> {
        let s = expect_string(object, method)?;
        match method {
            "upper" => Ok(Value::String(s.to_uppercase())),
            "lower" => Ok(Value::String(s.to_lowercase())),
            "trim" => Ok(Value::String(s.trim().to_string())),
            "trim_start" => Ok(Value::String(s.trim_start().to_string())),
            "trim_end" => Ok(Value::String(s.trim_end().to_string())),
            "words" => Ok(Value::Array(
                s.split_whitespace().map(Value::from).collect(),
            )),
            "chars" => Ok(Value::Array(
                s.chars().map(|c| Value::String(c.to_string())).collect(),
            )),
            "parse_int" => parse_int(s),
            _ => parse_float(s),
        }
    }

    fn method_split(
        &self,
        object: &Value,
        separator: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let s = expect_string(object, "split")?;
        let separator = self.string_arg(separator, "split", ctx)?;
        if separator.is_empty() {
            return Ok(Value::Array(
                s.chars().map(|c| Value::String(c.to_string())).collect(),
            ));
        }
        Ok(Value::Array(
            s.split(separator.as_str()).map(Value::from).collect(),
        ))
    }

    fn method_affix(
        &self,
        object: &Value,
        method: &str,
        affix: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let s = expect_string(object, method)?;
        let affix = self.string_arg(affix, method, ctx)?;
        let result = if method.starts_with("starts") {
            s.starts_with(affix.as_str())
        } else {
            s.ends_with(affix.as_str())
        };
        Ok(Value::Boolean(result))
    }

    fn regex_arg(
        &self,
        pattern: &Expr,
        method: &str,
        ctx: EvalContext<'_>,
    ) -> Result<Regex, EvalError> {
        let pattern = self.string_arg(pattern, method, ctx)?;
        Regex::new(&pattern).map_err(|e| EvalError::Regex(e.to_string()))
    }

    /// .matches(pattern), .captures(pattern) and .find_all(pattern)
    fn method_regex(
        &self,
        object: &Value,
        method: &str,
        pattern: &Expr,
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let s = expect_string(object, method)?;
        let re = self.regex_arg(pattern, method, ctx)?;
        match method {
            "matches" => Ok(Value::Boolean(re.is_match(s))),
            "find_all" => Ok(Value::Array(
                re.find_iter(s).map(|m| Value::from(m.as_str())).collect(),
            )),
            _ => {
                let Some(caps) = re.captures(s) else {
                    return Ok(Value::Array(vec![]));
                };
                if caps.len() == 1 {
                    return Ok(Value::Array(vec![Value::from(&caps[0])]));
                }
                Ok(Value::Array(
                    caps.iter()
                        .skip(1)
                        .map(|group| group.map(|m| Value::from(m.as_str())).unwrap_or(Value::Null))
                        .collect(),
                ))
            }
        }
    }

    /// .replace(from, to) is literal; .re_replace(pattern, replacement)
    /// expands `$1`-style group references
    fn method_replace(
        &self,
        object: &Value,
        method: &str,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let s = expect_string(object, method)?;
        let replacement = self.string_arg(&args[1], method, ctx)?;
        if method == "replace" {
            let from = self.string_arg(&args[0], method, ctx)?;
            if from.is_empty() {
                return Ok(Value::String(s.to_string()));
            }
            return Ok(Value::String(s.replace(from.as_str(), &replacement)));
        }
        let re = self.regex_arg(&args[0], method, ctx)?;
        Ok(Value::String(
            re.replace_all(s, replacement.as_str()).into_owned(),
        ))
    }

    /// .substring(start) / .substring(start, length), in characters
    fn method_substring(
        &self,
        object: &Value,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let s = expect_string(object, "substring")?;
        let chars: Vec<char> = s.chars().collect();
        let start = self.int_arg(&args[0], "substring", ctx)?;
        let start = if start == chars.len() as i64 {
            chars.len()
        } else {
            resolve_index(start, chars.len()).ok_or_else(|| {
                EvalError::AccessError(format!(
                    "substring() start {} is out of range for string of length {}",
                    start,
                    chars.len()
                ))
            })?
        };
        let end = match args.get(1) {
            None => chars.len(),
            Some(length) => {
                let length = self.int_arg(length, "substring", ctx)?;
                let end = usize::try_from(length)
                    .ok()
                    .and_then(|length| start.checked_add(length));
                let Some(end) = end.filter(|end| *end <= chars.len()) else {
                    return Err(EvalError::AccessError(format!(
                        "substring() length {} is out of range from index {} of a string of length {}",
                        length,
                        start,
                        chars.len()
                    )));
                };
                end
            }
        };
        Ok(Value::String(chars[start..end].iter().collect()))
    }

    fn method_pad(
        &self,
        object: &Value,
        method: &str,
        args: &[Expr],
        ctx: EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        let s = expect_string(object, method)?;
        let width = self.int_arg(&args[0], method, ctx)?.max(0) as usize;
        let fill = match args.get(1) {
            Some(arg) => {
                let fill = self.string_arg(arg, method, ctx)?;
                let mut chars = fill.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => {
                        return Err(EvalError::TypeError(format!(
                            "{}() fill must be a single character",
                            method
                        )));
                    }
                }
            }
            None => ' ',
        };
        let len = s.chars().count();
        if len >= width {
            return Ok(Value::String(s.to_string()));
        }
        let padding: String = std::iter::repeat_n(fill, width - len).collect();
        Ok(Value::String(if method == "pad_left" {
            padding + s
        } else {
            format!("{}{}", s, padding)
        }))
    }

    fn method_keys_values(&self, object: &Value, method: &str) -> Result<Value, EvalError> {
        match object {
            Value::Record(record) => Ok(Value::Array(
                record
                    .fields
                    .iter()
                    .map(|(name, value)| {
                        if method == "keys" {
                            Value::String(name.clone())
                        } else {
                            value.clone()
                        }
                    })
                    .collect(),
            )),
            other => Err(EvalError::TypeError(format!(
                "{}() requires a record, got {}",
                method,
                other.type_name()
            ))),
        }
    }
}

fn arity_text(signature: &Signature) -> String {
    if signature.min_args == signature.max_args {
        signature.min_args.to_string()
    } else {
        format!("{} to {}", signature.min_args, signature.max_args)
    }
}

fn expect_string<'v>(object: &'v Value, method: &str) -> Result<&'v str, EvalError> {
    match object {
        Value::String(s) => Ok(s),
        other => Err(EvalError::TypeError(format!(
            "{}() requires a string, got {}",
            method,
            other.type_name()
        ))),
    }
}

fn expect_int(value: &Value, what: &str) -> Result<i64, EvalError> {
    value.as_int().ok_or_else(|| {
        EvalError::TypeError(format!(
            "{} must be an integer, got {}",
            what,
            value.type_name()
        ))
    })
}

fn expect_count(value: &Value, what: &str) -> Result<usize, EvalError> {
    let n = expect_int(value, what)?;
    usize::try_from(n)
        .map_err(|_| EvalError::TypeError(format!("{} cannot be negative, got {}", what, n)))
}

fn parse_int(s: &str) -> Result<Value, EvalError> {
    s.trim()
        .parse::<i64>()
        .map(Value::Integer)
        .map_err(|_| EvalError::Conversion(format!("\"{}\" is not a valid integer", s)))
}

fn parse_float(s: &str) -> Result<Value, EvalError> {
    s.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| EvalError::Conversion(format!("\"{}\" is not a valid number", s)))
}
