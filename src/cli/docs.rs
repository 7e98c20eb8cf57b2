//! Documentation content for the lineq CLI

use super::CliError;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Syntax,
    Queries,
    Operators,
    ArrayMethods,
    StringMethods,
    Helpers,
    Output,
}

impl DocCategory {
    /// Parse category name from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "syntax" => Some(Self::Syntax),
            "queries" | "query" | "from" => Some(Self::Queries),
            "operators" | "ops" => Some(Self::Operators),
            "array_methods" | "array" | "arrays" => Some(Self::ArrayMethods),
            "string_methods" | "string" | "strings" => Some(Self::StringMethods),
            "helpers" | "helper" | "records" => Some(Self::Helpers),
            "output" | "format" | "formatting" => Some(Self::Output),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r##"LINEQ DOCUMENTATION

lineq runs an ad-hoc query over a list of text lines and prints the result as
new lines. The query is an expression over `lines`, the input as an array of
strings. Optional helper code adds functions, fields and record types the
query can use.

DOCUMENTATION CATEGORIES

  syntax            Literals, names, member access, indexing and calls
  queries           from / where / let / orderby / select / group comprehensions
  operators         Arithmetic, comparison, logical and null-coalescing operators
  array-methods     Filter, map, aggregate and reshape arrays
  string-methods    Text manipulation, regular expressions and parsing
  helpers           fn, let and record members in the helper code
  output            How results are turned into output lines

QUICK REFERENCE

  lines                          Input lines
  from l in lines select l       Comprehension
  lines.filter(@.len() > 3)      @ is the current element
  lines.map(l => l.upper())      Named lambda parameter
  { Line: l, Len: l.len() }      Anonymous record

Run 'lineq doc <category>' for detailed documentation.
"##
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<&'static str, CliError> {
    match DocCategory::from_str(name) {
        Some(DocCategory::Syntax) => Ok(SYNTAX_DOC),
        Some(DocCategory::Queries) => Ok(QUERIES_DOC),
        Some(DocCategory::Operators) => Ok(OPERATORS_DOC),
        Some(DocCategory::ArrayMethods) => Ok(ARRAY_METHODS_DOC),
        Some(DocCategory::StringMethods) => Ok(STRING_METHODS_DOC),
        Some(DocCategory::Helpers) => Ok(HELPERS_DOC),
        Some(DocCategory::Output) => Ok(OUTPUT_DOC),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

const SYNTAX_DOC: &str = r##"SYNTAX - Expressions

LITERALS
  42   3.5   "text"   'text'   true   false   null
  [1, 2, 3]                 Array
  { Name: "x", Size: 2 }    Anonymous record

NAMES
  lines       The input lines (only inside the query itself)
  limit       A field declared in the helpers with `let`
  l           A comprehension variable or lambda parameter
  @           The current element inside a method argument

ACCESS
  rec.Name        Record field
  parts[0]        Array element; negative indices count from the end
  l[0]            Character of a string, as a one-character string
  rec["Name"]     Record field by name

CALLS
  l.trim()            Method call
  is_comment(l)       Helper function
  Entry(1, "x")       Record constructor
  range(0, 5)         Built-in function: range, repeat, str, int, float

CONDITIONALS
  if l.len() > 80 then l.substring(0, 80) else l

COMMENTS
  // to the end of the line
"##;

const QUERIES_DOC: &str = r##"QUERIES - Comprehensions

FORM
  from x in source
      [from y in source2]
      [where condition]
      [let name = expr]
      [orderby key [ascending|descending], ...]
  select expr | group expr by key

EXAMPLES
  Identity:
    from l in lines select l

  Filter and transform:
    from l in lines where l.startswith("ERROR") select l.substring(6)

  Sort by length, longest first:
    from l in lines orderby l.len() descending select l

  Cross product:
    from a in lines from b in lines where a < b select a + "," + b

  Group by first word:
    from l in lines group l by l.words().first()
    Output: { Key = GET, Elements = [GET /a, GET /b] }

NOTES
  - Groups keep the order in which their keys first appear
  - `orderby` is stable
"##;

const OPERATORS_DOC: &str = r##"OPERATORS

ARITHMETIC
  + - * / %
    Integer overflow and integer division by zero are runtime errors.
    Exact integer division stays an integer: 6 / 3 = 2, 7 / 2 = 3.5
    Mixed integer/float arithmetic is exact where possible: 3 * 0.1 = 0.3

STRING CONCATENATION
  "n=" + 3        "n=3" (either side being a string concatenates)

COMPARISON
  == != < > <= >=
    1 == 1.0 is true. Ordering works on numbers, strings and booleans.

LOGICAL
  and  or  not  !
    Short-circuiting. Conditions use truthiness: null, false, 0, "" and []
    are false.

NULL COALESCING
  l.captures("id=(\\d+)").first() ?? "none"

PRECEDENCE (lowest first)
  ??  or  and  comparisons  + -  * / %  unary  postfix
"##;

const ARRAY_METHODS_DOC: &str = r##"ARRAY METHODS

Arguments that take a selector or predicate accept `x => expr` or an
expression using `@`. On a group, these act on its Elements.

FILTERING
  filter(p) / where(p)        Elements matching p
  take(n)  skip(n)            First n / all but the first n
  take_while(p)  skip_while(p)
  unique() / distinct()       First occurrence of each value

TRANSFORMING
  map(f) / select(f)          Apply f to each element
  flat_map(f) / select_many(f)
  flatten()                   One level
  reverse()
  with_index()                { Index = i, Value = v } records

SORTING
  sort() / order_by(key)              Ascending, stable
  sort_desc() / order_by_desc(key)    Descending

GROUPING
  group_by(key)  group_by(key, element)

AGGREGATES
  count()  count(p)   len() / length()
  sum()  sum(f)   min()  max()  avg()     null for an empty array (except sum)
  any()  any(p)   all(p)
  first()  first(p)   last()  last(p)     null when nothing matches

OTHER
  join(sep)        Concatenate elements as text
  contains(v)      index_of(v)
"##;

const STRING_METHODS_DOC: &str = r##"STRING METHODS

CASE AND WHITESPACE
  upper()  lower()  trim()  trim_start()  trim_end()

SPLITTING
  split(sep)      "a,b".split(",") = [a, b]; an empty separator splits characters
  words()         Split on whitespace
  chars()

INSPECTION
  len() / length()        In characters
  contains(s)  startswith(s) / starts_with(s)  endswith(s) / ends_with(s)
  index_of(s)             Character index, -1 when absent

SLICING AND PADDING
  substring(start)  substring(start, length)
  pad_left(width)  pad_left(width, "0")  pad_right(width)
  reverse()

REGULAR EXPRESSIONS
  matches(re)             Whether re matches anywhere
  captures(re)            Groups of the first match ([] when none)
  find_all(re)            Every match
  re_replace(re, with)    $1, $name refer to groups
  replace(from, to)       Literal replacement

CONVERSION
  parse_int()  parse_float()   Runtime error when the text is not a number
  to_string()  type()  is_null()
"##;

const HELPERS_DOC: &str = r##"HELPERS - Extra members for the query

The helper code is added to the same unit as the query, so everything it
declares can be used from the query.

FUNCTIONS
  fn is_comment(l) = l.trim().startswith("#");
  fn label(l) { return "[" + l + "]"; }

FIELDS
  let limit = 80;
    Evaluated once per run, in declaration order, before the query.

RECORDS
  record Entry(level, text);
  record Pair(key, value) {
      fn display(self) = self.key + " => " + self.value;
  }
    Construct with Entry("WARN", l). A `display` method controls how the
    record is printed; other methods are called as value.method(args).

EXAMPLE
  Query:    lines.filter(not is_comment(@)).map(label(@))
  Helpers:  fn is_comment(l) = l.startswith("#");
            fn label(l) = "[" + l + "]";
"##;

const OUTPUT_DOC: &str = r##"OUTPUT - From result to lines

  Array of strings        Each string is one output line, unchanged
  Other array             One line per element, formatted as below
  Anything else           A single line

ELEMENT FORMATTING
  null                    null
  numbers, booleans       Their natural form
  strings                 Verbatim
  nested arrays           [a, b, c]
  anonymous records       { Name = value, ... }
  records with display    The output of display(self)
  other records, groups   { Field = value, ... } with each value formatted again

ERRORS
  Compile errors list every problem with two lines of context either side,
  numbered as in the generated unit (see 'lineq source').
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_accept_aliases() {
        assert_eq!(DocCategory::from_str("array-methods"), Some(DocCategory::ArrayMethods));
        assert_eq!(DocCategory::from_str("Records"), Some(DocCategory::Helpers));
        assert!(get_doc_category("nope").is_err());
    }

    #[test]
    fn helpers_doc_keeps_hash_examples() {
        let text = get_doc_category("helpers").unwrap();
        assert!(text.contains(r##"startswith("#")"##));
        assert!(text.trim_end().ends_with(r#"fn label(l) = "[" + l + "]";"#));
    }
}
