use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically-typed value used on both sides of an assertion.
///
/// Maps and object fields are insertion-ordered pair vectors, not sorted
/// maps. The JSON and serialized equivalence checks compare rendered text,
/// so two structurally equal values built in different field order do not
/// compare equal. That is a documented property of those checks, inherited
/// from the wire format, and callers relying on structural equality should
/// normalize their construction order.
///
/// # Examples
///
/// ```rust
/// use tapkit::value::Value;
/// let n = Value::Int(42);
/// assert_eq!(n.type_name(), "int");
/// let s = Value::from("hello");
/// assert_eq!(s.type_name(), "string");
/// assert!(Value::Null.is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Map(Vec<(String, Value)>),
    Object {
        class: String,
        fields: Vec<(String, Value)>,
    },
    Callable(String),
}

impl Value {
    /// Returns the category tag of the value.
    ///
    /// The tags form a closed set: `null`, `bool`, `int`, `float`,
    /// `string`, `seq`, `map`, `object`, `callable`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
            Value::Object { .. } => "object",
            Value::Callable(_) => "callable",
        }
    }

    /// Returns true if the value is Null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the contained integer if this is an Int value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the contained bool if this is a Bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the contained string if this is a Str value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Loose equality: mixed Int/Float pairs compare numerically, all other
    /// cross-variant pairs are unequal, same-variant pairs compare strictly.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            _ => self == other,
        }
    }

    /// Loose ordering: defined for numeric pairs (Int/Float mixed),
    /// Str/Str and Bool/Bool. Everything else is unordered, and every
    /// ordering comparison on an unordered pair fails.
    pub fn loose_cmp(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Renders the value as plain untagged JSON.
    ///
    /// Objects render their fields as a JSON object (the class name is not
    /// part of the encoding), callables render as a `"callable:<name>"`
    /// string, and non-finite floats render as null.
    pub fn to_json(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out);
        out
    }

    // Walks the value directly instead of going through serde_json::Value,
    // whose object representation sorts keys and would erase entry order.
    fn write_json(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(f) => out.push_str(&serde_json::Value::from(*f).to_string()),
            Value::Str(s) => out.push_str(&serde_json::Value::String(s.clone()).to_string()),
            Value::Seq(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_json(out);
                }
                out.push(']');
            }
            Value::Map(pairs) | Value::Object { fields: pairs, .. } => {
                out.push('{');
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&serde_json::Value::String(k.clone()).to_string());
                    out.push(':');
                    v.write_json(out);
                }
                out.push('}');
            }
            Value::Callable(name) => {
                out.push_str(&serde_json::Value::String(format!("callable:{}", name)).to_string())
            }
        }
    }

    /// Renders the value in its full-fidelity tagged encoding.
    ///
    /// Unlike [`Value::to_json`], this preserves every distinction the type
    /// system makes: `Int(1)` and `Float(1.0)` encode differently, object
    /// class names are kept, and map entry order is preserved. Used by the
    /// serialized-equivalence assertion.
    pub fn to_serialized(&self) -> String {
        // Serialization of plain data variants cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Callable(name) => write!(f, "callable:{}", name),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

/// Explicit supertype/interface relations for object classes.
///
/// Type checks never reflect over live values. A class participates in
/// supertype matching only through relations registered here, so the set of
/// names a value can match is always known statically.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    parents: BTreeMap<String, Vec<String>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the direct supertypes and implemented interfaces of a class.
    /// Repeated calls extend the existing relation.
    pub fn register(
        &mut self,
        class: impl Into<String>,
        supertypes: impl IntoIterator<Item = impl Into<String>>,
    ) {
        let entry = self.parents.entry(class.into()).or_default();
        for s in supertypes {
            entry.push(s.into());
        }
    }

    /// Transitive subtype test. Matching is exact-case: `is_a("Foo", "foo")`
    /// is false even when `Foo` is registered.
    pub fn is_a(&self, class: &str, want: &str) -> bool {
        if class == want {
            return true;
        }
        let Some(parents) = self.parents.get(class) else {
            return false;
        };
        parents.iter().any(|p| self.is_a(p, want))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_are_the_closed_tag_set() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Bool(true).type_name(), "bool");
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::Float(1.0).type_name(), "float");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::Seq(vec![]).type_name(), "seq");
        assert_eq!(Value::Map(vec![]).type_name(), "map");
        assert_eq!(Value::Callable("f".into()).type_name(), "callable");
    }

    #[test]
    fn strict_equality_distinguishes_int_and_float() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
        assert!(!Value::Str("1".into()).loose_eq(&Value::Int(1)));
    }

    #[test]
    fn loose_ordering_covers_numbers_strings_bools() {
        use std::cmp::Ordering;
        assert_eq!(
            Value::Int(1).loose_cmp(&Value::Float(2.0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("b").loose_cmp(&Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(1).loose_cmp(&Value::from("1")), None);
    }

    #[test]
    fn json_is_untagged_and_order_preserving() {
        let v = Value::Map(vec![
            ("b".into(), Value::Int(2)),
            ("a".into(), Value::Int(1)),
        ]);
        assert_eq!(v.to_json(), r#"{"b":2,"a":1}"#);
    }

    #[test]
    fn serialized_form_distinguishes_numeric_variants() {
        assert_ne!(
            Value::Int(1).to_serialized(),
            Value::Float(1.0).to_serialized()
        );
        assert_eq!(Value::Int(1).to_json(), "1");
    }

    #[test]
    fn registry_resolves_transitive_supertypes() {
        let mut reg = TypeRegistry::new();
        reg.register("Dog", ["Animal"]);
        reg.register("Animal", ["LivingThing"]);
        assert!(reg.is_a("Dog", "LivingThing"));
        assert!(reg.is_a("Dog", "Dog"));
        assert!(!reg.is_a("Dog", "dog"));
        assert!(!reg.is_a("Animal", "Dog"));
    }
}
