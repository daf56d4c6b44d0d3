//! Definition of the value module
//!
//! A `Value` is what a random variable takes when it is assigned. Values are immutable and
//! totally ordered, so they can be used as keys of tables and compared structurally.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A tagged union over the value kinds a variable may take.
#[derive(Clone, Debug)]
pub enum Value {

    /// The absence of a value
    None,

    /// A boolean value
    Boolean(bool),

    /// A floating point value
    Double(f64),

    /// A string value
    String(String),

    /// A fixed-size vector of doubles (e.g. a draw from a Dirichlet density)
    Array(Vec<f64>),

    /// An ordered list of values
    Sequence(Vec<Value>),

    /// An unordered set of values
    Set(BTreeSet<Value>),

    /// A structured value, made of named attributes
    Relational(BTreeMap<String, Value>)
}

impl Value {

    /// Create a `Value` from its string representation.
    ///
    /// `true`/`false` become booleans, numeric literals become doubles, `None` is the empty
    /// value and `[a,b,...]` is parsed as a set of values. Anything else is a string.
    pub fn parse(s: &str) -> Value {
        let s = s.trim();

        if s.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        } else if s.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        } else if s == "None" || s == "none" {
            return Value::None;
        }

        let numeric = s.chars().next().map_or(false, |c| c.is_ascii_digit() || c == '-' || c == '.');
        if numeric {
            if let Ok(d) = s.parse::<f64>() {
                return Value::Double(d);
            }
        }

        if s.len() >= 2 && s.starts_with('[') && s.ends_with(']') {
            let inner = &s[1..s.len() - 1];
            let set: BTreeSet<Value> = inner.split(',')
                                            .map(str::trim)
                                            .filter(|e| !e.is_empty())
                                            .map(Value::parse)
                                            .collect();
            return Value::Set(set);
        }

        Value::String(String::from(s))
    }

    /// Check if this is the empty `Value`
    pub fn is_none(&self) -> bool {
        match self {
            Value::None => true,
            _ => false
        }
    }

    /// The double content of the `Value`, if any
    pub fn as_double(&self) -> Option<f64> {
        match *self {
            Value::Double(d) => Some(d),
            _ => None
        }
    }

    /// The boolean content of the `Value`, if any
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(b) => Some(b),
            _ => None
        }
    }

    /// The string content of the `Value`, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None
        }
    }

    /// Check whether the `Value` contains another one. Defined for collections (membership)
    /// and strings (substring).
    pub fn contains(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Set(s), v) => s.contains(v),
            (Value::Sequence(s), v) => s.contains(v),
            (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
            (Value::Array(a), Value::Double(d)) => a.iter().any(|x| x.total_cmp(d) == Ordering::Equal),
            _ => false
        }
    }

    /// Rank of the value kind, used to order values of different kinds
    fn rank(&self) -> u8 {
        match self {
            Value::None => 0,
            Value::Boolean(_) => 1,
            Value::Double(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Sequence(_) => 5,
            Value::Set(_) => 6,
            Value::Relational(_) => 7
        }
    }
}

fn cmp_doubles(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
     .zip(b.iter())
     .map(|(x, y)| x.total_cmp(y))
     .find(|o| *o != Ordering::Equal)
     .unwrap_or_else(|| a.len().cmp(&b.len()))
}

impl Ord for Value {
    fn cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::None, Value::None) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => cmp_doubles(a, b),
            (Value::Sequence(a), Value::Sequence(b)) => a.cmp(b),
            (Value::Set(a), Value::Set(b)) => a.cmp(b),
            (Value::Relational(a), Value::Relational(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank())
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

// Doubles hash by bit pattern, which agrees with `total_cmp` equality
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::None => (),
            Value::Boolean(b) => b.hash(state),
            Value::Double(d) => d.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Array(a) => {
                a.len().hash(state);
                for d in a {
                    d.to_bits().hash(state);
                }
            },
            Value::Sequence(s) => s.hash(state),
            Value::Set(s) => s.hash(state),
            Value::Relational(r) => r.hash(state)
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Double(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(a) => {
                let parts: Vec<String> = a.iter().map(|d| d.to_string()).collect();
                write!(f, "[{}]", parts.join(","))
            },
            Value::Sequence(s) => {
                let parts: Vec<String> = s.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(","))
            },
            Value::Set(s) => {
                let parts: Vec<String> = s.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(","))
            },
            Value::Relational(r) => {
                let parts: Vec<String> = r.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(","))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Value {
        Value::Double(d)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Value {
        Value::Double(f64::from(i))
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &'a str) -> Value {
        Value::String(String::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(s: Vec<Value>) -> Value {
        Value::Sequence(s)
    }
}
