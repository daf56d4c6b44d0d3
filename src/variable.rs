//! Definition of the variable module
//!
//! A `Variable` is a discrete random variable together with the finite range of `Value`s it
//! may take. An `Assignment` maps variable names to values, and is the key of every table,
//! factor and sample in the library.

use crate::util::{DialnetError, Result};
use crate::value::Value;

use indexmap::IndexMap;
use itertools::Itertools;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;


/// A discrete random variable with an explicit, ordered value range.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    /// The name of the `Variable`
    name: String,

    /// The values the `Variable` can take. Duplicates are removed on construction.
    values: Vec<Value>
}

impl Variable {

    /// Construct a new `Variable` over the given values
    pub fn new<S: Into<String>>(name: S, values: Vec<Value>) -> Self {
        let values = values.into_iter().unique().collect();
        Variable { name: name.into(), values }
    }

    /// Construct a boolean `Variable`
    pub fn binary<S: Into<String>>(name: S) -> Self {
        Variable::new(name, vec![Value::Boolean(true), Value::Boolean(false)])
    }

    /// Get the name of the `Variable`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the range of the `Variable`
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The number of values in the range of the `Variable`
    pub fn cardinality(&self) -> usize {
        self.values.len()
    }

    /// Position of a value in the range of the `Variable`
    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }
}


/// An immutable mapping from variable names to values.
///
/// Iteration follows insertion order, which makes printing reproducible. Equality and hashing
/// ignore the order, so two assignments with the same pairs are the same table key.
#[derive(Clone, Debug, Default)]
pub struct Assignment {
    pairs: IndexMap<String, Value>
}

impl Assignment {

    /// Construct the empty `Assignment`
    pub fn new() -> Self {
        Assignment { pairs: IndexMap::new() }
    }

    /// Construct an `Assignment` with a single pair
    pub fn from_pair<S: Into<String>, V: Into<Value>>(var: S, value: V) -> Self {
        Assignment::new().with(var, value)
    }

    /// Extend the `Assignment` with a new pair, returning the extended copy. An existing value
    /// for the variable is overwritten.
    pub fn with<S: Into<String>, V: Into<Value>>(mut self, var: S, value: V) -> Self {
        self.pairs.insert(var.into(), value.into());
        self
    }

    /// In-place extension, reserved for the builders of a single algorithm step (samples,
    /// factor enumeration)
    pub(crate) fn add_pair(&mut self, var: &str, value: Value) {
        self.pairs.insert(String::from(var), value);
    }

    /// Get the value of a variable
    pub fn get(&self, var: &str) -> Option<&Value> {
        self.pairs.get(var)
    }

    /// Check if the variable is assigned
    pub fn contains_var(&self, var: &str) -> bool {
        self.pairs.contains_key(var)
    }

    /// The assigned variables, in insertion order
    pub fn variables(&self) -> impl Iterator<Item = &String> {
        self.pairs.keys()
    }

    /// Iterate over the pairs, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.pairs.iter()
    }

    /// The number of assigned variables
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if no variable is assigned
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Strict union of two assignments.
    ///
    /// # Errors
    /// * `DialnetError::InconsistentAssignment` if the assignments disagree on a shared variable
    pub fn union(&self, other: &Assignment) -> Result<Assignment> {
        let mut pairs = self.pairs.clone();
        for (var, value) in other.pairs.iter() {
            match pairs.get(var) {
                Some(existing) if existing != value => {
                    return Err(DialnetError::InconsistentAssignment(var.clone()));
                },
                Some(_) => (),
                None => {
                    pairs.insert(var.clone(), value.clone());
                }
            }
        }
        Ok(Assignment { pairs })
    }

    /// Restrict the `Assignment` to the given variables. Variables that are not assigned are
    /// ignored.
    pub fn restrict_to<I, S>(&self, vars: I) -> Assignment
        where I: IntoIterator<Item = S>,
              S: AsRef<str>
    {
        let vars: Vec<S> = vars.into_iter().collect();
        let pairs = self.pairs
                        .iter()
                        .filter(|(k, _)| vars.iter().any(|v| v.as_ref() == k.as_str()))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
        Assignment { pairs }
    }

    /// Copy of the `Assignment` without the given variable
    pub fn remove_variable(&self, var: &str) -> Assignment {
        let mut pairs = self.pairs.clone();
        pairs.shift_remove(var);
        Assignment { pairs }
    }

    /// Copy of the `Assignment` without the given variables
    pub fn remove_variables<I, S>(&self, vars: I) -> Assignment
        where I: IntoIterator<Item = S>,
              S: AsRef<str>
    {
        let mut pairs = self.pairs.clone();
        for v in vars {
            pairs.shift_remove(v.as_ref());
        }
        Assignment { pairs }
    }

    /// Check that the two assignments agree on every variable they share
    pub fn is_consistent_with(&self, other: &Assignment) -> bool {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.pairs
             .iter()
             .all(|(k, v)| large.pairs.get(k).map_or(true, |v2| v == v2))
    }

    /// Check that every pair of `other` is also in `self`
    pub fn contains_all(&self, other: &Assignment) -> bool {
        other.pairs.iter().all(|(k, v)| self.pairs.get(k) == Some(v))
    }
}

impl PartialEq for Assignment {
    fn eq(&self, other: &Assignment) -> bool {
        self.pairs == other.pairs
    }
}

impl Eq for Assignment {}

impl Hash for Assignment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut entries: Vec<(&String, &Value)> = self.pairs.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.hash(state);
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(" ^ "))
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let pairs = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Assignment { pairs }
    }
}


/// Enumerate the indices of every cell of a table with the given shape, in row-major order.
pub fn all_indices(shape: &[usize]) -> Vec<Vec<usize>> {
    if shape.is_empty() {
        return vec![vec![]];
    }

    shape.iter()
         .map(|&n| 0..n)
         .multi_cartesian_product()
         .collect()
}


/// Enumerate every full assignment of the given `Variable`s, in row-major order of their
/// value ranges. The empty scope has exactly one (empty) assignment.
pub fn all_assignments(scope: &[Variable]) -> Vec<Assignment> {
    let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();

    all_indices(&shape).into_iter()
                       .map(|idx| {
                           scope.iter()
                                .zip(idx.into_iter())
                                .map(|(v, i)| (v.name.clone(), v.values[i].clone()))
                                .collect::<Assignment>()
                       })
                       .collect()
}


// Unit Tests for Variable and Assignment
#[cfg(test)]
mod tests {

    use super::*;
    use std::collections::HashSet;

    #[test]
    fn variable() {
        let var = Variable::new("Foo", vec![Value::from("a"), Value::from("b"), Value::from("a")]);
        assert_eq!(var.name(), "Foo");
        assert_eq!(2, var.cardinality());
        assert_eq!(Some(1), var.index_of(&Value::from("b")));
        assert_eq!(None, var.index_of(&Value::from("c")));

        let var = Variable::binary("Bar");
        assert_eq!(Some(0), var.index_of(&Value::Boolean(true)));
    }

    #[test]
    fn union() {
        let a = Assignment::from_pair("A", true).with("B", "x");
        let b = Assignment::from_pair("B", "x").with("C", 1.5);

        let u = a.union(&b).expect("unexpected error");
        assert_eq!(3, u.len());
        assert_eq!(Some(&Value::Double(1.5)), u.get("C"));

        // contradictory evidence
        let c = Assignment::from_pair("A", false);
        match a.union(&c) {
            Err(DialnetError::InconsistentAssignment(var)) => assert_eq!("A", var),
            _ => panic!("expected an inconsistent assignment")
        };

        // override-union by restricting first
        let overridden = a.remove_variables(c.variables()).union(&c).expect("unexpected error");
        assert_eq!(Some(&Value::Boolean(false)), overridden.get("A"));
    }

    #[test]
    fn restrict_and_remove() {
        let a = Assignment::from_pair("A", true).with("B", "x").with("C", 2);

        let r = a.restrict_to(&["C", "A", "D"]);
        assert_eq!(2, r.len());
        assert_eq!(vec!["A", "C"], r.variables().map(|s| s.as_str()).collect::<Vec<_>>());

        let r = a.remove_variable("B");
        assert!(! r.contains_var("B"));
        assert_eq!(3, a.len());
    }

    #[test]
    fn consistency() {
        let a = Assignment::from_pair("A", true).with("B", "x");
        assert!(a.is_consistent_with(&Assignment::from_pair("B", "x").with("Z", 0)));
        assert!(a.is_consistent_with(&Assignment::new()));
        assert!(! a.is_consistent_with(&Assignment::from_pair("B", "y")));
        assert!(a.contains_all(&Assignment::from_pair("B", "x")));
        assert!(! a.contains_all(&Assignment::from_pair("Z", 0)));
    }

    #[test]
    fn equality_ignores_order() {
        let a = Assignment::from_pair("A", true).with("B", "x");
        let b = Assignment::from_pair("B", "x").with("A", true);
        assert_eq!(a, b);

        let set: HashSet<Assignment> = vec![a.clone(), b].into_iter().collect();
        assert_eq!(1, set.len());

        // but printing follows insertion order
        assert_eq!("A=true ^ B=x", a.to_string());
    }

    #[test]
    fn enumerate() {
        let scope = vec![
            Variable::binary("A"),
            Variable::new("B", vec![Value::from(1), Value::from(2), Value::from(3)])
        ];
        let all = all_assignments(&scope);
        assert_eq!(6, all.len());
        assert_eq!(Assignment::from_pair("A", true).with("B", 1), all[0]);
        assert_eq!(Assignment::from_pair("A", false).with("B", 3), all[5]);

        assert_eq!(vec![Assignment::new()], all_assignments(&[]));
        assert_eq!(vec![vec![0usize, 0], vec![0, 1]], all_indices(&[1, 2]));
    }
}
