//! Distributions conditioned on the values of parent variables

use super::{CategoricalTable, CategoricalTableBuilder, ProbDistribution};
use crate::util::{DialnetError, Result};
use crate::value::Value;
use crate::variable::Assignment;

use indexmap::IndexMap;
use rand::RngCore;

use std::fmt;


/// One categorical table per assignment of the conditioning variables.
///
/// A condition that is not listed yields the degenerate distribution on `Value::None`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionalTable {
    variable: String,
    conditional_vars: Vec<String>,
    table: IndexMap<Assignment, CategoricalTable>
}

impl ConditionalTable {

    /// Start building a table row by row
    pub fn builder<S: Into<String>>(variable: S) -> ConditionalTableBuilder {
        ConditionalTableBuilder {
            variable: variable.into(),
            rows: IndexMap::new(),
            tables: IndexMap::new(),
            err: None
        }
    }

    /// Get the variable of the table
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The conditioning variables
    pub fn conditional_vars(&self) -> &[String] {
        &self.conditional_vars
    }

    /// The listed conditions
    pub fn conditions(&self) -> impl Iterator<Item = &Assignment> {
        self.table.keys()
    }

    /// The table for a condition. The condition may assign more variables than the
    /// conditioning ones.
    pub fn table_for(&self, condition: &Assignment) -> Option<&CategoricalTable> {
        let key = condition.restrict_to(&self.conditional_vars);
        self.table.get(&key)
    }
}

impl ProbDistribution for ConditionalTable {

    fn variable(&self) -> &str {
        &self.variable
    }

    fn sample(&self, condition: &Assignment, rng: &mut dyn RngCore) -> Result<Value> {
        Ok(self.table_for(condition).map_or(Value::None, |t| t.draw(rng)))
    }

    fn prob(&self, condition: &Assignment, value: &Value) -> f64 {
        match self.table_for(condition) {
            Some(t) => t.prob(value),
            None if value.is_none() => 1.0,
            None => 0.0
        }
    }

    fn values(&self, condition: &Assignment) -> Result<Vec<Value>> {
        match self.table_for(condition) {
            Some(t) => Ok(t.values()),
            None => Ok(vec![Value::None])
        }
    }
}

impl fmt::Display for ConditionalTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut lines = Vec::new();
        for (cond, t) in self.table.iter() {
            for (v, p) in t.rows() {
                lines.push(format!("P({}={} | {}):={:.4}", self.variable, v, cond, p));
            }
        }
        write!(f, "{}", lines.join("\n"))
    }
}


/// Incremental construction of a `ConditionalTable`. Errors are reported by `build`.
#[derive(Clone, Debug)]
pub struct ConditionalTableBuilder {
    variable: String,
    rows: IndexMap<Assignment, Vec<(Value, f64)>>,
    tables: IndexMap<Assignment, CategoricalTable>,
    err: Option<DialnetError>
}

impl ConditionalTableBuilder {

    /// Add a row `P(variable = value | condition) = prob`
    pub fn add_row<V: Into<Value>>(mut self, condition: Assignment, value: V, prob: f64) -> Self {
        self.rows.entry(condition).or_insert_with(Vec::new).push((value.into(), prob));
        self
    }

    /// Attach a complete table to a condition
    pub fn with_table(mut self, condition: Assignment, table: CategoricalTable) -> Self {
        if self.err.is_some() {
            return self;
        }

        if table.variable() != self.variable {
            self.err = Some(DialnetError::MalformedDistribution(
                self.variable.clone(),
                format!("table is defined over {}", table.variable())));
        } else {
            self.tables.insert(condition, table);
        }
        self
    }

    /// Build the table. Each conditional row is completed with `Value::None`.
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if a row is invalid, or the conditions do not
    ///   all cover the same variables
    pub fn build(self) -> Result<ConditionalTable> {
        if let Some(e) = self.err {
            return Err(e);
        }

        let mut table = self.tables;
        for (cond, row) in self.rows {
            let built = row.into_iter()
                           .fold(CategoricalTable::builder(self.variable.clone()),
                                 |b: CategoricalTableBuilder, (v, p)| b.add_row(v, p))
                           .build()?;
            table.insert(cond, built);
        }

        let conditional_vars: Vec<String> = table.keys()
                                                 .next()
                                                 .map(|c| c.variables().cloned().collect())
                                                 .unwrap_or_default();
        for cond in table.keys() {
            let same = cond.len() == conditional_vars.len()
                && conditional_vars.iter().all(|v| cond.contains_var(v));
            if !same {
                return Err(DialnetError::MalformedDistribution(
                    self.variable,
                    format!("condition {} does not cover the conditioning variables", cond)));
            }
        }

        Ok(ConditionalTable { variable: self.variable, conditional_vars, table })
    }
}


/// A distribution with a single value per assignment of the conditioning variables.
#[derive(Clone, Debug, PartialEq)]
pub struct DeterministicDistribution {
    variable: String,
    conditional_vars: Vec<String>,
    mapping: IndexMap<Assignment, Value>,
    default: Value
}

impl DeterministicDistribution {

    /// Construct a distribution that yields `default` for every condition
    pub fn new<S: Into<String>, V: Into<Value>>(variable: S, default: V) -> Self {
        DeterministicDistribution {
            variable: variable.into(),
            conditional_vars: Vec::new(),
            mapping: IndexMap::new(),
            default: default.into()
        }
    }

    /// Map a condition to a value
    pub fn with_mapping<V: Into<Value>>(mut self, condition: Assignment, value: V) -> Self {
        for var in condition.variables() {
            if !self.conditional_vars.contains(var) {
                self.conditional_vars.push(var.clone());
            }
        }
        self.mapping.insert(condition, value.into());
        self
    }

    /// The value given the condition
    pub fn value(&self, condition: &Assignment) -> &Value {
        let key = condition.restrict_to(&self.conditional_vars);
        self.mapping.get(&key).unwrap_or(&self.default)
    }
}

impl ProbDistribution for DeterministicDistribution {

    fn variable(&self) -> &str {
        &self.variable
    }

    fn sample(&self, condition: &Assignment, _rng: &mut dyn RngCore) -> Result<Value> {
        Ok(self.value(condition).clone())
    }

    fn prob(&self, condition: &Assignment, value: &Value) -> f64 {
        if self.value(condition) == value { 1.0 } else { 0.0 }
    }

    fn values(&self, condition: &Assignment) -> Result<Vec<Value>> {
        Ok(vec![self.value(condition).clone()])
    }
}

impl fmt::Display for DeterministicDistribution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut lines: Vec<String> = self.mapping
                                         .iter()
                                         .map(|(c, v)| format!("{}={} | {}", self.variable, v, c))
                                         .collect();
        lines.push(format!("{}={} otherwise", self.variable, self.default));
        write!(f, "{}", lines.join("\n"))
    }
}
