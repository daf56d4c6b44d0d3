//! Unconditional probability tables over discrete values

use super::{ContinuousDistribution, DensityFunction, ProbDistribution, PROB_TOLERANCE};
use crate::util::{DialnetError, Result};
use crate::value::Value;
use crate::variable::Assignment;

use indexmap::IndexMap;
use rand::{Rng, RngCore};

use std::fmt;


/// A table mapping each value of a variable to its probability.
///
/// The table always sums to 1 (within `PROB_TOLERANCE`). Rows are kept in insertion order.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoricalTable {
    variable: String,
    table: IndexMap<Value, f64>
}

impl CategoricalTable {

    /// Construct a table from explicit rows. Rows for the same value are accumulated.
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if a probability is negative or the rows do
    ///   not sum to 1
    pub fn new<S: Into<String>>(variable: S, rows: Vec<(Value, f64)>) -> Result<Self> {
        let variable = variable.into();
        let mut table = IndexMap::new();
        for (value, prob) in rows {
            *table.entry(value).or_insert(0.0) += prob;
        }

        let total = check_rows(&variable, &table)?;
        if (total - 1.0).abs() > PROB_TOLERANCE {
            return Err(DialnetError::MalformedDistribution(variable,
                                                           format!("total mass is {}", total)));
        }

        Ok(CategoricalTable { variable, table })
    }

    /// Start building a table row by row
    pub fn builder<S: Into<String>>(variable: S) -> CategoricalTableBuilder {
        CategoricalTableBuilder { variable: variable.into(), table: IndexMap::new() }
    }

    /// Table with a single value of probability 1
    pub fn degenerate<S: Into<String>, V: Into<Value>>(variable: S, value: V) -> Self {
        let mut table = IndexMap::new();
        table.insert(value.into(), 1.0);
        CategoricalTable { variable: variable.into(), table }
    }

    /// Uniform table over the given values
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if no value is given
    pub fn uniform<S: Into<String>>(variable: S, values: Vec<Value>) -> Result<Self> {
        let variable = variable.into();
        if values.is_empty() {
            return Err(DialnetError::MalformedDistribution(variable, String::from("no values")));
        }

        let mut table = IndexMap::new();
        for v in values {
            table.insert(v, 0.0);
        }
        let p = 1.0 / table.len() as f64;
        table.values_mut().for_each(|x| *x = p);

        Ok(CategoricalTable { variable, table })
    }

    /// Get the variable of the table
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Probability of a value, 0 if the value is not in the table
    pub fn prob(&self, value: &Value) -> f64 {
        self.table.get(value).copied().unwrap_or(0.0)
    }

    /// Iterate over the rows of the table
    pub fn rows(&self) -> impl Iterator<Item = (&Value, f64)> {
        self.table.iter().map(|(v, p)| (v, *p))
    }

    /// The values listed in the table
    pub fn values(&self) -> Vec<Value> {
        self.table.keys().cloned().collect()
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always false: a valid table has at least one row
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The most likely value. Ties go to the earliest row.
    pub fn best(&self) -> &Value {
        let mut best = None;
        for (v, p) in self.table.iter() {
            match best {
                Some((_, bp)) if *p <= bp => (),
                _ => best = Some((v, *p))
            }
        }
        best.map(|(v, _)| v).unwrap_or(&Value::None)
    }

    /// Draw a value from the table
    pub fn draw(&self, rng: &mut dyn RngCore) -> Value {
        let r: f64 = rng.gen::<f64>();
        let mut acc = 0.0;
        let mut last = &Value::None;
        for (v, p) in self.table.iter() {
            if *p <= 0.0 {
                continue;
            }
            acc += p;
            last = v;
            if r < acc {
                return v.clone();
            }
        }
        last.clone()
    }

    /// Read the table as a density over doubles, with one kernel per row weighted by its
    /// probability.
    ///
    /// # Errors
    /// * `DialnetError::NotContinuous` if some value is not a double
    pub fn to_continuous(&self) -> Result<ContinuousDistribution> {
        let mut points = Vec::with_capacity(self.table.len());
        let mut weights = Vec::with_capacity(self.table.len());
        for (v, p) in self.table.iter() {
            match v.as_double() {
                Some(d) => {
                    points.push(d);
                    weights.push(*p);
                },
                None => return Err(DialnetError::NotContinuous(self.variable.clone()))
            }
        }

        let density = DensityFunction::weighted_kernel(points, weights)?;
        Ok(ContinuousDistribution::new(self.variable.clone(), density))
    }
}

impl ProbDistribution for CategoricalTable {

    fn variable(&self) -> &str {
        &self.variable
    }

    fn sample(&self, _condition: &Assignment, rng: &mut dyn RngCore) -> Result<Value> {
        Ok(self.draw(rng))
    }

    fn prob(&self, _condition: &Assignment, value: &Value) -> f64 {
        CategoricalTable::prob(self, value)
    }

    fn values(&self, _condition: &Assignment) -> Result<Vec<Value>> {
        Ok(self.table.iter().filter(|(_, p)| **p > 0.0).map(|(v, _)| v.clone()).collect())
    }
}

impl fmt::Display for CategoricalTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lines: Vec<String> = self.table
                                     .iter()
                                     .map(|(v, p)| format!("P({}={}):={:.4}", self.variable, v, p))
                                     .collect();
        write!(f, "{}", lines.join("\n"))
    }
}


/// Incremental construction of a `CategoricalTable`.
#[derive(Clone, Debug)]
pub struct CategoricalTableBuilder {
    variable: String,
    table: IndexMap<Value, f64>
}

impl CategoricalTableBuilder {

    /// Add probability mass to a value
    pub fn add_row<V: Into<Value>>(mut self, value: V, prob: f64) -> Self {
        *self.table.entry(value.into()).or_insert(0.0) += prob;
        self
    }

    /// Build the table. Missing mass is assigned to `Value::None`.
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if a probability is negative or the total
    ///   exceeds 1
    pub fn build(mut self) -> Result<CategoricalTable> {
        let total = check_rows(&self.variable, &self.table)?;
        if total > 1.0 + PROB_TOLERANCE {
            return Err(DialnetError::MalformedDistribution(self.variable,
                                                           format!("total mass is {}", total)));
        }

        if total < 1.0 - PROB_TOLERANCE {
            *self.table.entry(Value::None).or_insert(0.0) += 1.0 - total;
        }

        Ok(CategoricalTable { variable: self.variable, table: self.table })
    }

    /// Build the table, rescaling the rows to sum to 1
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if a probability is negative or all rows are 0
    pub fn build_normalised(mut self) -> Result<CategoricalTable> {
        let total = check_rows(&self.variable, &self.table)?;
        if total <= 0.0 {
            return Err(DialnetError::MalformedDistribution(self.variable,
                                                           String::from("zero total mass")));
        }

        self.table.values_mut().for_each(|p| *p /= total);
        Ok(CategoricalTable { variable: self.variable, table: self.table })
    }
}


fn check_rows(variable: &str, table: &IndexMap<Value, f64>) -> Result<f64> {
    let mut total = 0.0;
    for (v, p) in table.iter() {
        if !p.is_finite() || *p < 0.0 {
            return Err(DialnetError::MalformedDistribution(String::from(variable),
                                                           format!("P({})={}", v, p)));
        }
        total += p;
    }
    Ok(total)
}
