//! Distributions represented by a collection of samples

use super::{CategoricalTable, ContinuousDistribution, DensityFunction, MultivariateTable};
use crate::util::{DialnetError, Result};
use crate::value::Value;
use crate::variable::Assignment;

use indexmap::IndexMap;

use std::fmt;


/// A distribution given by equally weighted samples, as returned by approximate inference.
#[derive(Clone, Debug, PartialEq)]
pub struct EmpiricalDistribution {
    variables: Vec<String>,
    samples: Vec<Assignment>
}

impl EmpiricalDistribution {

    pub fn new(samples: Vec<Assignment>) -> Self {
        let mut variables: Vec<String> = Vec::new();
        for s in samples.iter() {
            for var in s.variables() {
                if !variables.contains(var) {
                    variables.push(var.clone());
                }
            }
        }
        EmpiricalDistribution { variables, samples }
    }

    /// The variables covered by the samples
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn samples(&self) -> &[Assignment] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Fraction of the samples that agree with the assignment
    pub fn prob(&self, assignment: &Assignment) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let hits = self.samples.iter().filter(|s| s.contains_all(assignment)).count();
        hits as f64 / self.samples.len() as f64
    }

    /// Joint table of the sample frequencies
    ///
    /// # Errors
    /// * `DialnetError::InferenceFailure` if there are no samples
    pub fn to_table(&self) -> Result<MultivariateTable> {
        if self.samples.is_empty() {
            return Err(DialnetError::InferenceFailure(String::from("no samples")));
        }

        let mut counts: IndexMap<&Assignment, usize> = IndexMap::new();
        for s in self.samples.iter() {
            *counts.entry(s).or_insert(0) += 1;
        }

        let n = self.samples.len() as f64;
        MultivariateTable::from_rows(counts.into_iter().map(|(a, c)| (a.clone(), c as f64 / n)))
    }

    /// Table of the sample frequencies of a single variable
    ///
    /// # Errors
    /// * `DialnetError::UnknownNode` if no sample covers the variable
    pub fn marginal(&self, var: &str) -> Result<CategoricalTable> {
        if !self.variables.iter().any(|v| v == var) {
            return Err(DialnetError::UnknownNode(String::from(var)));
        }

        self.samples
            .iter()
            .fold(CategoricalTable::builder(var), |b, s| {
                b.add_row(s.get(var).cloned().unwrap_or(Value::None), 1.0)
            })
            .build_normalised()
    }

    /// The most frequent assignment
    pub fn best(&self) -> Option<Assignment> {
        self.to_table().ok().and_then(|t| t.best().cloned())
    }

    /// Kernel density estimate over the samples of a single numeric variable
    ///
    /// # Errors
    /// * `DialnetError::NotContinuous` if the samples cover several variables, or a sampled
    ///   value is not a double
    pub fn to_continuous(&self) -> Result<ContinuousDistribution> {
        let var = match self.variables.as_slice() {
            [var] => var.clone(),
            _ => return Err(DialnetError::NotContinuous(self.variables.join(",")))
        };

        let mut points = Vec::with_capacity(self.samples.len());
        for s in self.samples.iter() {
            match s.get(&var).and_then(Value::as_double) {
                Some(d) => points.push(d),
                None => return Err(DialnetError::NotContinuous(var))
            }
        }

        Ok(ContinuousDistribution::new(var, DensityFunction::kernel(points)?))
    }
}

impl fmt::Display for EmpiricalDistribution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_table() {
            Ok(t) => write!(f, "{}", t),
            Err(_) => write!(f, "(empty)")
        }
    }
}
