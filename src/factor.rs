//! Definition of the factor module
//!
//! A `Factor` is a table over the joint values of some scope of `Variable`s. Each cell holds a
//! probability and the expected utility attached to that assignment, which is what variable
//! elimination needs to answer both probability and utility queries.

use crate::util::{DialnetError, Result};
use crate::variable::{all_assignments, all_indices, Assignment, Variable};

use ndarray::prelude as nd;
use ndarray::Zip;

/// Alias f64 ndarray::Array as Table
pub type Table = nd::ArrayD<f64>;


#[derive(Clone, Debug)]
pub struct Factor {
    /// The scope of the `Factor`
    scope: Vec<Variable>,

    /// Probability of each assignment to the scope
    probs: Table,

    /// Expected utility of each assignment to the scope
    utils: Table
}


impl Factor {

    /// The identity `Factor`: empty scope, probability 1 and utility 0. It is the neutral
    /// element of the product.
    pub fn identity() -> Self {
        Factor {
            scope: vec![],
            probs: Table::from_elem(nd::IxDyn(&[]), 1.0),
            utils: Table::zeros(nd::IxDyn(&[]))
        }
    }


    /// Create a new `Factor`
    ///
    /// # Errors
    /// * `DialnetError::InvalidScope` if the tables do not match the cardinalities of the scope
    /// * `DialnetError::MalformedDistribution` if a probability is negative
    pub fn new(scope: Vec<Variable>, probs: Table, utils: Table) -> Result<Self> {
        let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
        if probs.shape() != shape.as_slice() || utils.shape() != shape.as_slice() {
            return Err(DialnetError::InvalidScope(
                format!("tables of shape {:?} and {:?} over a scope of shape {:?}",
                        probs.shape(), utils.shape(), shape)
            ));
        }

        if probs.iter().any(|&p| !(p >= 0.0)) {
            let names: Vec<&str> = scope.iter().map(|v| v.name()).collect();
            return Err(DialnetError::MalformedDistribution(names.join(","),
                                                           String::from("negative factor value")));
        }

        Ok(Factor { scope, probs, utils })
    }


    /// Create a `Factor` holding probabilities only
    pub fn probability(scope: Vec<Variable>, probs: Table) -> Result<Self> {
        let utils = Table::zeros(probs.raw_dim());
        Factor::new(scope, probs, utils)
    }


    /// Check if the `Factor` has an empty scope
    pub fn is_scalar(&self) -> bool {
        self.scope.is_empty()
    }


    /// Retrieve the scope of the `Factor`
    pub fn scope(&self) -> &[Variable] {
        &self.scope
    }


    /// Check if a variable is in the scope of the `Factor`
    pub fn contains(&self, var: &str) -> bool {
        self.scope.iter().any(|v| v.name() == var)
    }


    fn index_of(&self, assignment: &Assignment) -> Result<Option<Vec<usize>>> {
        let mut idx = Vec::with_capacity(self.scope.len());
        for v in self.scope.iter() {
            let value = assignment.get(v.name())
                                  .ok_or_else(|| DialnetError::InvalidScope(
                                      format!("{} is not assigned", v.name())))?;
            match v.index_of(value) {
                Some(i) => idx.push(i),
                None => return Ok(None)
            }
        }
        Ok(Some(idx))
    }


    /// Retrieve the probability of a complete assignment over the scope of this `Factor`. The
    /// assignment may be a superset of the scope. Values outside of a variable's range have
    /// probability 0.
    ///
    /// # Errors
    /// * `DialnetError::InvalidScope`, if a variable of the scope is not assigned
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        Ok(self.index_of(assignment)?.map_or(0.0, |idx| self.probs[nd::IxDyn(&idx)]))
    }


    /// Retrieve the utility of a complete assignment over the scope of this `Factor`
    ///
    /// # Errors
    /// * `DialnetError::InvalidScope`, if a variable of the scope is not assigned
    pub fn utility(&self, assignment: &Assignment) -> Result<f64> {
        Ok(self.index_of(assignment)?.map_or(0.0, |idx| self.utils[nd::IxDyn(&idx)]))
    }


    /// Total probability mass of the `Factor`
    pub fn total(&self) -> f64 {
        self.probs.sum()
    }


    /// Product of this `Factor` and another one: probabilities are multiplied and utilities
    /// are added.
    ///
    /// Defined in Koller & Friedman Section 4.2.1
    ///
    /// # Returns
    /// A new `Factor` of scope union(self.scope(), other.scope())
    ///
    /// # Errors
    /// * `DialnetError::InvalidScope`, if the factors disagree on the range of a shared variable
    pub fn product(&self, other: &Self) -> Result<Self> {
        if other.is_scalar() && self.is_scalar() {
            let p = self.probs.sum() * other.probs.sum();
            let u = self.utils.sum() + other.utils.sum();
            return Factor::new(vec![], Table::from_elem(nd::IxDyn(&[]), p),
                               Table::from_elem(nd::IxDyn(&[]), u));
        }

        // Psi(X, Y, Z) = phi1(X, Y) * phi2(Y, Z). The scope of self comes first, so its
        // indices are a prefix of the new ones.
        let mut new_scope = self.scope.clone();
        let mut other_pos = Vec::with_capacity(other.scope.len());
        for v in other.scope.iter() {
            match new_scope.iter().position(|n| n.name() == v.name()) {
                Some(i) if new_scope[i] != *v => {
                    return Err(DialnetError::InvalidScope(
                        format!("{} has different ranges in the two factors", v.name())));
                },
                Some(i) => other_pos.push(i),
                None => {
                    new_scope.push(v.clone());
                    other_pos.push(new_scope.len() - 1);
                }
            }
        }

        let shape: Vec<usize> = new_scope.iter().map(|v| v.cardinality()).collect();
        let mut probs = Table::zeros(nd::IxDyn(&shape));
        let mut utils = Table::zeros(nd::IxDyn(&shape));

        let n = self.scope.len();
        for idx in all_indices(&shape) {
            let idx1 = &idx[..n];
            let idx2: Vec<usize> = other_pos.iter().map(|&k| idx[k]).collect();

            probs[idx.as_slice()] = self.probs[idx1] * other.probs[idx2.as_slice()];
            utils[idx.as_slice()] = self.utils[idx1] + other.utils[idx2.as_slice()];
        }

        Ok(Factor { scope: new_scope, probs, utils })
    }


    /// Reduce the `Factor` to the given partial assignment. Variables of the assignment that
    /// are not in the scope are ignored. A value outside of a variable's range reduces the
    /// `Factor` to zero.
    ///
    /// Defined in Koller & Friedman 4.2.3
    pub fn reduce(&self, assignment: &Assignment) -> Self {
        let mut reduced: Vec<(usize, usize)> = Vec::new();
        let mut new_scope = Vec::with_capacity(self.scope.len());
        let mut impossible = false;

        for (i, v) in self.scope.iter().enumerate() {
            match assignment.get(v.name()) {
                Some(value) => match v.index_of(value) {
                    Some(k) => reduced.push((i, k)),
                    None => impossible = true
                },
                None => new_scope.push(v.clone())
            }
        }

        if impossible {
            let shape: Vec<usize> = new_scope.iter().map(|v| v.cardinality()).collect();
            return Factor {
                scope: new_scope,
                probs: Table::zeros(nd::IxDyn(&shape)),
                utils: Table::zeros(nd::IxDyn(&shape))
            };
        }

        // Axes are removed from the last one, so the remaining positions stay valid
        let mut probs = self.probs.clone();
        let mut utils = self.utils.clone();
        for &(i, k) in reduced.iter().rev() {
            probs = probs.index_axis(nd::Axis(i), k).to_owned();
            utils = utils.index_axis(nd::Axis(i), k).to_owned();
        }

        Factor { scope: new_scope, probs, utils }
    }


    /// Sum the `Factor` over the given variable. Utilities are averaged, weighted by the
    /// probability of each summed assignment.
    ///
    /// Defined in Koller & Friedman 9.3.1
    pub fn marginalize(&self, var: &str) -> Self {
        let i = match self.scope.iter().position(|v| v.name() == var) {
            Some(i) => i,
            // not in the scope, so already marginalized
            None => return self.clone()
        };

        let weighted = &self.probs * &self.utils;
        let probs = self.probs.sum_axis(nd::Axis(i));
        let weighted = weighted.sum_axis(nd::Axis(i));
        let utils = Zip::from(&probs)
                     .and(&weighted)
                     .map_collect(|&p, &pu| if p > 0.0 { pu / p } else { 0.0 });

        let mut scope = self.scope.clone();
        scope.remove(i);

        Factor { scope, probs, utils }
    }


    /// Rescale the probabilities to sum to 1
    ///
    /// # Errors
    /// * `DialnetError::EmptyFactor` if the total mass is 0
    pub fn normalize(&self) -> Result<Self> {
        let total = self.total();
        if !(total > 0.0) {
            return Err(DialnetError::EmptyFactor);
        }

        Ok(Factor {
            scope: self.scope.clone(),
            probs: self.probs.mapv(|p| p / total),
            utils: self.utils.clone()
        })
    }


    /// Every assignment of the scope with its probability and utility, in row-major order
    pub fn rows(&self) -> Vec<(Assignment, f64, f64)> {
        let shape: Vec<usize> = self.scope.iter().map(|v| v.cardinality()).collect();
        all_assignments(&self.scope)
            .into_iter()
            .zip(all_indices(&shape))
            .map(|(a, idx)| (a, self.probs[idx.as_slice()], self.utils[idx.as_slice()]))
            .collect()
    }
}
