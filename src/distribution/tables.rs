//! Result tables produced by inference: joint probability tables and utility tables

use super::{CategoricalTable, ConditionalTable, PROB_TOLERANCE};
use crate::util::{DialnetError, Result};
use crate::value::Value;
use crate::variable::Assignment;

use indexmap::IndexMap;

use std::fmt;


/// A joint probability table over the assignments of several variables.
#[derive(Clone, Debug, PartialEq)]
pub struct MultivariateTable {
    variables: Vec<String>,
    table: IndexMap<Assignment, f64>
}

impl MultivariateTable {

    /// Construct a table from its rows, rescaled to sum to 1. Rows for the same assignment
    /// are accumulated.
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if a row is negative or all rows are 0
    pub fn from_rows<I: IntoIterator<Item = (Assignment, f64)>>(rows: I) -> Result<Self> {
        let mut table: IndexMap<Assignment, f64> = IndexMap::new();
        let mut variables: Vec<String> = Vec::new();

        for (a, p) in rows {
            if !p.is_finite() || p < 0.0 {
                return Err(DialnetError::MalformedDistribution(a.to_string(), format!("P={}", p)));
            }
            for var in a.variables() {
                if !variables.contains(var) {
                    variables.push(var.clone());
                }
            }
            *table.entry(a).or_insert(0.0) += p;
        }

        let total: f64 = table.values().sum();
        if total <= 0.0 {
            return Err(DialnetError::MalformedDistribution(variables.join(","),
                                                           String::from("zero total mass")));
        }
        if (total - 1.0).abs() > PROB_TOLERANCE {
            table.values_mut().for_each(|p| *p /= total);
        }

        Ok(MultivariateTable { variables, table })
    }

    /// The variables of the table
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Probability of an assignment. Variables outside of the table are ignored.
    pub fn prob(&self, assignment: &Assignment) -> f64 {
        let key = assignment.restrict_to(&self.variables);
        self.table.get(&key).copied().unwrap_or(0.0)
    }

    /// Iterate over the rows of the table
    pub fn rows(&self) -> impl Iterator<Item = (&Assignment, f64)> {
        self.table.iter().map(|(a, p)| (a, *p))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The most likely assignment. Ties go to the earliest row.
    pub fn best(&self) -> Option<&Assignment> {
        let mut best: Option<(&Assignment, f64)> = None;
        for (a, p) in self.table.iter() {
            match best {
                Some((_, bp)) if *p <= bp => (),
                _ => best = Some((a, *p))
            }
        }
        best.map(|(a, _)| a)
    }

    /// Marginal table of a single variable
    ///
    /// # Errors
    /// * `DialnetError::UnknownNode` if the variable is not in the table
    pub fn marginal(&self, var: &str) -> Result<CategoricalTable> {
        if !self.variables.iter().any(|v| v == var) {
            return Err(DialnetError::UnknownNode(String::from(var)));
        }

        self.table
            .iter()
            .fold(CategoricalTable::builder(var), |b, (a, p)| {
                b.add_row(a.get(var).cloned().unwrap_or(Value::None), *p)
            })
            .build_normalised()
    }

    /// Conditional table of `head` given the `conditions` variables. Conditions with zero mass
    /// are left out.
    ///
    /// # Errors
    /// * `DialnetError::UnknownNode` if a variable is not in the table
    pub fn conditional(&self, head: &str, conditions: &[String]) -> Result<ConditionalTable> {
        for var in conditions.iter().map(String::as_str).chain(std::iter::once(head)) {
            if !self.variables.iter().any(|v| v == var) {
                return Err(DialnetError::UnknownNode(String::from(var)));
            }
        }

        let mut grouped: IndexMap<Assignment, IndexMap<Value, f64>> = IndexMap::new();
        for (a, p) in self.table.iter() {
            let cond = a.restrict_to(conditions);
            let value = a.get(head).cloned().unwrap_or(Value::None);
            *grouped.entry(cond).or_insert_with(IndexMap::new).entry(value).or_insert(0.0) += p;
        }

        let mut builder = ConditionalTable::builder(head);
        for (cond, rows) in grouped {
            if rows.values().sum::<f64>() <= 0.0 {
                continue;
            }
            let table = rows.into_iter()
                            .fold(CategoricalTable::builder(head), |b, (v, p)| b.add_row(v, p))
                            .build_normalised()?;
            builder = builder.with_table(cond, table);
        }
        builder.build()
    }
}

impl fmt::Display for MultivariateTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lines: Vec<String> = self.table
                                     .iter()
                                     .map(|(a, p)| format!("P({}):={:.4}", a, p))
                                     .collect();
        write!(f, "{}", lines.join("\n"))
    }
}


/// Utility estimate of an assignment, kept as a running average
#[derive(Clone, Copy, Debug, PartialEq)]
struct UtilityEstimate {
    average: f64,
    count: usize
}

/// A table mapping assignments (typically of action variables) to their expected utility.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UtilityTable {
    table: IndexMap<Assignment, UtilityEstimate>
}

impl UtilityTable {

    pub fn new() -> Self {
        UtilityTable { table: IndexMap::new() }
    }

    /// Set the utility of an assignment, replacing any earlier estimate
    pub fn set_util(&mut self, assignment: Assignment, util: f64) {
        self.table.insert(assignment, UtilityEstimate { average: util, count: 1 });
    }

    /// Fold a new utility observation into the running average of the assignment
    pub fn increment_util(&mut self, assignment: Assignment, util: f64) {
        let e = self.table.entry(assignment).or_insert(UtilityEstimate { average: 0.0, count: 0 });
        e.count += 1;
        e.average += (util - e.average) / e.count as f64;
    }

    /// Utility of an assignment, 0 if unknown
    pub fn util(&self, assignment: &Assignment) -> f64 {
        if let Some(e) = self.table.get(assignment) {
            return e.average;
        }

        self.table
            .iter()
            .find(|(a, _)| a.len() <= assignment.len() && assignment.contains_all(a))
            .map_or(0.0, |(_, e)| e.average)
    }

    /// Iterate over the rows of the table
    pub fn rows(&self) -> impl Iterator<Item = (&Assignment, f64)> {
        self.table.iter().map(|(a, e)| (a, e.average))
    }

    /// The assignment of highest utility. Ties go to the earliest row.
    pub fn best(&self) -> Option<(&Assignment, f64)> {
        let mut best: Option<(&Assignment, f64)> = None;
        for (a, e) in self.table.iter() {
            match best {
                Some((_, bu)) if e.average <= bu => (),
                _ => best = Some((a, e.average))
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Display for UtilityTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lines: Vec<String> = self.table
                                     .iter()
                                     .map(|(a, e)| format!("U({}):={:.4}", a, e.average))
                                     .collect();
        write!(f, "{}", lines.join("\n"))
    }
}
