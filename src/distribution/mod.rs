//! Defines the probability distributions attached to the nodes of a `Network`, and the tables
//! returned by inference.
//!
//! Every node distribution implements `ProbDistribution`: it can be sampled given the values
//! of the parent variables, and it can report the probability (or density) of a value. The
//! closed set of built-in kinds is gathered in the `Distribution` enum, with an `External`
//! variant for distributions computed elsewhere (e.g. from grounded rules).

use crate::util::Result;
use crate::value::Value;
use crate::variable::Assignment;

use rand::RngCore;

use std::fmt;
use std::sync::Arc;

pub mod categorical;
pub mod conditional;
pub mod continuous;
pub mod empirical;
pub mod tables;

pub use self::categorical::{CategoricalTable, CategoricalTableBuilder};
pub use self::conditional::{ConditionalTable, ConditionalTableBuilder, DeterministicDistribution};
pub use self::continuous::{ContinuousDistribution, DensityFunction};
pub use self::empirical::EmpiricalDistribution;
pub use self::tables::{MultivariateTable, UtilityTable};

/// Tolerance on the total mass of a discrete table
pub const PROB_TOLERANCE: f64 = 1e-6;

/// Number of buckets used when a continuous density must be read as a discrete table
pub const DISCRETISATION_BUCKETS: usize = 100;


/// The capabilities of a (conditional) probability distribution over a single variable.
pub trait ProbDistribution: fmt::Debug + Send + Sync {

    /// The variable over which the distribution is defined
    fn variable(&self) -> &str;

    /// Draw a value given the values of the conditioning variables
    fn sample(&self, condition: &Assignment, rng: &mut dyn RngCore) -> Result<Value>;

    /// Probability of the value given the conditioning variables, in `[0, 1]`
    fn prob(&self, condition: &Assignment, value: &Value) -> f64;

    /// Density of the value, for continuous distributions
    fn density(&self, _condition: &Assignment, _value: &Value) -> Option<f64> {
        None
    }

    /// The values with non-zero probability given the conditioning variables.
    ///
    /// # Errors
    /// * `DialnetError::UnsupportedDistribution` if the range is not enumerable
    fn values(&self, condition: &Assignment) -> Result<Vec<Value>>;

    /// Check if the distribution is over a continuous range
    fn is_continuous(&self) -> bool {
        false
    }
}


/// The distribution held by a chance node.
#[derive(Clone, Debug)]
pub enum Distribution {

    /// An unconditional table over discrete values
    Categorical(CategoricalTable),

    /// One categorical table per assignment of the parent variables
    Conditional(ConditionalTable),

    /// A parametric or kernel density
    Continuous(ContinuousDistribution),

    /// A single value per assignment of the parent variables
    Deterministic(DeterministicDistribution),

    /// A distribution supplied by an external component
    External(Arc<dyn ProbDistribution>)
}

impl Distribution {

    fn inner(&self) -> &dyn ProbDistribution {
        match self {
            Distribution::Categorical(d) => d,
            Distribution::Conditional(d) => d,
            Distribution::Continuous(d) => d,
            Distribution::Deterministic(d) => d,
            Distribution::External(d) => d.as_ref()
        }
    }

    /// Convert the distribution to a continuous one, if the representation allows it
    ///
    /// # Errors
    /// * `DialnetError::NotContinuous` for tables over non-numeric values, conditional and
    ///   external distributions
    pub fn to_continuous(&self) -> Result<ContinuousDistribution> {
        match self {
            Distribution::Continuous(d) => Ok(d.clone()),
            Distribution::Categorical(d) => d.to_continuous(),
            _ => Err(crate::util::DialnetError::NotContinuous(String::from(self.variable())))
        }
    }
}

impl ProbDistribution for Distribution {

    fn variable(&self) -> &str {
        self.inner().variable()
    }

    fn sample(&self, condition: &Assignment, rng: &mut dyn RngCore) -> Result<Value> {
        self.inner().sample(condition, rng)
    }

    fn prob(&self, condition: &Assignment, value: &Value) -> f64 {
        self.inner().prob(condition, value)
    }

    fn density(&self, condition: &Assignment, value: &Value) -> Option<f64> {
        self.inner().density(condition, value)
    }

    fn values(&self, condition: &Assignment) -> Result<Vec<Value>> {
        self.inner().values(condition)
    }

    fn is_continuous(&self) -> bool {
        self.inner().is_continuous()
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Distribution::Categorical(d) => write!(f, "{}", d),
            Distribution::Conditional(d) => write!(f, "{}", d),
            Distribution::Continuous(d) => write!(f, "{}", d),
            Distribution::Deterministic(d) => write!(f, "{}", d),
            Distribution::External(d) => write!(f, "{:?}", d)
        }
    }
}

impl From<CategoricalTable> for Distribution {
    fn from(d: CategoricalTable) -> Distribution {
        Distribution::Categorical(d)
    }
}

impl From<ConditionalTable> for Distribution {
    fn from(d: ConditionalTable) -> Distribution {
        Distribution::Conditional(d)
    }
}

impl From<ContinuousDistribution> for Distribution {
    fn from(d: ContinuousDistribution) -> Distribution {
        Distribution::Continuous(d)
    }
}

impl From<DeterministicDistribution> for Distribution {
    fn from(d: DeterministicDistribution) -> Distribution {
        Distribution::Deterministic(d)
    }
}
