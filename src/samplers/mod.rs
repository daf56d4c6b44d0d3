//! Defines the samplers that draw assignments from a `Network`, and the `Sample` they produce.

use crate::util::Result;
use crate::value::Value;
use crate::variable::Assignment;

use rand::RngCore;

pub mod forward;
pub mod intervals;
pub mod likelihood;

pub use self::forward::{extract_sample, ForwardSampler};
pub use self::intervals::Intervals;
pub use self::likelihood::LikelihoodWeightedSampler;


/// Draws unweighted assignments.
///
/// Samplers only read the network, so one sampler can be shared by several threads, each with
/// its own random number generator.
pub trait Sampler {

    /// Draw an assignment
    fn sample(&self, rng: &mut dyn RngCore) -> Result<Assignment>;

}


/// Draws weighted samples. `Ok(None)` marks a rejected sample.
pub trait WeightedSampler {

    fn weighted_sample(&self, rng: &mut dyn RngCore) -> Result<Option<Sample>>;

}


/// An assignment with the log of its importance weight and the utility accumulated while it
/// was drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    assignment: Assignment,
    log_weight: f64,
    utility: f64
}

impl Sample {

    /// An empty sample of weight 1 and utility 0
    pub fn new() -> Self {
        Sample { assignment: Assignment::new(), log_weight: 0.0, utility: 0.0 }
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }

    pub fn weight(&self) -> f64 {
        self.log_weight.exp()
    }

    pub fn log_weight(&self) -> f64 {
        self.log_weight
    }

    pub fn utility(&self) -> f64 {
        self.utility
    }

    pub(crate) fn set(&mut self, var: &str, value: Value) {
        self.assignment.add_pair(var, value);
    }

    pub(crate) fn add_log_weight(&mut self, log_weight: f64) {
        self.log_weight += log_weight;
    }

    pub(crate) fn add_utility(&mut self, utility: f64) {
        self.utility += utility;
    }

    /// Drop every variable outside of `vars`, keeping the weight and utility
    pub(crate) fn trim<S: AsRef<str>>(&mut self, vars: &[S]) {
        self.assignment = self.assignment.restrict_to(vars);
    }
}

impl Default for Sample {
    fn default() -> Self {
        Sample::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_and_utilities() {
        let mut s = Sample::new();
        assert!((s.weight() - 1.0).abs() < 1e-12);

        s.set("A", Value::from(true));
        s.set("B", Value::from("x"));
        s.add_log_weight(0.5f64.ln());
        s.add_log_weight(0.2f64.ln());
        s.add_utility(-1.0);
        s.add_utility(3.0);

        assert!((s.weight() - 0.1).abs() < 1e-12);
        assert!((s.utility() - 2.0).abs() < 1e-12);

        s.trim(&["B"]);
        assert_eq!(&Assignment::from_pair("B", "x"), s.assignment());
        assert!((s.weight() - 0.1).abs() < 1e-12);

        // an impossible observation zeroes the weight
        s.add_log_weight(0.0f64.ln());
        assert_eq!(0.0, s.weight());
    }
}
