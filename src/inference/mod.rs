//! Defines the interface to inference algorithms, and the answers they return.
//!
//! Two algorithms answer `Query`s: `VariableElimination` (exact) and `LikelihoodWeighting`
//! (approximate, anytime). `SwitchingAlgorithm` picks one of them per query.

use crate::distribution::{ContinuousDistribution, Distribution, EmpiricalDistribution, MultivariateTable,
                          ProbDistribution, UtilityTable};
use crate::model::{Network, NetworkBuilder, Node};
use crate::query::{Query, QueryType};
use crate::util::{DialnetError, Result};
use crate::variable::Assignment;

use indexmap::IndexSet;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub mod config;
mod importance_sampling;
mod switching;
mod variable_elimination;

pub use self::config::{SamplingConfig, SwitchingConfig};
pub use self::importance_sampling::LikelihoodWeighting;
pub use self::switching::SwitchingAlgorithm;
pub use self::variable_elimination::VariableElimination;


/// An `InferenceAlgorithm` answers the three kinds of `Query`:
///     ```P(Y | E = e)```, the expected utility ```U(Y | E = e)```, and the reduction of the
/// network to the variables `Y`.
///
/// Algorithms hold no state between queries: the same algorithm may answer queries on
/// different networks.
pub trait InferenceAlgorithm {

    /// Infer the joint distribution ```P(query_vars | evidence)```
    fn query_prob(&self, query: &Query) -> Result<MultivariateTable>;

    /// Infer the expected utility of each assignment of the query variables
    fn query_util(&self, query: &Query) -> Result<UtilityTable>;

    /// Build a network over the query variables only, with the evidence folded in
    fn reduce(&self, query: &Query) -> Result<Network>;

    /// Answer the query according to its kind
    fn run(&self, query: &Query) -> Result<QueryResult> {
        match query.kind() {
            QueryType::Probability => self.query_prob(query).map(QueryResult::Table),
            QueryType::Utility => self.query_util(query).map(QueryResult::Utility),
            QueryType::Reduction => self.reduce(query).map(QueryResult::Network)
        }
    }
}


/// A flag shared between the caller of a long-running inference and the algorithm. Sampling
/// stops once the token is cancelled; samples in progress are completed first.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {

    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}


/// The answer to a `Query`
#[derive(Clone, Debug)]
pub enum QueryResult {

    /// Joint probability table of the query variables
    Table(MultivariateTable),

    /// Posterior samples of the query variables
    Samples(EmpiricalDistribution),

    /// Expected utility of the assignments of the query variables
    Utility(UtilityTable),

    /// Network reduced to the query variables
    Network(Network)
}

impl QueryResult {

    /// Probability of an assignment of the query variables, for probability queries
    pub fn prob(&self, assignment: &Assignment) -> Option<f64> {
        match self {
            QueryResult::Table(t) => Some(t.prob(assignment)),
            QueryResult::Samples(s) => Some(s.prob(assignment)),
            _ => None
        }
    }

    /// Expected utility of an assignment of the query variables, for utility queries
    pub fn util(&self, assignment: &Assignment) -> Option<f64> {
        match self {
            QueryResult::Utility(t) => Some(t.util(assignment)),
            _ => None
        }
    }

    /// The most likely assignment, or the one of highest utility
    pub fn best(&self) -> Option<Assignment> {
        match self {
            QueryResult::Table(t) => t.best().cloned(),
            QueryResult::Samples(s) => s.best(),
            QueryResult::Utility(t) => t.best().map(|(a, _)| a.clone()),
            QueryResult::Network(_) => None
        }
    }

    /// Continuous view of the distribution of a single numeric variable
    ///
    /// # Errors
    /// * `DialnetError::NotContinuous` if the result is not a distribution over one variable
    ///   with double values
    pub fn to_continuous(&self) -> Result<ContinuousDistribution> {
        match self {
            QueryResult::Samples(s) => s.to_continuous(),
            QueryResult::Table(t) => match t.variables() {
                [var] => t.marginal(var)?.to_continuous(),
                vars => Err(DialnetError::NotContinuous(vars.join(",")))
            },
            QueryResult::Utility(_) => Err(DialnetError::NotContinuous(String::from("utility table"))),
            QueryResult::Network(_) => Err(DialnetError::NotContinuous(String::from("network")))
        }
    }

    pub fn network(&self) -> Option<&Network> {
        match self {
            QueryResult::Network(n) => Some(n),
            _ => None
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryResult::Table(t) => write!(f, "{}", t),
            QueryResult::Samples(s) => write!(f, "{}", s),
            QueryResult::Utility(t) => write!(f, "{}", t),
            QueryResult::Network(n) => write!(f, "{}", n)
        }
    }
}


/// Answer the query by variable elimination
///
/// # Errors
/// * `DialnetError::EmptyFactor` if the evidence has zero probability
/// * `DialnetError::UnsupportedDistribution` if a relevant node is continuous
pub fn run_exact_inference(query: &Query) -> Result<QueryResult> {
    VariableElimination::new().run(query)
}

/// Answer the query by likelihood weighting, collecting at most `nb_samples` samples within
/// `max_time`
///
/// # Errors
/// * `DialnetError::InferenceFailure` if no sample reached the weight threshold
pub fn run_approximate_inference(query: &Query, nb_samples: usize, max_time: Duration) -> Result<QueryResult> {
    let config = SamplingConfig::default()
                     .with_nb_samples(nb_samples)
                     .with_max_sampling_time(max_time);
    LikelihoodWeighting::new(config).run(query)
}


/// Build the reduced network of a query from the joint distribution of its discrete query
/// variables. Each variable is conditioned on its nearest ancestors among them. Continuous
/// variables get their own density, and are never parents.
pub(crate) fn reduce_from_joint(query: &Query,
                                joint: &MultivariateTable,
                                densities: &[ContinuousDistribution]) -> Result<Network> {
    let network = query.network();
    let sorted = query.sorted_query_vars();
    let discrete: IndexSet<String> = joint.variables().iter().cloned().collect();

    let mut builder = NetworkBuilder::new();
    for var in sorted.iter() {
        let density = densities.iter().find(|d| d.variable() == var.as_str());
        if let Some(density) = density {
            builder = builder.with_node(Node::chance(var.as_str(), density.clone())?, &[]);
            continue;
        }

        let ancestors = network.nearest_ancestor_ids(var, &discrete);
        let parents: Vec<String> = sorted.iter().filter(|v| ancestors.contains(*v)).cloned().collect();

        let distrib: Distribution = if parents.is_empty() {
            joint.marginal(var)?.into()
        } else {
            joint.conditional(var, &parents)?.into()
        };

        let inputs: Vec<&str> = parents.iter().map(String::as_str).collect();
        builder = builder.with_node(Node::chance(var.as_str(), distrib)?, &inputs);
    }

    builder.build()
}


#[cfg(test)]
/// Tests for the inference algorithms in this module. Tests are hoisted here to avoid
/// duplication. Any tests specific to one algorithm are held within that submodule's tests
/// module.
///
/// The student example is the modified Koller & Friedman network of example 6d of [1], which
/// provides the exact (via variable elimination) and approximate (via particle methods) results
/// of P(I | D=0, L=1, S=0).
///
/// [1] https://www.uni-oldenburg.de/en/lcs/probabilistic-programming/webchurch-and-openbugs/
mod tests {
    use super::*;
    use crate::fixtures;

    use std::time::Instant;

    fn seeded(nb_samples: usize, seed: u64) -> LikelihoodWeighting {
        LikelihoodWeighting::new(SamplingConfig::default()
                                     .with_nb_samples(nb_samples)
                                     .with_max_sampling_time(Duration::from_secs(60))
                                     .with_seed(seed))
    }

    /// Utility method to test the actual inference task
    fn test_inference(algorithm: &dyn InferenceAlgorithm, precision: f64) {
        let (network, evidence) = fixtures::student();
        let query = Query::new(&network, vec!["I"], evidence).expect("unexpected error");

        let result = algorithm.run(&query).expect("unexpected error");
        let p = result.prob(&Assignment::from_pair("I", 1)).expect("probability query");

        let expected = 0.02919708;
        assert!((p - expected).abs() < precision, "expected {}, got {}", expected, p);
    }

    #[test]
    /// Test variable elimination
    fn variable_elimination() {
        let engine = VariableElimination::new();

        // the result should be the same on subsequent iterations
        for _ in 0..10 {
            test_inference(&engine, 0.00000001);
        }
    }

    #[test]
    /// Test likelihood weighting
    fn likelihood_weighting() {
        for seed in 0..3 {
            test_inference(&seeded(10000, seed), 0.03);
        }
    }

    #[test]
    fn convergence() {
        let network = fixtures::burglary2();

        let query = Query::new(&network, vec!["MaryCalls"], Assignment::from_pair("Burglary", true))
                        .expect("unexpected error");
        let exact = run_exact_inference(&query).expect("unexpected error");
        let approx = seeded(10000, 5).run(&query).expect("unexpected error");
        for value in &[true, false] {
            let a = Assignment::from_pair("MaryCalls", *value);
            let (e, s) = (exact.prob(&a).unwrap_or(0.0), approx.prob(&a).unwrap_or(1.0));
            assert!((e - s).abs() < 0.03, "P({}) exact {} approximate {}", a, e, s);
        }

        let query = Query::new(&network, vec!["Burglary"], Assignment::from_pair("JohnCalls", true))
                        .expect("unexpected error");
        let exact = run_exact_inference(&query).expect("unexpected error");
        let approx = seeded(20000, 6).run(&query).expect("unexpected error");
        let a = Assignment::from_pair("Burglary", true);
        assert!((exact.prob(&a).unwrap_or(0.0) - approx.prob(&a).unwrap_or(1.0)).abs() < 0.03);
    }

    #[test]
    fn round_trips() {
        // a root variable without evidence gets its own table back
        let network = fixtures::robot();
        let query = Query::new(&network, vec!["robot1"], Assignment::new()).expect("unexpected error");
        let result = run_exact_inference(&query).expect("unexpected error");
        assert!((result.prob(&Assignment::from_pair("robot1", true)).unwrap_or(0.0) - 0.9).abs() < 1e-9);
        assert_eq!(Some(Assignment::from_pair("robot1", true)), result.best());

        // observed parents of a deterministic node leave a single possible value
        let query = Query::new(&network, vec!["Exists(robot1)"], Assignment::from_pair("robot1", false))
                        .expect("unexpected error");
        let result = run_exact_inference(&query).expect("unexpected error");
        assert_eq!(Some(1.0), result.prob(&Assignment::from_pair("Exists(robot1)", false)));
        assert_eq!(Some(0.0), result.prob(&Assignment::from_pair("Exists(robot1)", true)));
    }

    #[test]
    fn robot_state() {
        let network = fixtures::robot();
        assert_eq!(4, network.len());
        assert_eq!(vec!["name(robot1)", "floor", "robot1", "Exists(robot1)"], network.sorted_node_ids());

        let network = fixtures::robot_with_feature();
        assert_eq!(6, network.len());
        let inputs: Vec<&str> = network.node("feat(bla)")
                                       .expect("node is in the network")
                                       .inputs()
                                       .iter()
                                       .map(String::as_str)
                                       .collect();
        assert_eq!(vec!["bla"], inputs);

        let query = Query::new(&network, vec!["feat(bla)"], Assignment::new()).expect("unexpected error");
        let exact = run_exact_inference(&query).expect("unexpected error");
        assert!((exact.prob(&Assignment::from_pair("feat(bla)", 36)).unwrap_or(0.0) - 0.64).abs() < 1e-9);

        let approx = run_approximate_inference(&query, 5000, Duration::from_secs(60)).expect("unexpected error");
        assert!((approx.prob(&Assignment::from_pair("feat(bla)", 36)).unwrap_or(0.0) - 0.64).abs() < 0.04);
    }

    #[test]
    fn timeout() {
        let network = fixtures::chain(300);
        let query = Query::new(&network, vec!["x0"], Assignment::from_pair("x299", 0)).expect("unexpected error");

        let start = Instant::now();
        let result = run_approximate_inference(&query, 100000, Duration::from_millis(50)).expect("unexpected error");
        let elapsed = start.elapsed();

        match result {
            QueryResult::Samples(samples) => {
                assert!(!samples.is_empty());
                assert!(samples.len() < 100000);
            },
            r => panic!("expected samples, got {}", r)
        }
        assert!(elapsed < Duration::from_millis(1000), "sampling took {:?}", elapsed);
    }

    #[test]
    fn inconsistent_evidence() {
        let first = Assignment::from_pair("robot1", true).with("floor", 2);
        let second = Assignment::from_pair("robot1", false);
        assert_eq!(Err(DialnetError::InconsistentAssignment(String::from("robot1"))), first.union(&second));

        // overriding takes a restriction first
        let kept = first.remove_variable("robot1").union(&second).expect("unexpected error");
        assert_eq!(Some(&crate::value::Value::from(false)), kept.get("robot1"));
    }

    #[test]
    fn results() {
        let network = fixtures::burglary2();
        let evidence = Assignment::from_pair("JohnCalls", true).with("MaryCalls", true);

        let query = Query::utility(&network, vec!["Action"], evidence.clone()).expect("unexpected error");
        let result = run_exact_inference(&query).expect("unexpected error");
        assert_eq!(Some(Assignment::from_pair("Action", "CallPolice")), result.best());
        assert!(result.prob(&Assignment::from_pair("Action", "CallPolice")).is_none());
        assert!(result.util(&Assignment::from_pair("Action", "CallPolice")).is_some());
        assert!(result.to_continuous().is_err());

        let query = Query::reduction(&network, vec!["Burglary", "Alarm"], evidence).expect("unexpected error");
        let result = run_exact_inference(&query).expect("unexpected error");
        let reduced = result.network().expect("reduction query");
        assert_eq!(vec!["Burglary", "Alarm"], reduced.sorted_node_ids());
        assert!(result.best().is_none());
        assert!(!result.to_string().is_empty());

        let query = Query::new(&network, vec!["Burglary", "Alarm"], Assignment::new()).expect("unexpected error");
        match run_exact_inference(&query).expect("unexpected error").to_continuous() {
            Err(DialnetError::NotContinuous(vars)) => assert!(vars.contains("Burglary") && vars.contains("Alarm")),
            r => panic!("expected a failed conversion, got {:?}", r)
        }
    }

    #[test]
    fn continuous_results() {
        let network = fixtures::chain(2);
        let query = Query::new(&network, vec!["x1"], Assignment::new()).expect("unexpected error");

        let exact = run_exact_inference(&query).expect("unexpected error");
        let density = exact.to_continuous().expect("unexpected error");
        assert!(density.density_function().mean()[0] > 0.0);

        let approx = run_approximate_inference(&query, 1000, Duration::from_secs(60)).expect("unexpected error");
        let density = approx.to_continuous().expect("unexpected error");
        let mean = density.density_function().mean()[0];
        assert!(mean >= 0.0 && mean <= 3.0);
    }

    #[test]
    fn cancellation_token() {
        let token = CancellationToken::new();
        let shared = token.clone();
        assert!(!shared.is_cancelled());
        token.cancel();
        assert!(shared.is_cancelled());
    }
}
