//! Defines an `InferenceAlgorithm` choosing, query by query, between exact and approximate
//! inference.
//!
//! Variable elimination is exact but its cost grows with the size of the factors, so it is
//! used only on small relevant networks over a few query variables without continuous
//! distributions. Every other query is answered by likelihood weighting.

use super::{CancellationToken, InferenceAlgorithm, LikelihoodWeighting, SwitchingConfig, VariableElimination};
use crate::distribution::{MultivariateTable, UtilityTable};
use crate::model::{Network, NodeKind};
use crate::query::{Query, QueryType};
use crate::util::Result;
use crate::variable::Assignment;

use tracing::debug;


/// An `InferenceAlgorithm` delegating each query to `VariableElimination` or to
/// `LikelihoodWeighting`
#[derive(Clone, Debug, Default)]
pub struct SwitchingAlgorithm {
    config: SwitchingConfig,
    cancellation: Option<CancellationToken>
}

impl SwitchingAlgorithm {

    pub fn new(config: SwitchingConfig) -> Self {
        SwitchingAlgorithm { config, cancellation: None }
    }

    /// Cancel the sampling of approximate queries with the token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &SwitchingConfig {
        &self.config
    }

    /// Check if the query is small enough to be answered by variable elimination
    pub fn is_exact(&self, query: &Query) -> bool {
        let nodes = query.filtered_sorted_nodes();
        let branching = nodes.iter().map(|n| n.inputs().len()).max().unwrap_or(0);
        let continuous = nodes.iter().filter(|n| n.is_continuous()).count();
        let query_vars = query.query_vars().len();

        let exact = branching <= self.config.max_branching_factor
            && query_vars <= self.config.max_query_vars
            && continuous <= self.config.max_continuous;

        debug!(%query, branching, continuous, query_vars,
               algorithm = if exact { "variable elimination" } else { "likelihood weighting" },
               "inference algorithm selected");
        exact
    }

    fn algorithm(&self, query: &Query) -> Box<dyn InferenceAlgorithm> {
        if self.is_exact(query) {
            return Box::new(VariableElimination::new());
        }

        let lw = LikelihoodWeighting::new(self.config.sampling.clone());
        match self.cancellation.clone() {
            Some(token) => Box::new(lw.with_cancellation(token)),
            None => Box::new(lw)
        }
    }
}

/// The distribution of a single unobserved root variable, read from its node
fn prior_table(query: &Query) -> Option<Result<MultivariateTable>> {
    if query.kind() != QueryType::Probability
        || query.query_vars().len() != 1
        || !query.evidence().is_empty() {
        return None;
    }

    let var = query.query_vars().iter().next()?;
    let node = query.network().node(var)?;
    let chance = match node.kind() {
        NodeKind::Chance(chance) if node.inputs().is_empty() && !chance.is_continuous() => chance,
        _ => return None
    };

    let none = Assignment::new();
    let table = chance.values(&none).and_then(|values| {
        MultivariateTable::from_rows(values.into_iter().map(|v| {
            let p = chance.prob(&none, &v);
            (Assignment::from_pair(var.as_str(), v), p)
        }))
    });
    Some(table)
}


impl InferenceAlgorithm for SwitchingAlgorithm {

    fn query_prob(&self, query: &Query) -> Result<MultivariateTable> {
        if let Some(table) = prior_table(query) {
            debug!(%query, "answered from the prior distribution");
            return table;
        }
        self.algorithm(query).query_prob(query)
    }

    fn query_util(&self, query: &Query) -> Result<UtilityTable> {
        self.algorithm(query).query_util(query)
    }

    fn reduce(&self, query: &Query) -> Result<Network> {
        self.algorithm(query).reduce(query)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{CategoricalTable, ContinuousDistribution, DensityFunction, DeterministicDistribution};
    use crate::fixtures;
    use crate::inference::SamplingConfig;
    use crate::model::Node;
    use crate::value::Value;

    use std::time::Duration;

    fn switching() -> SwitchingAlgorithm {
        SwitchingAlgorithm::new(SwitchingConfig::default()
                                    .with_sampling(SamplingConfig::default()
                                                       .with_nb_samples(3000)
                                                       .with_max_sampling_time(Duration::from_secs(30))
                                                       .with_seed(12)))
    }

    fn coin(id: &str) -> Node {
        let table = CategoricalTable::new(id, vec![(Value::from(true), 0.5), (Value::from(false), 0.5)])
                        .expect("unexpected error");
        Node::chance(id, table).expect("unexpected error")
    }

    #[test]
    fn selection() {
        let algorithm = switching();
        let network = fixtures::burglary2();
        let evidence = Assignment::from_pair("JohnCalls", true).with("MaryCalls", true);

        let small = Query::new(&network, vec!["Burglary"], evidence.clone()).expect("unexpected error");
        assert!(algorithm.is_exact(&small));

        let many = Query::new(&network, vec!["Burglary", "Earthquake", "Alarm"], evidence)
                       .expect("unexpected error");
        assert!(!algorithm.is_exact(&many));

        // five parents
        let mut wide = fixtures::burglary2();
        for id in &["p1", "p2", "p3"] {
            wide.add_node(coin(id)).expect("unexpected error");
        }
        wide.add_node(Node::chance("wide", DeterministicDistribution::new("wide", true)).expect("unexpected error"))
            .expect("unexpected error");
        for parent in &["Burglary", "Earthquake", "p1", "p2", "p3"] {
            wide.connect(parent, "wide").expect("unexpected error");
        }
        let query = Query::new(&wide, vec!["wide"], Assignment::new()).expect("unexpected error");
        assert!(!algorithm.is_exact(&query));
        let query = Query::new(&wide, vec!["Burglary"], Assignment::from_pair("JohnCalls", true))
                        .expect("unexpected error");
        assert!(algorithm.is_exact(&query));

        let mut continuous = fixtures::burglary2();
        let gaussian = DensityFunction::gaussian(0.0, 1.0).expect("unexpected error");
        continuous.add_node(Node::chance("x", ContinuousDistribution::new("x", gaussian)).expect("unexpected error"))
                  .expect("unexpected error");
        let query = Query::new(&continuous, vec!["x"], Assignment::new()).expect("unexpected error");
        assert!(!algorithm.is_exact(&query));
        assert!(SwitchingAlgorithm::new(SwitchingConfig::default().with_max_continuous(1)).is_exact(&query));
    }

    #[test]
    fn answers() {
        let algorithm = switching();
        let network = fixtures::burglary2();

        // exact: P(!B | A, M) = 0.3577609
        let evidence = Assignment::from_pair("Alarm", true).with("MaryCalls", true);
        let query = Query::new(&network, vec!["Burglary"], evidence).expect("unexpected error");
        let table = algorithm.query_prob(&query).expect("unexpected error");
        assert!((table.prob(&Assignment::from_pair("Burglary", false)) - 0.3577609).abs() < 1e-3);

        // approximate
        let evidence = Assignment::from_pair("JohnCalls", true);
        let query = Query::new(&network, vec!["Burglary", "Earthquake", "Alarm"], evidence.clone())
                        .expect("unexpected error");
        let table = algorithm.query_prob(&query).expect("unexpected error");
        let exact = VariableElimination::new().query_prob(&query).expect("unexpected error");
        let a = Assignment::from_pair("Burglary", false).with("Earthquake", false).with("Alarm", false);
        assert!((table.prob(&a) - exact.prob(&a)).abs() < 0.05);
    }

    #[test]
    fn prior_shortcut() {
        let network = fixtures::robot();
        let query = Query::new(&network, vec!["robot1"], Assignment::new()).expect("unexpected error");
        let table = prior_table(&query).expect("read from the node").expect("unexpected error");
        assert_eq!(2, table.len());
        assert!((table.prob(&Assignment::from_pair("robot1", true)) - 0.9).abs() < 1e-12);

        let query = Query::new(&network, vec!["floor"], Assignment::from_pair("robot1", true))
                        .expect("unexpected error");
        assert!(prior_table(&query).is_none());

        let query = Query::new(&network, vec!["Exists(robot1)"], Assignment::new()).expect("unexpected error");
        assert!(prior_table(&query).is_none());
        let table = switching().query_prob(&query).expect("unexpected error");
        assert!((table.prob(&Assignment::from_pair("Exists(robot1)", true)) - 0.9).abs() < 1e-9);
    }
}
