//! Defines an `InferenceAlgorithm` that uses exact inference by variable elimination to answer
//! probability, utility and reduction queries.
//!
//! Implementation of Koller & Friedman Algorithm 9.1 - Sum-Product-VE, with each factor entry
//! carrying an expected utility next to its probability.

use super::{reduce_from_joint, InferenceAlgorithm};
use crate::distribution::{MultivariateTable, UtilityTable};
use crate::factor::{Factor, Table};
use crate::model::{Network, Node, NodeKind, NodeType};
use crate::query::{Query, QueryType};
use crate::util::{DialnetError, Result};
use crate::value::Value;
use crate::variable::{all_assignments, Assignment, Variable};

use indexmap::{IndexMap, IndexSet};
use ndarray::prelude as nd;
use tracing::debug;


/// Exact inference over discrete networks. Continuous chance nodes must be discretised before
/// they reach a query answered by this algorithm.
#[derive(Clone, Copy, Debug, Default)]
pub struct VariableElimination;

impl VariableElimination {

    pub fn new() -> Self {
        VariableElimination
    }

    /// Run the elimination and return the (unnormalized) factor over the query variables
    ///
    /// # Errors
    /// * `DialnetError::UnsupportedDistribution` if a relevant node is continuous
    /// * `DialnetError::EmptyFactor` if the evidence has probability zero
    pub fn eliminate(&self, query: &Query) -> Result<Factor> {
        let nodes = query.filtered_sorted_nodes();
        let evidence = query.evidence();
        let domains = domains(nodes, evidence)?;

        let mut phis = Vec::with_capacity(nodes.len());
        for node in nodes.iter() {
            phis.push(make_factor(node, &domains)?.reduce(evidence));
        }

        // children are eliminated before their parents
        let order: Vec<&str> = nodes.iter()
                                    .rev()
                                    .filter(|n| n.node_type() != NodeType::Utility)
                                    .map(|n| n.id())
                                    .filter(|id| !query.query_vars().contains(*id) && !evidence.contains_var(id))
                                    .collect();
        debug!(?order, "elimination order");

        for var in order {
            let (phi_1prime, phi_2prime): (Vec<Factor>, Vec<Factor>) = phis.into_iter()
                                                                           .partition(|f| f.contains(var));

            // product step - multiply factors with var
            let psi = phi_1prime.iter()
                                .try_fold(Factor::identity(), |acc, phi| acc.product(phi))?;

            // sum step - marginalize psi over var
            phis = phi_2prime;
            phis.push(psi.marginalize(var));
        }

        let result = phis.iter().try_fold(Factor::identity(), |acc, phi| acc.product(phi))?;
        if !(result.total() > 0.0) {
            return Err(DialnetError::EmptyFactor);
        }
        Ok(result)
    }
}


/// The range of each relevant chance and action variable, in topological order. Observed
/// variables only range over their observed value.
fn domains(nodes: &[&Node], evidence: &Assignment) -> Result<IndexMap<String, Variable>> {
    let mut domains: IndexMap<String, Variable> = IndexMap::new();

    for node in nodes.iter() {
        let id = node.id();
        let values: Vec<Value> = match node.kind() {
            NodeKind::Utility(_) => continue,
            NodeKind::Chance(c) if c.is_continuous() => {
                return Err(DialnetError::UnsupportedDistribution(String::from(id)));
            },
            _ if evidence.contains_var(id) => evidence.get(id).into_iter().cloned().collect(),
            NodeKind::Action(a) => a.actions().to_vec(),
            NodeKind::Chance(c) => {
                let parents = parent_scope(node, &domains);
                let mut values = IndexSet::new();
                for condition in all_assignments(&parents) {
                    values.extend(c.values(&condition)?);
                }
                values.into_iter().collect()
            }
        };
        domains.insert(String::from(id), Variable::new(id, values));
    }

    Ok(domains)
}

fn parent_scope(node: &Node, domains: &IndexMap<String, Variable>) -> Vec<Variable> {
    node.inputs().iter().filter_map(|p| domains.get(p)).cloned().collect()
}

fn table(scope: &[Variable], cells: Vec<f64>) -> Result<Table> {
    let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
    Table::from_shape_vec(nd::IxDyn(&shape), cells)
        .map_err(|e| DialnetError::InvalidScope(e.to_string()))
}

/// The factor of a node: `P(node | parents)` for chance nodes, the prior of the actions for
/// action nodes, and the utility of the parents (with probability 1) for utility nodes.
fn make_factor(node: &Node, domains: &IndexMap<String, Variable>) -> Result<Factor> {
    let id = node.id();
    let mut scope = parent_scope(node, domains);

    match node.kind() {
        NodeKind::Chance(c) => {
            if let Some(v) = domains.get(id) {
                scope.push(v.clone());
            }
            let cells = all_assignments(&scope).iter()
                                               .map(|a| match a.get(id) {
                                                   Some(value) => c.prob(&a.remove_variable(id), value),
                                                   None => 0.0
                                               })
                                               .collect();
            let probs = table(&scope, cells)?;
            Factor::probability(scope, probs)
        },
        NodeKind::Action(action) => {
            let scope: Vec<Variable> = domains.get(id).into_iter().cloned().collect();
            let cells = scope.iter()
                             .flat_map(|v| v.values().iter())
                             .map(|value| action.prob(value))
                             .collect();
            let probs = table(&scope, cells)?;
            Factor::probability(scope, probs)
        },
        NodeKind::Utility(u) => {
            let assignments = all_assignments(&scope);
            let probs = table(&scope, vec![1.0; assignments.len()])?;
            let utils = table(&scope, assignments.iter().map(|a| u.utility(a)).collect())?;
            Factor::new(scope, probs, utils)
        }
    }
}


impl InferenceAlgorithm for VariableElimination {

    fn query_prob(&self, query: &Query) -> Result<MultivariateTable> {
        let result = self.eliminate(query)?.normalize()?;
        MultivariateTable::from_rows(result.rows().into_iter().map(|(a, p, _)| (a, p)))
    }

    fn query_util(&self, query: &Query) -> Result<UtilityTable> {
        if query.kind() != QueryType::Utility {
            return Err(DialnetError::InvalidQuery(format!("{} is not a utility query", query)));
        }

        let result = self.eliminate(query)?;
        let mut table = UtilityTable::new();
        for (a, p, u) in result.rows() {
            if p > 0.0 {
                table.set_util(a, u);
            }
        }
        Ok(table)
    }

    fn reduce(&self, query: &Query) -> Result<Network> {
        let joint = self.query_prob(query)?;
        reduce_from_joint(query, &joint, &[])
    }
}
