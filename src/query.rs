//! Defines a `Query`: the variables of interest, the evidence, and the relevant part of the
//! network precomputed for the inference algorithms.

use crate::model::{Network, Node, NodeType};
use crate::util::{DialnetError, Result};
use crate::variable::Assignment;

use indexmap::IndexSet;
use tracing::{debug, warn};

use std::fmt;


/// The kind of answer a `Query` expects
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryType {

    /// A joint distribution over the query variables
    Probability,

    /// The expected utility of each assignment of the query variables
    Utility,

    /// A reduced network over the query variables
    Reduction
}


/// A validated inference request on a `Network`.
///
/// On construction, the query keeps the nodes that can influence the answer: the query and
/// evidence nodes, the utility nodes for utility queries, and all of their ancestors. Nodes
/// whose descendants are all irrelevant are pruned.
#[derive(Clone, Debug)]
pub struct Query<'a> {
    network: &'a Network,
    query_vars: IndexSet<String>,
    evidence: Assignment,
    kind: QueryType,

    /// The relevant nodes, in topological order
    nodes: Vec<&'a Node>
}

impl<'a> Query<'a> {

    /// Construct a probability query `P(query_vars | evidence)`
    ///
    /// # Errors
    /// * `DialnetError::InvalidQuery` if a variable is not in the network, is a utility node,
    ///   or appears both as query variable and evidence
    pub fn new<I, S>(network: &'a Network, query_vars: I, evidence: Assignment) -> Result<Self>
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Query::build(network, query_vars, evidence, QueryType::Probability)
    }

    /// Construct a utility query `U(query_vars | evidence)`
    ///
    /// # Errors
    /// * `DialnetError::InvalidQuery`, as for `Query::new`
    pub fn utility<I, S>(network: &'a Network, query_vars: I, evidence: Assignment) -> Result<Self>
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Query::build(network, query_vars, evidence, QueryType::Utility)
    }

    /// Construct a reduction query, whose answer is a network over the query variables
    ///
    /// # Errors
    /// * `DialnetError::InvalidQuery`, as for `Query::new`
    pub fn reduction<I, S>(network: &'a Network, query_vars: I, evidence: Assignment) -> Result<Self>
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Query::build(network, query_vars, evidence, QueryType::Reduction)
    }

    fn build<I, S>(network: &'a Network, query_vars: I, evidence: Assignment, kind: QueryType) -> Result<Self>
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let query_vars: IndexSet<String> = query_vars.into_iter().map(Into::into).collect();

        for var in query_vars.iter() {
            match network.node(var) {
                None => return Err(DialnetError::InvalidQuery(format!("unknown variable {}", var))),
                Some(n) if n.node_type() == NodeType::Utility => {
                    return Err(DialnetError::InvalidQuery(format!("{} is a utility node", var)));
                },
                Some(_) if evidence.contains_var(var) => {
                    return Err(DialnetError::InvalidQuery(format!("{} is also in the evidence", var)));
                },
                Some(_) => ()
            }
        }

        for var in evidence.variables() {
            match network.node(var) {
                None => return Err(DialnetError::InvalidQuery(format!("unknown evidence {}", var))),
                Some(n) if n.node_type() == NodeType::Utility => {
                    return Err(DialnetError::InvalidQuery(format!("{} is a utility node", var)));
                },
                Some(_) => ()
            }
        }

        if query_vars.is_empty() && kind != QueryType::Utility {
            warn!("query without query variables");
        }

        let mut targets: IndexSet<String> = query_vars.clone();
        targets.extend(evidence.variables().cloned());
        if kind == QueryType::Utility {
            targets.extend(network.node_ids_of_type(NodeType::Utility));
        }
        let nodes = network.relevant_sorted_nodes(&targets);

        let query = Query { network, query_vars, evidence, kind, nodes };
        debug!(query = %query, relevant = query.nodes.len(), total = network.len(), "query built");
        Ok(query)
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn query_vars(&self) -> &IndexSet<String> {
        &self.query_vars
    }

    pub fn evidence(&self) -> &Assignment {
        &self.evidence
    }

    pub fn kind(&self) -> QueryType {
        self.kind
    }

    /// The relevant nodes, in topological order
    pub fn filtered_sorted_nodes(&self) -> &[&'a Node] {
        &self.nodes
    }

    /// The query variables, in topological order
    pub fn sorted_query_vars(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| self.query_vars.contains(n.id()))
            .map(|n| String::from(n.id()))
            .collect()
    }

    /// Check if the relevant nodes hold a continuous distribution
    pub fn has_continuous_nodes(&self) -> bool {
        self.nodes.iter().any(|n| n.is_continuous())
    }
}

impl<'a> fmt::Display for Query<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let prefix = match self.kind {
            QueryType::Probability => "P",
            QueryType::Utility => "U",
            QueryType::Reduction => "Reduce"
        };
        let vars: Vec<&str> = self.query_vars.iter().map(String::as_str).collect();

        if self.evidence.is_empty() {
            write!(f, "{}({})", prefix, vars.join(","))
        } else {
            write!(f, "{}({}|{})", prefix, vars.join(","), self.evidence)
        }
    }
}
