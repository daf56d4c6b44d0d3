//! Defines the `Node`s of a `Network`: chance nodes carry a distribution, action nodes a set of
//! candidate actions, and utility nodes a utility function over their parents.

use crate::distribution::{CategoricalTable, Distribution, ProbDistribution, UtilityTable};
use crate::util::{DialnetError, Result};
use crate::value::Value;
use crate::variable::Assignment;

use indexmap::IndexSet;
use itertools::Itertools;
use rand::{Rng, RngCore};

use std::fmt;
use std::sync::Arc;


/// The kind of a `Node`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Chance,
    Action,
    Utility
}


/// A random variable with a (conditional) distribution
#[derive(Clone, Debug)]
pub struct ChanceNode {
    distrib: Distribution
}

impl ChanceNode {

    pub fn distrib(&self) -> &Distribution {
        &self.distrib
    }

    /// Draw a value given the values of the parents
    pub fn sample(&self, parents: &Assignment, rng: &mut dyn RngCore) -> Result<Value> {
        self.distrib.sample(parents, rng)
    }

    /// Probability of a value given the values of the parents
    pub fn prob(&self, parents: &Assignment, value: &Value) -> f64 {
        self.distrib.prob(parents, value)
    }

    /// Values of the node given the values of the parents
    pub fn values(&self, parents: &Assignment) -> Result<Vec<Value>> {
        self.distrib.values(parents)
    }

    pub fn is_continuous(&self) -> bool {
        self.distrib.is_continuous()
    }
}


/// A decision variable over a finite set of actions
#[derive(Clone, Debug)]
pub struct ActionNode {
    actions: Vec<Value>,

    /// Prior over the actions. Uniform when absent.
    prior: Option<CategoricalTable>
}

impl ActionNode {

    pub fn actions(&self) -> &[Value] {
        &self.actions
    }

    /// Draw an action from the prior
    pub fn sample(&self, rng: &mut dyn RngCore) -> Value {
        match &self.prior {
            Some(t) => t.draw(rng),
            None => self.actions[rng.gen_range(0..self.actions.len())].clone()
        }
    }

    /// Prior probability of an action
    pub fn prob(&self, action: &Value) -> f64 {
        match &self.prior {
            Some(t) => t.prob(action),
            None if self.actions.contains(action) => 1.0 / self.actions.len() as f64,
            None => 0.0
        }
    }
}


/// A utility function over the values of the parents of a utility node
#[derive(Clone)]
pub enum UtilityFunction {

    /// Utilities listed per assignment. Unlisted assignments have utility 0.
    Table(UtilityTable),

    /// Utilities computed by a closure
    Function(Arc<dyn Fn(&Assignment) -> f64 + Send + Sync>)
}

impl fmt::Debug for UtilityFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UtilityFunction::Table(t) => write!(f, "Table({:?})", t),
            UtilityFunction::Function(_) => write!(f, "Function")
        }
    }
}


/// A node that contributes utility given the values of its parents
#[derive(Clone, Debug)]
pub struct UtilityNode {
    function: UtilityFunction
}

impl UtilityNode {

    pub fn function(&self) -> &UtilityFunction {
        &self.function
    }

    /// Utility of the values of the parents
    pub fn utility(&self, parents: &Assignment) -> f64 {
        match &self.function {
            UtilityFunction::Table(t) => t.util(parents),
            UtilityFunction::Function(f) => f(parents)
        }
    }
}


#[derive(Clone, Debug)]
pub enum NodeKind {
    Chance(ChanceNode),
    Action(ActionNode),
    Utility(UtilityNode)
}


/// A node of a `Network`, with its incoming and outgoing edges.
///
/// Edges are maintained by the `Network`: `inputs` and `outputs` of connected nodes always
/// mirror each other.
#[derive(Clone, Debug)]
pub struct Node {
    id: String,
    inputs: IndexSet<String>,
    outputs: IndexSet<String>,
    kind: NodeKind
}

impl Node {

    fn with_kind(id: String, kind: NodeKind) -> Self {
        Node { id, inputs: IndexSet::new(), outputs: IndexSet::new(), kind }
    }

    /// Construct a chance node. The distribution must be defined over the node id.
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if the distribution is over another variable
    pub fn chance<S: Into<String>, D: Into<Distribution>>(id: S, distrib: D) -> Result<Self> {
        let id = id.into();
        let distrib = distrib.into();
        if distrib.variable() != id {
            return Err(DialnetError::MalformedDistribution(
                id, format!("distribution is defined over {}", distrib.variable())));
        }
        Ok(Node::with_kind(id, NodeKind::Chance(ChanceNode { distrib })))
    }

    /// Construct an action node with a uniform prior over the actions
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if there is no action
    pub fn action<S: Into<String>>(id: S, actions: Vec<Value>) -> Result<Self> {
        let id = id.into();
        let actions: Vec<Value> = actions.into_iter().unique().collect();
        if actions.is_empty() {
            return Err(DialnetError::MalformedDistribution(id, String::from("no actions")));
        }
        Ok(Node::with_kind(id, NodeKind::Action(ActionNode { actions, prior: None })))
    }

    /// Construct an action node with an explicit prior over the actions
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if the prior is over another variable
    pub fn action_with_prior<S: Into<String>>(id: S, prior: CategoricalTable) -> Result<Self> {
        let id = id.into();
        if prior.variable() != id {
            return Err(DialnetError::MalformedDistribution(
                id, format!("prior is defined over {}", prior.variable())));
        }
        let actions = prior.values();
        Ok(Node::with_kind(id, NodeKind::Action(ActionNode { actions, prior: Some(prior) })))
    }

    /// Construct a utility node
    pub fn utility<S: Into<String>>(id: S, function: UtilityFunction) -> Self {
        Node::with_kind(id.into(), NodeKind::Utility(UtilityNode { function }))
    }

    /// Construct a utility node from a closure over the values of the parents
    pub fn utility_fn<S, F>(id: S, f: F) -> Self
        where S: Into<String>,
              F: Fn(&Assignment) -> f64 + Send + Sync + 'static
    {
        Node::utility(id, UtilityFunction::Function(Arc::new(f)))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ids of the parents, in insertion order
    pub fn inputs(&self) -> &IndexSet<String> {
        &self.inputs
    }

    /// Ids of the children, in insertion order
    pub fn outputs(&self) -> &IndexSet<String> {
        &self.outputs
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Chance(_) => NodeType::Chance,
            NodeKind::Action(_) => NodeType::Action,
            NodeKind::Utility(_) => NodeType::Utility
        }
    }

    pub fn as_chance(&self) -> Option<&ChanceNode> {
        match &self.kind {
            NodeKind::Chance(c) => Some(c),
            _ => None
        }
    }

    pub fn as_action(&self) -> Option<&ActionNode> {
        match &self.kind {
            NodeKind::Action(a) => Some(a),
            _ => None
        }
    }

    pub fn as_utility(&self) -> Option<&UtilityNode> {
        match &self.kind {
            NodeKind::Utility(u) => Some(u),
            _ => None
        }
    }

    /// Check if the node is a chance node with a continuous distribution
    pub fn is_continuous(&self) -> bool {
        self.as_chance().map_or(false, ChanceNode::is_continuous)
    }

    /// Replace the distribution of a chance node
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if the node is not a chance node, or the
    ///   distribution is over another variable
    pub fn set_distrib<D: Into<Distribution>>(&mut self, distrib: D) -> Result<()> {
        let distrib = distrib.into();
        if distrib.variable() != self.id {
            return Err(DialnetError::MalformedDistribution(
                self.id.clone(), format!("distribution is defined over {}", distrib.variable())));
        }
        match &mut self.kind {
            NodeKind::Chance(c) => {
                c.distrib = distrib;
                Ok(())
            },
            _ => Err(DialnetError::MalformedDistribution(self.id.clone(),
                                                         String::from("not a chance node")))
        }
    }

    pub(crate) fn add_input(&mut self, id: &str) {
        self.inputs.insert(String::from(id));
    }

    pub(crate) fn add_output(&mut self, id: &str) {
        self.outputs.insert(String::from(id));
    }

    pub(crate) fn remove_input(&mut self, id: &str) -> bool {
        self.inputs.shift_remove(id)
    }

    pub(crate) fn remove_output(&mut self, id: &str) -> bool {
        self.outputs.shift_remove(id)
    }

    pub(crate) fn clear_edges(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            NodeKind::Chance(c) => write!(f, "{}", c.distrib),
            NodeKind::Action(a) => {
                let actions: Vec<String> = a.actions.iter().map(|v| v.to_string()).collect();
                write!(f, "{}: [{}]", self.id, actions.join(","))
            },
            NodeKind::Utility(u) => match &u.function {
                UtilityFunction::Table(t) => write!(f, "{}", t),
                UtilityFunction::Function(_) => write!(f, "U({})", self.id)
            }
        }
    }
}
