//! Defines a simple forward sampler for `Network`s
//!
//! Implementation of Koller & Friedman Algorithm 12.1 (pp 489)

use super::Sampler;
use crate::model::{Network, Node, NodeKind};
use crate::util::{DialnetError, Result};
use crate::variable::Assignment;

use indexmap::IndexSet;
use rand::RngCore;


/// A simple, stateless `Sampler` drawing every chance and action node of a `Network`
pub struct ForwardSampler<'a> {

    /// The `Network` to sample
    network: &'a Network,

    /// The nodes to sample, in topological order
    nodes: Vec<&'a Node>
}

impl<'a> ForwardSampler<'a> {

    pub fn new(network: &'a Network) -> Self {
        ForwardSampler { network, nodes: network.sorted_nodes() }
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }
}

impl<'a> Sampler for ForwardSampler<'a> {

    fn sample(&self, rng: &mut dyn RngCore) -> Result<Assignment> {
        draw(&self.nodes, rng)
    }
}

fn draw(nodes: &[&Node], rng: &mut dyn RngCore) -> Result<Assignment> {
    let mut a = Assignment::new();

    for node in nodes.iter() {
        // nodes come in topological order, so the parents of each node are already drawn
        match node.kind() {
            NodeKind::Chance(chance) => {
                let value = chance.sample(&a, rng)?;
                a.add_pair(node.id(), value);
            },
            NodeKind::Action(action) => a.add_pair(node.id(), action.sample(rng)),
            NodeKind::Utility(_) => ()
        }
    }

    Ok(a)
}


/// Draw a single unweighted sample of the given variables, sampling them and their ancestors
///
/// # Errors
/// * `DialnetError::UnknownNode` if a variable is not in the network
pub fn extract_sample<S: AsRef<str>>(network: &Network, vars: &[S], rng: &mut dyn RngCore) -> Result<Assignment> {
    let mut targets = IndexSet::new();
    for var in vars.iter() {
        let var: &str = var.as_ref();
        if !network.has_node(var) {
            return Err(DialnetError::UnknownNode(String::from(var)));
        }
        targets.insert(String::from(var));
    }

    let nodes = network.relevant_sorted_nodes(&targets);
    Ok(draw(&nodes, rng)?.restrict_to(vars))
}
